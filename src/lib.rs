//! Farmstead: the state core of a grid farming game.
//!
//! A host shell adds `FarmCorePlugin` on top of `MinimalPlugins` (or
//! `DefaultPlugins`) and `StatesPlugin`, then drives the farm through the
//! request events in [`shared`] and listens to the notification events.
//! Rendering, input raycasting, and UI stay in the host.

pub mod clock;
pub mod config;
pub mod data;
pub mod economy;
pub mod error;
pub mod farming;
pub mod interaction;
pub mod inventory;
pub mod save;
pub mod shared;

use bevy::prelude::*;

use crate::shared::*;

pub struct FarmCorePlugin;

impl Plugin for FarmCorePlugin {
    fn build(&self, app: &mut App) {
        // ── Injected collaborators ───────────────────────────────────────
        // Hosts and tests may insert their own before adding the plugin.
        if !app.world().contains_resource::<config::CoreConfig>() {
            app.insert_resource(config::load_core_config_from_env());
        }
        if !app.world().contains_resource::<SimClock>() {
            app.insert_resource(SimClock::system());
        }

        app.init_state::<SimState>();

        // ── Requests ─────────────────────────────────────────────────────
        app.add_event::<CellClickedEvent>()
            .add_event::<PointerMovedEvent>()
            .add_event::<StartPlantingEvent>()
            .add_event::<CancelPlantingEvent>()
            .add_event::<PopupOpenedEvent>()
            .add_event::<PopupClosedEvent>()
            .add_event::<PlantCropEvent>()
            .add_event::<HarvestCropEvent>()
            .add_event::<ClearCropEvent>()
            .add_event::<SwitchCellKindEvent>()
            .add_event::<AddItemEvent>()
            .add_event::<RemoveItemEvent>()
            .add_event::<GoldChangeEvent>()
            .add_event::<GemChangeEvent>()
            .add_event::<ExperienceGainEvent>();

        // ── Notifications ────────────────────────────────────────────────
        app.add_event::<CellSelectedEvent>()
            .add_event::<CellDeselectedEvent>()
            .add_event::<CellKindChangedEvent>()
            .add_event::<CropPlantedEvent>()
            .add_event::<CropStageChangedEvent>()
            .add_event::<CropReadyEvent>()
            .add_event::<CropHarvestedEvent>()
            .add_event::<CropClearedEvent>()
            .add_event::<ItemUpdatedEvent>()
            .add_event::<ItemRemovedEvent>()
            .add_event::<InventoryClearedEvent>()
            .add_event::<LevelChangedEvent>()
            .add_event::<CurrencyChangedEvent>()
            .add_event::<PlantingModeStartedEvent>()
            .add_event::<PlantingModeEndedEvent>()
            .add_event::<CellHoveredEvent>()
            .add_event::<HoverClearedEvent>()
            .add_event::<PlantingFailedEvent>()
            .add_event::<PlantingPopupRequestedEvent>()
            .add_event::<CropInfoRequestedEvent>()
            .add_event::<RequestRejectedEvent>();

        app.configure_sets(
            Update,
            (
                FarmSet::Interaction,
                FarmSet::Commands,
                FarmSet::Growth,
                FarmSet::Persistence,
            )
                .chain()
                .run_if(in_state(SimState::Running)),
        )
        .configure_sets(
            Update,
            (
                CommandSet::Inventory,
                CommandSet::Economy,
                CommandSet::Grid,
                CommandSet::Rewards,
            )
                .chain()
                .in_set(FarmSet::Commands),
        );

        app.add_plugins((
            data::DataPlugin,
            inventory::InventoryPlugin,
            farming::FarmingPlugin,
            economy::EconomyPlugin,
            interaction::InteractionPlugin,
            save::SavePlugin,
        ));
    }
}
