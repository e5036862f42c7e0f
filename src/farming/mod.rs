//! Farming domain: the grid, planting, harvesting, and growth watchers.
//!
//! Communicates with other domains through crate::shared events/resources.
//! The ledger is the one outside resource it writes, to spend a seed per planting.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use crate::config::CoreConfig;
use crate::data::CropCatalog;
use crate::inventory::InventoryLedger;
use crate::shared::*;

mod crops;
pub mod grid;
pub mod growth;
mod harvest;
mod soil;
pub mod watchers;

pub use crops::handle_plant_requests;
pub use grid::{Cell, FarmGrid, PlantedCrop, SelectionChange};
pub use growth::{CropPhase, GrowthReading};
pub use harvest::{handle_clear_requests, handle_harvest_requests};
pub use soil::handle_switch_kind;
pub use watchers::{watch_all_planted, GrowthWatcher, GrowthWatcherPool, WatchStep};

pub struct FarmingPlugin;

impl Plugin for FarmingPlugin {
    fn build(&self, app: &mut App) {
        let config = app
            .world()
            .get_resource::<CoreConfig>()
            .cloned()
            .unwrap_or_default();

        app.insert_resource(FarmGrid::seeded(
            config.grid_width,
            config.grid_height,
            config.default_farm_columns,
            config.default_farm_rows,
        ))
        .init_resource::<GrowthWatcherPool>()
        // ------------------------------------------------------------------
        // Requests: removals first, so a cell freed this frame can be replanted
        // ------------------------------------------------------------------
        .add_systems(
            Update,
            (
                handle_clear_requests,
                handle_harvest_requests,
                handle_switch_kind,
                handle_plant_requests,
            )
                .chain()
                .in_set(CommandSet::Grid),
        )
        // ------------------------------------------------------------------
        // Growth polling: after every mutation of the frame
        // ------------------------------------------------------------------
        .add_systems(
            Update,
            watchers::poll_growth_watchers.in_set(FarmSet::Growth),
        );
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Planting shared by PlantCropEvent and the planting-mode confirm click
// ─────────────────────────────────────────────────────────────────────────────

#[derive(SystemParam)]
pub struct Planter<'w, 's> {
    pub commands: Commands<'w, 's>,
    pub clock: Res<'w, SimClock>,
    pub catalog: Res<'w, CropCatalog>,
    pub grid: ResMut<'w, FarmGrid>,
    pub ledger: ResMut<'w, InventoryLedger>,
    pub pool: ResMut<'w, GrowthWatcherPool>,
    pub notifier: Notifier<'w>,
}

impl Planter<'_, '_> {
    /// Spends one seed and plants it. The crop id, the cell, and the seed
    /// count are all checked before anything changes.
    pub fn plant_from_inventory(
        &mut self,
        cell: GridPos,
        crop_id: &str,
    ) -> Result<CropId, FarmError> {
        let crop_id = self.catalog.resolve(crop_id)?;
        self.grid.check_plantable(cell)?;
        self.ledger.check_available(crop_id.as_str(), 1)?;

        let now = self.clock.now();
        let change = self.ledger.remove(crop_id.as_str(), 1)?;
        self.grid.plant(cell, crop_id.clone(), now)?;
        self.pool
            .register(&mut self.commands, cell, crop_id.clone(), now);

        info!("[Farming] Planted {} at {}", crop_id, cell);
        self.notifier.ledger(change);
        self.notifier.crop_planted.send(CropPlantedEvent {
            cell,
            crop_id: crop_id.clone(),
            planted_at: now,
        });
        Ok(crop_id)
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }
}
