//! Headless integration tests for Farmstead.
//!
//! These tests drive the full `FarmCorePlugin` without a window or GPU.
//! Time comes from a `ManualClock`, persistence from a `MemoryGateway`, and
//! every notification the core emits is captured by a recorder system in
//! `Last` so tests can assert on exactly what a host would have seen.
//!
//! Run with: `cargo test --test headless`

use bevy::prelude::*;
use bevy::state::app::StatesPlugin;
use farmstead::clock::ManualClock;
use farmstead::config::CoreConfig;
use farmstead::data::{CropCatalog, CropDef};
use farmstead::economy::shop::TradeKind;
use farmstead::economy::{BuyRequestEvent, Economy, SellRequestEvent, ShopTransactionEvent};
use farmstead::farming::{FarmGrid, GrowthWatcher, GrowthWatcherPool};
use farmstead::interaction::{InteractionMachine, InteractionState};
use farmstead::inventory::InventoryLedger;
use farmstead::save::{
    LoadCompleteEvent, LoadRequestEvent, MemoryGateway, NewGameEvent, SaveCompleteEvent,
    SaveGateway, SaveRequestEvent,
};
use farmstead::shared::*;
use farmstead::FarmCorePlugin;
use std::collections::BTreeMap;

const START_SECS: f64 = 1_000_000.0;
const FARM: GridPos = GridPos::new(5, 5);
const LAWN: GridPos = GridPos::new(0, 0);

// ─────────────────────────────────────────────────────────────────────────────
// Event recorder
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Resource)]
struct Recorded<E: Event>(Vec<E>);

impl<E: Event> Default for Recorded<E> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

fn record<E: Event + Clone>(mut reader: EventReader<E>, mut recorded: ResMut<Recorded<E>>) {
    recorded.0.extend(reader.read().cloned());
}

fn recording<E: Event + Clone>(app: &mut App) {
    app.init_resource::<Recorded<E>>()
        .add_systems(Last, record::<E>);
}

/// Drains everything recorded for `E` so far.
fn take<E: Event>(app: &mut App) -> Vec<E> {
    std::mem::take(&mut app.world_mut().resource_mut::<Recorded<E>>().0)
}

// ─────────────────────────────────────────────────────────────────────────────
// Test App Builder
// ─────────────────────────────────────────────────────────────────────────────

fn test_catalog() -> CropCatalog {
    CropCatalog::from_defs([
        CropDef {
            id: CropId::new("carrot"),
            name: "Carrot".into(),
            growth_time_secs: 60.0,
            stage_count: 4,
            purchase_price: 50,
            sell_price: 100,
        },
        CropDef {
            id: CropId::new("corn"),
            name: "Corn".into(),
            growth_time_secs: 120.0,
            stage_count: 4,
            purchase_price: 75,
            sell_price: 150,
        },
    ])
    .expect("test catalog is valid")
}

fn at(secs: f64) -> Timestamp {
    Timestamp::from_secs_f64(START_SECS + secs)
}

/// Builds the full core with injected clock, catalog, config, and gateway,
/// then ticks until the simulation is Running.
fn build_test_app(gateway: MemoryGateway, start: Timestamp) -> (App, ManualClock) {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.add_plugins(StatesPlugin);

    let (clock, handle) = SimClock::manual(start);
    app.insert_resource(clock)
        .insert_resource(CoreConfig::default())
        .insert_resource(test_catalog())
        .insert_resource(SaveGateway::new(gateway));

    app.add_plugins(FarmCorePlugin);

    // ── Recorders ────────────────────────────────────────────────────────
    recording::<CellSelectedEvent>(&mut app);
    recording::<CellDeselectedEvent>(&mut app);
    recording::<CellKindChangedEvent>(&mut app);
    recording::<CropPlantedEvent>(&mut app);
    recording::<CropStageChangedEvent>(&mut app);
    recording::<CropReadyEvent>(&mut app);
    recording::<CropHarvestedEvent>(&mut app);
    recording::<CropClearedEvent>(&mut app);
    recording::<ItemUpdatedEvent>(&mut app);
    recording::<ItemRemovedEvent>(&mut app);
    recording::<LevelChangedEvent>(&mut app);
    recording::<CurrencyChangedEvent>(&mut app);
    recording::<PlantingModeStartedEvent>(&mut app);
    recording::<PlantingModeEndedEvent>(&mut app);
    recording::<CellHoveredEvent>(&mut app);
    recording::<HoverClearedEvent>(&mut app);
    recording::<PlantingFailedEvent>(&mut app);
    recording::<PlantingPopupRequestedEvent>(&mut app);
    recording::<CropInfoRequestedEvent>(&mut app);
    recording::<RequestRejectedEvent>(&mut app);
    recording::<ShopTransactionEvent>(&mut app);
    recording::<SaveCompleteEvent>(&mut app);
    recording::<LoadCompleteEvent>(&mut app);

    app.update();
    app.update();
    (app, handle)
}

fn fresh_app() -> (App, ManualClock) {
    build_test_app(MemoryGateway::default(), at(0.0))
}

/// Sends one event and runs a frame.
fn send<E: Event>(app: &mut App, event: E) {
    app.world_mut().send_event(event);
    app.update();
}

fn click(app: &mut App, cell: Option<GridPos>) {
    send(app, CellClickedEvent { cell });
}

fn plant(app: &mut App, cell: GridPos, crop_id: &str) {
    send(
        app,
        PlantCropEvent {
            cell,
            crop_id: crop_id.to_string(),
        },
    );
}

fn state_of(app: &App, cell: GridPos) -> CellState {
    let clock = app.world().resource::<SimClock>();
    let catalog = app.world().resource::<CropCatalog>();
    app.world()
        .resource::<FarmGrid>()
        .state(cell, catalog, clock.now())
        .expect("cell in range")
}

fn watcher_count(app: &mut App) -> usize {
    let mut query = app.world_mut().query::<&GrowthWatcher>();
    query.iter(app.world()).count()
}

// ─────────────────────────────────────────────────────────────────────────────
// Boot
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_boot_seeds_a_new_farm() {
    let (mut app, _clock) = fresh_app();

    assert_eq!(
        *app.world().resource::<State<SimState>>().get(),
        SimState::Running
    );

    let grid = app.world().resource::<FarmGrid>();
    assert_eq!(grid.get(FARM).unwrap().kind(), CellKind::Farm);
    assert_eq!(grid.get(LAWN).unwrap().kind(), CellKind::Ground);
    assert_eq!(grid.planted().count(), 0);

    let ledger = app.world().resource::<InventoryLedger>();
    assert_eq!(ledger.quantity("carrot"), 10);
    assert_eq!(ledger.unit_value("carrot"), 100);
    assert_eq!(ledger.quantity("corn"), 10);

    let economy = app.world().resource::<Economy>();
    assert_eq!(economy.level(), 1);
    assert_eq!(economy.max_exp(), 1000);
    assert_eq!(economy.gold(), 10_000);
    assert_eq!(economy.gems(), 100);

    let loads = take::<LoadCompleteEvent>(&mut app);
    assert_eq!(loads.len(), 1, "boot reports exactly one load result");
    assert!(!loads[0].success, "nothing was saved, so nothing was restored");
    assert!(loads[0].error_message.is_none());
}

// ─────────────────────────────────────────────────────────────────────────────
// Planting, growth, harvest
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_plant_grow_and_harvest_carrot() {
    let (mut app, clock) = fresh_app();

    plant(&mut app, FARM, "carrot");
    let planted = take::<CropPlantedEvent>(&mut app);
    assert_eq!(planted.len(), 1);
    assert_eq!(planted[0].cell, FARM);
    assert_eq!(planted[0].crop_id, CropId::new("carrot"));
    assert_eq!(planted[0].planted_at, at(0.0));
    assert_eq!(app.world().resource::<InventoryLedger>().quantity("carrot"), 9);
    assert!(app.world().resource::<GrowthWatcherPool>().is_watching(FARM));
    assert_eq!(state_of(&app, FARM), CellState::Growing);

    // Too early.
    send(&mut app, HarvestCropEvent { cell: FARM });
    let rejected = take::<RequestRejectedEvent>(&mut app);
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].reason, FarmError::NotReady { cell: FARM });
    assert!(take::<CropHarvestedEvent>(&mut app).is_empty());

    clock.advance_secs(61.0);
    app.update();
    app.update();

    let ready = take::<CropReadyEvent>(&mut app);
    assert_eq!(ready.len(), 1, "ready fires once");
    assert_eq!(ready[0].cell, FARM);
    let stages = take::<CropStageChangedEvent>(&mut app);
    assert_eq!(stages.last().map(|s| s.stage), Some(3));
    assert!(!app.world().resource::<GrowthWatcherPool>().is_watching(FARM));
    assert_eq!(watcher_count(&mut app), 0);
    assert_eq!(state_of(&app, FARM), CellState::ReadyToHarvest);

    send(&mut app, HarvestCropEvent { cell: FARM });
    let harvested = take::<CropHarvestedEvent>(&mut app);
    assert_eq!(harvested.len(), 1);
    assert_eq!(harvested[0].crop_id, CropId::new("carrot"));
    assert_eq!(state_of(&app, FARM), CellState::Empty);

    let economy = app.world().resource::<Economy>();
    assert_eq!(economy.gold(), 10_100, "harvest credits the sell price");
    assert_eq!(economy.current_exp(), 10, "harvest grants fixed experience");
}

#[test]
fn test_plant_on_ground_is_rejected() {
    let (mut app, _clock) = fresh_app();

    plant(&mut app, LAWN, "carrot");
    assert!(take::<CropPlantedEvent>(&mut app).is_empty());
    let failed = take::<PlantingFailedEvent>(&mut app);
    assert_eq!(failed.len(), 1);
    assert!(matches!(
        failed[0].reason,
        FarmError::InvalidPlanting {
            kind: CellKind::Ground,
            occupied: false,
            ..
        }
    ));
    assert_eq!(
        app.world().resource::<InventoryLedger>().quantity("carrot"),
        10,
        "a failed planting spends no seed"
    );
}

#[test]
fn test_clear_crop_stops_its_watcher() {
    let (mut app, _clock) = fresh_app();

    plant(&mut app, FARM, "corn");
    app.update();
    assert_eq!(watcher_count(&mut app), 1);

    send(&mut app, ClearCropEvent { cell: FARM });
    let cleared = take::<CropClearedEvent>(&mut app);
    assert_eq!(cleared.len(), 1);
    assert_eq!(cleared[0].crop_id, CropId::new("corn"));
    assert!(app.world().resource::<GrowthWatcherPool>().is_empty());
    app.update();
    assert_eq!(watcher_count(&mut app), 0);
    assert_eq!(state_of(&app, FARM), CellState::Empty);
}

#[test]
fn test_clear_and_replant_in_one_frame() {
    let (mut app, _clock) = fresh_app();

    plant(&mut app, FARM, "carrot");
    app.update();
    take::<CropPlantedEvent>(&mut app);

    app.world_mut().send_event(ClearCropEvent { cell: FARM });
    app.world_mut().send_event(PlantCropEvent {
        cell: FARM,
        crop_id: "corn".into(),
    });
    app.update();
    app.update();

    assert_eq!(take::<CropClearedEvent>(&mut app).len(), 1);
    let planted = take::<CropPlantedEvent>(&mut app);
    assert_eq!(planted.len(), 1, "the freed cell is replanted the same frame");
    assert_eq!(planted[0].crop_id, CropId::new("corn"));
    assert_eq!(app.world().resource::<GrowthWatcherPool>().len(), 1);
    assert_eq!(watcher_count(&mut app), 1);
}

#[test]
fn test_switch_cell_kind() {
    let (mut app, _clock) = fresh_app();

    send(
        &mut app,
        SwitchCellKindEvent {
            cell: LAWN,
            kind: CellKind::Farm,
        },
    );
    let changed = take::<CellKindChangedEvent>(&mut app);
    assert_eq!(changed.len(), 1);
    assert_eq!(changed[0].from, CellKind::Ground);
    assert_eq!(changed[0].to, CellKind::Farm);

    plant(&mut app, FARM, "carrot");
    send(
        &mut app,
        SwitchCellKindEvent {
            cell: FARM,
            kind: CellKind::Ground,
        },
    );
    let rejected = take::<RequestRejectedEvent>(&mut app);
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].reason, FarmError::CellOccupied { cell: FARM });
    assert_eq!(
        app.world().resource::<FarmGrid>().get(FARM).unwrap().kind(),
        CellKind::Farm
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Interaction
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_selecting_same_cell_twice_emits_once() {
    let (mut app, clock) = fresh_app();

    click(&mut app, Some(LAWN));
    clock.advance_secs(1.0);
    click(&mut app, Some(LAWN));

    let selected = take::<CellSelectedEvent>(&mut app);
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].cell, LAWN);
    assert!(take::<PlantingPopupRequestedEvent>(&mut app).is_empty());

    clock.advance_secs(1.0);
    let next = GridPos::new(1, 0);
    click(&mut app, Some(next));
    let deselected = take::<CellDeselectedEvent>(&mut app);
    assert_eq!(deselected.len(), 1);
    assert_eq!(deselected[0].cell, LAWN);
    assert_eq!(take::<CellSelectedEvent>(&mut app)[0].cell, next);

    // A miss clears the selection.
    clock.advance_secs(1.0);
    click(&mut app, None);
    assert_eq!(take::<CellDeselectedEvent>(&mut app)[0].cell, next);
    assert_eq!(app.world().resource::<FarmGrid>().selected(), None);
}

#[test]
fn test_rapid_clicks_are_debounced() {
    let (mut app, clock) = fresh_app();

    click(&mut app, Some(LAWN));
    clock.advance_secs(0.2);
    click(&mut app, Some(GridPos::new(1, 0)));
    assert_eq!(app.world().resource::<FarmGrid>().selected(), Some(LAWN));

    clock.advance_secs(0.5);
    click(&mut app, Some(GridPos::new(1, 0)));
    assert_eq!(
        app.world().resource::<FarmGrid>().selected(),
        Some(GridPos::new(1, 0))
    );
    assert_eq!(take::<CellSelectedEvent>(&mut app).len(), 2);
}

#[test]
fn test_planting_mode_hover_and_confirm() {
    let (mut app, _clock) = fresh_app();

    // Idle click on empty farmland asks the UI for the seed picker.
    click(&mut app, Some(FARM));
    let popup = take::<PlantingPopupRequestedEvent>(&mut app);
    assert_eq!(popup.len(), 1);
    assert_eq!(popup[0].cell, FARM);

    send(
        &mut app,
        StartPlantingEvent {
            crop_id: "carrot".into(),
        },
    );
    let started = take::<PlantingModeStartedEvent>(&mut app);
    assert_eq!(started.len(), 1);
    assert_eq!(started[0].crop_id, CropId::new("carrot"));
    assert_eq!(take::<CellDeselectedEvent>(&mut app)[0].cell, FARM);
    assert_eq!(app.world().resource::<FarmGrid>().selected(), None);

    send(&mut app, PointerMovedEvent { cell: Some(LAWN) });
    send(&mut app, PointerMovedEvent { cell: Some(LAWN) });
    send(&mut app, PointerMovedEvent { cell: Some(FARM) });
    let hovered = take::<CellHoveredEvent>(&mut app);
    assert_eq!(hovered.len(), 2, "unchanged hover is not repeated");
    assert!(!hovered[0].valid);
    assert!(hovered[1].valid);

    // Invalid target: failure reported, still planting.
    click(&mut app, Some(LAWN));
    let failed = take::<PlantingFailedEvent>(&mut app);
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].cell, Some(LAWN));
    assert!(matches!(
        app.world().resource::<InteractionMachine>().state(),
        InteractionState::PlantingMode { .. }
    ));

    click(&mut app, Some(FARM));
    assert_eq!(take::<CropPlantedEvent>(&mut app).len(), 1);
    assert_eq!(take::<PlantingModeEndedEvent>(&mut app).len(), 1);
    assert_eq!(take::<HoverClearedEvent>(&mut app).len(), 1);
    assert!(app.world().resource::<InteractionMachine>().is_idle());
    assert_eq!(app.world().resource::<InventoryLedger>().quantity("carrot"), 9);
}

#[test]
fn test_running_out_of_seeds_exits_planting_mode() {
    let (mut app, _clock) = fresh_app();

    send(
        &mut app,
        RemoveItemEvent {
            item_id: "carrot".into(),
            amount: 10,
        },
    );
    assert_eq!(take::<ItemRemovedEvent>(&mut app).len(), 1);

    send(
        &mut app,
        StartPlantingEvent {
            crop_id: "carrot".into(),
        },
    );
    click(&mut app, Some(FARM));

    let failed = take::<PlantingFailedEvent>(&mut app);
    assert_eq!(failed.len(), 1);
    assert!(matches!(
        failed[0].reason,
        FarmError::InsufficientQuantity { available: 0, .. }
    ));
    assert_eq!(take::<PlantingModeEndedEvent>(&mut app).len(), 1);
    assert!(app.world().resource::<InteractionMachine>().is_idle());
    assert_eq!(state_of(&app, FARM), CellState::Empty);
}

#[test]
fn test_popup_suppresses_cell_clicks() {
    let (mut app, clock) = fresh_app();

    send(&mut app, PopupOpenedEvent);
    click(&mut app, Some(LAWN));
    assert!(take::<CellSelectedEvent>(&mut app).is_empty());

    send(&mut app, PopupClosedEvent);
    clock.advance_secs(1.0);
    click(&mut app, Some(LAWN));
    assert_eq!(take::<CellSelectedEvent>(&mut app).len(), 1);
}

#[test]
fn test_clicking_growing_crop_requests_info() {
    let (mut app, clock) = fresh_app();

    plant(&mut app, FARM, "carrot");
    clock.advance_secs(15.0);
    click(&mut app, Some(FARM));

    let info = take::<CropInfoRequestedEvent>(&mut app);
    assert_eq!(info.len(), 1);
    assert_eq!(info[0].planted_at, at(0.0));
    assert!((info[0].fraction - 0.25).abs() < 1e-9);
    assert!((info[0].remaining_secs - 45.0).abs() < 1e-9);
    assert!(take::<CropHarvestedEvent>(&mut app).is_empty());
}

#[test]
fn test_clicking_ready_crop_harvests_and_credits() {
    let (mut app, clock) = fresh_app();

    plant(&mut app, FARM, "carrot");
    clock.advance_secs(61.0);
    app.update();
    take::<LevelChangedEvent>(&mut app);

    click(&mut app, Some(FARM));
    assert_eq!(take::<CropHarvestedEvent>(&mut app).len(), 1);
    assert_eq!(state_of(&app, FARM), CellState::Empty);

    let economy = app.world().resource::<Economy>();
    assert_eq!(economy.gold(), 10_100);
    let levels = take::<LevelChangedEvent>(&mut app);
    assert_eq!(levels.len(), 1);
    assert_eq!(
        (levels[0].level, levels[0].current_exp, levels[0].max_exp),
        (1, 10, 1000)
    );
    let wallet = take::<CurrencyChangedEvent>(&mut app);
    assert_eq!(wallet.last().map(|w| w.gold), Some(10_100));
}

// ─────────────────────────────────────────────────────────────────────────────
// Economy
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_experience_rolls_over_several_levels() {
    let (mut app, _clock) = fresh_app();
    take::<LevelChangedEvent>(&mut app);

    send(
        &mut app,
        ExperienceGainEvent {
            amount: 2500,
            reason: "test".into(),
        },
    );

    let levels = take::<LevelChangedEvent>(&mut app);
    assert_eq!(levels.len(), 1, "one notification per gain");
    assert_eq!(levels[0].level, 3);
    assert_eq!(levels[0].current_exp, 300);
    assert_eq!(levels[0].max_exp, 1440);
}

#[test]
fn test_gold_changes_never_overdraw() {
    let (mut app, _clock) = fresh_app();

    send(
        &mut app,
        GoldChangeEvent {
            amount: -20_000,
            reason: "too much".into(),
        },
    );
    send(
        &mut app,
        GoldChangeEvent {
            amount: 0,
            reason: "nothing".into(),
        },
    );
    let rejected = take::<RequestRejectedEvent>(&mut app);
    assert_eq!(rejected.len(), 2);
    assert_eq!(
        rejected[0].reason,
        FarmError::InsufficientFunds {
            currency: Currency::Gold,
            requested: 20_000,
            available: 10_000,
        }
    );
    assert_eq!(rejected[1].reason, FarmError::InvalidAmount(0));
    assert_eq!(app.world().resource::<Economy>().gold(), 10_000);

    send(
        &mut app,
        GemChangeEvent {
            amount: -40,
            reason: "speed up".into(),
        },
    );
    let wallet = take::<CurrencyChangedEvent>(&mut app);
    assert_eq!(wallet.last().map(|w| (w.gold, w.gems)), Some((10_000, 60)));
}

#[test]
fn test_shop_buy_and_sell() {
    let (mut app, _clock) = fresh_app();

    send(
        &mut app,
        BuyRequestEvent {
            crop_id: "corn".into(),
            quantity: 2,
        },
    );
    let tx = take::<ShopTransactionEvent>(&mut app);
    assert_eq!(tx.len(), 1);
    assert_eq!(tx[0].kind, TradeKind::Buy);
    assert_eq!(tx[0].total, 150);
    assert_eq!(app.world().resource::<Economy>().gold(), 9_850);
    assert_eq!(app.world().resource::<InventoryLedger>().quantity("corn"), 12);

    send(
        &mut app,
        SellRequestEvent {
            crop_id: "carrot".into(),
            quantity: 3,
        },
    );
    assert_eq!(take::<ShopTransactionEvent>(&mut app)[0].total, 300);
    assert_eq!(app.world().resource::<Economy>().gold(), 10_150);
    assert_eq!(app.world().resource::<InventoryLedger>().quantity("carrot"), 7);

    // Rejected trades change nothing.
    send(
        &mut app,
        BuyRequestEvent {
            crop_id: "ghost".into(),
            quantity: 1,
        },
    );
    send(
        &mut app,
        BuyRequestEvent {
            crop_id: "carrot".into(),
            quantity: 1_000,
        },
    );
    let rejected = take::<RequestRejectedEvent>(&mut app);
    assert_eq!(rejected.len(), 2);
    assert!(matches!(rejected[0].reason, FarmError::NotFound { .. }));
    assert!(matches!(
        rejected[1].reason,
        FarmError::InsufficientFunds { .. }
    ));
    assert_eq!(app.world().resource::<Economy>().gold(), 10_150);
    assert_eq!(app.world().resource::<InventoryLedger>().quantity("carrot"), 7);
}

#[test]
fn test_seeds_bought_this_frame_can_be_planted_this_frame() {
    let (mut app, _clock) = fresh_app();
    send(
        &mut app,
        RemoveItemEvent {
            item_id: "carrot".into(),
            amount: 10,
        },
    );

    app.world_mut().send_event(PlantCropEvent {
        cell: FARM,
        crop_id: "carrot".into(),
    });
    app.world_mut().send_event(BuyRequestEvent {
        crop_id: "carrot".into(),
        quantity: 1,
    });
    app.update();

    assert_eq!(take::<CropPlantedEvent>(&mut app).len(), 1);
    assert!(take::<PlantingFailedEvent>(&mut app).is_empty());
    assert_eq!(app.world().resource::<InventoryLedger>().quantity("carrot"), 0);
    assert_eq!(app.world().resource::<Economy>().gold(), 9_950);
}

#[test]
fn test_items_added_this_frame_can_be_planted_this_frame() {
    let (mut app, _clock) = fresh_app();
    send(
        &mut app,
        RemoveItemEvent {
            item_id: "corn".into(),
            amount: 10,
        },
    );

    app.world_mut().send_event(PlantCropEvent {
        cell: FARM,
        crop_id: "corn".into(),
    });
    app.world_mut().send_event(AddItemEvent {
        item_id: "corn".into(),
        amount: 1,
        unit_value: 150,
    });
    app.update();

    assert_eq!(take::<CropPlantedEvent>(&mut app).len(), 1);
    assert!(take::<PlantingFailedEvent>(&mut app).is_empty());
    assert_eq!(app.world().resource::<InventoryLedger>().quantity("corn"), 0);
}

// ─────────────────────────────────────────────────────────────────────────────
// Persistence
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_new_game_deselects_and_leaves_planting_mode() {
    let (mut app, clock) = fresh_app();

    click(&mut app, Some(LAWN));
    send(&mut app, NewGameEvent);
    let deselected = take::<CellDeselectedEvent>(&mut app);
    assert_eq!(deselected.len(), 1);
    assert_eq!(deselected[0].cell, LAWN);
    assert_eq!(app.world().resource::<FarmGrid>().selected(), None);

    send(
        &mut app,
        StartPlantingEvent {
            crop_id: "carrot".into(),
        },
    );
    send(&mut app, PointerMovedEvent { cell: Some(FARM) });
    send(&mut app, NewGameEvent);
    assert_eq!(take::<PlantingModeEndedEvent>(&mut app).len(), 1);
    assert_eq!(take::<HoverClearedEvent>(&mut app).len(), 1);
    assert!(app.world().resource::<InteractionMachine>().is_idle());

    // A new game with nothing selected stays quiet.
    send(&mut app, NewGameEvent);
    assert!(take::<CellDeselectedEvent>(&mut app).is_empty());
    assert!(take::<PlantingModeEndedEvent>(&mut app).is_empty());

    clock.advance_secs(1.0);
    click(&mut app, Some(LAWN));
    assert_eq!(app.world().resource::<FarmGrid>().selected(), Some(LAWN));
}

#[test]
fn test_load_request_deselects_current_cell() {
    let (mut app, clock) = fresh_app();

    send(&mut app, SaveRequestEvent);
    clock.advance_secs(1.0);
    click(&mut app, Some(LAWN));
    send(&mut app, LoadRequestEvent);

    assert!(take::<LoadCompleteEvent>(&mut app).last().is_some_and(|e| e.success));
    let deselected = take::<CellDeselectedEvent>(&mut app);
    assert_eq!(deselected.len(), 1);
    assert_eq!(deselected[0].cell, LAWN);
    assert_eq!(app.world().resource::<FarmGrid>().selected(), None);
}

#[test]
fn test_save_then_reload_catches_up_offline_growth() {
    let gateway = MemoryGateway::default();
    let (mut app, _clock) = build_test_app(gateway.clone(), at(0.0));

    plant(&mut app, FARM, "carrot");
    send(&mut app, SaveRequestEvent);
    let saves = take::<SaveCompleteEvent>(&mut app);
    assert_eq!(saves.len(), 1);
    assert!(saves[0].success);

    let snapshot = gateway.snapshot().expect("snapshot saved");
    assert_eq!(snapshot.last_save_time, at(0.0));
    assert_eq!(snapshot.inventory["carrot"].quantity, 9);
    let planted: Vec<_> = snapshot.cells.iter().filter(|c| c.crop_id.is_some()).collect();
    assert_eq!(planted.len(), 1);
    assert_eq!((planted[0].x, planted[0].y), (FARM.x, FARM.y));

    // Two minutes later the game starts again.
    let (mut app, _clock) = build_test_app(gateway, at(120.0));

    let loads = take::<LoadCompleteEvent>(&mut app);
    assert_eq!(loads.len(), 1);
    assert!(loads[0].success);
    assert!((loads[0].offline_secs - 120.0).abs() < 1e-6);

    let ready = take::<CropReadyEvent>(&mut app);
    assert_eq!(ready.len(), 1, "matured crop reports ready on first poll");
    assert_eq!(ready[0].cell, FARM);
    assert_eq!(app.world().resource::<InventoryLedger>().quantity("carrot"), 9);

    send(&mut app, HarvestCropEvent { cell: FARM });
    assert_eq!(take::<CropHarvestedEvent>(&mut app).len(), 1);
}

#[test]
fn test_corrupted_snapshot_falls_back_to_new_farm() {
    let mut inventory = BTreeMap::new();
    inventory.insert(
        "carrot".to_string(),
        ItemSnapshot {
            quantity: 1,
            unit_value: 100,
        },
    );
    let bad = FarmSnapshot {
        version: 1,
        cells: vec![CellSnapshot {
            x: LAWN.x,
            y: LAWN.y,
            kind: CellKind::Ground,
            crop_id: Some(CropId::new("carrot")),
            planted_at: Some(at(0.0)),
        }],
        inventory,
        economy: EconomySnapshot {
            level: 4,
            current_exp: 0,
            max_exp: 1728,
            gold: 1,
            gem: 1,
        },
        last_save_time: at(0.0),
    };

    let (mut app, _clock) = build_test_app(MemoryGateway::with_snapshot(bad), at(10.0));

    let loads = take::<LoadCompleteEvent>(&mut app);
    assert_eq!(loads.len(), 1);
    assert!(!loads[0].success);
    assert!(loads[0].error_message.is_some());

    assert_eq!(app.world().resource::<FarmGrid>().planted().count(), 0);
    assert_eq!(app.world().resource::<InventoryLedger>().quantity("carrot"), 10);
    let economy = app.world().resource::<Economy>();
    assert_eq!(economy.level(), 1);
    assert_eq!(economy.gold(), 10_000);
}

#[test]
fn test_failed_load_request_keeps_current_farm() {
    let (mut app, _clock) = fresh_app();
    take::<LoadCompleteEvent>(&mut app);

    plant(&mut app, FARM, "carrot");
    send(&mut app, LoadRequestEvent);

    let loads = take::<LoadCompleteEvent>(&mut app);
    assert_eq!(loads.len(), 1);
    assert!(!loads[0].success);
    assert_eq!(app.world().resource::<FarmGrid>().planted().count(), 1);
    assert_eq!(app.world().resource::<InventoryLedger>().quantity("carrot"), 9);
}
