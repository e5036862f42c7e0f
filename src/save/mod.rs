//! Save domain: snapshots of the grid, ledger, and economy.
//!
//! At OnEnter(SimState::Running) the world is restored from the gateway, or
//! freshly seeded if there is nothing usable. Restores are all-or-nothing:
//! the snapshot is fully validated before any resource is replaced.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use crate::config::CoreConfig;
use crate::data::CropCatalog;
use crate::economy::{Economy, LevelCurve};
use crate::farming::{watch_all_planted, FarmGrid, GrowthWatcherPool};
use crate::inventory::{clear_inventory, InventoryLedger};
use crate::interaction::{InteractionMachine, InteractionOutput};
use crate::shared::*;

mod gateway;

pub use gateway::{JsonFileGateway, MemoryGateway, PersistenceGateway, SaveError, SaveGateway};

pub const SNAPSHOT_VERSION: u32 = 1;

// ═══════════════════════════════════════════════════════════════════════
// EVENTS
// ═══════════════════════════════════════════════════════════════════════

#[derive(Event, Debug, Clone)]
pub struct SaveRequestEvent;

#[derive(Event, Debug, Clone)]
pub struct LoadRequestEvent;

/// Resets the grid, ledger, and economy to the configured starting state.
#[derive(Event, Debug, Clone)]
pub struct NewGameEvent;

#[derive(Event, Debug, Clone)]
pub struct SaveCompleteEvent {
    pub success: bool,
    pub error_message: Option<String>,
}

/// Sent after boot and after every load request.
#[derive(Event, Debug, Clone)]
pub struct LoadCompleteEvent {
    /// True when a saved snapshot was restored.
    pub success: bool,
    pub error_message: Option<String>,
    /// Wall-clock seconds between the snapshot's save time and the restore.
    pub offline_secs: f64,
}

// ═══════════════════════════════════════════════════════════════════════
// RESOURCES
// ═══════════════════════════════════════════════════════════════════════

#[derive(Resource, Debug, Clone, Default)]
pub struct AutosaveState {
    pub last_save: Option<Timestamp>,
}

// ═══════════════════════════════════════════════════════════════════════
// PLUGIN
// ═══════════════════════════════════════════════════════════════════════

pub struct SavePlugin;

impl Plugin for SavePlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_resource::<SaveGateway>() {
            app.insert_resource(SaveGateway::new(JsonFileGateway::default_location()));
        }

        app.init_resource::<AutosaveState>()
            .add_event::<SaveRequestEvent>()
            .add_event::<LoadRequestEvent>()
            .add_event::<NewGameEvent>()
            .add_event::<SaveCompleteEvent>()
            .add_event::<LoadCompleteEvent>()
            .add_systems(OnEnter(SimState::Running), boot_world)
            .add_systems(
                Update,
                (
                    handle_new_game,
                    handle_load_request,
                    handle_save_request,
                    autosave_tick,
                )
                    .chain()
                    .in_set(FarmSet::Persistence),
            );
    }
}

// ═══════════════════════════════════════════════════════════════════════
// SNAPSHOT <-> WORLD
// ═══════════════════════════════════════════════════════════════════════

/// Every resource a snapshot touches.
#[derive(SystemParam)]
pub struct FarmWorld<'w, 's> {
    pub commands: Commands<'w, 's>,
    pub clock: Res<'w, SimClock>,
    pub config: Res<'w, CoreConfig>,
    pub catalog: Res<'w, CropCatalog>,
    pub grid: ResMut<'w, FarmGrid>,
    pub ledger: ResMut<'w, InventoryLedger>,
    pub economy: ResMut<'w, Economy>,
    pub pool: ResMut<'w, GrowthWatcherPool>,
    pub autosave: ResMut<'w, AutosaveState>,
    pub machine: ResMut<'w, InteractionMachine>,
    pub notifier: Notifier<'w>,
    pub interaction: InteractionOutput<'w>,
}

impl FarmWorld<'_, '_> {
    pub fn snapshot(&self) -> FarmSnapshot {
        FarmSnapshot {
            version: SNAPSHOT_VERSION,
            cells: self.grid.snapshot(),
            inventory: self.ledger.snapshot(),
            economy: self.economy.snapshot(),
            last_save_time: self.clock.now(),
        }
    }

    fn curve(&self) -> LevelCurve {
        LevelCurve {
            base_exp: self.config.base_exp,
            growth_factor: self.config.exp_growth_factor,
        }
    }

    /// Validates the whole snapshot, then swaps it in. Returns the offline seconds.
    pub fn restore(&mut self, snapshot: &FarmSnapshot) -> Result<f64, FarmError> {
        if snapshot.version != SNAPSHOT_VERSION {
            warn!(
                "[Save] Snapshot version {} differs from current {}; loading anyway",
                snapshot.version, SNAPSHOT_VERSION
            );
        }

        let mut grid = FarmGrid::blank(self.grid.width(), self.grid.height());
        grid.restore(&snapshot.cells, &self.catalog)?;
        let economy = Economy::from_snapshot(&snapshot.economy, self.curve())?;
        let ledger = InventoryLedger::from_snapshot(&snapshot.inventory);

        self.reset_interaction();
        *self.grid = grid;
        *self.economy = economy;
        clear_inventory(&mut self.ledger, &mut self.notifier);
        *self.ledger = ledger;
        self.after_reset();

        let offline_secs = self.clock.now().seconds_since(snapshot.last_save_time).max(0.0);
        info!(
            "[Save] Restored farm: {} crops, {} item stacks, {:.0}s offline",
            self.grid.planted().count(),
            self.ledger.len(),
            offline_secs
        );
        Ok(offline_secs)
    }

    /// Default grid, starting inventory, level 1 with the starting wallet.
    pub fn seed(&mut self) {
        let config: CoreConfig = (*self.config).clone();
        self.reset_interaction();
        *self.grid = FarmGrid::seeded(
            config.grid_width,
            config.grid_height,
            config.default_farm_columns,
            config.default_farm_rows,
        );
        *self.economy = Economy::from_config(&config);
        clear_inventory(&mut self.ledger, &mut self.notifier);
        for item in &config.starting_inventory {
            if item.quantity == 0 {
                continue;
            }
            if let Err(err) = self.ledger.add(&item.item_id, item.quantity, item.unit_value) {
                warn!("[Save] Skipping starting item {}: {}", item.item_id, err);
            }
        }
        self.after_reset();
        info!("[Save] Seeded a new farm");
    }

    /// Drops the selection and any planting mode before the grid is replaced.
    fn reset_interaction(&mut self) {
        let deselected = self.grid.clear_selection();
        self.notifier.deselected(deselected);
        let ended = self.machine.end_planting();
        self.interaction.planting_ended(ended);
    }

    /// Restarts watchers and republishes ledger and wallet state.
    fn after_reset(&mut self) {
        watch_all_planted(&mut self.commands, &mut self.pool, &self.grid);

        let mut items: Vec<_> = self
            .ledger
            .iter()
            .map(|(id, entry)| (id.clone(), *entry))
            .collect();
        items.sort_by(|a, b| a.0.cmp(&b.0));
        for (item_id, entry) in items {
            self.notifier.item_updated.send(ItemUpdatedEvent {
                item_id,
                quantity: entry.quantity,
                unit_value: entry.unit_value,
            });
        }
        self.notifier.level(&self.economy);
        self.notifier.wallet(self.economy.wallet());
        self.autosave.last_save = Some(self.clock.now());
    }
}

// ═══════════════════════════════════════════════════════════════════════
// SYSTEMS
// ═══════════════════════════════════════════════════════════════════════

fn boot_world(
    gateway: Res<SaveGateway>,
    mut world: FarmWorld,
    mut complete_events: EventWriter<LoadCompleteEvent>,
) {
    let loaded = gateway
        .load()
        .and_then(|snapshot| match snapshot {
            Some(snapshot) => world.restore(&snapshot).map(Some).map_err(SaveError::from),
            None => Ok(None),
        });

    let event = match loaded {
        Ok(Some(offline_secs)) => LoadCompleteEvent {
            success: true,
            error_message: None,
            offline_secs,
        },
        Ok(None) => {
            world.seed();
            LoadCompleteEvent {
                success: false,
                error_message: None,
                offline_secs: 0.0,
            }
        }
        Err(err) => {
            warn!("[Save] Saved farm unusable ({}); starting a new one", err);
            world.seed();
            LoadCompleteEvent {
                success: false,
                error_message: Some(err.to_string()),
                offline_secs: 0.0,
            }
        }
    };
    complete_events.send(event);
}

fn handle_save_request(
    mut save_events: EventReader<SaveRequestEvent>,
    gateway: Res<SaveGateway>,
    mut world: FarmWorld,
    mut complete_events: EventWriter<SaveCompleteEvent>,
) {
    for _ in save_events.read() {
        complete_events.send(save_now(&gateway, &mut world));
    }
}

fn save_now(gateway: &SaveGateway, world: &mut FarmWorld) -> SaveCompleteEvent {
    let snapshot = world.snapshot();
    match gateway.save(&snapshot) {
        Ok(()) => {
            world.autosave.last_save = Some(snapshot.last_save_time);
            info!("[Save] Saved farm at {}", snapshot.last_save_time);
            SaveCompleteEvent {
                success: true,
                error_message: None,
            }
        }
        Err(err) => {
            error!("[Save] Save failed: {}", err);
            SaveCompleteEvent {
                success: false,
                error_message: Some(err.to_string()),
            }
        }
    }
}

fn handle_load_request(
    mut load_events: EventReader<LoadRequestEvent>,
    gateway: Res<SaveGateway>,
    mut world: FarmWorld,
    mut complete_events: EventWriter<LoadCompleteEvent>,
) {
    for _ in load_events.read() {
        let result = match gateway.load() {
            Ok(Some(snapshot)) => world.restore(&snapshot).map_err(SaveError::from),
            Ok(None) => Err(SaveError::Unavailable("no saved farm".into())),
            Err(err) => Err(err),
        };
        let event = match result {
            Ok(offline_secs) => LoadCompleteEvent {
                success: true,
                error_message: None,
                offline_secs,
            },
            Err(err) => {
                warn!("[Save] Load failed, keeping current farm: {}", err);
                LoadCompleteEvent {
                    success: false,
                    error_message: Some(err.to_string()),
                    offline_secs: 0.0,
                }
            }
        };
        complete_events.send(event);
    }
}

fn handle_new_game(mut new_game_events: EventReader<NewGameEvent>, mut world: FarmWorld) {
    for _ in new_game_events.read() {
        world.seed();
    }
}

fn autosave_tick(
    gateway: Res<SaveGateway>,
    mut world: FarmWorld,
    mut complete_events: EventWriter<SaveCompleteEvent>,
) {
    let Some(interval) = world.config.autosave_interval_secs else {
        return;
    };
    let now = world.clock.now();
    let due = world
        .autosave
        .last_save
        .map_or(true, |last| now.seconds_since(last) >= interval);
    if due {
        debug!("[Save] Autosave");
        complete_events.send(save_now(&gateway, &mut world));
    }
}
