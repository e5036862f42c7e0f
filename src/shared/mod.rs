//! Shared types, resources, events, and states for the farm core.
//!
//! This is the type contract. Every domain plugin imports from here.
//! No domain reaches into another domain's internals for data types.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub use crate::clock::{SimClock, Timestamp};
pub use crate::error::FarmError;

// ═══════════════════════════════════════════════════════════════════════
// SIM STATE: lifecycle state machine
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, States, Default)]
pub enum SimState {
    #[default]
    Loading,
    Running,
}

/// Fixed per-frame ordering of the core's systems.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum FarmSet {
    /// Translates pointer/popup input into grid and planting actions.
    Interaction,
    /// Applies plant/harvest/ledger/economy requests.
    Commands,
    /// Polls growth watchers.
    Growth,
    /// Save/load/autosave.
    Persistence,
}

/// Chained order inside `FarmSet::Commands`, so requests sent in the same
/// frame always resolve the same way.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum CommandSet {
    /// Direct ledger adds and removals.
    Inventory,
    /// Currency, experience, and shop trades.
    Economy,
    /// Clear, harvest, kind changes, then planting.
    Grid,
    /// Harvest rewards.
    Rewards,
}

// ═══════════════════════════════════════════════════════════════════════
// GRID
// ═══════════════════════════════════════════════════════════════════════

/// Integer grid coordinate. Range checking happens in `FarmGrid`, never here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Terrain category of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    Water,
    Ground,
    Farm,
}

/// Occupancy state of a cell, always derived from the planted crop and the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellState {
    Empty,
    Growing,
    ReadyToHarvest,
}

// ═══════════════════════════════════════════════════════════════════════
// IDS
// ═══════════════════════════════════════════════════════════════════════

/// Ledger key. Seeds and harvested crops share their crop's id.
pub type ItemId = String;

/// Crop identifier that has been checked against the `CropCatalog`.
///
/// Construct through `CropCatalog::resolve` in game code; `CropId::new` exists for
/// tests and for data that is validated afterwards (snapshots, config files).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CropId(String);

impl CropId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CropId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CropId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ═══════════════════════════════════════════════════════════════════════
// ECONOMY
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    Gold,
    Gem,
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Currency::Gold => f.write_str("gold"),
            Currency::Gem => f.write_str("gem"),
        }
    }
}

/// Both denominations, always reported together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Wallet {
    pub gold: u64,
    pub gems: u64,
}

// ═══════════════════════════════════════════════════════════════════════
// SNAPSHOT: plain data exchanged with the persistence gateway
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellSnapshot {
    pub x: i32,
    pub y: i32,
    pub kind: CellKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop_id: Option<CropId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planted_at: Option<Timestamp>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub quantity: u32,
    pub unit_value: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EconomySnapshot {
    pub level: u32,
    pub current_exp: u64,
    pub max_exp: u64,
    pub gold: u64,
    pub gem: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmSnapshot {
    pub version: u32,
    pub cells: Vec<CellSnapshot>,
    pub inventory: BTreeMap<ItemId, ItemSnapshot>,
    pub economy: EconomySnapshot,
    pub last_save_time: Timestamp,
}

// ═══════════════════════════════════════════════════════════════════════
// REQUEST EVENTS: sent by the host shell
// ═══════════════════════════════════════════════════════════════════════

/// A primary click. `None` means the pointer hit nothing on the grid.
#[derive(Event, Debug, Clone)]
pub struct CellClickedEvent {
    pub cell: Option<GridPos>,
}

#[derive(Event, Debug, Clone)]
pub struct PointerMovedEvent {
    pub cell: Option<GridPos>,
}

/// The player picked a seed from the inventory popup.
#[derive(Event, Debug, Clone)]
pub struct StartPlantingEvent {
    pub crop_id: String,
}

#[derive(Event, Debug, Clone)]
pub struct CancelPlantingEvent;

#[derive(Event, Debug, Clone)]
pub struct PopupOpenedEvent;

#[derive(Event, Debug, Clone)]
pub struct PopupClosedEvent;

#[derive(Event, Debug, Clone)]
pub struct PlantCropEvent {
    pub cell: GridPos,
    pub crop_id: String,
}

#[derive(Event, Debug, Clone)]
pub struct HarvestCropEvent {
    pub cell: GridPos,
}

/// Out-of-band removal of a crop regardless of its phase.
#[derive(Event, Debug, Clone)]
pub struct ClearCropEvent {
    pub cell: GridPos,
}

#[derive(Event, Debug, Clone)]
pub struct SwitchCellKindEvent {
    pub cell: GridPos,
    pub kind: CellKind,
}

#[derive(Event, Debug, Clone)]
pub struct AddItemEvent {
    pub item_id: ItemId,
    pub amount: u32,
    pub unit_value: u32,
}

#[derive(Event, Debug, Clone)]
pub struct RemoveItemEvent {
    pub item_id: ItemId,
    pub amount: u32,
}

#[derive(Event, Debug, Clone)]
pub struct GoldChangeEvent {
    pub amount: i64, // positive = gain, negative = spend
    pub reason: String,
}

#[derive(Event, Debug, Clone)]
pub struct GemChangeEvent {
    pub amount: i64, // positive = gain, negative = spend
    pub reason: String,
}

#[derive(Event, Debug, Clone)]
pub struct ExperienceGainEvent {
    pub amount: u64,
    pub reason: String,
}

// ═══════════════════════════════════════════════════════════════════════
// NOTIFICATION EVENTS: consumed by the host's renderers and UI
// ═══════════════════════════════════════════════════════════════════════

#[derive(Event, Debug, Clone)]
pub struct CellSelectedEvent {
    pub cell: GridPos,
}

/// Always sent before the `CellSelectedEvent` of the replacing selection.
#[derive(Event, Debug, Clone)]
pub struct CellDeselectedEvent {
    pub cell: GridPos,
}

#[derive(Event, Debug, Clone)]
pub struct CellKindChangedEvent {
    pub cell: GridPos,
    pub from: CellKind,
    pub to: CellKind,
}

#[derive(Event, Debug, Clone)]
pub struct CropPlantedEvent {
    pub cell: GridPos,
    pub crop_id: CropId,
    pub planted_at: Timestamp,
}

/// Visual stage changed; renderers swap the crop mesh or sprite.
#[derive(Event, Debug, Clone)]
pub struct CropStageChangedEvent {
    pub cell: GridPos,
    pub crop_id: CropId,
    pub stage: u32,
    pub fraction: f64,
}

#[derive(Event, Debug, Clone)]
pub struct CropReadyEvent {
    pub cell: GridPos,
    pub crop_id: CropId,
}

#[derive(Event, Debug, Clone)]
pub struct CropHarvestedEvent {
    pub cell: GridPos,
    pub crop_id: CropId,
}

#[derive(Event, Debug, Clone)]
pub struct CropClearedEvent {
    pub cell: GridPos,
    pub crop_id: CropId,
}

#[derive(Event, Debug, Clone)]
pub struct ItemUpdatedEvent {
    pub item_id: ItemId,
    pub quantity: u32,
    pub unit_value: u32,
}

#[derive(Event, Debug, Clone)]
pub struct ItemRemovedEvent {
    pub item_id: ItemId,
}

#[derive(Event, Debug, Clone)]
pub struct InventoryClearedEvent;

#[derive(Event, Debug, Clone)]
pub struct LevelChangedEvent {
    pub level: u32,
    pub current_exp: u64,
    pub max_exp: u64,
}

#[derive(Event, Debug, Clone)]
pub struct CurrencyChangedEvent {
    pub gold: u64,
    pub gems: u64,
}

#[derive(Event, Debug, Clone)]
pub struct PlantingModeStartedEvent {
    pub crop_id: CropId,
}

#[derive(Event, Debug, Clone)]
pub struct PlantingModeEndedEvent;

/// Hover feedback while planting: `valid` is hover-valid, otherwise hover-invalid.
#[derive(Event, Debug, Clone)]
pub struct CellHoveredEvent {
    pub cell: GridPos,
    pub valid: bool,
}

#[derive(Event, Debug, Clone)]
pub struct HoverClearedEvent;

#[derive(Event, Debug, Clone)]
pub struct PlantingFailedEvent {
    pub cell: Option<GridPos>,
    pub crop_id: String,
    pub reason: FarmError,
}

/// Idle click landed on empty farmland; the UI shows the seed picker.
#[derive(Event, Debug, Clone)]
pub struct PlantingPopupRequestedEvent {
    pub cell: GridPos,
}

/// Idle click landed on a growing crop; the UI shows its progress.
#[derive(Event, Debug, Clone)]
pub struct CropInfoRequestedEvent {
    pub cell: GridPos,
    pub crop_id: CropId,
    pub planted_at: Timestamp,
    pub fraction: f64,
    pub remaining_secs: f64,
}

/// A host request failed with an expected, recoverable error.
#[derive(Event, Debug, Clone)]
pub struct RequestRejectedEvent {
    pub request: &'static str,
    pub reason: FarmError,
}

// ═══════════════════════════════════════════════════════════════════════
// NOTIFIER: one system param bundling the notification writers
// ═══════════════════════════════════════════════════════════════════════

/// `CropHarvestedEvent` is left out: the harvest reward system reads it while
/// holding a `Notifier`, and a system may not read and write one event type.
#[derive(SystemParam)]
pub struct Notifier<'w> {
    pub cell_selected: EventWriter<'w, CellSelectedEvent>,
    pub cell_deselected: EventWriter<'w, CellDeselectedEvent>,
    pub kind_changed: EventWriter<'w, CellKindChangedEvent>,
    pub crop_planted: EventWriter<'w, CropPlantedEvent>,
    pub crop_cleared: EventWriter<'w, CropClearedEvent>,
    pub item_updated: EventWriter<'w, ItemUpdatedEvent>,
    pub item_removed: EventWriter<'w, ItemRemovedEvent>,
    pub inventory_cleared: EventWriter<'w, InventoryClearedEvent>,
    pub level_changed: EventWriter<'w, LevelChangedEvent>,
    pub currency_changed: EventWriter<'w, CurrencyChangedEvent>,
    pub rejected: EventWriter<'w, RequestRejectedEvent>,
}

impl Notifier<'_> {
    pub fn deselected(&mut self, cell: Option<GridPos>) {
        if let Some(cell) = cell {
            self.cell_deselected.send(CellDeselectedEvent { cell });
        }
    }

    pub fn wallet(&mut self, wallet: Wallet) {
        self.currency_changed.send(CurrencyChangedEvent {
            gold: wallet.gold,
            gems: wallet.gems,
        });
    }

    pub fn reject(&mut self, request: &'static str, reason: FarmError) {
        warn!("[Farm] {} rejected: {}", request, reason);
        self.rejected.send(RequestRejectedEvent { request, reason });
    }
}
