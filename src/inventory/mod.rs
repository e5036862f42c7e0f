//! Inventory domain: the item ledger seeds and produce move through.

use bevy::prelude::*;

use crate::shared::*;

mod ledger;

pub use ledger::{InventoryLedger, LedgerChange, LedgerEntry};

pub struct InventoryPlugin;

impl Plugin for InventoryPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<InventoryLedger>().add_systems(
            Update,
            (handle_add_item, handle_remove_item)
                .chain()
                .in_set(CommandSet::Inventory),
        );
    }
}

impl Notifier<'_> {
    pub fn ledger(&mut self, change: LedgerChange) {
        match change {
            LedgerChange::Updated {
                item_id,
                quantity,
                unit_value,
            } => {
                self.item_updated.send(ItemUpdatedEvent {
                    item_id,
                    quantity,
                    unit_value,
                });
            }
            LedgerChange::Removed { item_id } => {
                self.item_removed.send(ItemRemovedEvent { item_id });
            }
        }
    }
}

/// Empties the ledger and tells listeners.
pub fn clear_inventory(ledger: &mut InventoryLedger, notifier: &mut Notifier) {
    ledger.clear();
    notifier.inventory_cleared.send(InventoryClearedEvent);
}

pub fn handle_add_item(
    mut events: EventReader<AddItemEvent>,
    mut ledger: ResMut<InventoryLedger>,
    mut notifier: Notifier,
) {
    for ev in events.read() {
        match ledger.add(&ev.item_id, ev.amount, ev.unit_value) {
            Ok(change) => {
                debug!("[Inventory] +{} {}", ev.amount, ev.item_id);
                notifier.ledger(change);
            }
            Err(err) => notifier.reject("add item", err),
        }
    }
}

pub fn handle_remove_item(
    mut events: EventReader<RemoveItemEvent>,
    mut ledger: ResMut<InventoryLedger>,
    mut notifier: Notifier,
) {
    for ev in events.read() {
        match ledger.remove(&ev.item_id, ev.amount) {
            Ok(change) => {
                debug!("[Inventory] -{} {}", ev.amount, ev.item_id);
                notifier.ledger(change);
            }
            Err(err) => notifier.reject("remove item", err),
        }
    }
}
