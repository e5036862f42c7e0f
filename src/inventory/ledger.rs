use bevy::prelude::*;
use std::collections::{BTreeMap, HashMap};

use crate::shared::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerEntry {
    pub quantity: u32,
    pub unit_value: u32,
}

/// What a successful ledger mutation did, for the caller to announce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerChange {
    Updated {
        item_id: ItemId,
        quantity: u32,
        unit_value: u32,
    },
    Removed {
        item_id: ItemId,
    },
}

/// Item id -> quantity and unit value. An absent item has quantity zero;
/// entries are deleted rather than kept at zero.
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct InventoryLedger {
    entries: HashMap<ItemId, LedgerEntry>,
}

impl InventoryLedger {
    /// Adds `amount` of an item. The unit value is fixed when the entry is
    /// created; later adds keep it.
    pub fn add(
        &mut self,
        item_id: &str,
        amount: u32,
        unit_value: u32,
    ) -> Result<LedgerChange, FarmError> {
        if amount == 0 {
            return Err(FarmError::InvalidAmount(0));
        }
        let entry = self
            .entries
            .entry(item_id.to_string())
            .or_insert(LedgerEntry {
                quantity: 0,
                unit_value,
            });
        let Some(quantity) = entry.quantity.checked_add(amount) else {
            if entry.quantity == 0 {
                self.entries.remove(item_id);
            }
            return Err(FarmError::InvalidAmount(i64::from(amount)));
        };
        entry.quantity = quantity;
        Ok(LedgerChange::Updated {
            item_id: item_id.to_string(),
            quantity: entry.quantity,
            unit_value: entry.unit_value,
        })
    }

    pub fn remove(&mut self, item_id: &str, amount: u32) -> Result<LedgerChange, FarmError> {
        if amount == 0 {
            return Err(FarmError::InvalidAmount(0));
        }
        self.check_available(item_id, amount)?;
        let Some(entry) = self.entries.get_mut(item_id) else {
            return Err(FarmError::InsufficientQuantity {
                item_id: item_id.to_string(),
                requested: amount,
                available: 0,
            });
        };
        entry.quantity -= amount;
        if entry.quantity == 0 {
            self.entries.remove(item_id);
            return Ok(LedgerChange::Removed {
                item_id: item_id.to_string(),
            });
        }
        Ok(LedgerChange::Updated {
            item_id: item_id.to_string(),
            quantity: entry.quantity,
            unit_value: entry.unit_value,
        })
    }

    /// Fails with `InsufficientQuantity` unless at least `amount` is held.
    pub fn check_available(&self, item_id: &str, amount: u32) -> Result<(), FarmError> {
        if self.quantity(item_id) < amount {
            return Err(self.shortfall(item_id, amount));
        }
        Ok(())
    }

    fn shortfall(&self, item_id: &str, requested: u32) -> FarmError {
        FarmError::InsufficientQuantity {
            item_id: item_id.to_string(),
            requested,
            available: self.quantity(item_id),
        }
    }

    pub fn quantity(&self, item_id: &str) -> u32 {
        self.entries.get(item_id).map_or(0, |e| e.quantity)
    }

    pub fn unit_value(&self, item_id: &str) -> u32 {
        self.entries.get(item_id).map_or(0, |e| e.unit_value)
    }

    pub fn get(&self, item_id: &str) -> Option<LedgerEntry> {
        self.entries.get(item_id).copied()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ItemId, &LedgerEntry)> {
        self.entries.iter()
    }

    pub fn snapshot(&self) -> BTreeMap<ItemId, ItemSnapshot> {
        self.entries
            .iter()
            .map(|(id, e)| {
                (
                    id.clone(),
                    ItemSnapshot {
                        quantity: e.quantity,
                        unit_value: e.unit_value,
                    },
                )
            })
            .collect()
    }

    /// Builds a ledger from saved entries. Zero-quantity records are skipped.
    pub fn from_snapshot(items: &BTreeMap<ItemId, ItemSnapshot>) -> Self {
        let entries = items
            .iter()
            .filter(|(_, item)| item.quantity > 0)
            .map(|(id, item)| {
                (
                    id.clone(),
                    LedgerEntry {
                        quantity: item.quantity,
                        unit_value: item.unit_value,
                    },
                )
            })
            .collect();
        Self { entries }
    }
}
