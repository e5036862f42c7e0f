use bevy::prelude::*;

use super::gold::format_amount;
use super::Economy;
use crate::data::CropCatalog;
use crate::inventory::{InventoryLedger, LedgerChange};
use crate::shared::*;

// ─────────────────────────────────────────────────────────────────────────────
// Events
// ─────────────────────────────────────────────────────────────────────────────

/// Buy `quantity` seeds of a crop at its purchase price.
#[derive(Event, Debug, Clone)]
pub struct BuyRequestEvent {
    pub crop_id: String,
    pub quantity: u32,
}

/// Sell `quantity` of a crop from the ledger at its sell price.
#[derive(Event, Debug, Clone)]
pub struct SellRequestEvent {
    pub crop_id: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeKind {
    Buy,
    Sell,
}

#[derive(Event, Debug, Clone)]
pub struct ShopTransactionEvent {
    pub kind: TradeKind,
    pub crop_id: CropId,
    pub quantity: u32,
    pub total: u64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Transactions
// ─────────────────────────────────────────────────────────────────────────────

/// Debits gold and credits seeds. Nothing changes unless every check passes.
pub fn buy(
    catalog: &CropCatalog,
    economy: &mut Economy,
    ledger: &mut InventoryLedger,
    crop_id: &str,
    quantity: u32,
) -> Result<(ShopTransactionEvent, LedgerChange), FarmError> {
    let def = catalog.get(crop_id)?;
    if quantity == 0 {
        return Err(FarmError::InvalidAmount(0));
    }
    let total = def
        .purchase_price
        .checked_mul(u64::from(quantity))
        .ok_or(FarmError::InvalidAmount(i64::from(quantity)))?;
    if economy.gold() < total {
        return Err(FarmError::InsufficientFunds {
            currency: Currency::Gold,
            requested: total,
            available: economy.gold(),
        });
    }
    if ledger.quantity(crop_id).checked_add(quantity).is_none() {
        return Err(FarmError::InvalidAmount(i64::from(quantity)));
    }
    let unit_value = u32::try_from(def.sell_price).unwrap_or(u32::MAX);

    economy.remove_gold(total)?;
    let change = ledger.add(crop_id, quantity, unit_value)?;

    let tx = ShopTransactionEvent {
        kind: TradeKind::Buy,
        crop_id: def.id.clone(),
        quantity,
        total,
    };
    Ok((tx, change))
}

/// Debits the ledger and credits gold. Nothing changes unless every check passes.
pub fn sell(
    catalog: &CropCatalog,
    economy: &mut Economy,
    ledger: &mut InventoryLedger,
    crop_id: &str,
    quantity: u32,
) -> Result<(ShopTransactionEvent, LedgerChange), FarmError> {
    let def = catalog.get(crop_id)?;
    if quantity == 0 {
        return Err(FarmError::InvalidAmount(0));
    }
    ledger.check_available(crop_id, quantity)?;
    let total = def
        .sell_price
        .checked_mul(u64::from(quantity))
        .ok_or(FarmError::InvalidAmount(i64::from(quantity)))?;
    if economy.gold().checked_add(total).is_none() {
        return Err(FarmError::Overflow {
            currency: Currency::Gold,
        });
    }

    let change = ledger.remove(crop_id, quantity)?;
    economy.add_gold(total)?;

    let tx = ShopTransactionEvent {
        kind: TradeKind::Sell,
        crop_id: def.id.clone(),
        quantity,
        total,
    };
    Ok((tx, change))
}

// ─────────────────────────────────────────────────────────────────────────────
// Systems
// ─────────────────────────────────────────────────────────────────────────────

pub fn handle_buy(
    mut buy_events: EventReader<BuyRequestEvent>,
    catalog: Res<CropCatalog>,
    mut economy: ResMut<Economy>,
    mut ledger: ResMut<InventoryLedger>,
    mut notifier: Notifier,
    mut transaction_writer: EventWriter<ShopTransactionEvent>,
) {
    for ev in buy_events.read() {
        match buy(&catalog, &mut economy, &mut ledger, &ev.crop_id, ev.quantity) {
            Ok((tx, change)) => {
                info!(
                    "[Economy] Bought {} x {} for {}g. Balance: {}g",
                    tx.quantity,
                    tx.crop_id,
                    tx.total,
                    format_amount(economy.gold())
                );
                notifier.wallet(economy.wallet());
                notifier.ledger(change);
                transaction_writer.send(tx);
            }
            Err(err) => notifier.reject("buy", err),
        }
    }
}

pub fn handle_sell(
    mut sell_events: EventReader<SellRequestEvent>,
    catalog: Res<CropCatalog>,
    mut economy: ResMut<Economy>,
    mut ledger: ResMut<InventoryLedger>,
    mut notifier: Notifier,
    mut transaction_writer: EventWriter<ShopTransactionEvent>,
) {
    for ev in sell_events.read() {
        match sell(&catalog, &mut economy, &mut ledger, &ev.crop_id, ev.quantity) {
            Ok((tx, change)) => {
                info!(
                    "[Economy] Sold {} x {} for {}g. Balance: {}g",
                    tx.quantity,
                    tx.crop_id,
                    tx.total,
                    format_amount(economy.gold())
                );
                notifier.wallet(economy.wallet());
                notifier.ledger(change);
                transaction_writer.send(tx);
            }
            Err(err) => notifier.reject("sell", err),
        }
    }
}
