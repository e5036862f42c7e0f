use bevy::prelude::*;

use super::Economy;
use crate::shared::*;

/// Applies GoldChangeEvents. A debit larger than the balance is rejected,
/// never clamped.
pub fn apply_gold_changes(
    mut gold_events: EventReader<GoldChangeEvent>,
    mut economy: ResMut<Economy>,
    mut notifier: Notifier,
) {
    for ev in gold_events.read() {
        apply(&mut economy, &mut notifier, Currency::Gold, ev.amount, &ev.reason);
    }
}

pub fn apply_gem_changes(
    mut gem_events: EventReader<GemChangeEvent>,
    mut economy: ResMut<Economy>,
    mut notifier: Notifier,
) {
    for ev in gem_events.read() {
        apply(&mut economy, &mut notifier, Currency::Gem, ev.amount, &ev.reason);
    }
}

fn apply(
    economy: &mut Economy,
    notifier: &mut Notifier,
    currency: Currency,
    amount: i64,
    reason: &str,
) {
    match economy.apply_change(currency, amount) {
        Ok(wallet) => {
            info!(
                "[Economy] {} {:+}: {}. Balance: {}g / {} gems",
                currency,
                amount,
                reason,
                format_amount(wallet.gold),
                format_amount(wallet.gems)
            );
            notifier.wallet(wallet);
        }
        Err(err) => notifier.reject("currency change", err),
    }
}

/// Format a balance with thousands separators, e.g. "10,000".
pub fn format_amount(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
