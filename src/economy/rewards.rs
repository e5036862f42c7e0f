//! Experience gain and the gold/exp credited for each harvest.

use bevy::prelude::*;

use super::Economy;
use crate::config::CoreConfig;
use crate::data::CropCatalog;
use crate::shared::*;

pub fn apply_experience(
    mut exp_events: EventReader<ExperienceGainEvent>,
    mut economy: ResMut<Economy>,
    mut notifier: Notifier,
) {
    for ev in exp_events.read() {
        gain_experience(&mut economy, &mut notifier, ev.amount, &ev.reason);
    }
}

fn gain_experience(economy: &mut Economy, notifier: &mut Notifier, amount: u64, reason: &str) {
    match economy.add_experience(amount) {
        Ok(progress) => {
            if progress.levels_gained > 0 {
                info!(
                    "[Economy] Level up! Now level {} ({}/{} exp, {})",
                    progress.level, progress.current_exp, progress.max_exp, reason
                );
            }
            notifier.level(economy);
        }
        Err(err) => notifier.reject("experience gain", err),
    }
}

/// Credits the sell price in gold plus a fixed amount of experience for every
/// harvested crop. Runs after the harvest itself, as a separate step.
pub fn credit_harvest(
    mut harvested: EventReader<CropHarvestedEvent>,
    catalog: Res<CropCatalog>,
    config: Res<CoreConfig>,
    mut economy: ResMut<Economy>,
    mut notifier: Notifier,
) {
    for ev in harvested.read() {
        let def = match catalog.get(ev.crop_id.as_str()) {
            Ok(def) => def,
            Err(err) => {
                warn!("[Economy] No reward for harvest at {}: {}", ev.cell, err);
                continue;
            }
        };

        if def.sell_price > 0 {
            match economy.add_gold(def.sell_price) {
                Ok(wallet) => {
                    info!(
                        "[Economy] Harvest {} +{}g. Balance: {}g",
                        def.id, def.sell_price, wallet.gold
                    );
                    notifier.wallet(wallet);
                }
                Err(err) => notifier.reject("harvest credit", err),
            }
        }

        if config.harvest_exp > 0 {
            gain_experience(&mut economy, &mut notifier, config.harvest_exp, "harvest");
        }
    }
}
