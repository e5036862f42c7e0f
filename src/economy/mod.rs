//! Economy domain: wallet, level progression, shop, and harvest rewards.
//!
//! Every balance changes through a checked method on `Economy`. A rejected
//! change leaves the wallet and level exactly as they were.

use bevy::prelude::*;

use crate::config::CoreConfig;
use crate::shared::*;

pub mod gold;
pub mod level;
pub mod rewards;
pub mod shop;

pub use level::{LevelCurve, LevelProgress};
pub use shop::{BuyRequestEvent, SellRequestEvent, ShopTransactionEvent};

// ─────────────────────────────────────────────────────────────────────────────
// Plugin
// ─────────────────────────────────────────────────────────────────────────────

pub struct EconomyPlugin;

impl Plugin for EconomyPlugin {
    fn build(&self, app: &mut App) {
        let economy = app
            .world()
            .get_resource::<CoreConfig>()
            .map(Economy::from_config)
            .unwrap_or_default();

        app.insert_resource(economy)
            .add_event::<BuyRequestEvent>()
            .add_event::<SellRequestEvent>()
            .add_event::<ShopTransactionEvent>();

        app.add_systems(
            Update,
            (
                gold::apply_gold_changes,
                gold::apply_gem_changes,
                rewards::apply_experience,
                shop::handle_buy,
                shop::handle_sell,
            )
                .chain()
                .in_set(CommandSet::Economy),
        )
        // Harvests land in CommandSet::Grid; credit them in the same frame.
        .add_systems(Update, rewards::credit_harvest.in_set(CommandSet::Rewards));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Economy resource
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct Economy {
    curve: LevelCurve,
    level: u32,
    current_exp: u64,
    max_exp: u64,
    wallet: Wallet,
}

impl Default for Economy {
    fn default() -> Self {
        Self::new(LevelCurve::default(), Wallet::default())
    }
}

impl Economy {
    /// Level 1, no experience.
    pub fn new(curve: LevelCurve, wallet: Wallet) -> Self {
        Self {
            curve,
            level: 1,
            current_exp: 0,
            max_exp: curve.max_exp_for(1),
            wallet,
        }
    }

    pub fn from_config(config: &CoreConfig) -> Self {
        Self::new(
            LevelCurve {
                base_exp: config.base_exp,
                growth_factor: config.exp_growth_factor,
            },
            Wallet {
                gold: config.starting_gold,
                gems: config.starting_gems,
            },
        )
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn current_exp(&self) -> u64 {
        self.current_exp
    }

    pub fn max_exp(&self) -> u64 {
        self.max_exp
    }

    pub fn curve(&self) -> LevelCurve {
        self.curve
    }

    pub fn wallet(&self) -> Wallet {
        self.wallet
    }

    pub fn gold(&self) -> u64 {
        self.wallet.gold
    }

    pub fn gems(&self) -> u64 {
        self.wallet.gems
    }

    pub fn balance(&self, currency: Currency) -> u64 {
        match currency {
            Currency::Gold => self.wallet.gold,
            Currency::Gem => self.wallet.gems,
        }
    }

    fn balance_mut(&mut self, currency: Currency) -> &mut u64 {
        match currency {
            Currency::Gold => &mut self.wallet.gold,
            Currency::Gem => &mut self.wallet.gems,
        }
    }

    // ── Experience ───────────────────────────────────────────────────────

    /// Adds experience, rolling over as many levels as it covers.
    pub fn add_experience(&mut self, amount: u64) -> Result<LevelProgress, FarmError> {
        if amount == 0 {
            return Err(FarmError::InvalidAmount(0));
        }
        let mut level = self.level;
        let mut max_exp = self.max_exp;
        let mut exp = self.current_exp.saturating_add(amount);
        let mut gained = 0;
        while exp >= max_exp && level < u32::MAX {
            exp -= max_exp;
            level += 1;
            gained += 1;
            max_exp = self.curve.max_exp_for(level);
        }
        self.level = level;
        self.current_exp = exp;
        self.max_exp = max_exp;
        Ok(LevelProgress {
            level,
            current_exp: exp,
            max_exp,
            levels_gained: gained,
        })
    }

    // ── Currency ─────────────────────────────────────────────────────────

    pub fn credit(&mut self, currency: Currency, amount: u64) -> Result<Wallet, FarmError> {
        let balance = self.balance_mut(currency);
        *balance = balance
            .checked_add(amount)
            .ok_or(FarmError::Overflow { currency })?;
        Ok(self.wallet)
    }

    pub fn debit(&mut self, currency: Currency, amount: u64) -> Result<Wallet, FarmError> {
        let balance = self.balance_mut(currency);
        if *balance < amount {
            return Err(FarmError::InsufficientFunds {
                currency,
                requested: amount,
                available: *balance,
            });
        }
        *balance -= amount;
        Ok(self.wallet)
    }

    pub fn add_gold(&mut self, amount: u64) -> Result<Wallet, FarmError> {
        self.credit(Currency::Gold, amount)
    }

    pub fn remove_gold(&mut self, amount: u64) -> Result<Wallet, FarmError> {
        self.debit(Currency::Gold, amount)
    }

    pub fn add_gem(&mut self, amount: u64) -> Result<Wallet, FarmError> {
        self.credit(Currency::Gem, amount)
    }

    pub fn remove_gem(&mut self, amount: u64) -> Result<Wallet, FarmError> {
        self.debit(Currency::Gem, amount)
    }

    /// Applies a signed change: positive credits, negative debits, zero is rejected.
    pub fn apply_change(&mut self, currency: Currency, amount: i64) -> Result<Wallet, FarmError> {
        match amount {
            0 => Err(FarmError::InvalidAmount(0)),
            a if a > 0 => self.credit(currency, a.unsigned_abs()),
            a => self.debit(currency, a.unsigned_abs()),
        }
    }

    // ── Snapshot ─────────────────────────────────────────────────────────

    pub fn snapshot(&self) -> EconomySnapshot {
        EconomySnapshot {
            level: self.level,
            current_exp: self.current_exp,
            max_exp: self.max_exp,
            gold: self.wallet.gold,
            gem: self.wallet.gems,
        }
    }

    pub fn from_snapshot(snapshot: &EconomySnapshot, curve: LevelCurve) -> Result<Self, FarmError> {
        if snapshot.level == 0 {
            return Err(FarmError::InvalidSnapshot("level must be at least 1".into()));
        }
        if snapshot.max_exp == 0 || snapshot.current_exp >= snapshot.max_exp {
            return Err(FarmError::InvalidSnapshot(format!(
                "experience {}/{} out of range",
                snapshot.current_exp, snapshot.max_exp
            )));
        }
        Ok(Self {
            curve,
            level: snapshot.level,
            current_exp: snapshot.current_exp,
            max_exp: snapshot.max_exp,
            wallet: Wallet {
                gold: snapshot.gold,
                gems: snapshot.gem,
            },
        })
    }
}

impl Notifier<'_> {
    pub fn level(&mut self, economy: &Economy) {
        self.level_changed.send(LevelChangedEvent {
            level: economy.level(),
            current_exp: economy.current_exp(),
            max_exp: economy.max_exp(),
        });
    }
}
