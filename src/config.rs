//! Tunable constants for the farm core, loaded from RON.

use bevy::prelude::*;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const BUILTIN_CORE_CONFIG: &str = include_str!("data/core_config.ron");
pub const CONFIG_PATH_ENV: &str = "FARMSTEAD_CONFIG_PATH";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read core config from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse core config: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("invalid core config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StartingItem {
    pub item_id: String,
    pub quantity: u32,
    pub unit_value: u32,
}

#[derive(Resource, Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub grid_width: u32,
    pub grid_height: u32,
    /// Size of the farmland rectangle seeded in the middle of a new grid.
    pub default_farm_columns: u32,
    pub default_farm_rows: u32,
    pub click_debounce_secs: f64,
    pub watcher_poll_secs: f64,
    pub base_exp: u64,
    pub exp_growth_factor: f64,
    pub harvest_exp: u64,
    pub starting_gold: u64,
    pub starting_gems: u64,
    pub starting_inventory: Vec<StartingItem>,
    pub autosave_interval_secs: Option<f64>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            grid_width: 10,
            grid_height: 10,
            default_farm_columns: 2,
            default_farm_rows: 3,
            click_debounce_secs: 0.5,
            watcher_poll_secs: 1.0,
            base_exp: 1000,
            exp_growth_factor: 1.2,
            harvest_exp: 10,
            starting_gold: 10_000,
            starting_gems: 100,
            starting_inventory: vec![
                StartingItem {
                    item_id: "carrot".into(),
                    quantity: 10,
                    unit_value: 100,
                },
                StartingItem {
                    item_id: "corn".into(),
                    quantity: 10,
                    unit_value: 150,
                },
            ],
            autosave_interval_secs: None,
        }
    }
}

impl CoreConfig {
    pub fn from_ron_str(data: &str) -> Result<Self, ConfigError> {
        let config: CoreConfig = ron::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron_str(&contents)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_width == 0 || self.grid_height == 0 {
            return Err(ConfigError::Invalid(format!(
                "grid must be at least 1x1, got {}x{}",
                self.grid_width, self.grid_height
            )));
        }
        if self.default_farm_columns > self.grid_width || self.default_farm_rows > self.grid_height
        {
            return Err(ConfigError::Invalid(
                "default farmland does not fit in the grid".into(),
            ));
        }
        if self.base_exp == 0
            || !self.exp_growth_factor.is_finite()
            || self.exp_growth_factor < 1.0
        {
            return Err(ConfigError::Invalid(
                "base_exp must be positive and exp_growth_factor a finite number >= 1.0".into(),
            ));
        }
        check_secs("watcher_poll_secs", self.watcher_poll_secs, false, MAX_POLL_SECS)?;
        check_secs("click_debounce_secs", self.click_debounce_secs, true, MAX_DEBOUNCE_SECS)?;
        if let Some(secs) = self.autosave_interval_secs {
            check_secs("autosave_interval_secs", secs, false, MAX_AUTOSAVE_SECS)?;
        }
        Ok(())
    }
}

const MAX_POLL_SECS: f64 = 3_600.0;
const MAX_DEBOUNCE_SECS: f64 = 60.0;
const MAX_AUTOSAVE_SECS: f64 = 7.0 * 86_400.0;

/// Rejects NaN, infinities, and values outside `(0, max]` (or `[0, max]`).
fn check_secs(field: &str, secs: f64, allow_zero: bool, max: f64) -> Result<(), ConfigError> {
    let above_min = if allow_zero { secs >= 0.0 } else { secs > 0.0 };
    if secs.is_finite() && above_min && secs <= max {
        return Ok(());
    }
    Err(ConfigError::Invalid(format!(
        "{field} must be a finite number of seconds in {}{max}], got {secs}",
        if allow_zero { "[0, " } else { "(0, " }
    )))
}

/// Reads the config named by `FARMSTEAD_CONFIG_PATH`, falling back to the built-in file.
pub fn load_core_config_from_env() -> CoreConfig {
    if let Ok(path) = env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        match CoreConfig::from_file(&path) {
            Ok(config) => {
                info!("[Config] Loaded core config from {}", path.display());
                return config;
            }
            Err(err) => {
                warn!(
                    "[Config] Failed to load {}: {}. Using built-in config.",
                    path.display(),
                    err
                );
            }
        }
    }

    match CoreConfig::from_ron_str(BUILTIN_CORE_CONFIG) {
        Ok(config) => config,
        Err(err) => {
            error!("[Config] Built-in core config is invalid: {}", err);
            CoreConfig::default()
        }
    }
}
