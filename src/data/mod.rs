//! Data layer: fills the crop catalog at startup.
//!
//! Runs in OnEnter(SimState::Loading), loads the catalog unless the host
//! already inserted one, checks the starting inventory against it, then moves
//! the simulation into SimState::Running.

mod crops;

pub use crops::{
    load_crop_catalog_from_env, CatalogError, CropCatalog, CropDef, BUILTIN_CROPS,
    CROPS_PATH_ENV,
};

use bevy::prelude::*;

use crate::config::CoreConfig;
use crate::shared::*;

pub struct DataPlugin;

impl Plugin for DataPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CropCatalog>()
            .add_systems(OnEnter(SimState::Loading), load_catalog);
    }
}

fn load_catalog(
    mut catalog: ResMut<CropCatalog>,
    mut config: ResMut<CoreConfig>,
    mut next_state: ResMut<NextState<SimState>>,
) {
    if catalog.is_empty() {
        match load_crop_catalog_from_env() {
            Ok(loaded) => *catalog = loaded,
            Err(err) => error!("[Data] Crop catalog failed to load: {}", err),
        }
    }
    info!("[Data] Crops loaded: {}", catalog.len());

    config.starting_inventory.retain(|item| {
        let known = catalog.contains(&item.item_id);
        if !known {
            error!(
                "[Data] Starting item '{}' is not in the crop catalog; dropping it",
                item.item_id
            );
        }
        known
    });

    next_state.set(SimState::Running);
}
