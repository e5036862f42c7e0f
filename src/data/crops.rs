use bevy::prelude::*;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::shared::*;

pub const BUILTIN_CROPS: &str = include_str!("crops.ron");
pub const CROPS_PATH_ENV: &str = "FARMSTEAD_CROPS_PATH";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read crop catalog from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse crop catalog: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("duplicate crop id '{0}'")]
    Duplicate(String),
    #[error("crop '{id}': {reason}")]
    InvalidEntry { id: String, reason: String },
}

/// Growth and price parameters of one crop.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CropDef {
    pub id: CropId,
    pub name: String,
    pub growth_time_secs: f64,
    /// Number of visual stages, including the mature one.
    pub stage_count: u32,
    pub purchase_price: u64,
    pub sell_price: u64,
}

impl CropDef {
    fn check(&self) -> Result<(), CatalogError> {
        let invalid = |reason: &str| CatalogError::InvalidEntry {
            id: self.id.to_string(),
            reason: reason.to_string(),
        };
        if self.id.as_str().is_empty() {
            return Err(invalid("id is empty"));
        }
        if !self.growth_time_secs.is_finite() || self.growth_time_secs < 1.0 {
            return Err(invalid("growth time must be at least 1 second"));
        }
        if self.stage_count < 1 {
            return Err(invalid("stage count must be at least 1"));
        }
        Ok(())
    }
}

/// Read-only crop lookup. Populated once while `SimState::Loading`.
#[derive(Resource, Debug, Clone, Default)]
pub struct CropCatalog {
    crops: HashMap<CropId, CropDef>,
}

impl CropCatalog {
    pub fn from_defs(defs: impl IntoIterator<Item = CropDef>) -> Result<Self, CatalogError> {
        let mut crops = HashMap::new();
        for def in defs {
            def.check()?;
            if crops.contains_key(&def.id) {
                return Err(CatalogError::Duplicate(def.id.to_string()));
            }
            crops.insert(def.id.clone(), def);
        }
        Ok(Self { crops })
    }

    pub fn from_ron_str(data: &str) -> Result<Self, CatalogError> {
        let defs: Vec<CropDef> = ron::from_str(data)?;
        Self::from_defs(defs)
    }

    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron_str(&contents)
    }

    /// Looks up a crop by raw id. Unknown ids are `NotFound`.
    pub fn get(&self, id: &str) -> Result<&CropDef, FarmError> {
        self.crops
            .get(&CropId::new(id))
            .ok_or_else(|| FarmError::NotFound { id: id.to_string() })
    }

    /// Turns a raw id from input or storage into a checked `CropId`.
    pub fn resolve(&self, id: &str) -> Result<CropId, FarmError> {
        self.get(id).map(|def| def.id.clone())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.crops.contains_key(&CropId::new(id))
    }

    pub fn len(&self) -> usize {
        self.crops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.crops.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CropDef> {
        self.crops.values()
    }
}

/// Loads the catalog named by `FARMSTEAD_CROPS_PATH`, falling back to the built-in list.
pub fn load_crop_catalog_from_env() -> Result<CropCatalog, CatalogError> {
    if let Ok(path) = env::var(CROPS_PATH_ENV) {
        let path = PathBuf::from(path);
        match CropCatalog::from_file(&path) {
            Ok(catalog) => return Ok(catalog),
            Err(err) => warn!(
                "[Data] Failed to load crops from {}: {}. Using built-in catalog.",
                path.display(),
                err
            ),
        }
    }
    CropCatalog::from_ron_str(BUILTIN_CROPS)
}
