use bevy::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::shared::*;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("snapshot JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] FarmError),
    #[error("save storage unavailable: {0}")]
    Unavailable(String),
}

/// Where snapshots live. The core only produces and consumes `FarmSnapshot`.
pub trait PersistenceGateway: Send + Sync + 'static {
    /// `Ok(None)` means nothing has been saved yet.
    fn load_snapshot(&self) -> Result<Option<FarmSnapshot>, SaveError>;
    fn save_snapshot(&self, snapshot: &FarmSnapshot) -> Result<(), SaveError>;
}

#[derive(Resource)]
pub struct SaveGateway(Box<dyn PersistenceGateway>);

impl SaveGateway {
    pub fn new(gateway: impl PersistenceGateway) -> Self {
        Self(Box::new(gateway))
    }

    pub fn load(&self) -> Result<Option<FarmSnapshot>, SaveError> {
        self.0.load_snapshot()
    }

    pub fn save(&self, snapshot: &FarmSnapshot) -> Result<(), SaveError> {
        self.0.save_snapshot(snapshot)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// JSON FILE
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct JsonFileGateway {
    path: PathBuf,
}

impl JsonFileGateway {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `saves/farm.json` next to the executable.
    pub fn default_location() -> Self {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(exe_dir.join("saves").join("farm.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, path: &Path, source: std::io::Error) -> SaveError {
        SaveError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl PersistenceGateway for JsonFileGateway {
    fn load_snapshot(&self) -> Result<Option<FarmSnapshot>, SaveError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&self.path).map_err(|e| self.io_error(&self.path, e))?;
        let snapshot = serde_json::from_str(&json)?;
        Ok(Some(snapshot))
    }

    fn save_snapshot(&self, snapshot: &FarmSnapshot) -> Result<(), SaveError> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir).map_err(|e| self.io_error(dir, e))?;
            }
        }
        let json = serde_json::to_string_pretty(snapshot)?;

        // Write to a temp file first, then rename over the real one.
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json).map_err(|e| self.io_error(&tmp_path, e))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| self.io_error(&self.path, e))?;
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════
// IN MEMORY
// ═══════════════════════════════════════════════════════════════════════

/// Single shared slot. Clones see the same snapshot.
#[derive(Debug, Clone, Default)]
pub struct MemoryGateway {
    slot: Arc<Mutex<Option<FarmSnapshot>>>,
}

impl MemoryGateway {
    pub fn with_snapshot(snapshot: FarmSnapshot) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(snapshot))),
        }
    }

    pub fn snapshot(&self) -> Option<FarmSnapshot> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }

    pub fn replace(&self, snapshot: Option<FarmSnapshot>) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = snapshot;
        }
    }
}

impl PersistenceGateway for MemoryGateway {
    fn load_snapshot(&self) -> Result<Option<FarmSnapshot>, SaveError> {
        let slot = self
            .slot
            .lock()
            .map_err(|e| SaveError::Unavailable(e.to_string()))?;
        Ok(slot.clone())
    }

    fn save_snapshot(&self, snapshot: &FarmSnapshot) -> Result<(), SaveError> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|e| SaveError::Unavailable(e.to_string()))?;
        *slot = Some(snapshot.clone());
        Ok(())
    }
}
