/// Cart persistence backends
///
/// The store calls `save` after every successful mutation and `load` once
/// when it is rehydrated. Persistence is a side effect only; the
/// normalization logic never depends on it.
use super::types::AllocationSet;
use crate::errors::CartSwapError;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};

pub trait CartPersistence: Send + Sync {
    fn load(&self) -> Result<Option<AllocationSet>, CartSwapError>;
    fn save(&self, set: &AllocationSet) -> Result<(), CartSwapError>;
}

/// JSON file on disk (the CLI uses `<data dir>/data/cart.json`)
pub struct JsonFilePersistence {
    path: PathBuf,
}

impl JsonFilePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CartPersistence for JsonFilePersistence {
    fn load(&self) -> Result<Option<AllocationSet>, CartSwapError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(None);
        }
        let set = serde_json::from_str::<AllocationSet>(&contents)?;
        Ok(Some(set))
    }

    fn save(&self, set: &AllocationSet) -> Result<(), CartSwapError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        // Write-then-rename so a crash never leaves a half-written cart
        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, serde_json::to_string_pretty(set)?)?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

/// Session-only persistence, nothing survives the process
#[derive(Default)]
pub struct MemoryPersistence {
    saved: Mutex<Option<AllocationSet>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial(set: AllocationSet) -> Self {
        Self {
            saved: Mutex::new(Some(set)),
        }
    }

    pub fn saved(&self) -> Option<AllocationSet> {
        self.saved.lock().clone()
    }
}

impl CartPersistence for MemoryPersistence {
    fn load(&self) -> Result<Option<AllocationSet>, CartSwapError> {
        Ok(self.saved.lock().clone())
    }

    fn save(&self, set: &AllocationSet) -> Result<(), CartSwapError> {
        *self.saved.lock() = Some(set.clone());
        Ok(())
    }
}
