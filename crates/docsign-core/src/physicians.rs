//! Read-only physician lookups

use crate::error::StoreError;
use crate::storage::{Record, RecordStore, SeededStore};
use shared_types::Physician;

/// Name used in attributions when a document's physician cannot be resolved
pub const FALLBACK_PHYSICIAN_NAME: &str = "Physician";

pub struct PhysicianDirectory {
    records: SeededStore<Physician>,
}

impl PhysicianDirectory {
    /// Directory over `store`, seeded with the default physicians if empty
    pub fn new(store: Box<dyn RecordStore<Physician>>) -> Self {
        Self::with_seed(store, default_physicians())
    }

    pub fn with_seed(store: Box<dyn RecordStore<Physician>>, seed: Vec<Physician>) -> Self {
        Self {
            records: SeededStore::new(store, seed),
        }
    }

    /// All physicians in stored order
    pub fn list(&self) -> Result<Vec<Physician>, StoreError> {
        self.records.snapshot()
    }

    pub fn get(&self, id: &str) -> Result<Option<Physician>, StoreError> {
        Ok(self.list()?.into_iter().find(|p| p.id() == id))
    }

    /// Name to print in an attribution for `physician_id`
    pub fn display_name(&self, physician_id: &str) -> Result<String, StoreError> {
        if physician_id.is_empty() {
            return Ok(FALLBACK_PHYSICIAN_NAME.to_string());
        }
        Ok(self
            .get(physician_id)?
            .map(|p| p.name)
            .unwrap_or_else(|| FALLBACK_PHYSICIAN_NAME.to_string()))
    }
}

pub fn default_physicians() -> Vec<Physician> {
    vec![
        Physician::new("phys-001", "Dr. John Smith"),
        Physician::new("phys-002", "Dr. Sarah Johnson"),
        Physician::new("phys-003", "Dr. Michael Brown"),
    ]
}
