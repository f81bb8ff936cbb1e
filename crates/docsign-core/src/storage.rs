//! Whole-collection record storage
//!
//! A `RecordStore` reads and rewrites an entire collection at once. The JSON
//! file store backs the running service; the memory store stands in for it
//! in tests.

use crate::error::StoreError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_types::{Document, Physician};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

/// A record with a unique string key
pub trait Record {
    fn id(&self) -> &str;
}

impl Record for Document {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for Physician {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Load-all / save-all access to one collection
pub trait RecordStore<T>: Send + Sync {
    fn load_all(&self) -> Result<Vec<T>, StoreError>;
    fn save_all(&self, records: &[T]) -> Result<(), StoreError>;
}

/// Collection serialized as one pretty-printed JSON array
pub struct JsonFileStore<T> {
    path: PathBuf,
    _records: PhantomData<fn() -> T>,
}

impl<T> JsonFileStore<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _records: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl<T> RecordStore<T> for JsonFileStore<T>
where
    T: Serialize + DeserializeOwned,
{
    fn load_all(&self) -> Result<Vec<T>, StoreError> {
        let json = match std::fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_error(e)),
        };
        if json.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&json).map_err(|source| StoreError::Serialization {
            path: self.path.clone(),
            source,
        })
    }

    fn save_all(&self, records: &[T]) -> Result<(), StoreError> {
        let json =
            serde_json::to_string_pretty(records).map_err(|source| StoreError::Serialization {
                path: self.path.clone(),
                source,
            })?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        // Write beside the target and rename so readers never see a partial snapshot
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))
    }
}

/// In-memory collection
pub struct MemoryStore<T> {
    records: Mutex<Vec<T>>,
    saves: AtomicUsize,
}

impl<T> MemoryStore<T> {
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    pub fn with_records(records: Vec<T>) -> Self {
        Self {
            records: Mutex::new(records),
            saves: AtomicUsize::new(0),
        }
    }

    /// Number of `save_all` calls so far
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<T>>, StoreError> {
        self.records.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RecordStore<T> for MemoryStore<T>
where
    T: Clone + Send,
{
    fn load_all(&self) -> Result<Vec<T>, StoreError> {
        Ok(self.lock()?.clone())
    }

    fn save_all(&self, records: &[T]) -> Result<(), StoreError> {
        *self.lock()? = records.to_vec();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A store that writes `seed` on first access when the collection is empty.
///
/// Every access holds one mutex, so a read-modify-write through `modify`
/// cannot interleave with another one in this process.
pub(crate) struct SeededStore<T> {
    store: Box<dyn RecordStore<T>>,
    seed: Vec<T>,
    seeded: Mutex<bool>,
}

impl<T: Clone> SeededStore<T> {
    pub(crate) fn new(store: Box<dyn RecordStore<T>>, seed: Vec<T>) -> Self {
        Self {
            store,
            seed,
            seeded: Mutex::new(false),
        }
    }

    /// Current collection
    pub(crate) fn snapshot(&self) -> Result<Vec<T>, StoreError> {
        let mut seeded = self.seeded.lock().map_err(|_| StoreError::LockPoisoned)?;
        self.load(&mut seeded)
    }

    /// Load, let `f` mutate, and save the whole collection if `f` reports a change
    pub(crate) fn modify<R>(
        &self,
        f: impl FnOnce(&mut Vec<T>) -> (bool, R),
    ) -> Result<R, StoreError> {
        let mut seeded = self.seeded.lock().map_err(|_| StoreError::LockPoisoned)?;
        let mut records = self.load(&mut seeded)?;
        let (changed, result) = f(&mut records);
        if changed {
            self.store.save_all(&records)?;
        }
        Ok(result)
    }

    fn load(&self, seeded: &mut bool) -> Result<Vec<T>, StoreError> {
        let records = self.store.load_all()?;
        if *seeded {
            return Ok(records);
        }

        let records = if records.is_empty() && !self.seed.is_empty() {
            tracing::info!("Seeding empty record store with {} records", self.seed.len());
            self.store.save_all(&self.seed)?;
            self.seed.clone()
        } else {
            records
        };
        *seeded = true;
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store: JsonFileStore<Physician> = JsonFileStore::new(dir.path().join("none.json"));
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn test_json_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("physicians.json");
        let store = JsonFileStore::new(&path);
        let records = vec![
            Physician::new("phys-001", "Dr. John Smith"),
            Physician::new("phys-002", "Dr. Sarah Johnson"),
        ];
        store.save_all(&records).unwrap();

        assert_eq!(store.load_all().unwrap(), records);
        assert!(!path.with_extension("json.tmp").exists());
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\n  {"), "snapshot should be pretty printed");
    }

    #[test]
    fn test_malformed_snapshot_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("physicians.json");
        std::fs::write(&path, "{ not json").unwrap();
        let store: JsonFileStore<Physician> = JsonFileStore::new(&path);
        assert!(matches!(
            store.load_all(),
            Err(StoreError::Serialization { .. })
        ));
    }

    #[test]
    fn test_seed_written_once_when_empty() {
        let seeded = SeededStore::new(
            Box::new(MemoryStore::new()),
            vec![Physician::new("phys-001", "Dr. John Smith")],
        );
        assert_eq!(seeded.snapshot().unwrap().len(), 1);

        // Emptying the backing collection afterwards must not trigger a reseed
        seeded.modify(|records| {
            records.clear();
            (true, ())
        })
        .unwrap();
        assert!(seeded.snapshot().unwrap().is_empty());
    }

    #[test]
    fn test_existing_records_are_not_reseeded() {
        let existing = vec![Physician::new("phys-900", "Dr. Existing")];
        let seeded = SeededStore::new(
            Box::new(MemoryStore::with_records(existing.clone())),
            vec![Physician::new("phys-001", "Dr. John Smith")],
        );
        assert_eq!(seeded.snapshot().unwrap(), existing);
    }

    #[test]
    fn test_unchanged_modify_skips_save() {
        let store = std::sync::Arc::new(MemoryStore::with_records(vec![Physician::new(
            "phys-001",
            "Dr. John Smith",
        )]));
        let seeded = SeededStore::new(Box::new(SharedStore(store.clone())), Vec::new());
        seeded.modify(|_| (false, ())).unwrap();
        assert_eq!(store.save_count(), 0);
    }

    struct SharedStore<T>(std::sync::Arc<MemoryStore<T>>);

    impl<T: Clone + Send> RecordStore<T> for SharedStore<T> {
        fn load_all(&self) -> Result<Vec<T>, StoreError> {
            self.0.load_all()
        }
        fn save_all(&self, records: &[T]) -> Result<(), StoreError> {
            self.0.save_all(records)
        }
    }
}
