//! Document record store
//!
//! Every operation reads the whole collection; `update` rewrites it in full.

use crate::error::StoreError;
use crate::layout::{StorageLayout, SAMPLE_ARTIFACTS};
use crate::storage::{Record, RecordStore, SeededStore};
use chrono::Utc;
use shared_types::{Document, DocumentCounts, DocumentStatus};

pub struct DocumentStore {
    records: SeededStore<Document>,
}

impl DocumentStore {
    /// Store over `store`, seeded with the sample documents if empty
    pub fn new(store: Box<dyn RecordStore<Document>>, layout: &StorageLayout) -> Self {
        Self::with_seed(store, default_documents(layout))
    }

    pub fn with_seed(store: Box<dyn RecordStore<Document>>, seed: Vec<Document>) -> Self {
        Self {
            records: SeededStore::new(store, seed),
        }
    }

    /// All documents in stored order
    pub fn list(&self) -> Result<Vec<Document>, StoreError> {
        self.records.snapshot()
    }

    pub fn list_by_physician(&self, physician_id: &str) -> Result<Vec<Document>, StoreError> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|d| d.physician_id == physician_id)
            .collect())
    }

    pub fn list_by_physician_and_status(
        &self,
        physician_id: &str,
        status: DocumentStatus,
    ) -> Result<Vec<Document>, StoreError> {
        Ok(self
            .list_by_physician(physician_id)?
            .into_iter()
            .filter(|d| d.status == status)
            .collect())
    }

    pub fn get(&self, id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self.list()?.into_iter().find(|d| d.id() == id))
    }

    pub fn counts_by_physician(&self, physician_id: &str) -> Result<DocumentCounts, StoreError> {
        let counts = self
            .list_by_physician(physician_id)?
            .iter()
            .fold(DocumentCounts::default(), |mut acc, d| {
                match d.status {
                    DocumentStatus::Signed => acc.signed += 1,
                    DocumentStatus::Pending => acc.unsigned += 1,
                }
                acc
            });
        Ok(counts)
    }

    /// Replace the record with `document.id`, persisting the whole collection.
    ///
    /// Returns `false` without writing when no record has that id.
    pub fn update(&self, document: &Document) -> Result<bool, StoreError> {
        self.records.modify(|records| {
            match records.iter_mut().find(|d| d.id == document.id) {
                Some(slot) => {
                    *slot = document.clone();
                    (true, true)
                }
                None => {
                    tracing::warn!("Update skipped, no document with id {}", document.id);
                    (false, false)
                }
            }
        })
    }
}

/// Bootstrap records: three pending documents, each on its own sample artifact
pub fn default_documents(layout: &StorageLayout) -> Vec<Document> {
    let now = Utc::now();
    let owners = [("doc-001", "phys-001"), ("doc-002", "phys-001"), ("doc-003", "phys-002")];
    owners
        .into_iter()
        .zip(SAMPLE_ARTIFACTS)
        .map(|((id, physician_id), (file_name, title))| {
            Document::pending(id, title, layout.sample_record_path(file_name), physician_id, now)
        })
        .collect()
}
