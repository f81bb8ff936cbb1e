//! Document signing core logic
//!
//! This crate holds the physician directory, the document store, storage
//! path resolution and the signing orchestrator that ties them to the
//! stamper in `shared-pdf`.

pub mod clock;
pub mod documents;
pub mod error;
pub mod layout;
pub mod physicians;
pub mod signing;
pub mod storage;

pub use clock::{Clock, FixedClock, SystemClock};
pub use documents::DocumentStore;
pub use error::{SigningError, StoreError};
pub use layout::StorageLayout;
pub use physicians::PhysicianDirectory;
pub use signing::{attribution_text, error_message, PdfArtifact, ResignPolicy, SigningService};
pub use storage::{JsonFileStore, MemoryStore, Record, RecordStore};

// Re-export record types so callers need a single dependency
pub use shared_types::{BulkSignResult, Document, DocumentCounts, DocumentStatus, Physician};
