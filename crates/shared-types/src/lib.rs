//! Record types shared by the signing service crates

pub mod types;

pub use types::{BulkSignResult, Document, DocumentCounts, DocumentStatus, Physician};
