use shared_pdf::StampError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed record snapshot {}", path.display())]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Record store lock poisoned")]
    LockPoisoned,
}

#[derive(Error, Debug)]
pub enum SigningError {
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Source file missing: {}", .0.display())]
    SourceFileMissing(PathBuf),

    #[error("Document already signed: {0}")]
    AlreadySigned(String),

    #[error("Failed to stamp document {document_id}")]
    StampingFailed {
        document_id: String,
        #[source]
        source: StampError,
    },

    #[error("Failed to persist document record")]
    Store(#[from] StoreError),
}
