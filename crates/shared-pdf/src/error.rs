use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StampError {
    #[error("Signature image not found: {}", .0.display())]
    SignatureAssetMissing(PathBuf),

    #[error("Unsupported signature image: {0}")]
    UnsupportedImage(String),

    #[error("Failed to parse source PDF: {0}")]
    SourceUnreadable(String),

    #[error("Failed to write stamped PDF: {0}")]
    Write(String),
}
