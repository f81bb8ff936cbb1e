//! Signing orchestration
//!
//! Resolves a document's original artifact, stamps it with the signature
//! image and an attribution line, writes `<stem>_signed.pdf` next to it and
//! records the new state through the document store.

use crate::clock::{Clock, SystemClock};
use crate::documents::DocumentStore;
use crate::error::{SigningError, StoreError};
use crate::layout::{signed_output_path, StorageLayout};
use crate::physicians::PhysicianDirectory;
use chrono::{DateTime, Local, Utc};
use shared_pdf::{SignatureImage, StampError};
use shared_types::{BulkSignResult, Document};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// What to do when asked to sign a document that is already signed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResignPolicy {
    /// Stamp the original artifact again, replacing the signed file and timestamp
    #[default]
    Restamp,
    /// Refuse with `SigningError::AlreadySigned`
    Reject,
}

/// `Electronically Signed by <name> on MM/DD/YYYY`
pub fn attribution_text(physician_name: &str, date: DateTime<Local>) -> String {
    format!(
        "Electronically Signed by {} on {}",
        physician_name,
        date.format("%m/%d/%Y")
    )
}

/// The currently active artifact of a document
#[derive(Debug, Clone)]
pub struct PdfArtifact {
    pub document: Document,
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

pub struct SigningService {
    documents: Arc<DocumentStore>,
    physicians: Arc<PhysicianDirectory>,
    layout: StorageLayout,
    signature_image: PathBuf,
    policy: ResignPolicy,
    clock: Arc<dyn Clock>,
}

impl SigningService {
    pub fn new(
        documents: Arc<DocumentStore>,
        physicians: Arc<PhysicianDirectory>,
        layout: StorageLayout,
    ) -> Self {
        let signature_image = layout.default_signature_image();
        Self {
            documents,
            physicians,
            layout,
            signature_image,
            policy: ResignPolicy::default(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_signature_image(mut self, path: impl Into<PathBuf>) -> Self {
        self.signature_image = path.into();
        self
    }

    pub fn with_policy(mut self, policy: ResignPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Attribution line for `document`, stamped with the clock's current date
    pub fn attribution_for(&self, document: &Document) -> Result<String, StoreError> {
        let name = self.physicians.display_name(&document.physician_id)?;
        Ok(attribution_text(&name, self.clock.now()))
    }

    /// Sign one document and return its updated record
    pub fn sign_one(&self, document_id: &str) -> Result<Document, SigningError> {
        let mut document = self
            .documents
            .get(document_id)?
            .ok_or_else(|| SigningError::DocumentNotFound(document_id.to_string()))?;

        if document.is_signed() {
            match self.policy {
                ResignPolicy::Reject => {
                    return Err(SigningError::AlreadySigned(document_id.to_string()))
                }
                ResignPolicy::Restamp => {
                    info!("Re-stamping already signed document {}", document_id)
                }
            }
        }

        // Always stamp the original, never a previous signed output
        let source_path = self.layout.resolve(&document.file_path);
        let source = read_source(&source_path)?;

        let now = self.clock.now();
        let name = self.physicians.display_name(&document.physician_id)?;
        let attribution = attribution_text(&name, now);
        let output_path = signed_output_path(&source_path);

        info!(
            "Signing document {} as {} -> {}",
            document_id,
            name,
            output_path.display()
        );

        self.stamp_to(&source, &attribution, &output_path)
            .map_err(|cause| {
                error!("Stamping document {} failed: {}", document_id, cause);
                SigningError::StampingFailed {
                    document_id: document_id.to_string(),
                    source: cause,
                }
            })?;

        document.mark_signed(
            output_path.to_string_lossy().into_owned(),
            now.with_timezone(&Utc),
        );
        self.documents.update(&document)?;

        info!("Document {} signed", document_id);
        Ok(document)
    }

    /// Sign each id independently, in order, collecting one result per id
    pub fn sign_bulk(&self, document_ids: &[String]) -> Vec<BulkSignResult> {
        document_ids
            .iter()
            .map(|id| match self.sign_one(id) {
                Ok(_) => BulkSignResult::succeeded(id.as_str()),
                Err(e) => {
                    warn!("Bulk signing: document {} failed: {}", id, e);
                    BulkSignResult::failed(id.as_str(), error_message(&e))
                }
            })
            .collect()
    }

    /// Bytes of the document's active artifact: the signed file once one
    /// exists, otherwise the original. `None` if the document or file is missing.
    pub fn pdf_bytes(&self, document_id: &str) -> Result<Option<PdfArtifact>, StoreError> {
        let Some(document) = self.documents.get(document_id)? else {
            warn!("Document not found: {}", document_id);
            return Ok(None);
        };

        let path = self.layout.resolve(document.active_file_path());
        match std::fs::read(&path) {
            Ok(bytes) => {
                debug!("Read {} bytes from {}", bytes.len(), path.display());
                Ok(Some(PdfArtifact {
                    document,
                    path,
                    bytes,
                }))
            }
            Err(e) => {
                warn!("PDF for {} unavailable at {}: {}", document_id, path.display(), e);
                Ok(None)
            }
        }
    }

    fn stamp_to(&self, source: &[u8], attribution: &str, output: &Path) -> Result<(), StampError> {
        let signature = SignatureImage::load(&self.signature_image)?;
        let stamped = shared_pdf::stamp(source, &signature, attribution)?;
        write_replacing(output, &stamped).map_err(|e| StampError::Write(e.to_string()))
    }
}

/// Write `bytes` to a uniquely named sibling and rename it over `output`, so
/// concurrent readers see either the previous artifact or the new one in full
fn write_replacing(output: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut staged = tempfile::NamedTempFile::new_in(dir)?;
    staged.write_all(bytes)?;
    staged.as_file().sync_all()?;
    staged.persist(output).map_err(|e| e.error)?;
    Ok(())
}

fn read_source(path: &Path) -> Result<Vec<u8>, SigningError> {
    if !path.is_file() {
        return Err(SigningError::SourceFileMissing(path.to_path_buf()));
    }
    std::fs::read(path).map_err(|e| {
        warn!("Source {} unreadable: {}", path.display(), e);
        SigningError::SourceFileMissing(path.to_path_buf())
    })
}

/// Human-readable reason including the underlying cause
pub fn error_message(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut cause = err.source();
    while let Some(inner) = cause {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        cause = inner.source();
    }
    message
}
