//! Storage root layout and stored-path resolution
//!
//! Document records store file locations as written by whoever created
//! them: absolute, prefixed with the storage root's directory name, or
//! relative to the storage root. `resolve` turns any of those into a
//! concrete path.

use crate::error::StoreError;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

pub const DEFAULT_MARKER: &str = "Storage";
pub const DOCUMENTS_FILE: &str = "documents.json";
pub const PHYSICIANS_FILE: &str = "physicians.json";
pub const PDF_DIR: &str = "pdfs";
pub const SIGNATURE_DIR: &str = "signatures";
pub const SIGNATURE_FILE: &str = "signatures.png";

/// Bootstrap artifacts as `(file name, title)`, one per seeded document
pub const SAMPLE_ARTIFACTS: [(&str, &str); 3] = [
    ("sample-consent.pdf", "Patient Consent Form"),
    ("surgical-consent.pdf", "Surgical Consent Form"),
    ("medication-authorization.pdf", "Medication Authorization"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    root: PathBuf,
    marker: String,
}

impl StorageLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            marker: DEFAULT_MARKER.to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn documents_file(&self) -> PathBuf {
        self.root.join(DOCUMENTS_FILE)
    }

    pub fn physicians_file(&self) -> PathBuf {
        self.root.join(PHYSICIANS_FILE)
    }

    pub fn pdf_dir(&self) -> PathBuf {
        self.root.join(PDF_DIR)
    }

    pub fn signature_dir(&self) -> PathBuf {
        self.root.join(SIGNATURE_DIR)
    }

    pub fn default_signature_image(&self) -> PathBuf {
        self.signature_dir().join(SIGNATURE_FILE)
    }

    /// Stored path of a bootstrap artifact, as written into seeded records
    pub fn sample_record_path(&self, file_name: &str) -> String {
        format!("{}/{}/{}", self.marker, PDF_DIR, file_name)
    }

    /// Resolve a stored path.
    ///
    /// 1. Absolute paths are used as-is.
    /// 2. Paths whose first segment equals the marker (case-insensitively)
    ///    have it stripped and are joined onto the root.
    /// 3. Anything else is joined onto the root.
    ///
    /// Both `/` and `\` are accepted as separators.
    pub fn resolve(&self, stored: &str) -> PathBuf {
        let normalized = stored.replace('\\', "/");
        let path = Path::new(&normalized);

        let resolved = if path.is_absolute() {
            normalize(path)
        } else {
            let mut segments = normalized.split('/').filter(|s| !s.is_empty()).peekable();
            if segments
                .peek()
                .is_some_and(|first| first.eq_ignore_ascii_case(&self.marker))
            {
                segments.next();
            }
            let relative: PathBuf = segments.collect();
            normalize(&self.root.join(relative))
        };

        debug!("Resolved {} -> {}", stored, resolved.display());
        resolved
    }

    /// Create the PDF and signature directories if absent
    pub fn ensure_directories(&self) -> Result<(), StoreError> {
        for dir in [self.pdf_dir(), self.signature_dir()] {
            std::fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Write any missing one-page bootstrap artifacts
    pub fn ensure_sample_artifacts(&self) -> Result<(), StoreError> {
        for (file_name, title) in SAMPLE_ARTIFACTS {
            let path = self.pdf_dir().join(file_name);
            if path.exists() {
                continue;
            }

            let bytes = shared_pdf::sample_document(title, 1).map_err(|e| StoreError::Io {
                path: path.clone(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            })?;
            std::fs::write(&path, bytes).map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
            info!("Wrote sample artifact {}", path.display());
        }
        Ok(())
    }
}

/// Where the signed artifact for `source` goes: `<dir>/<stem>_signed.pdf`
pub fn signed_output_path(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    source.with_file_name(format!("{}_signed.pdf", stem))
}

/// Lexically fold `.` and `..` components
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    out
}
