use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Signing state of a document. `Pending -> Signed` is the only transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentStatus {
    #[default]
    Pending,
    Signed,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Pending => "Pending",
            DocumentStatus::Signed => "Signed",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A signable file and its signing state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub status: DocumentStatus,
    /// Location of the original artifact, absolute or relative to the storage root
    pub file_path: String,
    #[serde(default)]
    pub signed_file_path: Option<String>,
    #[serde(default)]
    pub physician_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub signed_at: Option<DateTime<Utc>>,
}

impl Document {
    /// Create a pending document
    pub fn pending(
        id: impl Into<String>,
        name: impl Into<String>,
        file_path: impl Into<String>,
        physician_id: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status: DocumentStatus::Pending,
            file_path: file_path.into(),
            signed_file_path: None,
            physician_id: physician_id.into(),
            created_at,
            signed_at: None,
        }
    }

    pub fn is_signed(&self) -> bool {
        self.status == DocumentStatus::Signed
    }

    /// Record a completed signing. Status, signed path and timestamp move together.
    pub fn mark_signed(&mut self, signed_file_path: impl Into<String>, signed_at: DateTime<Utc>) {
        self.status = DocumentStatus::Signed;
        self.signed_file_path = Some(signed_file_path.into());
        self.signed_at = Some(signed_at);
    }

    /// The artifact a reader should see: the signed file once one exists, else the original
    pub fn active_file_path(&self) -> &str {
        match (&self.status, self.signed_file_path.as_deref()) {
            (DocumentStatus::Signed, Some(path)) if !path.is_empty() => path,
            _ => &self.file_path,
        }
    }

    /// `Signed` iff a non-empty signed path and a signing timestamp are both present
    pub fn is_consistent(&self) -> bool {
        let has_signed_path = self
            .signed_file_path
            .as_deref()
            .is_some_and(|p| !p.is_empty());
        self.is_signed() == (has_signed_path && self.signed_at.is_some())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Physician {
    pub id: String,
    pub name: String,
}

impl Physician {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Per-physician tally of documents by status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentCounts {
    pub signed: usize,
    pub unsigned: usize,
}

/// Outcome of one id within a bulk signing call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkSignResult {
    pub document_id: String,
    pub success: bool,
    pub error: Option<String>,
}

impl BulkSignResult {
    pub fn succeeded(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            success: true,
            error: None,
        }
    }

    pub fn failed(document_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            success: false,
            error: Some(error.into()),
        }
    }
}
