//! Request and response bodies

use serde::{Deserialize, Serialize};
use shared_types::BulkSignResult;

/// `?physicianId=` filter shared by the document listing endpoints
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentQuery {
    pub physician_id: Option<String>,
}

impl DocumentQuery {
    /// The physician id, treating an empty value as absent
    pub fn physician(&self) -> Option<&str> {
        self.physician_id.as_deref().filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkSignRequest {
    #[serde(default)]
    pub document_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkSignResponse {
    pub results: Vec<BulkSignResult>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}
