//! Error types for DocSign API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use docsign_core::{error_message, SigningError, StoreError};
use serde_json::json;
use thiserror::Error;

use crate::config::Environment;

/// Message returned in production when signing fails internally
pub const GENERIC_SIGNING_FAILURE: &str = "Failed to sign document";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Physician not found: {0}")]
    PhysicianNotFound(String),

    #[error("PDF not found for document {0}")]
    PdfNotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("{0}")]
    Conflict(String),

    /// Already classified; `message` is what the client may see
    #[error("Signing failed: {message}")]
    SigningFailed { message: String },

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Classify a signing failure for the client
    ///
    /// Unknown documents and rejected re-signs keep their own status codes.
    /// Anything else is a server error whose body carries the full cause
    /// chain in development and a generic message in production.
    pub fn from_signing(err: SigningError, environment: Environment) -> Self {
        match err {
            SigningError::DocumentNotFound(id) => ApiError::DocumentNotFound(id),
            SigningError::AlreadySigned(_) => ApiError::Conflict(err.to_string()),
            other => {
                let chain = error_message(&other);
                tracing::error!("Signing failed: {}", chain);
                let message = if environment.is_production() {
                    GENERIC_SIGNING_FAILURE.to_string()
                } else {
                    chain
                };
                ApiError::SigningFailed { message }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::DocumentNotFound(id) => {
                (StatusCode::NOT_FOUND, format!("Document not found: {}", id))
            }
            ApiError::PhysicianNotFound(id) => {
                (StatusCode::NOT_FOUND, format!("Physician not found: {}", id))
            }
            ApiError::PdfNotFound(id) => (
                StatusCode::NOT_FOUND,
                format!("PDF not found for document {}", id),
            ),
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            ApiError::SigningFailed { message } => {
                (StatusCode::INTERNAL_SERVER_ERROR, message.clone())
            }
            ApiError::Store(e) => {
                tracing::error!("Storage error: {}", error_message(e));
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Storage error".to_string(),
                )
            }
            ApiError::Internal(e) => {
                tracing::error!("Internal error: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use shared_pdf::StampError;

    fn stamping_failure() -> SigningError {
        SigningError::StampingFailed {
            document_id: "doc-001".into(),
            source: StampError::SignatureAssetMissing("/srv/signatures.png".into()),
        }
    }

    #[test]
    fn test_development_exposes_cause() {
        match ApiError::from_signing(stamping_failure(), Environment::Development) {
            ApiError::SigningFailed { message } => assert_eq!(
                message,
                "Failed to stamp document doc-001: Signature image not found: /srv/signatures.png"
            ),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_production_hides_cause() {
        match ApiError::from_signing(stamping_failure(), Environment::Production) {
            ApiError::SigningFailed { message } => assert_eq!(message, GENERIC_SIGNING_FAILURE),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (
                ApiError::from_signing(
                    SigningError::DocumentNotFound("x".into()),
                    Environment::Production,
                ),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::from_signing(
                    SigningError::AlreadySigned("x".into()),
                    Environment::Production,
                ),
                StatusCode::CONFLICT,
            ),
            (
                ApiError::from_signing(
                    SigningError::SourceFileMissing("/tmp/x.pdf".into()),
                    Environment::Production,
                ),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError::InvalidRequest("physicianId is required".into()),
                StatusCode::BAD_REQUEST,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
