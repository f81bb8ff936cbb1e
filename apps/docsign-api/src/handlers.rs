//! HTTP handlers for DocSign API

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use shared_types::{Document, DocumentCounts, DocumentStatus, Physician};
use std::sync::Arc;

use crate::error::ApiError;
use crate::models::*;
use crate::state::AppState;

/// Run store and PDF work off the async executor
async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Blocking task failed: {}", e)))?
}

fn required_physician(query: &DocumentQuery) -> Result<String, ApiError> {
    query
        .physician()
        .map(str::to_string)
        .ok_or_else(|| ApiError::InvalidRequest("physicianId is required".to_string()))
}

/// Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "docsign-api",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Liveness text
pub async fn root() -> &'static str {
    "DocSign API is running"
}

/// List documents, optionally for one physician
pub async fn list_documents(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DocumentQuery>,
) -> Result<Json<Vec<Document>>, ApiError> {
    let physician = query.physician().map(str::to_string);
    let documents = blocking(move || {
        Ok(match physician {
            Some(id) => state.documents.list_by_physician(&id)?,
            None => state.documents.list()?,
        })
    })
    .await?;
    Ok(Json(documents))
}

pub async fn get_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Document>, ApiError> {
    let document = blocking(move || {
        state
            .documents
            .get(&id)?
            .ok_or(ApiError::DocumentNotFound(id))
    })
    .await?;
    Ok(Json(document))
}

/// Serve the document's active artifact inline
pub async fn get_document_pdf(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let artifact = blocking(move || {
        state
            .signer
            .pdf_bytes(&id)?
            .ok_or(ApiError::PdfNotFound(id))
    })
    .await?;

    let file_name = artifact.document.name.replace(' ', "_");
    let disposition = HeaderValue::from_str(&format!("inline; filename=\"{}\"", file_name))
        .unwrap_or_else(|_| HeaderValue::from_static("inline"));

    tracing::debug!(
        "Returning PDF {} ({} bytes) for {}",
        file_name,
        artifact.bytes.len(),
        artifact.document.id
    );

    let headers = [
        (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
        (header::CONTENT_DISPOSITION, disposition),
        (header::ACCEPT_RANGES, HeaderValue::from_static("bytes")),
        (header::CONTENT_LENGTH, HeaderValue::from(artifact.bytes.len())),
    ];
    Ok((headers, artifact.bytes).into_response())
}

/// Sign one document and return the updated record
pub async fn sign_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Document>, ApiError> {
    let environment = state.environment;
    let document = blocking(move || {
        state
            .signer
            .sign_one(&id)
            .map_err(|e| ApiError::from_signing(e, environment))
    })
    .await?;
    Ok(Json(document))
}

async fn list_with_status(
    state: Arc<AppState>,
    query: DocumentQuery,
    status: DocumentStatus,
) -> Result<Json<Vec<Document>>, ApiError> {
    let physician = required_physician(&query)?;
    let documents = blocking(move || {
        Ok(state
            .documents
            .list_by_physician_and_status(&physician, status)?)
    })
    .await?;
    Ok(Json(documents))
}

pub async fn unsigned_documents(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DocumentQuery>,
) -> Result<Json<Vec<Document>>, ApiError> {
    list_with_status(state, query, DocumentStatus::Pending).await
}

pub async fn signed_documents(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DocumentQuery>,
) -> Result<Json<Vec<Document>>, ApiError> {
    list_with_status(state, query, DocumentStatus::Signed).await
}

pub async fn document_counts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DocumentQuery>,
) -> Result<Json<DocumentCounts>, ApiError> {
    let physician = required_physician(&query)?;
    let counts =
        blocking(move || Ok(state.documents.counts_by_physician(&physician)?)).await?;
    Ok(Json(counts))
}

/// Sign several documents; per-id failures are reported in the results
pub async fn sign_bulk(
    State(state): State<Arc<AppState>>,
    body: Option<Json<BulkSignRequest>>,
) -> Result<Json<BulkSignResponse>, ApiError> {
    let document_ids = body.map(|Json(req)| req.document_ids).unwrap_or_default();
    if document_ids.is_empty() {
        return Err(ApiError::InvalidRequest(
            "documentIds array is required".to_string(),
        ));
    }

    tracing::info!("Bulk signing {} documents", document_ids.len());
    let results = blocking(move || Ok(state.signer.sign_bulk(&document_ids))).await?;
    Ok(Json(BulkSignResponse { results }))
}

pub async fn list_physicians(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Physician>>, ApiError> {
    let physicians = blocking(move || Ok(state.physicians.list()?)).await?;
    Ok(Json(physicians))
}

pub async fn get_physician(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Physician>, ApiError> {
    let physician = blocking(move || {
        state
            .physicians
            .get(&id)?
            .ok_or(ApiError::PhysicianNotFound(id))
    })
    .await?;
    Ok(Json(physician))
}
