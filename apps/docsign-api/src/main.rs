//! DocSign API Server - physician document signing
//!
//! Provides REST endpoints for:
//! - Document listing, lookup and per-physician counts
//! - Single and bulk signing
//! - Inline delivery of the original or signed PDF
//! - Physician directory lookups

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use clap::Parser;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
mod error;
mod handlers;
mod models;
mod state;

use config::Args;
use state::AppState;

/// All routes, without CORS
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        // Documents
        .route("/api/documents", get(handlers::list_documents))
        .route("/api/documents/unsigned", get(handlers::unsigned_documents))
        .route("/api/documents/signed", get(handlers::signed_documents))
        .route("/api/documents/counts", get(handlers::document_counts))
        .route("/api/documents/sign-bulk", post(handlers::sign_bulk))
        .route("/api/documents/:id", get(handlers::get_document))
        .route("/api/documents/:id/pdf", get(handlers::get_document_pdf))
        .route("/api/documents/:id/sign", post(handlers::sign_document))
        // Physicians
        .route("/api/physicians", get(handlers::list_physicians))
        .route("/api/physicians/:id", get(handlers::get_physician))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present, before env fallbacks are read
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "docsign_api={level},docsign_core={level},shared_pdf={level},tower_http=debug"
        ))
    });
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Initializing DocSign API...");
    let state = Arc::new(AppState::new(&args)?);
    info!(
        "Environment: {:?}, re-sign policy: {:?}",
        args.environment, args.resign_policy
    );

    let app = router(state).layer(cors_layer(&args.allowed_origins));

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Starting DocSign API on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
