//! Command-line and environment configuration

use clap::{Parser, ValueEnum};
use docsign_core::ResignPolicy;
use std::path::PathBuf;

/// Command-line arguments for the DocSign API server
///
/// Every option can also be supplied through the environment (or a `.env` file).
#[derive(Parser, Debug, Clone)]
#[command(name = "docsign-api")]
#[command(about = "Physician document signing API")]
pub struct Args {
    /// Host address to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "3001")]
    pub port: u16,

    /// Directory holding record snapshots, PDFs and the signature image
    #[arg(long, env = "DOCSIGN_STORAGE_ROOT", default_value = "Storage")]
    pub storage_root: PathBuf,

    /// Signature image to stamp (defaults to `<storage-root>/signatures/signatures.png`)
    #[arg(long, env = "DOCSIGN_SIGNATURE_IMAGE")]
    pub signature_image: Option<PathBuf>,

    /// Controls how much of a failure's cause is returned to clients
    #[arg(long, env = "DOCSIGN_ENV", value_enum, default_value_t = Environment::Development)]
    pub environment: Environment,

    /// What to do when an already signed document is signed again
    #[arg(long, env = "DOCSIGN_RESIGN_POLICY", value_enum, default_value_t = ResignMode::Restamp)]
    pub resign_policy: ResignMode,

    /// Origins allowed by CORS
    #[arg(
        long = "allowed-origin",
        env = "DOCSIGN_ALLOWED_ORIGINS",
        value_delimiter = ',',
        default_values = ["http://localhost:3000", "http://localhost:3001"]
    )]
    pub allowed_origins: Vec<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResignMode {
    #[default]
    Restamp,
    Reject,
}

impl From<ResignMode> for ResignPolicy {
    fn from(mode: ResignMode) -> Self {
        match mode {
            ResignMode::Restamp => ResignPolicy::Restamp,
            ResignMode::Reject => ResignPolicy::Reject,
        }
    }
}
