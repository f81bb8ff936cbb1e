//! Application state for DocSign API

use anyhow::{Context, Result};
use docsign_core::{
    DocumentStore, JsonFileStore, PhysicianDirectory, ResignPolicy, SigningService,
    StorageLayout,
};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{Args, Environment};

pub struct AppState {
    pub documents: Arc<DocumentStore>,
    pub physicians: Arc<PhysicianDirectory>,
    pub signer: Arc<SigningService>,
    pub environment: Environment,
}

impl AppState {
    /// Prepare the storage root named by `args` and open the record stores
    pub fn new(args: &Args) -> Result<Self> {
        let root = std::path::absolute(&args.storage_root).with_context(|| {
            format!("Invalid storage root {}", args.storage_root.display())
        })?;
        let layout = StorageLayout::new(root);

        tracing::info!("Using storage root {}", layout.root().display());
        layout.ensure_directories()?;
        layout.ensure_sample_artifacts()?;

        Ok(Self::from_layout(
            layout,
            args.signature_image.clone(),
            args.resign_policy.into(),
            args.environment,
        ))
    }

    /// Open JSON-backed stores under an already prepared layout
    pub fn from_layout(
        layout: StorageLayout,
        signature_image: Option<PathBuf>,
        policy: ResignPolicy,
        environment: Environment,
    ) -> Self {
        let documents = Arc::new(DocumentStore::new(
            Box::new(JsonFileStore::new(layout.documents_file())),
            &layout,
        ));
        let physicians = Arc::new(PhysicianDirectory::new(Box::new(JsonFileStore::new(
            layout.physicians_file(),
        ))));

        let mut signer = SigningService::new(documents.clone(), physicians.clone(), layout)
            .with_policy(policy);
        if let Some(path) = signature_image {
            signer = signer.with_signature_image(path);
        }

        Self {
            documents,
            physicians,
            signer: Arc::new(signer),
            environment,
        }
    }
}
