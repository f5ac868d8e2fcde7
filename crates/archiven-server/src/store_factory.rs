use std::sync::Arc;

use tracing::info;

use archiven_core::app::BuildError;
use archiven_core::impls::{InMemoryBlobStore, LocalFsBlobStore};
use archiven_core::{ArchiveService, ArchiveServiceBuilder, BlobStore, StoreError};

use crate::config::{ArchivenConfig, StorageBackend};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("failed to open blob store: {0}")]
    Store(#[from] StoreError),

    #[error("invalid service configuration: {0}")]
    Build(#[from] BuildError),
}

/// Create the configured blob store backend.
pub async fn create_store(config: &ArchivenConfig) -> Result<Arc<dyn BlobStore>, StoreError> {
    match config.storage.backend {
        StorageBackend::Memory => {
            info!("using in-memory blob store; files are lost on restart");
            Ok(Arc::new(InMemoryBlobStore::new()))
        }
        StorageBackend::Fs => {
            let store = LocalFsBlobStore::open(&config.storage.root).await?;
            Ok(Arc::new(store))
        }
    }
}

/// Wire the archive service from configuration.
pub async fn create_service(config: &ArchivenConfig) -> Result<ArchiveService, StartupError> {
    let store = create_store(config).await?;
    let service = ArchiveServiceBuilder::new()
        .store(store)
        .policy(config.upload.clone())
        .build()?;
    Ok(service)
}
