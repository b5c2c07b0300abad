//! Runtime environment helpers
//!
//! Thin wrapper around `common::env` so binary crates can prepare storage
//! directories through `service::runtime` without depending on `common`.

use configs::{StorageBackend, StorageConfig};

/// Create the data directory when the file backend is selected.
pub async fn ensure_env(storage: &StorageConfig) -> anyhow::Result<()> {
    if storage.backend == StorageBackend::File {
        common::env::ensure_data_dir(&storage.data_dir).await?;
    }
    Ok(())
}
