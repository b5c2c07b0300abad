//! Storage abstractions for service layer
//!
//! [`RecordStore`] is the seam between resource services and persistence.
//! Two implementations exist: [`file_store::FileRecordStore`] (one JSON file
//! per resource, or purely in memory) and [`seaorm_store::SeaOrmRecordStore`]
//! (a single Postgres table). [`Storage`] is the explicit handle the process
//! opens once at startup and closes on shutdown.

pub mod file_store;
pub mod json_map_store;
pub mod seaorm_store;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use configs::{DatabaseConfig, StorageBackend, StorageConfig};
use models::record::{Patch, Record};
use sea_orm::DatabaseConnection;
use tracing::info;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::pagination::Window;

/// Persistence for records of any resource, keyed by resource name.
///
/// `insert` only writes; reading the stored row back is the caller's job.
/// `update` and `delete` report a missing record as `Ok(None)` / `Ok(false)`;
/// translating that into a not-found error is the caller's job.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn insert(&self, resource: &str, record: Record) -> Result<Record, ServiceError>;
    async fn find(&self, resource: &str, id: Uuid) -> Result<Option<Record>, ServiceError>;
    async fn update(&self, resource: &str, id: Uuid, patch: Patch) -> Result<Option<Record>, ServiceError>;
    async fn delete(&self, resource: &str, id: Uuid) -> Result<bool, ServiceError>;
    /// Records matching every filter, newest first, sliced by `window`.
    async fn list(&self, resource: &str, filters: &BTreeMap<String, String>, window: Window) -> Result<Vec<Record>, ServiceError>;
}

/// Opened storage backend plus whatever must be released on shutdown.
#[derive(Clone)]
pub struct Storage {
    store: Arc<dyn RecordStore>,
    db: Option<DatabaseConnection>,
    backend: StorageBackend,
}

impl Storage {
    /// Open the configured backend for the given resource names.
    pub async fn open(storage: &StorageConfig, database: &DatabaseConfig, resources: &[String]) -> Result<Self, ServiceError> {
        let (store, db): (Arc<dyn RecordStore>, Option<DatabaseConnection>) = match storage.backend {
            StorageBackend::Postgres => {
                let db = models::db::connect_and_migrate(database)
                    .await
                    .map_err(|e| ServiceError::Db(format!("{e:#}")))?;
                (Arc::new(seaorm_store::SeaOrmRecordStore::new(db.clone())), Some(db))
            }
            StorageBackend::File => (Arc::new(file_store::FileRecordStore::open(&storage.data_dir, resources).await?), None),
            StorageBackend::Memory => (Arc::new(file_store::FileRecordStore::in_memory(resources)), None),
        };
        info!(backend = ?storage.backend, resources = resources.len(), "storage opened");
        Ok(Self { store, db, backend: storage.backend })
    }

    pub fn store(&self) -> Arc<dyn RecordStore> {
        Arc::clone(&self.store)
    }

    pub fn backend(&self) -> StorageBackend {
        self.backend
    }

    /// Release pooled connections. File stores flush on every write, so there
    /// is nothing else to do.
    pub async fn close(self) -> Result<(), ServiceError> {
        if let Some(db) = self.db {
            db.close().await?;
        }
        info!(backend = ?self.backend, "storage closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::temp_path;

    #[tokio::test]
    async fn open_memory_and_file_backends() -> Result<(), anyhow::Error> {
        let names = vec!["claims".to_string()];
        let db = DatabaseConfig::default();

        let mem = StorageConfig { backend: StorageBackend::Memory, ..StorageConfig::default() };
        let storage = Storage::open(&mem, &db, &names).await?;
        assert_eq!(storage.backend(), StorageBackend::Memory);
        assert!(storage.store().list("claims", &BTreeMap::new(), Window { offset: 0, limit: 10 }).await?.is_empty());
        storage.close().await?;

        let dir = temp_path("storage_open");
        let file = StorageConfig { backend: StorageBackend::File, data_dir: dir.clone(), ..StorageConfig::default() };
        let storage = Storage::open(&file, &db, &names).await?;
        assert!(dir.join("claims.json").exists());
        storage.close().await?;
        let _ = tokio::fs::remove_dir_all(&dir).await;
        Ok(())
    }
}
