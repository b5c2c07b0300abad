#![cfg(test)]
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use configs::DatabaseConfig;
use models::record::{NewRecord, Patch, Record};
use models::schema::ResourceSchema;
use sea_orm::DatabaseConnection;
use serde_json::{Map, Value};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::pagination::Window;
use crate::resource::ResourceService;
use crate::storage::file_store::FileRecordStore;
use crate::storage::RecordStore;

// Ensure migrations run only once across the entire test process
static MIGRATED: OnceCell<()> = OnceCell::const_new();

pub fn db_tests_enabled() -> bool {
    std::env::var("SKIP_DB_TESTS").is_err() && std::env::var("DATABASE_URL").is_ok()
}

fn test_db_config() -> DatabaseConfig {
    DatabaseConfig {
        url: models::db::DATABASE_URL.clone(),
        max_connections: 20,
        min_connections: 1,
        acquire_timeout_secs: 10,
        ..DatabaseConfig::default()
    }
}

pub async fn get_db() -> Result<DatabaseConnection, anyhow::Error> {
    // Run migrations exactly once, with a throwaway connection
    MIGRATED
        .get_or_try_init(|| async {
            let db = models::db::connect_and_migrate(&test_db_config()).await?;
            db.close().await?;
            Ok::<(), anyhow::Error>(())
        })
        .await?;

    // Return a fresh connection for the current test's runtime
    models::db::connect_with_config(&test_db_config()).await
}

/// Unique path under the system temp dir.
pub fn temp_path(prefix: &str) -> PathBuf {
    std::env::temp_dir().join(format!("{prefix}_{}", Uuid::new_v4().simple()))
}

pub fn obj(v: Value) -> Map<String, Value> {
    v.as_object().cloned().unwrap_or_default()
}

/// Unvalidated record, for exercising stores directly.
pub fn record_with(status: &str, fields: Value) -> Record {
    Record::new(NewRecord { status: status.to_string(), fields: obj(fields) })
}

pub fn claims_schema() -> ResourceSchema {
    let cfg = configs::default_resources()
        .expect("built-in resources parse")
        .into_iter()
        .find(|r| r.name == "claims")
        .expect("claims is a built-in resource");
    ResourceSchema::from_config(&cfg).expect("claims schema is valid")
}

/// Claims service over a fresh in-memory store.
pub fn claims_service() -> ResourceService {
    let store = Arc::new(FileRecordStore::in_memory(&["claims".to_string()]));
    ResourceService::new(claims_schema(), store)
}

/// Store whose every call sleeps before answering.
pub struct SlowStore(pub Duration);

#[async_trait]
impl RecordStore for SlowStore {
    async fn insert(&self, _resource: &str, record: Record) -> Result<Record, ServiceError> {
        tokio::time::sleep(self.0).await;
        Ok(record)
    }

    async fn find(&self, _resource: &str, _id: Uuid) -> Result<Option<Record>, ServiceError> {
        tokio::time::sleep(self.0).await;
        Ok(None)
    }

    async fn update(&self, _resource: &str, _id: Uuid, _patch: Patch) -> Result<Option<Record>, ServiceError> {
        tokio::time::sleep(self.0).await;
        Ok(None)
    }

    async fn delete(&self, _resource: &str, _id: Uuid) -> Result<bool, ServiceError> {
        tokio::time::sleep(self.0).await;
        Ok(false)
    }

    async fn list(&self, _resource: &str, _filters: &BTreeMap<String, String>, _window: Window) -> Result<Vec<Record>, ServiceError> {
        tokio::time::sleep(self.0).await;
        Ok(Vec::new())
    }
}

/// How [`FlakyReadStore`] answers `find`.
#[derive(Clone, Copy, Debug)]
pub enum ReadBack {
    Stall(Duration),
    Fail,
    Missing,
}

/// In-memory store whose writes succeed but whose `find` misbehaves.
pub struct FlakyReadStore {
    pub inner: FileRecordStore,
    pub read_back: ReadBack,
}

impl FlakyReadStore {
    pub fn new(resource: &str, read_back: ReadBack) -> Self {
        Self { inner: FileRecordStore::in_memory(&[resource.to_string()]), read_back }
    }
}

#[async_trait]
impl RecordStore for FlakyReadStore {
    async fn insert(&self, resource: &str, record: Record) -> Result<Record, ServiceError> {
        self.inner.insert(resource, record).await
    }

    async fn find(&self, resource: &str, id: Uuid) -> Result<Option<Record>, ServiceError> {
        match self.read_back {
            ReadBack::Stall(d) => {
                tokio::time::sleep(d).await;
                self.inner.find(resource, id).await
            }
            ReadBack::Fail => Err(ServiceError::Db("connection reset".into())),
            ReadBack::Missing => Ok(None),
        }
    }

    async fn update(&self, resource: &str, id: Uuid, patch: Patch) -> Result<Option<Record>, ServiceError> {
        self.inner.update(resource, id, patch).await
    }

    async fn delete(&self, resource: &str, id: Uuid) -> Result<bool, ServiceError> {
        self.inner.delete(resource, id).await
    }

    async fn list(&self, resource: &str, filters: &BTreeMap<String, String>, window: Window) -> Result<Vec<Record>, ServiceError> {
        self.inner.list(resource, filters, window).await
    }
}
