use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use models::record::Record;
use models::schema::ResourceSchema;
use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::pagination::{Pagination, Window};
use crate::storage::RecordStore;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// CRUD operations for one resource type.
///
/// Validation runs against the resource schema before any store call, so a
/// rejected request never touches storage. Every store call is bounded by
/// `timeout`; the read-back after an insert gets its own deadline, so a slow
/// read never reports a committed create as failed.
#[derive(Clone)]
pub struct ResourceService {
    schema: Arc<ResourceSchema>,
    store: Arc<dyn RecordStore>,
    timeout: Duration,
}

impl ResourceService {
    pub fn new(schema: ResourceSchema, store: Arc<dyn RecordStore>) -> Self {
        Self { schema: Arc::new(schema), store, timeout: DEFAULT_TIMEOUT }
    }

    /// Same service with a different deadline for store calls.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self { timeout, ..self.clone() }
    }

    pub fn schema(&self) -> &ResourceSchema { &self.schema }
    pub fn name(&self) -> &str { self.schema.name() }
    pub fn timeout(&self) -> Duration { self.timeout }

    async fn guarded<T, F>(&self, fut: F) -> Result<T, ServiceError>
    where
        F: Future<Output = Result<T, ServiceError>>,
    {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| ServiceError::Timeout(self.timeout))?
    }

    #[instrument(skip(self, input), fields(resource = %self.name()))]
    pub async fn create(&self, input: &Map<String, Value>) -> Result<Record, ServiceError> {
        let draft = self.schema.validate_create(input)?;
        let written = self.guarded(self.store.insert(self.name(), Record::new(draft))).await?;
        let record = self.read_back(written).await;
        info!(id = %record.id, status = %record.status, "record created");
        Ok(record)
    }

    /// Stored form of a just-written record. The write already succeeded, so
    /// any read failure falls back to the written record.
    async fn read_back(&self, written: Record) -> Record {
        match self.guarded(self.store.find(self.name(), written.id)).await {
            Ok(Some(stored)) => stored,
            Ok(None) => {
                warn!(id = %written.id, "inserted record not visible on read-back");
                written
            }
            Err(e) => {
                warn!(id = %written.id, error = %e, "read-back after insert failed");
                written
            }
        }
    }

    #[instrument(skip(self), fields(resource = %self.name()))]
    pub async fn find(&self, id: Uuid) -> Result<Option<Record>, ServiceError> {
        self.guarded(self.store.find(self.name(), id)).await
    }

    /// Partial update: only keys present in `input` are validated and merged.
    #[instrument(skip(self, input), fields(resource = %self.name()))]
    pub async fn update(&self, id: Uuid, input: &Map<String, Value>) -> Result<Record, ServiceError> {
        let patch = self.schema.validate_patch(input)?;
        let record = self
            .guarded(self.store.update(self.name(), id, patch))
            .await?
            .ok_or_else(|| self.not_found(id))?;
        info!(id = %record.id, status = %record.status, "record updated");
        Ok(record)
    }

    #[instrument(skip(self), fields(resource = %self.name()))]
    pub async fn delete(&self, id: Uuid) -> Result<bool, ServiceError> {
        if !self.guarded(self.store.delete(self.name(), id)).await? {
            return Err(self.not_found(id));
        }
        info!(%id, "record deleted");
        Ok(true)
    }

    /// Filtered listing, newest first. Keys outside the filter allow-list are
    /// dropped; `limit` and `offset` are clamped rather than rejected.
    #[instrument(skip(self, filters), fields(resource = %self.name()))]
    pub async fn list(&self, filters: &BTreeMap<String, String>, limit: i64, offset: i64) -> Result<Vec<Record>, ServiceError> {
        let window = Window::clamped(limit, offset, self.schema.max_limit());
        self.list_window(filters, window).await
    }

    /// Page-based listing as sent by HTTP clients.
    pub async fn list_page(&self, filters: &BTreeMap<String, String>, page: Pagination) -> Result<Vec<Record>, ServiceError> {
        let window = page.normalize(self.schema.default_limit(), self.schema.max_limit());
        self.list_window(filters, window).await
    }

    async fn list_window(&self, filters: &BTreeMap<String, String>, window: Window) -> Result<Vec<Record>, ServiceError> {
        let allowed = self.allowed_filters(filters);
        if window.limit == 0 {
            return Ok(Vec::new());
        }
        self.guarded(self.store.list(self.name(), &allowed, window)).await
    }

    fn allowed_filters(&self, filters: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        filters
            .iter()
            .filter(|(k, _)| {
                let ok = self.schema.allows_filter(k);
                if !ok {
                    debug!(key = %k, "ignoring filter outside allow-list");
                }
                ok
            })
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn not_found(&self, id: Uuid) -> ServiceError {
        ServiceError::NotFound(format!("{} {} not found", self.name(), id))
    }
}
