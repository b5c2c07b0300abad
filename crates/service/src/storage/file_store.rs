use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use models::record::{newest_first, Patch, Record};
use uuid::Uuid;

use super::json_map_store::JsonMapStore;
use super::RecordStore;
use crate::errors::ServiceError;
use crate::pagination::Window;

type Collection = JsonMapStore<Uuid, Record>;

/// One [`JsonMapStore`] per resource, persisted as `<data_dir>/<resource>.json`
/// (or kept in memory).
pub struct FileRecordStore {
    collections: HashMap<String, Arc<Collection>>,
}

impl FileRecordStore {
    pub async fn open(data_dir: &Path, resources: &[String]) -> Result<Self, ServiceError> {
        let mut collections = HashMap::with_capacity(resources.len());
        for name in resources {
            let store = Collection::new(data_dir.join(format!("{name}.json"))).await?;
            tracing::debug!(resource = %name, records = store.len().await, "loaded collection");
            collections.insert(name.clone(), store);
        }
        Ok(Self { collections })
    }

    pub fn in_memory(resources: &[String]) -> Self {
        let collections = resources.iter().map(|n| (n.clone(), Collection::in_memory())).collect();
        Self { collections }
    }

    fn collection(&self, resource: &str) -> Result<&Arc<Collection>, ServiceError> {
        self.collections
            .get(resource)
            .ok_or_else(|| ServiceError::Db(format!("no collection for resource `{resource}`")))
    }
}

#[async_trait]
impl RecordStore for FileRecordStore {
    async fn insert(&self, resource: &str, record: Record) -> Result<Record, ServiceError> {
        let col = self.collection(resource)?;
        col.insert(record.id, record.clone()).await?;
        Ok(record)
    }

    async fn find(&self, resource: &str, id: Uuid) -> Result<Option<Record>, ServiceError> {
        Ok(self.collection(resource)?.get(&id).await)
    }

    async fn update(&self, resource: &str, id: Uuid, patch: Patch) -> Result<Option<Record>, ServiceError> {
        let col = self.collection(resource)?;
        col.update_map(move |m| {
            let Some(existing) = m.get_mut(&id) else { return Ok(None) };
            existing.apply(&patch);
            Ok(Some(existing.clone()))
        })
        .await
    }

    async fn delete(&self, resource: &str, id: Uuid) -> Result<bool, ServiceError> {
        let col = self.collection(resource)?;
        if col.get(&id).await.is_none() {
            return Ok(false);
        }
        col.remove(&id).await
    }

    async fn list(&self, resource: &str, filters: &BTreeMap<String, String>, window: Window) -> Result<Vec<Record>, ServiceError> {
        let mut rows: Vec<Record> = self
            .collection(resource)?
            .values()
            .await
            .into_iter()
            .filter(|r| r.matches(filters))
            .collect();
        rows.sort_by(newest_first);
        let offset = usize::try_from(window.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(window.limit).unwrap_or(usize::MAX);
        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }
}
