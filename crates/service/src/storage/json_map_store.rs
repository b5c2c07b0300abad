use std::{
    collections::HashMap,
    hash::Hash,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{fs, sync::RwLock};

use crate::errors::ServiceError;

/// Generic JSON file-backed key-value map store.
///
/// Persists a `HashMap<K, V>` to a JSON file, or keeps it in memory only when
/// created with [`JsonMapStore::in_memory`]. Intended for lightweight state
/// where a database is overkill: every write rewrites the whole file.
///
/// Writes are all-or-nothing. A mutation is applied to a copy of the map, the
/// copy is written to a temp file and renamed over the target, and only then
/// does it replace the in-memory map.
pub struct JsonMapStore<K, V> {
    inner: RwLock<HashMap<K, V>>,
    file_path: Option<PathBuf>,
}

fn io_err(path: &Path, e: std::io::Error) -> ServiceError {
    ServiceError::Db(format!("{}: {e}", path.display()))
}

impl<K, V> JsonMapStore<K, V>
where
    K: Eq + Hash + serde::Serialize + serde::de::DeserializeOwned + Clone + Send + Sync + 'static,
    V: serde::Serialize + serde::de::DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Initialize the store from a path. Creates the file with an empty map if missing;
    /// an unreadable or corrupt file is an error rather than an empty store.
    pub async fn new<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| io_err(parent, e))?;
        }

        let store = match fs::read(&file_path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Self::with_map(HashMap::new(), Some(file_path)),
            Ok(bytes) => {
                let map: HashMap<K, V> = serde_json::from_slice(&bytes)
                    .map_err(|e| ServiceError::Db(format!("corrupt store file {}: {e}", file_path.display())))?;
                Self::with_map(map, Some(file_path))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let store = Self::with_map(HashMap::new(), Some(file_path));
                store.persist(&HashMap::new()).await?;
                store
            }
            Err(e) => return Err(io_err(&file_path, e)),
        };
        Ok(Arc::new(store))
    }

    /// A store that never touches the filesystem.
    pub fn in_memory() -> Arc<Self> {
        Arc::new(Self::with_map(HashMap::new(), None))
    }

    fn with_map(map: HashMap<K, V>, file_path: Option<PathBuf>) -> Self {
        Self { inner: RwLock::new(map), file_path }
    }

    pub fn path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    async fn persist(&self, map: &HashMap<K, V>) -> Result<(), ServiceError> {
        let Some(path) = &self.file_path else { return Ok(()) };
        let data = serde_json::to_vec_pretty(map).map_err(|e| ServiceError::Db(e.to_string()))?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, data).await.map_err(|e| io_err(&tmp, e))?;
        fs::rename(&tmp, path).await.map_err(|e| io_err(path, e))?;
        Ok(())
    }

    /// All values, in no particular order.
    pub async fn values(&self) -> Vec<V> {
        let map = self.inner.read().await;
        map.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Get value by key.
    pub async fn get(&self, key: &K) -> Option<V> {
        let map = self.inner.read().await;
        map.get(key).cloned()
    }

    /// Insert or replace a value and persist; returns the previous value.
    pub async fn insert(self: &Arc<Self>, key: K, value: V) -> Result<Option<V>, ServiceError> {
        self.update_map(move |m| Ok(m.insert(key, value))).await
    }

    /// Remove a key and persist; returns whether it existed.
    pub async fn remove(self: &Arc<Self>, key: &K) -> Result<bool, ServiceError> {
        let key = key.clone();
        self.update_map(move |m| Ok(m.remove(&key).is_some())).await
    }

    /// Apply a mutation to the map and persist it atomically.
    ///
    /// The write runs on its own task: dropping the returned future does not
    /// interrupt it between the file and the in-memory swap. If `f` fails or
    /// the file cannot be written, nothing changes.
    pub async fn update_map<F, R>(self: &Arc<Self>, f: F) -> Result<R, ServiceError>
    where
        F: FnOnce(&mut HashMap<K, V>) -> Result<R, ServiceError> + Send + 'static,
        R: Send + 'static,
    {
        let this = Arc::clone(self);
        tokio::spawn(async move { this.commit(f).await })
            .await
            .map_err(|e| ServiceError::Db(format!("store write task failed: {e}")))?
    }

    async fn commit<F, R>(&self, f: F) -> Result<R, ServiceError>
    where
        F: FnOnce(&mut HashMap<K, V>) -> Result<R, ServiceError>,
    {
        let mut map = self.inner.write().await;
        let mut next = map.clone();
        let out = f(&mut next)?;
        self.persist(&next).await?;
        *map = next;
        Ok(out)
    }
}
