use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use serde::Deserialize;

/// Resource schemas compiled into the binary; used when the config file
/// declares no `[[resources]]`.
const DEFAULT_RESOURCES: &str = include_str!("../resources.default.toml");

/// Field names managed by the record itself and therefore not declarable.
pub const RESERVED_FIELDS: [&str; 4] = ["id", "status", "created_at", "updated_at"];

/// Top-level paths served by the HTTP layer itself.
pub const RESERVED_RESOURCE_NAMES: [&str; 3] = ["health", "metrics", "api-docs"];

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub resources: Vec<ResourceConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
        }
    }
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }

/// Which `RecordStore` implementation backs the resources.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    #[default]
    File,
    Memory,
}

impl std::str::FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "file" => Ok(Self::File),
            "memory" => Ok(Self::Memory),
            other => Err(anyhow!("unknown storage backend `{other}` (expected postgres, file or memory)")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Deadline applied to every store operation.
    #[serde(default = "default_op_timeout")]
    pub op_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { backend: StorageBackend::default(), data_dir: default_data_dir(), op_timeout_ms: default_op_timeout() }
    }
}

fn default_data_dir() -> PathBuf { PathBuf::from("data") }
fn default_op_timeout() -> u64 { 5_000 }

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    String,
    Integer,
    Number,
    Boolean,
    /// RFC 3339 date-time string.
    Timestamp,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Integer => "integer",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
            FieldKind::Timestamp => "timestamp",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FieldConfig {
    pub name: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
}

/// Declarative schema for one CRUD resource.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ResourceConfig {
    /// Collection name, used as the URL segment (`/claims`).
    pub name: String,
    /// Status allow-list; the first entry is the initial status.
    pub statuses: Vec<String>,
    /// Fields accepted as exact-match list filters.
    #[serde(default)]
    pub filters: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
    #[serde(default = "default_page_size")]
    pub default_limit: u64,
    #[serde(default = "default_max_limit")]
    pub max_limit: u64,
}

fn default_page_size() -> u64 { 20 }
fn default_max_limit() -> u64 { 100 }

#[derive(Debug, Deserialize)]
struct ResourceFile {
    #[serde(default)]
    resources: Vec<ResourceConfig>,
}

/// Built-in resource schemas (claims, customers, vehicles, notifications, appointments).
pub fn default_resources() -> Result<Vec<ResourceConfig>> {
    let file: ResourceFile = toml::from_str(DEFAULT_RESOURCES)?;
    Ok(file.resources)
}

pub fn config_path() -> String {
    std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string())
}

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `config.toml` (or `CONFIG_PATH`), normalize and validate. A missing
    /// file falls back to defaults plus `SERVER_HOST`/`SERVER_PORT` from the
    /// environment.
    pub fn load_or_default() -> Result<Self> {
        let path = config_path();
        let mut cfg = match std::fs::read_to_string(&path) {
            Ok(content) => load_from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let mut cfg = AppConfig::default();
                cfg.server.apply_env();
                cfg
            }
            Err(e) => return Err(anyhow!("cannot read {path}: {e}")),
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.storage.normalize_from_env()?;
        self.storage.validate()?;
        self.database.normalize_from_env();
        if self.storage.backend == StorageBackend::Postgres {
            self.database.validate()?;
        }
        if self.resources.is_empty() {
            self.resources = default_resources()?;
        }
        validate_resources(&self.resources)
    }
}

impl ServerConfig {
    fn apply_env(&mut self) {
        if let Ok(host) = std::env::var("SERVER_HOST") {
            self.host = host;
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            self.port = port;
        }
    }

    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl StorageConfig {
    pub fn normalize_from_env(&mut self) -> Result<()> {
        if let Ok(backend) = std::env::var("STORAGE_BACKEND") {
            self.backend = backend.parse()?;
        }
        if let Ok(dir) = std::env::var("DATA_DIR") {
            if !dir.trim().is_empty() {
                self.data_dir = PathBuf::from(dir);
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.op_timeout_ms == 0 {
            return Err(anyhow!("storage.op_timeout_ms must be a positive number of milliseconds"));
        }
        if self.backend == StorageBackend::File && self.data_dir.as_os_str().is_empty() {
            return Err(anyhow!("storage.data_dir is required for the file backend"));
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env(&mut self) {
        if self.url.trim().is_empty() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                self.url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or DATABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url must start with postgresql:// or postgres://"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }
}

impl ResourceConfig {
    pub fn validate(&self) -> Result<()> {
        let name = self.name.trim();
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            return Err(anyhow!("resource name `{}` must be non-empty and URL-safe", self.name));
        }
        if RESERVED_RESOURCE_NAMES.contains(&name) {
            return Err(anyhow!("resource name `{name}` is reserved"));
        }
        if self.statuses.is_empty() {
            return Err(anyhow!("resource `{name}` needs at least one status"));
        }
        let mut statuses = HashSet::new();
        for s in &self.statuses {
            if s.trim().is_empty() || !statuses.insert(s.as_str()) {
                return Err(anyhow!("resource `{name}` has a blank or duplicate status `{s}`"));
            }
        }
        let mut fields = HashSet::new();
        for f in &self.fields {
            if f.name.trim().is_empty() {
                return Err(anyhow!("resource `{name}` declares a field with an empty name"));
            }
            if RESERVED_FIELDS.contains(&f.name.as_str()) {
                return Err(anyhow!("resource `{name}` cannot declare reserved field `{}`", f.name));
            }
            if !fields.insert(f.name.as_str()) {
                return Err(anyhow!("resource `{name}` declares field `{}` twice", f.name));
            }
        }
        for filter in &self.filters {
            if filter != "status" && !fields.contains(filter.as_str()) {
                return Err(anyhow!("resource `{name}` filter `{filter}` is not a declared field"));
            }
        }
        if self.max_limit == 0 {
            return Err(anyhow!("resource `{name}` max_limit must be >= 1"));
        }
        if self.default_limit > self.max_limit {
            return Err(anyhow!("resource `{name}` default_limit must be <= max_limit"));
        }
        Ok(())
    }
}

fn validate_resources(resources: &[ResourceConfig]) -> Result<()> {
    let mut names = HashSet::new();
    for r in resources {
        r.validate()?;
        if !names.insert(r.name.as_str()) {
            return Err(anyhow!("resource `{}` is declared twice", r.name));
        }
    }
    Ok(())
}
