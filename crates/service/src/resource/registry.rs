use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use configs::ResourceConfig;
use models::schema::ResourceSchema;

use super::service::ResourceService;
use crate::errors::ServiceError;
use crate::storage::RecordStore;

/// All resource services of the process, keyed by collection name.
#[derive(Clone, Default)]
pub struct ResourceRegistry {
    services: BTreeMap<String, ResourceService>,
}

impl ResourceRegistry {
    pub fn new() -> Self { Self::default() }

    /// Build a service per schema, all sharing `store` and the same deadline.
    pub fn from_configs(configs: &[ResourceConfig], store: Arc<dyn RecordStore>, timeout: Duration) -> Result<Self, ServiceError> {
        let mut registry = Self::new();
        for cfg in configs {
            let schema = ResourceSchema::from_config(cfg)?;
            registry.register(ResourceService::new(schema, Arc::clone(&store)).with_timeout(timeout));
        }
        Ok(registry)
    }

    /// Add or replace a service under its resource name.
    pub fn register(&mut self, service: ResourceService) {
        self.services.insert(service.name().to_string(), service);
    }

    pub fn get(&self, name: &str) -> Option<&ResourceService> {
        self.services.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::file_store::FileRecordStore;

    #[test]
    fn builds_one_service_per_default_resource() -> Result<(), anyhow::Error> {
        let configs = configs::default_resources()?;
        let names: Vec<String> = configs.iter().map(|c| c.name.clone()).collect();
        let store = Arc::new(FileRecordStore::in_memory(&names));
        let registry = ResourceRegistry::from_configs(&configs, store, Duration::from_millis(250))?;

                assert_eq!(
            registry.names().collect::<Vec<_>>(),
            vec!["appointments", "claims", "customers", "notifications", "vehicles"]
        );
        let claims = registry.get("claims").expect("claims registered");
        assert_eq!(claims.timeout(), Duration::from_millis(250));
        assert_eq!(claims.schema().initial_status(), "PENDING");
        assert!(registry.get("invoices").is_none());
        Ok(())
    }
}
