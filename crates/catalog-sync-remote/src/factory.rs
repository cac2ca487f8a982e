/// Backend factory pattern for building the remote catalog from configuration
///
/// The `remote.backend` setting names a registered factory; adding a
/// backend means registering one more factory here.
use crate::memory::MemoryCatalog;
use crate::rest::RestCatalog;
use crate::traits::RemoteCatalog;
use anyhow::{anyhow, Result};
use catalog_sync_config::{Config, CredentialStore};
use std::collections::HashMap;
use std::sync::Arc;

/// Environment variable consulted when no API key is stored in the credentials file
pub const API_KEY_ENV: &str = "MARQUEE_API_KEY";

pub trait BackendFactory: Send + Sync {
    fn backend_name(&self) -> &str;

    fn create(&self, config: &Config, credentials: &CredentialStore) -> Result<Arc<dyn RemoteCatalog>>;
}

pub struct BackendRegistry {
    factories: HashMap<String, Box<dyn BackendFactory>>,
}

impl BackendRegistry {
    /// Registry with the built-in backends
    pub fn new() -> Self {
        let mut registry = Self {
            factories: HashMap::new(),
        };
        registry.register(Box::new(RestFactory));
        registry.register(Box::new(MemoryFactory));
        registry
    }

    pub fn register(&mut self, factory: Box<dyn BackendFactory>) {
        self.factories.insert(factory.backend_name().to_string(), factory);
    }

    /// Build the backend selected by `config.remote.backend`
    pub fn create(&self, config: &Config, credentials: &CredentialStore) -> Result<Arc<dyn RemoteCatalog>> {
        let name = config.remote.backend.as_str();
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| anyhow!("Unknown remote backend: {}", name))?;
        factory.create(config, credentials)
    }

    pub fn registered_backends(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

struct RestFactory;

impl BackendFactory for RestFactory {
    fn backend_name(&self) -> &str {
        "rest"
    }

    fn create(&self, config: &Config, credentials: &CredentialStore) -> Result<Arc<dyn RemoteCatalog>> {
        config.validate()?;

        let api_key = credentials
            .get_remote_api_key()
            .cloned()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "No API key for the catalog service. Store one with `marquee config set-key` or set {}",
                    API_KEY_ENV
                )
            })?;

        let catalog = RestCatalog::new(
            &config.remote.url,
            &api_key,
            &config.remote.changes_path,
            config.collections.clone(),
        )?;
        Ok(Arc::new(catalog))
    }
}

struct MemoryFactory;

impl BackendFactory for MemoryFactory {
    fn backend_name(&self) -> &str {
        "memory"
    }

    fn create(&self, _config: &Config, _credentials: &CredentialStore) -> Result<Arc<dyn RemoteCatalog>> {
        Ok(Arc::new(MemoryCatalog::new()))
    }
}
