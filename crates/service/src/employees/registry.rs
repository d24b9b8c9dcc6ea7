use std::{collections::HashMap, future::Future, pin::Pin, sync::Arc};

use configs::{AppConfig, DatabaseConfig, MongoConfig, StorageConfig};
use thiserror::Error;
use tracing::{debug, info};

use super::backend::EmployeesBackend;

/// Everything a backend factory may need to construct its storage medium.
#[derive(Debug, Clone, Default)]
pub struct BackendDeps {
    pub storage: StorageConfig,
    pub database: DatabaseConfig,
    pub mongo: MongoConfig,
}

impl BackendDeps {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self { storage: cfg.storage.clone(), database: cfg.database.clone(), mongo: cfg.mongo.clone() }
    }
}

pub type BackendFuture = Pin<Box<dyn Future<Output = anyhow::Result<Arc<dyn EmployeesBackend>>> + Send>>;

/// Async constructor of a ready backend.
pub type BackendFactory = Arc<dyn Fn(BackendDeps) -> BackendFuture + Send + Sync>;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("backend '{0}' is already registered")]
    DuplicateRegistration(String),
    #[error("unknown backend '{key}'; available: {}", available.join(", "))]
    UnknownBackend { key: String, available: Vec<String> },
    #[error("backend '{key}' failed to initialize: {message}")]
    Factory { key: String, message: String },
}

/// Key -> factory table, built explicitly at bootstrap.
#[derive(Default, Clone)]
pub struct BackendRegistry {
    factories: HashMap<String, BackendFactory>,
}

impl BackendRegistry {
    pub fn new() -> Self { Self::default() }

    /// Record `factory` under `key`. A key can be registered only once.
    pub fn register<F, Fut>(&mut self, key: &str, factory: F) -> Result<(), RegistryError>
    where
        F: Fn(BackendDeps) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Arc<dyn EmployeesBackend>>> + Send + 'static,
    {
        if self.factories.contains_key(key) {
            return Err(RegistryError::DuplicateRegistration(key.to_string()));
        }
        let boxed: BackendFactory = Arc::new(move |deps| -> BackendFuture { Box::pin(factory(deps)) });
        self.factories.insert(key.to_string(), boxed);
        debug!(key, "backend registered");
        Ok(())
    }

    /// Construct and initialize the backend registered under `key`.
    pub async fn resolve(&self, key: &str, deps: BackendDeps) -> Result<Arc<dyn EmployeesBackend>, RegistryError> {
        let factory = self.factories.get(key).cloned().ok_or_else(|| RegistryError::UnknownBackend {
            key: key.to_string(),
            available: self.list_keys(),
        })?;
        let backend = factory(deps)
            .await
            .map_err(|e| RegistryError::Factory { key: key.to_string(), message: format!("{e:#}") })?;
        info!(key, "employees backend ready");
        Ok(backend)
    }

    /// Registered keys, sorted.
    pub fn list_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.factories.keys().cloned().collect();
        keys.sort();
        keys
    }
}
