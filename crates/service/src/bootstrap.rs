use configs::AppConfig;
use tracing::info;

use crate::backends;
use crate::employees::{BackendDeps, BackendRegistry, EmployeesFacade, RegistryError};

pub const DEFAULT_BACKEND: &str = "map";

/// Registry holding every built-in backend.
pub fn default_registry() -> Result<BackendRegistry, RegistryError> {
    let mut registry = BackendRegistry::new();
    backends::map::register(&mut registry)?;
    backends::sql::register(&mut registry)?;
    backends::mongo::register(&mut registry)?;
    backends::mock::register(&mut registry)?;
    Ok(registry)
}

/// CLI argument first, then `storage.backend` (which `EMPLOYEES_IMPL`
/// overrides), then [`DEFAULT_BACKEND`].
pub fn select_backend_key(cli_arg: Option<String>, cfg: &AppConfig) -> String {
    cli_arg
        .filter(|k| !k.trim().is_empty())
        .or_else(|| cfg.storage.backend.clone().filter(|k| !k.trim().is_empty()))
        .map(|k| k.trim().to_string())
        .unwrap_or_else(|| DEFAULT_BACKEND.to_string())
}

/// Resolve `key` once and bind the resulting backend to a facade.
pub async fn bootstrap(registry: &BackendRegistry, key: &str, cfg: &AppConfig) -> Result<EmployeesFacade, RegistryError> {
    info!(key, available = ?registry.list_keys(), "resolving employees backend");
    let backend = registry.resolve(key, BackendDeps::from_config(cfg)).await?;
    Ok(EmployeesFacade::new(key, backend))
}
