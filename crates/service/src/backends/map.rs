use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::employees::backend::{resolve_id, EmployeesBackend};
use crate::employees::{BackendDeps, BackendRegistry, Employee, EmployeeError, EmployeePatch, NewEmployee, RegistryError};
use crate::storage::JsonArrayFile;

#[derive(Default)]
struct MapState {
    employees: HashMap<String, Employee>,
    dirty: bool,
    closed: bool,
}

impl MapState {
    fn ensure_open(&self) -> Result<(), EmployeeError> {
        if self.closed {
            return Err(EmployeeError::Closed);
        }
        Ok(())
    }
}

/// Hash-map backend, optionally mirrored to a JSON array file.
///
/// The map and its dirty flag live under one lock; `save` writes the file
/// only when something changed since construction. A successful `save`
/// closes the store.
pub struct MapEmployees {
    state: RwLock<MapState>,
    file: Option<JsonArrayFile<NewEmployee>>,
}

impl MapEmployees {
    /// Ephemeral store with no file behind it.
    pub fn in_memory() -> Self {
        Self { state: RwLock::new(MapState::default()), file: None }
    }

    /// Load the file once; malformed records and records without an id are
    /// skipped.
    pub async fn with_file(file: JsonArrayFile<NewEmployee>) -> Result<Self, EmployeeError> {
        let loaded = file.read().await?;
        let mut employees = HashMap::with_capacity(loaded.len());
        for record in loaded {
            match record.id.clone().filter(|id| !id.is_empty()) {
                Some(id) => {
                    employees.insert(id.clone(), record.into_employee(id));
                }
                None => warn!(full_name = %record.full_name, "skipping employee without id"),
            }
        }
        info!(count = employees.len(), path = %file.path().display(), "employees loaded from file");
        Ok(Self { state: RwLock::new(MapState { employees, ..MapState::default() }), file: Some(file) })
    }

    /// Seed records directly, as if loaded; the store stays clean.
    pub async fn seeded(records: impl IntoIterator<Item = Employee>) -> Self {
        let me = Self::in_memory();
        {
            let mut state = me.state.write().await;
            for e in records {
                state.employees.insert(e.id.clone(), e);
            }
        }
        me
    }

    pub async fn is_dirty(&self) -> bool {
        self.state.read().await.dirty
    }
}

#[async_trait]
impl EmployeesBackend for MapEmployees {
    async fn get_all(&self, department: Option<&str>) -> Result<Vec<Employee>, EmployeeError> {
        let state = self.state.read().await;
        state.ensure_open()?;
        Ok(state
            .employees
            .values()
            .filter(|e| department.map_or(true, |d| e.department == d))
            .cloned()
            .collect())
    }

    async fn get_employee(&self, id: &str) -> Result<Employee, EmployeeError> {
        let state = self.state.read().await;
        state.ensure_open()?;
        state.employees.get(id).cloned().ok_or_else(|| EmployeeError::NotFound(id.to_string()))
    }

    async fn add_employee(&self, employee: NewEmployee) -> Result<Employee, EmployeeError> {
        let id = resolve_id(employee.id.as_deref());
        let mut state = self.state.write().await;
        state.ensure_open()?;
        if state.employees.contains_key(&id) {
            return Err(EmployeeError::AlreadyExists(id));
        }
        let record = employee.into_employee(id.clone());
        state.employees.insert(id, record.clone());
        state.dirty = true;
        Ok(record)
    }

    async fn update_employee(&self, id: &str, patch: EmployeePatch) -> Result<Employee, EmployeeError> {
        let mut state = self.state.write().await;
        state.ensure_open()?;
        let existing = state.employees.get_mut(id).ok_or_else(|| EmployeeError::NotFound(id.to_string()))?;
        patch.apply_to(existing);
        let updated = existing.clone();
        state.dirty = true;
        Ok(updated)
    }

    async fn delete_employee(&self, id: &str) -> Result<Employee, EmployeeError> {
        let mut state = self.state.write().await;
        state.ensure_open()?;
        let removed = state.employees.remove(id).ok_or_else(|| EmployeeError::NotFound(id.to_string()))?;
        state.dirty = true;
        Ok(removed)
    }

    async fn save(&self) -> Result<(), EmployeeError> {
        let mut state = self.state.write().await;
        if state.closed {
            warn!("map backend already closed");
            return Ok(());
        }
        let Some(file) = &self.file else {
            state.dirty = false;
            state.closed = true;
            return Ok(());
        };
        if state.dirty {
            let records: Vec<NewEmployee> = state.employees.values().cloned().map(NewEmployee::from).collect();
            // 写失败时保持打开且 dirty，允许重试
            file.write(&records).await?;
            state.dirty = false;
            info!(count = records.len(), path = %file.path().display(), "employees saved to file");
        } else {
            info!(path = %file.path().display(), "no changes, file not written");
        }
        state.closed = true;
        Ok(())
    }
}

async fn open_file_map(deps: BackendDeps) -> anyhow::Result<Arc<dyn EmployeesBackend>> {
    debug!(path = %deps.storage.data_file, "opening map backend");
    let backend = MapEmployees::with_file(JsonArrayFile::new(deps.storage.data_file)).await?;
    Ok(Arc::new(backend) as Arc<dyn EmployeesBackend>)
}

async fn open_memory(_deps: BackendDeps) -> anyhow::Result<Arc<dyn EmployeesBackend>> {
    Ok(Arc::new(MapEmployees::in_memory()) as Arc<dyn EmployeesBackend>)
}

/// Register `map` (file backed) and `memory`.
pub fn register(registry: &mut BackendRegistry) -> Result<(), RegistryError> {
    registry.register("map", open_file_map)?;
    registry.register("memory", open_memory)?;
    Ok(())
}
