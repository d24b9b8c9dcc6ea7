use async_trait::async_trait;

use super::domain::{Employee, EmployeePatch, NewEmployee};
use super::errors::EmployeeError;

/// Uniform CRUD contract over employee records.
///
/// Implementations own their storage medium and release it in `save`.
#[async_trait]
pub trait EmployeesBackend: Send + Sync {
    /// All records, or those whose department equals `department`.
    async fn get_all(&self, department: Option<&str>) -> Result<Vec<Employee>, EmployeeError>;
    async fn get_employee(&self, id: &str) -> Result<Employee, EmployeeError>;
    /// Store a record, generating a UUID v4 when `id` is unset.
    async fn add_employee(&self, employee: NewEmployee) -> Result<Employee, EmployeeError>;
    async fn update_employee(&self, id: &str, patch: EmployeePatch) -> Result<Employee, EmployeeError>;
    /// Remove a record and return it as it was before removal.
    async fn delete_employee(&self, id: &str) -> Result<Employee, EmployeeError>;
    /// Flush buffered state and release owned resources.
    async fn save(&self) -> Result<(), EmployeeError>;
}

/// Final id for a new record: the supplied one, or a fresh UUID v4.
pub fn resolve_id(requested: Option<&str>) -> String {
    match requested.filter(|s| !s.trim().is_empty()) {
        Some(id) => id.to_string(),
        None => uuid::Uuid::new_v4().to_string(),
    }
}
