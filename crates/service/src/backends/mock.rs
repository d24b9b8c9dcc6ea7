use std::sync::Arc;

use async_trait::async_trait;

use crate::employees::{BackendDeps, BackendRegistry, Employee, EmployeeError, EmployeePatch, EmployeesBackend, NewEmployee, RegistryError};

/// No-op backend for wiring tests: empty lists and default records.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockEmployees;

#[async_trait]
impl EmployeesBackend for MockEmployees {
    async fn get_all(&self, _department: Option<&str>) -> Result<Vec<Employee>, EmployeeError> {
        Ok(Vec::new())
    }

    async fn get_employee(&self, _id: &str) -> Result<Employee, EmployeeError> {
        Ok(Employee::default())
    }

    async fn add_employee(&self, _employee: NewEmployee) -> Result<Employee, EmployeeError> {
        Ok(Employee::default())
    }

    async fn update_employee(&self, _id: &str, _patch: EmployeePatch) -> Result<Employee, EmployeeError> {
        Ok(Employee::default())
    }

    async fn delete_employee(&self, _id: &str) -> Result<Employee, EmployeeError> {
        Ok(Employee::default())
    }

    async fn save(&self) -> Result<(), EmployeeError> {
        Ok(())
    }
}

async fn open_mock(_deps: BackendDeps) -> anyhow::Result<Arc<dyn EmployeesBackend>> {
    Ok(Arc::new(MockEmployees) as Arc<dyn EmployeesBackend>)
}

pub fn register(registry: &mut BackendRegistry) -> Result<(), RegistryError> {
    registry.register("mock", open_mock)
}
