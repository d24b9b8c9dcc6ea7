use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

use super::backend::EmployeesBackend;
use super::domain::{Employee, EmployeePatch, NewEmployee};
use super::errors::EmployeeError;

/// The single resolved backend the HTTP layer talks to.
///
/// Once `save` has succeeded the facade is closed: every further operation
/// fails with [`EmployeeError::Closed`] and another `save` is a no-op. A
/// failed `save` leaves it open so the flush can be retried.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use service::backends::map::MapEmployees;
/// use service::employees::{EmployeesFacade, EmployeeError, NewEmployee};
///
/// let facade = EmployeesFacade::new("memory", Arc::new(MapEmployees::in_memory()));
/// let added = tokio_test::block_on(facade.add_employee(NewEmployee {
///     full_name: "Ann Lee".into(),
///     department: "QA".into(),
///     birth_date: "1990-01-01".into(),
///     salary: 10000,
///     ..Default::default()
/// })).unwrap();
/// assert!(!added.id.is_empty());
/// tokio_test::block_on(facade.save()).unwrap();
/// assert_eq!(tokio_test::block_on(facade.get_all(None)), Err(EmployeeError::Closed));
/// ```
pub struct EmployeesFacade {
    key: String,
    backend: Arc<dyn EmployeesBackend>,
    closed: AtomicBool,
    save_lock: Mutex<()>,
}

impl EmployeesFacade {
    pub fn new(key: impl Into<String>, backend: Arc<dyn EmployeesBackend>) -> Self {
        Self { key: key.into(), backend, closed: AtomicBool::new(false), save_lock: Mutex::new(()) }
    }

    /// Registry key the backend was resolved from.
    pub fn key(&self) -> &str { &self.key }

    pub fn is_closed(&self) -> bool { self.closed.load(Ordering::Acquire) }

    fn ensure_open(&self) -> Result<(), EmployeeError> {
        if self.is_closed() {
            warn!(backend = %self.key, "operation on closed employees backend");
            return Err(EmployeeError::Closed);
        }
        Ok(())
    }

    #[instrument(skip(self), fields(backend = %self.key))]
    pub async fn get_all(&self, department: Option<&str>) -> Result<Vec<Employee>, EmployeeError> {
        self.ensure_open()?;
        let all = self.backend.get_all(department).await?;
        debug!(count = all.len(), "employees listed");
        Ok(all)
    }

    #[instrument(skip(self), fields(backend = %self.key))]
    pub async fn get_employee(&self, id: &str) -> Result<Employee, EmployeeError> {
        self.ensure_open()?;
        self.backend.get_employee(id).await
    }

    #[instrument(skip(self, employee), fields(backend = %self.key, requested_id = ?employee.id))]
    pub async fn add_employee(&self, employee: NewEmployee) -> Result<Employee, EmployeeError> {
        self.ensure_open()?;
        let added = self.backend.add_employee(employee).await?;
        info!(id = %added.id, "employee_added");
        Ok(added)
    }

    #[instrument(skip(self, patch), fields(backend = %self.key))]
    pub async fn update_employee(&self, id: &str, patch: EmployeePatch) -> Result<Employee, EmployeeError> {
        self.ensure_open()?;
        let updated = self.backend.update_employee(id, patch).await?;
        info!(id = %updated.id, "employee_updated");
        Ok(updated)
    }

    #[instrument(skip(self), fields(backend = %self.key))]
    pub async fn delete_employee(&self, id: &str) -> Result<Employee, EmployeeError> {
        self.ensure_open()?;
        let deleted = self.backend.delete_employee(id).await?;
        info!(id = %deleted.id, "employee_deleted");
        Ok(deleted)
    }

    /// Flush and release the backend. Saves run one at a time; once one has
    /// succeeded later calls do not reach the backend.
    #[instrument(skip(self), fields(backend = %self.key))]
    pub async fn save(&self) -> Result<(), EmployeeError> {
        let _guard = self.save_lock.lock().await;
        if self.is_closed() {
            warn!("save called on closed employees backend; ignoring");
            return Ok(());
        }
        if let Err(e) = self.backend.save().await {
            error!(error = %e, "employees backend save failed; still open");
            return Err(e);
        }
        self.closed.store(true, Ordering::Release);
        info!("employees backend saved and closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::map::MapEmployees;
    use crate::storage::JsonArrayFile;

    fn facade() -> EmployeesFacade {
        EmployeesFacade::new("memory", Arc::new(MapEmployees::in_memory()))
    }

    #[tokio::test]
    async fn operations_after_save_fail_closed() {
        let f = facade();
        let added = f
            .add_employee(NewEmployee { full_name: "A B".into(), department: "QA".into(), ..Default::default() })
            .await
            .unwrap();
        f.save().await.unwrap();
        assert!(f.is_closed());
        assert_eq!(f.get_all(None).await, Err(EmployeeError::Closed));
        assert_eq!(f.get_employee(&added.id).await, Err(EmployeeError::Closed));
        assert_eq!(f.add_employee(NewEmployee::default()).await, Err(EmployeeError::Closed));
        assert_eq!(f.update_employee(&added.id, EmployeePatch::default()).await, Err(EmployeeError::Closed));
        assert_eq!(f.delete_employee(&added.id).await, Err(EmployeeError::Closed));
    }

    #[tokio::test]
    async fn second_save_is_noop() {
        let f = facade();
        f.save().await.unwrap();
        f.save().await.unwrap();
        assert_eq!(f.key(), "memory");
    }

    #[tokio::test]
    async fn failed_save_can_be_retried() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("employees.json");
        let backend = MapEmployees::with_file(JsonArrayFile::new(&path)).await?;
        let f = EmployeesFacade::new("map", Arc::new(backend));
        let added = f
            .add_employee(NewEmployee { full_name: "A B".into(), department: "QA".into(), ..Default::default() })
            .await?;

        tokio::fs::remove_file(&path).await?;
        tokio::fs::create_dir(&path).await?;
        assert!(matches!(f.save().await, Err(EmployeeError::Storage(_))));
        assert!(!f.is_closed());

        tokio::fs::remove_dir(&path).await?;
        f.save().await?;
        assert!(f.is_closed());
        let raw = tokio::fs::read_to_string(&path).await?;
        assert!(raw.contains(&added.id), "{raw}");
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_saves_reach_backend_once() {
        let f = Arc::new(facade());
        let (a, b) = tokio::join!(
            tokio::spawn({
                let f = Arc::clone(&f);
                async move { f.save().await }
            }),
            tokio::spawn({
                let f = Arc::clone(&f);
                async move { f.save().await }
            })
        );
        assert_eq!(a.unwrap(), Ok(()));
        assert_eq!(b.unwrap(), Ok(()));
        assert!(f.is_closed());
    }

    #[tokio::test]
    async fn domain_errors_pass_through() {
        let f = facade();
        assert_eq!(f.get_employee("missing").await, Err(EmployeeError::NotFound("missing".into())));
    }
}
