use std::sync::Arc;

use async_trait::async_trait;
use migration::{Migrator, MigratorTrait};
use models::{
    db::{connect_with_config, DatabaseConfig},
    employee,
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel, Set, SqlErr};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::employees::backend::{resolve_id, EmployeesBackend};
use crate::employees::{BackendDeps, BackendRegistry, Employee, EmployeeError, EmployeePatch, NewEmployee, RegistryError};

/// Relational backend over the `employees` table (SQLite or PostgreSQL).
pub struct SqlEmployees {
    conn: RwLock<Option<DatabaseConnection>>,
}

impl SqlEmployees {
    /// Connect and make sure the schema exists.
    pub async fn connect(cfg: &DatabaseConfig) -> anyhow::Result<Self> {
        let db = connect_with_config(cfg).await?;
        Migrator::up(&db, None).await?;
        debug!("employees schema ready");
        Ok(Self { conn: RwLock::new(Some(db)) })
    }

    async fn conn(&self) -> Result<DatabaseConnection, EmployeeError> {
        self.conn.read().await.clone().ok_or(EmployeeError::Closed)
    }

    async fn find(&self, db: &DatabaseConnection, id: &str) -> Result<employee::Model, EmployeeError> {
        employee::by_id(id)
            .one(db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| EmployeeError::NotFound(id.to_string()))
    }
}

fn db_err(e: DbErr) -> EmployeeError {
    EmployeeError::storage(e)
}

fn to_employee(m: employee::Model) -> Employee {
    Employee {
        id: m.id,
        full_name: m.full_name,
        avatar: m.avatar,
        department: m.department,
        birth_date: m.birth_date,
        salary: m.salary,
    }
}

fn to_model(e: &Employee) -> employee::Model {
    employee::Model {
        id: e.id.clone(),
        full_name: e.full_name.clone(),
        avatar: e.avatar.clone(),
        department: e.department.clone(),
        birth_date: e.birth_date.clone(),
        salary: e.salary,
    }
}

#[async_trait]
impl EmployeesBackend for SqlEmployees {
    async fn get_all(&self, department: Option<&str>) -> Result<Vec<Employee>, EmployeeError> {
        let db = self.conn().await?;
        let rows = employee::by_department(department).all(&db).await.map_err(db_err)?;
        Ok(rows.into_iter().map(to_employee).collect())
    }

    async fn get_employee(&self, id: &str) -> Result<Employee, EmployeeError> {
        let db = self.conn().await?;
        self.find(&db, id).await.map(to_employee)
    }

    async fn add_employee(&self, input: NewEmployee) -> Result<Employee, EmployeeError> {
        let db = self.conn().await?;
        let id = resolve_id(input.id.as_deref());
        if employee::by_id(&id).one(&db).await.map_err(db_err)?.is_some() {
            return Err(EmployeeError::AlreadyExists(id));
        }
        let record = input.into_employee(id);
        // a concurrent insert of the same id surfaces as a unique violation
        match employee::Entity::insert(to_model(&record).into_active_model()).exec_without_returning(&db).await {
            Ok(_) => Ok(record),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(EmployeeError::AlreadyExists(record.id))
            }
            Err(e) => Err(db_err(e)),
        }
    }

    async fn update_employee(&self, id: &str, patch: EmployeePatch) -> Result<Employee, EmployeeError> {
        let db = self.conn().await?;
        let current = self.find(&db, id).await?;
        if patch.is_empty() {
            return Ok(to_employee(current));
        }
        let mut am = current.into_active_model();
        if let Some(v) = patch.full_name { am.full_name = Set(v); }
        if let Some(v) = patch.avatar { am.avatar = Set(v); }
        if let Some(v) = patch.department { am.department = Set(v); }
        if let Some(v) = patch.birth_date { am.birth_date = Set(v); }
        if let Some(v) = patch.salary { am.salary = Set(v); }
        match am.update(&db).await {
            Ok(m) => Ok(to_employee(m)),
            Err(DbErr::RecordNotUpdated) => Err(EmployeeError::NotFound(id.to_string())),
            Err(e) => Err(db_err(e)),
        }
    }

    async fn delete_employee(&self, id: &str) -> Result<Employee, EmployeeError> {
        let db = self.conn().await?;
        let current = self.find(&db, id).await?;
        let res = employee::Entity::delete_by_id(id.to_string()).exec(&db).await.map_err(db_err)?;
        if res.rows_affected == 0 {
            return Err(EmployeeError::NotFound(id.to_string()));
        }
        Ok(to_employee(current))
    }

    async fn save(&self) -> Result<(), EmployeeError> {
        let Some(db) = self.conn.write().await.take() else {
            warn!("sql backend already closed");
            return Ok(());
        };
        db.close().await.map_err(db_err)?;
        info!("database connection closed");
        Ok(())
    }
}

fn is_sqlite(url: &str) -> bool {
    url.to_lowercase().starts_with("sqlite:")
}

async fn open_sqlite(deps: BackendDeps) -> anyhow::Result<Arc<dyn EmployeesBackend>> {
    let mut cfg = deps.database;
    if !is_sqlite(&cfg.url) {
        warn!("database.url is not a sqlite url; using the default sqlite file");
        cfg.url = DatabaseConfig::default().url;
    }
    Ok(Arc::new(SqlEmployees::connect(&cfg).await?) as Arc<dyn EmployeesBackend>)
}

async fn open_postgres(deps: BackendDeps) -> anyhow::Result<Arc<dyn EmployeesBackend>> {
    if is_sqlite(&deps.database.url) {
        anyhow::bail!("postgres backend needs a postgres:// url in DATABASE_URL");
    }
    Ok(Arc::new(SqlEmployees::connect(&deps.database).await?) as Arc<dyn EmployeesBackend>)
}

/// Register `sqlite` and `postgres`.
pub fn register(registry: &mut BackendRegistry) -> Result<(), RegistryError> {
    registry.register("sqlite", open_sqlite)?;
    registry.register("postgres", open_postgres)?;
    Ok(())
}
