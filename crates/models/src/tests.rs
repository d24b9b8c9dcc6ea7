//! Schema + entity tests against a throwaway SQLite file.
use migration::MigratorTrait;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel, PaginatorTrait};

use crate::db::{connect_with_config, DatabaseConfig};
use crate::employee;

async fn setup_test_db(dir: &tempfile::TempDir) -> anyhow::Result<DatabaseConnection> {
    let file = dir.path().join("models.sqlite");
    let cfg = DatabaseConfig { url: configs::sqlite_url(&file.to_string_lossy()), max_connections: 1, ..DatabaseConfig::default() };
    let db = connect_with_config(&cfg).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

fn row(id: &str, department: &str) -> employee::Model {
    employee::Model {
        id: id.into(),
        full_name: format!("Employee {id}"),
        avatar: "https://example.com/a.png".into(),
        department: department.into(),
        birth_date: "1990-01-01".into(),
        salary: 10000,
    }
}

#[tokio::test]
async fn migration_is_idempotent() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let db = setup_test_db(&dir).await?;
    migration::Migrator::up(&db, None).await?;
    assert_eq!(employee::Entity::find().count(&db).await?, 0);
    Ok(())
}

#[tokio::test]
async fn employee_crud_and_department_filter() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let db = setup_test_db(&dir).await?;

    for (id, dep) in [("a", "QA"), ("b", "QA"), ("c", "Development")] {
        employee::Entity::insert(row(id, dep).into_active_model()).exec_without_returning(&db).await?;
    }

    let qa = employee::by_department(Some("QA")).all(&db).await?;
    assert_eq!(qa.len(), 2);
    assert!(employee::by_department(Some("kuku")).all(&db).await?.is_empty());
    assert_eq!(employee::by_department(None).count(&db).await?, 3);

    let found = employee::by_id("c").one(&db).await?.expect("row c");
    assert_eq!(found, row("c", "Development"));

    let mut am = found.into_active_model();
    am.salary = sea_orm::Set(30000);
    let updated = am.update(&db).await?;
    assert_eq!(updated.salary, 30000);
    assert_eq!(updated.department, "Development");

    employee::Entity::delete_by_id("c".to_string()).exec(&db).await?;
    assert!(employee::by_id("c").one(&db).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn duplicate_primary_key_is_a_unique_violation() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let db = setup_test_db(&dir).await?;
    employee::Entity::insert(row("dup", "QA").into_active_model()).exec_without_returning(&db).await?;
    let err = employee::Entity::insert(row("dup", "QA").into_active_model())
        .exec_without_returning(&db)
        .await
        .expect_err("second insert must fail");
    assert!(matches!(err.sql_err(), Some(sea_orm::SqlErr::UniqueConstraintViolation(_))));
    Ok(())
}
