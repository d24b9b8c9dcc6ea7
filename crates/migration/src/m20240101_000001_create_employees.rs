//! Create `employees` table.
//! Keyed by the string `id`; `department` is indexed for filtered scans.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Employees::Table)
                    .if_not_exists()
                    .col(string(Employees::Id).primary_key())
                    .col(string(Employees::FullName))
                    .col(string(Employees::Avatar).default(""))
                    .col(string(Employees::Department))
                    .col(string(Employees::BirthDate))
                    .col(big_integer(Employees::Salary))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_employees_department")
                    .table(Employees::Table)
                    .col(Employees::Department)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Employees::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Employees {
    Table,
    Id,
    FullName,
    Avatar,
    Department,
    BirthDate,
    Salary,
}
