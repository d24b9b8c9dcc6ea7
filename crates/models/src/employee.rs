use sea_orm::entity::prelude::*;
use sea_orm::QueryFilter;
use serde::{Deserialize, Serialize};

/// Row of the `employees` table.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "employees")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub full_name: String,
    pub avatar: String,
    pub department: String,
    pub birth_date: String,
    pub salary: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Query helper scoped to a single employee id.
pub fn by_id(id: &str) -> Select<Entity> {
    Entity::find().filter(Column::Id.eq(id))
}

/// All rows, or only those in `department` when given.
pub fn by_department(department: Option<&str>) -> Select<Entity> {
    match department {
        Some(dep) => Entity::find().filter(Column::Department.eq(dep)),
        None => Entity::find(),
    }
}
