//! `SeaORM` Entity for employees table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "employees")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub employee_id: String,
    pub name: String,
    pub email: Option<String>,
    pub role: String,
    pub department: Option<String>,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::reporting_lines::Entity")]
    ReportingLines,
}

impl Related<super::reporting_lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReportingLines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
