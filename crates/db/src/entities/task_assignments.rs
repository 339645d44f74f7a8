//! `SeaORM` Entity for task_assignments table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "task_assignments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub applicant_id: String,
    pub flow_id: Uuid,
    pub title: String,
    pub assignee_id: String,
    pub project_id: Option<Uuid>,
    pub due_date: Option<Date>,
    #[sea_orm(column_type = "JsonBinary")]
    pub approval_trail: Json,
    pub overall_state: String,
    pub overall_role: Option<String>,
    pub version: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::project_assignments::Entity",
        from = "Column::ProjectId",
        to = "super::project_assignments::Column::Id"
    )]
    ProjectAssignments,
}

impl Related<super::project_assignments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProjectAssignments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
