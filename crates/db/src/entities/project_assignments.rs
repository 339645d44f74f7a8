//! `SeaORM` Entity for project_assignments table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "project_assignments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub applicant_id: String,
    pub flow_id: Uuid,
    pub project_name: String,
    pub assignee_id: String,
    pub description: String,
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
        belongs_to = "super::approval_flows::Entity",
        from = "Column::FlowId",
        to = "super::approval_flows::Column::Id"
    )]
    ApprovalFlows,
}

impl Related<super::approval_flows::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApprovalFlows.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
