//! `SeaORM` Entity for leave_requests table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "leave_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub applicant_id: String,
    pub flow_id: Uuid,
    pub leave_type: String,
    pub start_date: Date,
    pub end_date: Date,
    #[sea_orm(column_type = "Decimal(Some((5, 1)))")]
    pub days: Decimal,
    pub reason: String,
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
        belongs_to = "super::employees::Entity",
        from = "Column::ApplicantId",
        to = "super::employees::Column::EmployeeId"
    )]
    Employees,
    #[sea_orm(
        belongs_to = "super::approval_flows::Entity",
        from = "Column::FlowId",
        to = "super::approval_flows::Column::Id"
    )]
    ApprovalFlows,
}

impl Related<super::employees::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employees.def()
    }
}

impl Related<super::approval_flows::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApprovalFlows.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
