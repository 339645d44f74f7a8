//! Project assignment repository.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
    sea_query::Expr,
};
use uuid::Uuid;

use hrflow_core::requests::ProjectAssignment;

use crate::entities::project_assignments;
use crate::repositories::approval_store::{
    ApprovalColumns, ApprovalStore, pending_for, state_from_columns,
};

/// Project assignment repository.
#[derive(Debug, Clone)]
pub struct ProjectAssignmentRepository {
    db: DatabaseConnection,
}

impl ProjectAssignmentRepository {
    /// Creates a new project assignment repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ApprovalStore for ProjectAssignmentRepository {
    type Request = ProjectAssignment;

    async fn insert(&self, request: &ProjectAssignment) -> Result<(), DbErr> {
        let columns = ApprovalColumns::from_state(&request.approval)?;
        project_assignments::ActiveModel {
            id: Set(request.id.into_inner()),
            applicant_id: Set(request.applicant_id.clone()),
            flow_id: Set(request.flow_id),
            project_name: Set(request.project_name.clone()),
            assignee_id: Set(request.assignee_id.clone()),
            description: Set(request.description.clone()),
            approval_trail: Set(columns.trail),
            overall_state: Set(columns.state),
            overall_role: Set(columns.role),
            version: Set(request.version),
            created_at: Set(request.created_at.into()),
            updated_at: Set(request.updated_at.into()),
        }
        .insert(&self.db)
        .await?;
        Ok(())
    }

    async fn load(&self, id: Uuid) -> Result<Option<ProjectAssignment>, DbErr> {
        project_assignments::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(to_core)
            .transpose()
    }

    async fn save_approval(
        &self,
        request: &ProjectAssignment,
        expected_version: i32,
    ) -> Result<bool, DbErr> {
        let columns = ApprovalColumns::from_state(&request.approval)?;
        let result = project_assignments::Entity::update_many()
            .col_expr(project_assignments::Column::ApprovalTrail, Expr::value(columns.trail))
            .col_expr(project_assignments::Column::OverallState, Expr::value(columns.state))
            .col_expr(project_assignments::Column::OverallRole, Expr::value(columns.role))
            .col_expr(project_assignments::Column::Version, Expr::value(expected_version + 1))
            .col_expr(
                project_assignments::Column::UpdatedAt,
                Expr::value(chrono::Utc::now()),
            )
            .filter(project_assignments::Column::Id.eq(request.id.into_inner()))
            .filter(project_assignments::Column::Version.eq(expected_version))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected == 1)
    }

    async fn delete(&self, id: Uuid, expected_version: i32) -> Result<bool, DbErr> {
        let result = project_assignments::Entity::delete_many()
            .filter(project_assignments::Column::Id.eq(id))
            .filter(project_assignments::Column::Version.eq(expected_version))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected == 1)
    }

    async fn list_by_applicant(&self, applicant_id: &str) -> Result<Vec<ProjectAssignment>, DbErr> {
        project_assignments::Entity::find()
            .filter(project_assignments::Column::ApplicantId.eq(applicant_id))
            .order_by_desc(project_assignments::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(to_core)
            .collect()
    }

    async fn list_pending_for(&self, employee_id: &str) -> Result<Vec<ProjectAssignment>, DbErr> {
        project_assignments::Entity::find()
            .filter(pending_for(
                project_assignments::Column::ApprovalTrail,
                employee_id,
            ))
            .order_by_asc(project_assignments::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(to_core)
            .collect()
    }
}

fn to_core(model: project_assignments::Model) -> Result<ProjectAssignment, DbErr> {
    let approval = state_from_columns(
        model.approval_trail,
        &model.overall_state,
        model.overall_role.as_deref(),
    )?;

    Ok(ProjectAssignment {
        id: model.id.into(),
        applicant_id: model.applicant_id,
        flow_id: model.flow_id,
        project_name: model.project_name,
        assignee_id: model.assignee_id,
        description: model.description,
        approval,
        version: model.version,
        created_at: model.created_at.into(),
        updated_at: model.updated_at.into(),
    })
}
