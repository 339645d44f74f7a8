//! Project assignment requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use hrflow_shared::types::ProjectAssignmentId;

use crate::approval::{Approvable, ApprovalError, ApprovalState, RequestKind};

/// Input for a new project assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProjectAssignment {
    /// Project the assignee is put on.
    pub project_name: String,
    /// Employee code of the assignee.
    pub assignee_id: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
}

impl NewProjectAssignment {
    /// Project name and assignee are required.
    pub fn validate(&self) -> Result<(), ApprovalError> {
        if self.project_name.trim().is_empty() {
            return Err(ApprovalError::InvalidRequest(
                "project_name is required".to_string(),
            ));
        }
        if self.assignee_id.trim().is_empty() {
            return Err(ApprovalError::InvalidRequest(
                "assignee_id is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// A project assignment with its approval state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectAssignment {
    /// Request identifier.
    pub id: ProjectAssignmentId,
    /// Employee code of the requester.
    pub applicant_id: String,
    /// Flow the request was created against.
    pub flow_id: Uuid,
    /// Project the assignee is put on.
    pub project_name: String,
    /// Employee code of the assignee.
    pub assignee_id: String,
    /// Free-text description.
    pub description: String,
    /// Approval trail and overall status.
    pub approval: ApprovalState,
    /// Optimistic concurrency version, bumped on every write.
    pub version: i32,
    /// Submission time.
    pub created_at: DateTime<Utc>,
    /// Last change to the approval state.
    pub updated_at: DateTime<Utc>,
}

impl Approvable for ProjectAssignment {
    fn request_kind(&self) -> RequestKind {
        RequestKind::Project
    }

    fn request_id(&self) -> Uuid {
        self.id.into_inner()
    }

    fn applicant_id(&self) -> &str {
        &self.applicant_id
    }

    fn flow_id(&self) -> Uuid {
        self.flow_id
    }

    fn version(&self) -> i32 {
        self.version
    }

    fn approval_state(&self) -> &ApprovalState {
        &self.approval
    }

    fn approval_state_mut(&mut self) -> &mut ApprovalState {
        &mut self.approval
    }

    fn referenced_employees(&self) -> Vec<&str> {
        vec![&self.assignee_id]
    }
}
