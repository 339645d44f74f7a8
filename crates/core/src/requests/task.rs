//! Task assignment requests.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use hrflow_shared::types::TaskAssignmentId;

use crate::approval::{Approvable, ApprovalError, ApprovalState, RequestKind};

/// Input for a new task assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTaskAssignment {
    /// Short task title.
    pub title: String,
    /// Employee code of the assignee.
    pub assignee_id: String,
    /// Project assignment the task belongs to.
    pub project_id: Option<Uuid>,
    /// Optional due date.
    pub due_date: Option<NaiveDate>,
}

impl NewTaskAssignment {
    /// Title and assignee are required; a due date may not lie before `today`.
    pub fn validate(&self, today: NaiveDate) -> Result<(), ApprovalError> {
        if self.title.trim().is_empty() {
            return Err(ApprovalError::InvalidRequest("title is required".to_string()));
        }
        if self.assignee_id.trim().is_empty() {
            return Err(ApprovalError::InvalidRequest(
                "assignee_id is required".to_string(),
            ));
        }
        if let Some(due) = self.due_date
            && due < today
        {
            return Err(ApprovalError::InvalidRequest(format!(
                "due_date {due} is in the past"
            )));
        }
        Ok(())
    }
}

/// A task assignment with its approval state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskAssignment {
    /// Request identifier.
    pub id: TaskAssignmentId,
    /// Employee code of the requester.
    pub applicant_id: String,
    /// Flow the request was created against.
    pub flow_id: Uuid,
    /// Short task title.
    pub title: String,
    /// Employee code of the assignee.
    pub assignee_id: String,
    /// Project assignment the task belongs to, if any.
    pub project_id: Option<Uuid>,
    /// Optional due date.
    pub due_date: Option<NaiveDate>,
    /// Approval trail and overall status.
    pub approval: ApprovalState,
    /// Optimistic concurrency version, bumped on every write.
    pub version: i32,
    /// Submission time.
    pub created_at: DateTime<Utc>,
    /// Last change to the approval state.
    pub updated_at: DateTime<Utc>,
}

impl Approvable for TaskAssignment {
    fn request_kind(&self) -> RequestKind {
        RequestKind::Task
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

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    #[test]
    fn test_validate_due_date() {
        let task = NewTaskAssignment {
            title: "Write onboarding guide".into(),
            assignee_id: "EMP0003".into(),
            project_id: None,
            due_date: NaiveDate::from_ymd_opt(2026, 10, 20),
        };
        assert!(task.validate(today()).is_ok());

        let overdue = NewTaskAssignment {
            due_date: NaiveDate::from_ymd_opt(2026, 10, 1),
            ..task.clone()
        };
        assert!(matches!(
            overdue.validate(today()),
            Err(ApprovalError::InvalidRequest(_))
        ));

        let untitled = NewTaskAssignment {
            title: String::new(),
            ..task
        };
        assert!(untitled.validate(today()).is_err());
    }
}
