//! Approval engine error types.
//!
//! Every failure here is local and recoverable by the caller retrying with
//! corrected input. Notification failures never appear here: they are
//! dispatched after the transition and swallowed by the dispatcher.

use hrflow_shared::AppError;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur while resolving or mutating an approval trail.
#[derive(Debug, Error)]
pub enum ApprovalError {
    /// The applicant's role is not a member of the configured flow.
    #[error("Role {role} is not part of the {request_type} approval flow")]
    Configuration {
        /// The applicant's role.
        role: String,
        /// The flow's request type.
        request_type: String,
    },

    /// A flow definition failed validation.
    #[error("Invalid approval flow: {0}")]
    InvalidFlow(String),

    /// A request payload failed validation.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No flow configured for the request type.
    #[error("No approval flow configured for {request_type} ({display_name})")]
    FlowNotFound {
        /// The request type looked up.
        request_type: String,
        /// The display name looked up, or `any`.
        display_name: String,
    },

    /// Applicant or approver does not exist.
    #[error("Employee {0} not found")]
    EmployeeNotFound(String),

    /// Request does not exist.
    #[error("Request {0} not found")]
    RequestNotFound(Uuid),

    /// The actor's entry for this step is already terminal.
    #[error("Employee {employee_id} has already taken action as {role}")]
    DuplicateAction {
        /// The acting employee.
        employee_id: String,
        /// The role the action was attempted under.
        role: String,
    },

    /// The actor has no entry on this request at all.
    #[error("Employee {employee_id} is not allowed to act on this request as {role}")]
    NotPendingApprover {
        /// The acting employee.
        employee_id: String,
        /// The role the action was attempted under.
        role: String,
    },

    /// Only the applicant may withdraw a request.
    #[error("Employee {0} is not the applicant of this request")]
    NotApplicant(String),

    /// The request is already approved or rejected.
    #[error("Request {0} is already finalized")]
    Finalized(Uuid),

    /// Optimistic write kept losing to concurrent writers.
    #[error("Request {0} was modified concurrently")]
    ConcurrentModification(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl ApprovalError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::DuplicateAction { .. } | Self::InvalidFlow(_) | Self::InvalidRequest(_) => 400,
            Self::NotPendingApprover { .. } | Self::NotApplicant(_) => 403,
            Self::FlowNotFound { .. } | Self::EmployeeNotFound(_) | Self::RequestNotFound(_) => {
                404
            }
            Self::ConcurrentModification(_) | Self::Finalized(_) => 409,
            Self::Configuration { .. } => 422,
            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "configuration_error",
            Self::InvalidFlow(_) => "invalid_flow",
            Self::InvalidRequest(_) => "invalid_request",
            Self::FlowNotFound { .. } => "flow_not_found",
            Self::EmployeeNotFound(_) => "employee_not_found",
            Self::RequestNotFound(_) => "request_not_found",
            Self::DuplicateAction { .. } => "already_taken_action",
            Self::NotPendingApprover { .. } => "not_allowed",
            Self::NotApplicant(_) => "not_applicant",
            Self::Finalized(_) => "request_finalized",
            Self::ConcurrentModification(_) => "concurrent_modification",
            Self::Database(_) => "internal_error",
        }
    }
}

impl From<ApprovalError> for AppError {
    fn from(err: ApprovalError) -> Self {
        let message = err.to_string();
        match err {
            ApprovalError::Configuration { .. } => Self::Configuration(message),
            ApprovalError::InvalidFlow(_) | ApprovalError::InvalidRequest(_) => {
                Self::Validation(message)
            }
            ApprovalError::FlowNotFound { .. }
            | ApprovalError::EmployeeNotFound(_)
            | ApprovalError::RequestNotFound(_) => Self::NotFound(message),
            ApprovalError::DuplicateAction { .. } => Self::DuplicateAction(message),
            ApprovalError::NotPendingApprover { .. } | ApprovalError::NotApplicant(_) => {
                Self::Forbidden(message)
            }
            ApprovalError::ConcurrentModification(_) | ApprovalError::Finalized(_) => {
                Self::Conflict(message)
            }
            ApprovalError::Database(_) => Self::Database(message),
        }
    }
}
