//! Leave requests.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use hrflow_shared::types::LeaveRequestId;

use crate::approval::{Approvable, ApprovalError, ApprovalState, RequestKind};

/// Kind of leave being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveType {
    /// Paid annual leave.
    Annual,
    /// Sick leave.
    Sick,
    /// Short-notice casual leave.
    Casual,
    /// Unpaid leave.
    Unpaid,
}

impl LeaveType {
    /// Returns the string representation of the leave type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Annual => "annual",
            Self::Sick => "sick",
            Self::Casual => "casual",
            Self::Unpaid => "unpaid",
        }
    }

    /// Parses a leave type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "annual" => Some(Self::Annual),
            "sick" => Some(Self::Sick),
            "casual" => Some(Self::Casual),
            "unpaid" => Some(Self::Unpaid),
            _ => None,
        }
    }

    /// Unpaid leave is not drawn from a balance.
    #[must_use]
    pub const fn consumes_balance(&self) -> bool {
        !matches!(self, Self::Unpaid)
    }
}

impl fmt::Display for LeaveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Input for a new leave request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLeaveRequest {
    /// Kind of leave.
    pub leave_type: LeaveType,
    /// First day of leave.
    pub start_date: NaiveDate,
    /// Last day of leave (inclusive).
    pub end_date: NaiveDate,
    /// Days taken; half days allowed.
    pub days: Decimal,
    /// Reason given by the applicant.
    #[serde(default)]
    pub reason: String,
}

impl NewLeaveRequest {
    /// Validates dates and day count.
    ///
    /// `days` must be positive and no larger than the calendar span.
    pub fn validate(&self) -> Result<(), ApprovalError> {
        if self.end_date < self.start_date {
            return Err(ApprovalError::InvalidRequest(
                "end_date must not be before start_date".to_string(),
            ));
        }
        if self.days <= Decimal::ZERO {
            return Err(ApprovalError::InvalidRequest(
                "days must be greater than zero".to_string(),
            ));
        }
        let span = (self.end_date - self.start_date).num_days() + 1;
        if self.days > Decimal::from(span) {
            return Err(ApprovalError::InvalidRequest(format!(
                "days ({}) exceeds the requested period of {span} day(s)",
                self.days
            )));
        }
        Ok(())
    }
}

/// A leave request with its approval state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveRequest {
    /// Request identifier.
    pub id: LeaveRequestId,
    /// Applicant employee code.
    pub applicant_id: String,
    /// Flow the request was created against.
    pub flow_id: Uuid,
    /// Kind of leave.
    pub leave_type: LeaveType,
    /// First day of leave.
    pub start_date: NaiveDate,
    /// Last day of leave.
    pub end_date: NaiveDate,
    /// Days taken.
    pub days: Decimal,
    /// Reason given by the applicant.
    pub reason: String,
    /// Approval trail and status.
    pub approval: ApprovalState,
    /// Optimistic concurrency version.
    pub version: i32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Approvable for LeaveRequest {
    fn request_kind(&self) -> RequestKind {
        RequestKind::Leave
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
}
