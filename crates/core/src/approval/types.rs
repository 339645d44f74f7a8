//! Approval domain types shared by every approvable request.
//!
//! This module defines the per-entry status, the decision an approver can
//! take, the trail entry itself and the structured overall status whose
//! display form ("Pending for Manager") is what clients render.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::approval::directory::Employee;

/// Status of a single entry in an approval trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    /// The applicant's own entry.
    Submitted,
    /// Waiting on this approver.
    Pending,
    /// The approver accepted the request.
    Approved,
    /// The approver turned the request down.
    Rejected,
}

impl ApprovalStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Approved and Rejected end an approver's involvement.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Decision taken by an approver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// Accept and pass the request on.
    Approved,
    /// Turn the request down. Terminal for the whole request.
    Rejected,
}

impl Decision {
    /// Parses a decision, accepting both the verb and the participle.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "approve" | "approved" => Some(Self::Approved),
            "reject" | "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl From<Decision> for ApprovalStatus {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Approved => Self::Approved,
            Decision::Rejected => Self::Rejected,
        }
    }
}

/// One row of an approval trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalEntry {
    /// Role the entry was made under.
    pub role: String,
    /// Employee occupying the role slot.
    pub employee_id: String,
    /// Display name of the employee.
    pub name: String,
    /// Current status of the slot.
    pub status: ApprovalStatus,
    /// Free-text comment left with a decision.
    pub comments: Option<String>,
    /// When the entry was submitted or decided. Pending entries have none.
    pub action_date: Option<DateTime<Utc>>,
}

impl ApprovalEntry {
    /// The applicant's own entry that opens every trail.
    #[must_use]
    pub fn submitted(applicant: &Employee, at: DateTime<Utc>) -> Self {
        Self {
            role: applicant.role.clone(),
            employee_id: applicant.employee_id.clone(),
            name: applicant.name.clone(),
            status: ApprovalStatus::Submitted,
            comments: None,
            action_date: Some(at),
        }
    }

    /// A slot waiting on `approver` acting as `role`.
    #[must_use]
    pub fn pending(approver: &Employee, role: &str) -> Self {
        Self {
            role: role.to_string(),
            employee_id: approver.employee_id.clone(),
            name: approver.name.clone(),
            status: ApprovalStatus::Pending,
            comments: None,
            action_date: None,
        }
    }

    /// A terminal entry recording `actor`'s decision.
    #[must_use]
    pub fn decided(
        actor: &Employee,
        decision: Decision,
        comments: Option<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            role: actor.role.clone(),
            employee_id: actor.employee_id.clone(),
            name: actor.name.clone(),
            status: decision.into(),
            comments,
            action_date: Some(at),
        }
    }

    /// True if this entry belongs to `employee_id` acting as `role`.
    #[must_use]
    pub fn is_for(&self, employee_id: &str, role: &str) -> bool {
        self.employee_id == employee_id && same_role(&self.role, role)
    }
}

/// Roles are matched case-insensitively ("HR" == "hr").
#[must_use]
pub fn same_role(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// Structured overall status of a request.
///
/// The canonical state is the `(state, role)` pair; the human readable
/// strings are produced by `Display` and never parsed for decisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "role")]
pub enum OverallStatus {
    /// Waiting on the holder of this role.
    #[serde(rename = "pending")]
    PendingFor(String),
    /// Every step approved.
    #[serde(rename = "approved")]
    Approved,
    /// Rejected by the holder of this role.
    #[serde(rename = "rejected")]
    RejectedBy(String),
}

impl OverallStatus {
    /// Returns the state keyword stored alongside the role.
    #[must_use]
    pub const fn state(&self) -> &'static str {
        match self {
            Self::PendingFor(_) => "pending",
            Self::Approved => "approved",
            Self::RejectedBy(_) => "rejected",
        }
    }

    /// Returns the role the state refers to, if any.
    #[must_use]
    pub fn role(&self) -> Option<&str> {
        match self {
            Self::PendingFor(role) | Self::RejectedBy(role) => Some(role),
            Self::Approved => None,
        }
    }

    /// Rebuilds the status from its stored `(state, role)` pair.
    pub fn from_parts(state: &str, role: Option<&str>) -> Option<Self> {
        match (state, role) {
            ("pending", Some(role)) => Some(Self::PendingFor(role.to_string())),
            ("approved", _) => Some(Self::Approved),
            ("rejected", Some(role)) => Some(Self::RejectedBy(role.to_string())),
            _ => None,
        }
    }

    /// Approved or rejected requests accept no further decisions.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::RejectedBy(_))
    }
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PendingFor(role) => write!(f, "Pending for {role}"),
            Self::Approved => write!(f, "Approved"),
            Self::RejectedBy(role) => write!(f, "Rejected by {role}"),
        }
    }
}

/// The three kinds of request that run through the approval engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    /// Leave request.
    Leave,
    /// Project assignment request.
    Project,
    /// Task assignment request.
    Task,
}

impl RequestKind {
    /// All kinds, in inbox display order.
    pub const ALL: [Self; 3] = [Self::Leave, Self::Project, Self::Task];

    /// Returns the path segment form of the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Leave => "leave",
            Self::Project => "project",
            Self::Task => "task",
        }
    }

    /// Parses a kind, accepting singular and plural forms.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "leave" | "leaves" => Some(Self::Leave),
            "project" | "projects" => Some(Self::Project),
            "task" | "tasks" => Some(Self::Task),
            _ => None,
        }
    }

    /// Request type key of the flow configured for this kind.
    #[must_use]
    pub const fn flow_request_type(&self) -> &'static str {
        match self {
            Self::Leave => "Leave",
            Self::Project | Self::Task => "Projects",
        }
    }

    /// Display name distinguishing sub-flows that share a request type.
    #[must_use]
    pub const fn flow_display_name(&self) -> &'static str {
        match self {
            Self::Leave => "Leave Request",
            Self::Project => "Project Assign Request",
            Self::Task => "Task Assign Request",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ApprovalStatus::Submitted, "submitted")]
    #[case(ApprovalStatus::Pending, "pending")]
    #[case(ApprovalStatus::Approved, "approved")]
    #[case(ApprovalStatus::Rejected, "rejected")]
    fn test_status_wire_name(#[case] status: ApprovalStatus, #[case] expected: &str) {
        assert_eq!(status.to_string(), expected);
        assert_eq!(serde_json::to_value(status).unwrap(), expected);
    }

    #[test]
    fn test_status_terminal() {
        assert!(!ApprovalStatus::Submitted.is_terminal());
        assert!(!ApprovalStatus::Pending.is_terminal());
        assert!(ApprovalStatus::Approved.is_terminal());
        assert!(ApprovalStatus::Rejected.is_terminal());
    }

    #[test]
    fn test_decision_parse() {
        assert_eq!(Decision::parse("approve"), Some(Decision::Approved));
        assert_eq!(Decision::parse("Approved"), Some(Decision::Approved));
        assert_eq!(Decision::parse("REJECT"), Some(Decision::Rejected));
        assert_eq!(Decision::parse("maybe"), None);
    }

    #[test]
    fn test_overall_status_display() {
        assert_eq!(
            OverallStatus::PendingFor("Manager".into()).to_string(),
            "Pending for Manager"
        );
        assert_eq!(OverallStatus::Approved.to_string(), "Approved");
        assert_eq!(
            OverallStatus::RejectedBy("HR".into()).to_string(),
            "Rejected by HR"
        );
    }

    #[test]
    fn test_overall_status_parts() {
        let status = OverallStatus::PendingFor("TeamLeader".into());
        let rebuilt = OverallStatus::from_parts(status.state(), status.role());
        assert_eq!(rebuilt, Some(status));

        assert_eq!(
            OverallStatus::from_parts("approved", None),
            Some(OverallStatus::Approved)
        );
        assert_eq!(OverallStatus::from_parts("pending", None), None);
        assert_eq!(OverallStatus::from_parts("unknown", Some("HR")), None);
    }

    #[test]
    fn test_overall_status_serde_shape() {
        let status = OverallStatus::RejectedBy("Manager".into());
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json, serde_json::json!({"state": "rejected", "role": "Manager"}));
        assert_eq!(json["state"], status.state());

        let pending = OverallStatus::PendingFor("HR".into());
        assert_eq!(serde_json::to_value(&pending).unwrap()["state"], pending.state());
        let back: OverallStatus =
            serde_json::from_value(serde_json::json!({"state": "pending", "role": "HR"})).unwrap();
        assert_eq!(back, pending);
    }

    #[test]
    fn test_same_role_ignores_case() {
        assert!(same_role("HR", "hr"));
        assert!(same_role(" Manager", "manager "));
        assert!(!same_role("Manager", "TeamLeader"));
    }

    #[test]
    fn test_request_kind_flow_keys() {
        assert_eq!(RequestKind::Leave.flow_request_type(), "Leave");
        assert_eq!(RequestKind::Project.flow_request_type(), "Projects");
        assert_eq!(RequestKind::Task.flow_request_type(), "Projects");
        assert_eq!(RequestKind::Task.flow_display_name(), "Task Assign Request");
        assert_eq!(RequestKind::parse("tasks"), Some(RequestKind::Task));
        assert_eq!(RequestKind::parse("payroll"), None);
    }
}
