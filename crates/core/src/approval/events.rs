//! Events emitted after a successful approval transition.
//!
//! Events are produced by the engine but only handed to an [`EventSink`] once
//! the new state has been written. Delivery failures must never surface to
//! the caller that triggered the transition.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::approval::types::RequestKind;

/// What happened to a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ApprovalOutcome {
    /// Request created and routed to its first approver.
    Submitted {
        /// First pending approver, if any.
        next_approver_id: Option<String>,
        /// Role of the first pending step, if any.
        next_role: Option<String>,
    },
    /// An approver approved and the request moved on.
    Advanced {
        /// Approver who acted.
        actor_id: String,
        /// Next pending approver.
        next_approver_id: String,
        /// Role of the next pending step.
        next_role: String,
    },
    /// Every step approved.
    Approved {
        /// Final approver, or `None` when nobody had to act.
        actor_id: Option<String>,
    },
    /// An approver rejected the request.
    Rejected {
        /// Approver who rejected.
        actor_id: String,
        /// Role they rejected under.
        role: String,
        /// Rejection comments.
        comments: Option<String>,
    },
}

/// A state transition to be dispatched to side-effect handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApprovalEvent {
    /// Request kind.
    pub kind: RequestKind,
    /// Request identifier.
    pub request_id: Uuid,
    /// Applicant employee code.
    pub applicant_id: String,
    /// Transition outcome.
    pub outcome: ApprovalOutcome,
    /// When the transition happened.
    pub occurred_at: DateTime<Utc>,
}

impl ApprovalEvent {
    /// Employees to notify about this event.
    #[must_use]
    pub fn recipients(&self) -> Vec<&str> {
        match &self.outcome {
            ApprovalOutcome::Submitted {
                next_approver_id, ..
            } => next_approver_id.iter().map(String::as_str).collect(),
            ApprovalOutcome::Advanced {
                next_approver_id, ..
            } => vec![self.applicant_id.as_str(), next_approver_id.as_str()],
            ApprovalOutcome::Approved { .. } | ApprovalOutcome::Rejected { .. } => {
                vec![self.applicant_id.as_str()]
            }
        }
    }

    /// True for approved and rejected outcomes.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self.outcome,
            ApprovalOutcome::Approved { .. } | ApprovalOutcome::Rejected { .. }
        )
    }
}

/// Receives events after the transition that produced them is durable.
pub trait EventSink: Send + Sync {
    /// Hands an event off for asynchronous delivery. Must not block.
    fn publish(&self, event: ApprovalEvent);
}

/// Sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn publish(&self, _event: ApprovalEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(outcome: ApprovalOutcome) -> ApprovalEvent {
        ApprovalEvent {
            kind: RequestKind::Leave,
            request_id: Uuid::nil(),
            applicant_id: "E1".to_string(),
            outcome,
            occurred_at: Utc::now(),
        }
    }

    #[test]
    fn test_recipients() {
        let submitted = event(ApprovalOutcome::Submitted {
            next_approver_id: Some("T1".into()),
            next_role: Some("TeamLeader".into()),
        });
        assert_eq!(submitted.recipients(), vec!["T1"]);
        assert!(!submitted.is_terminal());

        let advanced = event(ApprovalOutcome::Advanced {
            actor_id: "T1".into(),
            next_approver_id: "M1".into(),
            next_role: "Manager".into(),
        });
        assert_eq!(advanced.recipients(), vec!["E1", "M1"]);

        let rejected = event(ApprovalOutcome::Rejected {
            actor_id: "M1".into(),
            role: "Manager".into(),
            comments: None,
        });
        assert_eq!(rejected.recipients(), vec!["E1"]);
        assert!(rejected.is_terminal());
    }

    #[test]
    fn test_outcome_serialization_is_tagged() {
        let json = serde_json::to_value(ApprovalOutcome::Approved {
            actor_id: Some("H1".into()),
        })
        .unwrap();
        assert_eq!(json["type"], "approved");
        assert_eq!(json["actor_id"], "H1");
    }
}
