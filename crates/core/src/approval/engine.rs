//! Approval state mutation shared by every approvable request kind.
//!
//! [`ApprovalEngine`] never touches storage. It works on a copy of the
//! request's [`ApprovalState`] and only writes it back once the whole
//! transition succeeded, so a failed decision leaves the request untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::approval::directory::{Employee, EmployeeDirectory};
use crate::approval::error::ApprovalError;
use crate::approval::events::{ApprovalEvent, ApprovalOutcome};
use crate::approval::flow::ApprovalFlow;
use crate::approval::resolver::{StepResolver, Stepper};
use crate::approval::trail::ApprovalTrail;
use crate::approval::types::{ApprovalEntry, Decision, OverallStatus, RequestKind};

/// Trail plus the overall status projected from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalState {
    /// Ordered approval history.
    pub trail: ApprovalTrail,
    /// Current overall status.
    pub overall_status: OverallStatus,
}

/// Capability shared by leave, project and task requests.
pub trait Approvable {
    /// Kind of request.
    fn request_kind(&self) -> RequestKind;
    /// Request identifier.
    fn request_id(&self) -> Uuid;
    /// Applicant employee code.
    fn applicant_id(&self) -> &str;
    /// Flow the request was created against.
    fn flow_id(&self) -> Uuid;
    /// Optimistic concurrency version.
    fn version(&self) -> i32;
    /// Current approval state.
    fn approval_state(&self) -> &ApprovalState;
    /// Mutable approval state.
    fn approval_state_mut(&mut self) -> &mut ApprovalState;
    /// Employees the request names besides the applicant, e.g. an assignee.
    fn referenced_employees(&self) -> Vec<&str> {
        Vec::new()
    }
}

/// Result of a successful decision.
#[derive(Debug, Clone)]
pub struct DecisionOutcome {
    /// New overall status.
    pub overall_status: OverallStatus,
    /// Chain as resolved after the decision.
    pub stepper: Stepper,
    /// Events to publish once the new state is persisted.
    pub events: Vec<ApprovalEvent>,
}

/// Stateless approval engine.
pub struct ApprovalEngine;

impl ApprovalEngine {
    /// Builds the initial state of a new request.
    ///
    /// The trail starts with the applicant's submitted entry and, unless
    /// nobody can approve, the first pending approver.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the applicant's role is not in the flow.
    pub fn initiate<D: EmployeeDirectory + ?Sized>(
        kind: RequestKind,
        request_id: Uuid,
        applicant: &Employee,
        flow: &ApprovalFlow,
        directory: &D,
        now: DateTime<Utc>,
    ) -> Result<(ApprovalState, Vec<ApprovalEvent>), ApprovalError> {
        let mut trail = ApprovalTrail::new(ApprovalEntry::submitted(applicant, now));
        let stepper = StepResolver::resolve(
            &applicant.employee_id,
            &applicant.role,
            flow,
            &trail,
            directory,
        )?;

        let pending = stepper.pending_step().cloned();
        if let Some(entry) = &pending {
            trail.push_pending(entry.clone());
        }
        let overall_status = stepper.overall_status();

        let event = |outcome| ApprovalEvent {
            kind,
            request_id,
            applicant_id: applicant.employee_id.clone(),
            outcome,
            occurred_at: now,
        };
        let mut events = vec![event(ApprovalOutcome::Submitted {
            next_approver_id: pending.as_ref().map(|e| e.employee_id.clone()),
            next_role: pending.as_ref().map(|e| e.role.clone()),
        })];
        if overall_status == OverallStatus::Approved {
            events.push(event(ApprovalOutcome::Approved { actor_id: None }));
        }

        Ok((
            ApprovalState {
                trail,
                overall_status,
            },
            events,
        ))
    }

    /// Applies an approver's decision to `request`.
    ///
    /// On success the request's state is replaced; on error it is unchanged.
    ///
    /// # Errors
    ///
    /// - `EmployeeNotFound` if the actor is unknown
    /// - `NotPendingApprover` if the actor is the applicant or has no entry
    /// - `DuplicateAction` if the actor already acted
    /// - `Configuration` if the flow no longer contains the applicant's role
    pub fn apply_decision<R, D>(
        request: &mut R,
        flow: &ApprovalFlow,
        directory: &D,
        actor_id: &str,
        decision: Decision,
        comments: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<DecisionOutcome, ApprovalError>
    where
        R: Approvable + ?Sized,
        D: EmployeeDirectory + ?Sized,
    {
        let actor = directory
            .find_employee(actor_id)
            .ok_or_else(|| ApprovalError::EmployeeNotFound(actor_id.to_string()))?;

        if actor.employee_id == request.applicant_id() {
            return Err(ApprovalError::NotPendingApprover {
                employee_id: actor.employee_id.clone(),
                role: actor.role.clone(),
            });
        }

        let mut trail = request.approval_state().trail.clone();
        trail.record_decision(actor, decision, comments.clone(), now)?;

        let applicant_role = Self::applicant_role(request, directory)?;
        let stepper =
            StepResolver::resolve(request.applicant_id(), &applicant_role, flow, &trail, directory)?;

        let (overall_status, outcome) = match decision {
            Decision::Rejected => (
                OverallStatus::RejectedBy(actor.role.clone()),
                ApprovalOutcome::Rejected {
                    actor_id: actor.employee_id.clone(),
                    role: actor.role.clone(),
                    comments,
                },
            ),
            Decision::Approved => match stepper.pending_step() {
                None => (
                    OverallStatus::Approved,
                    ApprovalOutcome::Approved {
                        actor_id: Some(actor.employee_id.clone()),
                    },
                ),
                Some(next) => {
                    trail.push_pending(next.clone());
                    (
                        OverallStatus::PendingFor(next.role.clone()),
                        ApprovalOutcome::Advanced {
                            actor_id: actor.employee_id.clone(),
                            next_approver_id: next.employee_id.clone(),
                            next_role: next.role.clone(),
                        },
                    )
                }
            },
        };

        let event = ApprovalEvent {
            kind: request.request_kind(),
            request_id: request.request_id(),
            applicant_id: request.applicant_id().to_string(),
            outcome,
            occurred_at: now,
        };

        *request.approval_state_mut() = ApprovalState {
            trail,
            overall_status: overall_status.clone(),
        };

        Ok(DecisionOutcome {
            overall_status,
            stepper,
            events: vec![event],
        })
    }

    /// Replays resolution over the stored trail without changing anything.
    ///
    /// # Errors
    ///
    /// Same as [`StepResolver::resolve`].
    pub fn stepper<R, D>(
        request: &R,
        flow: &ApprovalFlow,
        directory: &D,
    ) -> Result<Stepper, ApprovalError>
    where
        R: Approvable + ?Sized,
        D: EmployeeDirectory + ?Sized,
    {
        let applicant_role = Self::applicant_role(request, directory)?;
        StepResolver::resolve(
            request.applicant_id(),
            &applicant_role,
            flow,
            &request.approval_state().trail,
            directory,
        )
    }

    // The submitted entry pins the role the request was filed under, so a
    // later promotion of the applicant does not reroute an open request.
    fn applicant_role<R, D>(request: &R, directory: &D) -> Result<String, ApprovalError>
    where
        R: Approvable + ?Sized,
        D: EmployeeDirectory + ?Sized,
    {
        if let Some(entry) = request.approval_state().trail.first() {
            return Ok(entry.role.clone());
        }
        directory
            .find_employee(request.applicant_id())
            .map(|e| e.role.clone())
            .ok_or_else(|| ApprovalError::EmployeeNotFound(request.applicant_id().to_string()))
    }
}
