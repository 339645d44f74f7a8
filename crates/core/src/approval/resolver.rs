//! Approver resolution ("stepper").
//!
//! Given an applicant, a flow and the trail recorded so far, the resolver
//! materializes who occupies every approver step and how far the request got.
//! It is a pure function of its inputs: replaying it over the same trail and
//! directory snapshot always yields the same steps.

use serde::Serialize;

use crate::approval::directory::{Employee, EmployeeDirectory};
use crate::approval::error::ApprovalError;
use crate::approval::flow::{ApprovalFlow, FlowStep};
use crate::approval::trail::ApprovalTrail;
use crate::approval::types::{ApprovalEntry, ApprovalStatus, OverallStatus, same_role};

/// Resolved view of a request's approval chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stepper {
    /// Applicant entry followed by resolved approver entries.
    pub steps: Vec<ApprovalEntry>,
    /// Role of the first step no approver could be found for.
    pub truncated_at: Option<String>,
}

impl Stepper {
    /// The single open step, if the chain ends in one.
    #[must_use]
    pub fn pending_step(&self) -> Option<&ApprovalEntry> {
        self.steps
            .iter()
            .find(|e| e.status == ApprovalStatus::Pending)
    }

    /// The rejecting step, if the chain ends in one.
    #[must_use]
    pub fn rejected_step(&self) -> Option<&ApprovalEntry> {
        self.steps
            .iter()
            .find(|e| e.status == ApprovalStatus::Rejected)
    }

    /// Overall status projected from the resolved steps.
    ///
    /// A chain cut short by a missing approver with nothing pending counts
    /// as approved.
    #[must_use]
    pub fn overall_status(&self) -> OverallStatus {
        if let Some(rejected) = self.rejected_step() {
            return OverallStatus::RejectedBy(rejected.role.clone());
        }
        match self.pending_step() {
            Some(pending) => OverallStatus::PendingFor(pending.role.clone()),
            None => OverallStatus::Approved,
        }
    }
}

/// Stateless approver resolution.
pub struct StepResolver;

impl StepResolver {
    /// Resolves every step of `flow` for the applicant.
    ///
    /// Each approver is found by walking one hop up the reporting chain from
    /// the previous step's occupant. If that manager is inactive or holds a
    /// different role, the lowest-coded active holder of the step's role is
    /// used instead. Resolution stops at the first pending or rejected step,
    /// or at the first step nobody can fill.
    ///
    /// # Errors
    ///
    /// - `Configuration` if `applicant_role` is not part of the flow
    /// - `EmployeeNotFound` if the trail is empty and the applicant is unknown
    pub fn resolve<D: EmployeeDirectory + ?Sized>(
        applicant_id: &str,
        applicant_role: &str,
        flow: &ApprovalFlow,
        trail: &ApprovalTrail,
        directory: &D,
    ) -> Result<Stepper, ApprovalError> {
        let applicant_entry = match trail.first() {
            Some(entry) => entry.clone(),
            None => {
                let applicant = directory
                    .find_employee(applicant_id)
                    .ok_or_else(|| ApprovalError::EmployeeNotFound(applicant_id.to_string()))?;
                ApprovalEntry {
                    status: ApprovalStatus::Submitted,
                    ..ApprovalEntry::pending(applicant, &applicant.role)
                }
            }
        };

        let remaining = flow.steps_after(applicant_role)?;

        let mut steps = vec![applicant_entry];
        let mut truncated_at = None;
        let mut cursor = applicant_id.to_string();

        for step in remaining {
            let Some(approver) = Self::find_approver(&cursor, step, directory) else {
                truncated_at = Some(step.role.clone());
                break;
            };
            cursor.clone_from(&approver.employee_id);

            match trail.find(&approver.employee_id, &step.role) {
                Some(entry)
                    if matches!(
                        entry.status,
                        ApprovalStatus::Approved | ApprovalStatus::Submitted
                    ) =>
                {
                    steps.push(entry.clone());
                }
                Some(entry) if entry.status == ApprovalStatus::Rejected => {
                    steps.push(entry.clone());
                    break;
                }
                _ => {
                    steps.push(ApprovalEntry::pending(approver, &step.role));
                    break;
                }
            }
        }

        Ok(Stepper {
            steps,
            truncated_at,
        })
    }

    fn find_approver<'d, D: EmployeeDirectory + ?Sized>(
        previous: &str,
        step: &FlowStep,
        directory: &'d D,
    ) -> Option<&'d Employee> {
        let manager = directory
            .find_manager_of(previous)
            .and_then(|id| directory.find_employee(id))
            .filter(|m| m.is_active && same_role(&m.role, &step.role));

        manager.or_else(|| directory.find_active_by_role(&step.role, step.department.as_deref()))
    }
}
