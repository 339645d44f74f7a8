//! The ordered approval trail embedded in every approvable request.
//!
//! All mutation goes through [`ApprovalTrail::push_pending`] and
//! [`ApprovalTrail::record_decision`], which keep the trail free of duplicate
//! pending slots for the same `(employee, role)` pair.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::approval::directory::Employee;
use crate::approval::error::ApprovalError;
use crate::approval::types::{ApprovalEntry, ApprovalStatus, Decision};

/// Ordered list of approval entries. The first entry is the applicant's.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApprovalTrail(Vec<ApprovalEntry>);

impl ApprovalTrail {
    /// Starts a trail with the applicant's submitted entry.
    #[must_use]
    pub fn new(submitted: ApprovalEntry) -> Self {
        Self(vec![submitted])
    }

    /// The applicant's entry, if the trail is not empty.
    #[must_use]
    pub fn first(&self) -> Option<&ApprovalEntry> {
        self.0.first()
    }

    /// Iterates entries in order.
    pub fn iter(&self) -> impl Iterator<Item = &ApprovalEntry> {
        self.0.iter()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the trail holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Latest entry for `employee_id` acting as `role`.
    #[must_use]
    pub fn find(&self, employee_id: &str, role: &str) -> Option<&ApprovalEntry> {
        self.0.iter().rev().find(|e| e.is_for(employee_id, role))
    }

    /// True if `employee_id` has an open pending slot as `role`.
    #[must_use]
    pub fn has_pending(&self, employee_id: &str, role: &str) -> bool {
        self.0
            .iter()
            .any(|e| e.status == ApprovalStatus::Pending && e.is_for(employee_id, role))
    }

    /// Appends a pending slot unless one already exists for the pair.
    ///
    /// Returns `true` if an entry was appended.
    pub fn push_pending(&mut self, entry: ApprovalEntry) -> bool {
        if self.has_pending(&entry.employee_id, &entry.role) {
            return false;
        }
        self.0.push(entry);
        true
    }

    /// Replaces the actor's pending slot with a terminal decision entry.
    ///
    /// # Errors
    ///
    /// - `DuplicateAction` if the actor's entry for their role is already terminal
    /// - `NotPendingApprover` if the actor has no entry for their role
    pub fn record_decision(
        &mut self,
        actor: &Employee,
        decision: Decision,
        comments: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<(), ApprovalError> {
        if !self.has_pending(&actor.employee_id, &actor.role) {
            return Err(match self.find(&actor.employee_id, &actor.role) {
                Some(_) => ApprovalError::DuplicateAction {
                    employee_id: actor.employee_id.clone(),
                    role: actor.role.clone(),
                },
                None => ApprovalError::NotPendingApprover {
                    employee_id: actor.employee_id.clone(),
                    role: actor.role.clone(),
                },
            });
        }

        self.0.retain(|e| {
            !(e.status == ApprovalStatus::Pending && e.is_for(&actor.employee_id, &actor.role))
        });
        self.0
            .push(ApprovalEntry::decided(actor, decision, comments, at));
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ApprovalTrail {
    type Item = &'a ApprovalEntry;
    type IntoIter = std::slice::Iter<'a, ApprovalEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
