//! Approval flow configuration model.
//!
//! A flow is an ordered list of roles. The applicant's own role is the first
//! conceptual step; every step after it needs an approver.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use crate::approval::error::ApprovalError;
use crate::approval::types::same_role;

/// One role slot of a flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowStep {
    /// Role that must act at this step.
    pub role: String,
    /// Position in the flow (ascending).
    pub sequence_no: i32,
    /// Restricts the fallback approver lookup to one department.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

impl FlowStep {
    /// Creates a step without a department restriction.
    #[must_use]
    pub fn new(role: &str, sequence_no: i32) -> Self {
        Self {
            role: role.to_string(),
            sequence_no,
            department: None,
        }
    }
}

/// A configured approval flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalFlow {
    /// Flow identifier.
    pub id: Uuid,
    /// Request type key, e.g. `Leave`.
    pub request_type: String,
    /// Distinguishes sub-flows sharing a request type.
    pub display_name: String,
    /// Steps in insertion order.
    pub steps: Vec<FlowStep>,
}

impl ApprovalFlow {
    /// Steps sorted by sequence number; equal numbers keep insertion order.
    #[must_use]
    pub fn ordered_steps(&self) -> Vec<&FlowStep> {
        let mut steps: Vec<&FlowStep> = self.steps.iter().collect();
        steps.sort_by_key(|s| s.sequence_no);
        steps
    }

    /// Steps that follow `applicant_role`.
    ///
    /// # Errors
    ///
    /// Returns `ApprovalError::Configuration` if the role is not in the flow.
    pub fn steps_after(&self, applicant_role: &str) -> Result<Vec<&FlowStep>, ApprovalError> {
        let ordered = self.ordered_steps();
        let position = ordered
            .iter()
            .position(|s| same_role(&s.role, applicant_role))
            .ok_or_else(|| ApprovalError::Configuration {
                role: applicant_role.to_string(),
                request_type: self.request_type.clone(),
            })?;

        Ok(ordered.into_iter().skip(position + 1).collect())
    }
}

/// Validation applied when flows are created or updated.
pub struct FlowValidator;

impl FlowValidator {
    /// Checks a flow definition before it is stored.
    ///
    /// Rules:
    /// - request type and display name are non-empty
    /// - at least two steps (submitter role plus one approver)
    /// - roles are non-empty and unique within the flow (case-insensitive)
    /// - sequence numbers are positive
    pub fn validate(
        request_type: &str,
        display_name: &str,
        steps: &[FlowStep],
    ) -> Result<(), ApprovalError> {
        if request_type.trim().is_empty() {
            return Err(ApprovalError::InvalidFlow(
                "request_type is required".to_string(),
            ));
        }
        if display_name.trim().is_empty() {
            return Err(ApprovalError::InvalidFlow(
                "display_name is required".to_string(),
            ));
        }
        if steps.len() < 2 {
            return Err(ApprovalError::InvalidFlow(
                "a flow needs the submitting role and at least one approver role".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for step in steps {
            if step.role.trim().is_empty() {
                return Err(ApprovalError::InvalidFlow("step role is required".to_string()));
            }
            if step.sequence_no <= 0 {
                return Err(ApprovalError::InvalidFlow(format!(
                    "sequence_no must be positive for role {}",
                    step.role
                )));
            }
            if !seen.insert(step.role.trim().to_lowercase()) {
                return Err(ApprovalError::InvalidFlow(format!(
                    "role {} appears more than once",
                    step.role
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flow(steps: Vec<FlowStep>) -> ApprovalFlow {
        ApprovalFlow {
            id: Uuid::nil(),
            request_type: "Leave".to_string(),
            display_name: "Leave Request".to_string(),
            steps,
        }
    }

    #[test]
    fn test_ordered_steps_by_sequence() {
        let f = flow(vec![
            FlowStep::new("HR", 4),
            FlowStep::new("Employee", 1),
            FlowStep::new("Manager", 3),
            FlowStep::new("TeamLeader", 2),
        ]);
        let roles: Vec<&str> = f.ordered_steps().iter().map(|s| s.role.as_str()).collect();
        assert_eq!(roles, vec!["Employee", "TeamLeader", "Manager", "HR"]);
    }

    #[test]
    fn test_equal_sequence_keeps_insertion_order() {
        let f = flow(vec![
            FlowStep::new("Employee", 1),
            FlowStep::new("Manager", 2),
            FlowStep::new("HR", 2),
        ]);
        let roles: Vec<&str> = f.ordered_steps().iter().map(|s| s.role.as_str()).collect();
        assert_eq!(roles, vec!["Employee", "Manager", "HR"]);
    }

    #[test]
    fn test_steps_after_applicant_role() {
        let f = flow(vec![
            FlowStep::new("Employee", 1),
            FlowStep::new("TeamLeader", 2),
            FlowStep::new("Manager", 3),
        ]);
        let after = f.steps_after("teamleader").unwrap();
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].role, "Manager");
    }

    #[test]
    fn test_steps_after_missing_role_is_configuration_error() {
        let f = flow(vec![FlowStep::new("Employee", 1), FlowStep::new("HR", 2)]);
        let result = f.steps_after("Intern");
        assert!(matches!(result, Err(ApprovalError::Configuration { .. })));
    }

    #[test]
    fn test_validate_ok() {
        let steps = vec![FlowStep::new("Employee", 1), FlowStep::new("HR", 2)];
        assert!(FlowValidator::validate("Leave", "Leave Request", &steps).is_ok());
    }

    #[test]
    fn test_validate_rejects_duplicate_roles() {
        let steps = vec![
            FlowStep::new("Employee", 1),
            FlowStep::new("HR", 2),
            FlowStep::new("hr", 3),
        ];
        let result = FlowValidator::validate("Leave", "Leave Request", &steps);
        assert!(matches!(result, Err(ApprovalError::InvalidFlow(_))));
    }

    #[test]
    fn test_validate_rejects_single_step() {
        let steps = vec![FlowStep::new("Employee", 1)];
        assert!(FlowValidator::validate("Leave", "Leave Request", &steps).is_err());
    }

    #[test]
    fn test_validate_rejects_blank_keys_and_bad_sequence() {
        let steps = vec![FlowStep::new("Employee", 1), FlowStep::new("HR", 2)];
        assert!(FlowValidator::validate(" ", "Leave Request", &steps).is_err());
        assert!(FlowValidator::validate("Leave", "", &steps).is_err());

        let steps = vec![FlowStep::new("Employee", 0), FlowStep::new("HR", 2)];
        assert!(FlowValidator::validate("Leave", "Leave Request", &steps).is_err());
    }
}
