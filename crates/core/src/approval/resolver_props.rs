//! Property-based tests for StepResolver.
//!
//! Random org charts are generated with one employee slot per
//! `(role, index)` pair and arbitrary reporting edges between them.

use chrono::Utc;
use proptest::prelude::*;
use uuid::Uuid;

use crate::approval::directory::{DirectorySnapshot, Employee, EmployeeDirectory};
use crate::approval::flow::{ApprovalFlow, FlowStep};
use crate::approval::resolver::StepResolver;
use crate::approval::trail::ApprovalTrail;
use crate::approval::types::{ApprovalEntry, ApprovalStatus};

/// A generated organisation plus the flow over its roles.
#[derive(Debug, Clone)]
pub(crate) struct Org {
    pub flow: ApprovalFlow,
    pub directory: DirectorySnapshot,
    pub codes: Vec<String>,
}

fn role_name(i: usize) -> String {
    format!("Role{i}")
}

/// Strategy for an org of 2-5 roles with up to 3 employees per role.
pub(crate) fn arb_org() -> impl Strategy<Value = Org> {
    (2usize..=5)
        .prop_flat_map(|roles| {
            (
                Just(roles),
                proptest::collection::vec((1usize..=3, any::<[bool; 3]>()), roles),
                proptest::collection::vec((any::<u16>(), any::<u16>()), 0..20),
            )
        })
        .prop_map(|(roles, staffing, edges)| {
            let mut employees = Vec::new();
            for (r, (count, active)) in staffing.iter().enumerate() {
                for (i, is_active) in active.iter().enumerate().take(*count) {
                    employees.push(Employee {
                        employee_id: format!("E{r}{i}"),
                        name: format!("Employee {r}{i}"),
                        role: role_name(r),
                        department: None,
                        email: None,
                        // The applicant slot is always active.
                        is_active: *is_active || (r == 0 && i == 0),
                    });
                }
            }
            let codes: Vec<String> = employees.iter().map(|e| e.employee_id.clone()).collect();
            let reporting = edges
                .into_iter()
                .map(|(from, to)| {
                    (
                        codes[usize::from(from) % codes.len()].clone(),
                        codes[usize::from(to) % codes.len()].clone(),
                    )
                })
                .collect::<std::collections::HashMap<_, _>>();

            let flow = ApprovalFlow {
                id: Uuid::nil(),
                request_type: "Leave".to_string(),
                display_name: "Leave Request".to_string(),
                steps: (0..roles)
                    .map(|r| FlowStep::new(&role_name(r), i32::try_from(r + 1).unwrap_or(i32::MAX)))
                    .collect(),
            };

            Org {
                flow,
                directory: DirectorySnapshot::new(employees, reporting),
                codes,
            }
        })
}

fn fresh_trail(org: &Org) -> ApprovalTrail {
    ApprovalTrail::new(ApprovalEntry::submitted(
        org.directory.find_employee("E00").unwrap(),
        Utc::now(),
    ))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Resolution never yields more than one Pending entry
    #[test]
    fn prop_at_most_one_pending(org in arb_org()) {
        let stepper = StepResolver::resolve("E00", "Role0", &org.flow, &fresh_trail(&org), &org.directory).unwrap();
        let pending = stepper.steps.iter().filter(|e| e.status == ApprovalStatus::Pending).count();
        prop_assert!(pending <= 1);
        if pending == 1 {
            prop_assert_eq!(stepper.steps.last().unwrap().status, ApprovalStatus::Pending);
        }
    }

    /// Resolution is idempotent over the same inputs
    #[test]
    fn prop_resolution_is_idempotent(org in arb_org()) {
        let trail = fresh_trail(&org);
        let first = StepResolver::resolve("E00", "Role0", &org.flow, &trail, &org.directory).unwrap();
        let second = StepResolver::resolve("E00", "Role0", &org.flow, &trail, &org.directory).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Every resolved approver is active and holds the step's role
    #[test]
    fn prop_resolved_approvers_match_steps(org in arb_org()) {
        let stepper = StepResolver::resolve("E00", "Role0", &org.flow, &fresh_trail(&org), &org.directory).unwrap();
        for (i, entry) in stepper.steps.iter().enumerate().skip(1) {
            let employee = org.directory.find_employee(&entry.employee_id).unwrap();
            prop_assert!(employee.is_active);
            prop_assert_eq!(&entry.role, &role_name(i));
        }
        prop_assert!(stepper.steps.len() <= org.flow.steps.len());
        prop_assert!(!org.codes.is_empty());
    }
}
