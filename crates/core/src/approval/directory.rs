//! Employee directory and reporting chain as seen by the resolver.
//!
//! The resolver only reads through [`EmployeeDirectory`]. Production code
//! hands it a [`DirectorySnapshot`] loaded in a single read transaction so a
//! resolution never mixes two versions of the org chart.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::approval::types::same_role;

/// An employee as needed for approver resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    /// Employee code, e.g. `EMP0042`.
    pub employee_id: String,
    /// Display name.
    pub name: String,
    /// Organisational role, e.g. `Manager`.
    pub role: String,
    /// Department, if assigned.
    pub department: Option<String>,
    /// Work email used for notifications.
    pub email: Option<String>,
    /// Inactive employees are never picked as approvers.
    pub is_active: bool,
}

/// Read access to employees and the reporting chain.
pub trait EmployeeDirectory {
    /// Looks up an employee by code.
    fn find_employee(&self, employee_id: &str) -> Option<&Employee>;

    /// Returns the code of the employee `employee_id` reports to.
    fn find_manager_of(&self, employee_id: &str) -> Option<&str>;

    /// Returns the active employee holding `role` (and `department`, when
    /// given) with the lowest employee code.
    fn find_active_by_role(&self, role: &str, department: Option<&str>) -> Option<&Employee>;
}

/// Immutable in-memory copy of the directory.
#[derive(Debug, Clone, Default)]
pub struct DirectorySnapshot {
    employees: BTreeMap<String, Employee>,
    reports_to: HashMap<String, String>,
}

impl DirectorySnapshot {
    /// Builds a snapshot from employees and `(employee, manager)` edges.
    ///
    /// Edges pointing at unknown employees are kept; lookups through them
    /// simply find nobody.
    #[must_use]
    pub fn new(
        employees: impl IntoIterator<Item = Employee>,
        reporting_edges: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        Self {
            employees: employees
                .into_iter()
                .map(|e| (e.employee_id.clone(), e))
                .collect(),
            reports_to: reporting_edges.into_iter().collect(),
        }
    }
}

impl EmployeeDirectory for DirectorySnapshot {
    fn find_employee(&self, employee_id: &str) -> Option<&Employee> {
        self.employees.get(employee_id)
    }

    fn find_manager_of(&self, employee_id: &str) -> Option<&str> {
        self.reports_to.get(employee_id).map(String::as_str)
    }

    fn find_active_by_role(&self, role: &str, department: Option<&str>) -> Option<&Employee> {
        // BTreeMap iterates in key order, so the first hit has the lowest code.
        self.employees.values().find(|e| {
            e.is_active
                && same_role(&e.role, role)
                && department.is_none_or(|d| e.department.as_deref() == Some(d))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee(id: &str, role: &str, department: Option<&str>, active: bool) -> Employee {
        Employee {
            employee_id: id.to_string(),
            name: format!("Employee {id}"),
            role: role.to_string(),
            department: department.map(ToString::to_string),
            email: None,
            is_active: active,
        }
    }

    #[test]
    fn test_find_manager_of() {
        let snapshot = DirectorySnapshot::new(
            vec![
                employee("E1", "Employee", None, true),
                employee("E2", "Manager", None, true),
            ],
            vec![("E1".to_string(), "E2".to_string())],
        );
        assert_eq!(snapshot.find_manager_of("E1"), Some("E2"));
        assert_eq!(snapshot.find_manager_of("E2"), None);
    }

    #[test]
    fn test_fallback_picks_lowest_active_code() {
        let snapshot = DirectorySnapshot::new(
            vec![
                employee("E9", "HR", None, true),
                employee("E3", "HR", None, false),
                employee("E5", "HR", None, true),
            ],
            Vec::new(),
        );
        let found = snapshot.find_active_by_role("hr", None).unwrap();
        assert_eq!(found.employee_id, "E5");
    }

    #[test]
    fn test_fallback_respects_department() {
        let snapshot = DirectorySnapshot::new(
            vec![
                employee("E1", "Manager", Some("Sales"), true),
                employee("E2", "Manager", Some("Engineering"), true),
            ],
            Vec::new(),
        );
        let found = snapshot
            .find_active_by_role("Manager", Some("Engineering"))
            .unwrap();
        assert_eq!(found.employee_id, "E2");
        assert!(snapshot.find_active_by_role("Manager", Some("Legal")).is_none());
    }
}
