//! `SeaORM` entity definitions.

pub mod approval_flows;
pub mod employees;
pub mod leave_balances;
pub mod leave_requests;
pub mod project_assignments;
pub mod reporting_lines;
pub mod task_assignments;
