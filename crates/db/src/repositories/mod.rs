//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod approval;
pub mod approval_flow;
pub mod approval_store;
pub mod employee;
pub mod leave;
pub mod leave_balance;
pub mod project;
pub mod task;

pub use approval::{ApprovalRepository, Decided, NewRequestContext};
pub use approval_flow::{
    ApprovalFlowError, ApprovalFlowRepository, CreateFlowInput, UpdateFlowInput,
};
pub use approval_store::ApprovalStore;
pub use employee::{CreateEmployeeInput, EmployeeRepository};
pub use leave::LeaveRequestRepository;
pub use leave_balance::LeaveBalanceRepository;
pub use project::ProjectAssignmentRepository;
pub use task::TaskAssignmentRepository;
