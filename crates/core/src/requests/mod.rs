//! Approvable request kinds: leave, project assignment and task assignment.
//!
//! Each kind carries its own payload plus an embedded `ApprovalState` and
//! implements `Approvable`, so the approval engine handles all three alike.

pub mod leave;
pub mod project;
pub mod task;

pub use leave::{LeaveRequest, LeaveType, NewLeaveRequest};
pub use project::{NewProjectAssignment, ProjectAssignment};
pub use task::{NewTaskAssignment, TaskAssignment};
