//! Multi-step approval workflow shared by leave, project and task requests.
//!
//! # Modules
//!
//! - `types` - Entry status, decisions and the structured overall status
//! - `directory` - Employee directory trait and in-memory snapshot
//! - `flow` - Approval flow definitions and validation
//! - `trail` - Ordered approval trail with guarded mutation
//! - `resolver` - Approver resolution ("stepper")
//! - `engine` - Initiation and approve/reject transitions
//! - `events` - Post-transition events and the sink they are published to
//! - `error` - Approval-specific error types

pub mod directory;
pub mod engine;
pub mod error;
pub mod events;
pub mod flow;
pub mod resolver;
pub mod trail;
pub mod types;

#[cfg(test)]
mod engine_props;
#[cfg(test)]
mod resolver_props;

pub use directory::{DirectorySnapshot, Employee, EmployeeDirectory};
pub use engine::{Approvable, ApprovalEngine, ApprovalState, DecisionOutcome};
pub use error::ApprovalError;
pub use events::{ApprovalEvent, ApprovalOutcome, EventSink, NullEventSink};
pub use flow::{ApprovalFlow, FlowStep, FlowValidator};
pub use resolver::{StepResolver, Stepper};
pub use trail::ApprovalTrail;
pub use types::{ApprovalEntry, ApprovalStatus, Decision, OverallStatus, RequestKind, same_role};
