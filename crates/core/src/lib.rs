//! Core business logic for HRFlow.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Approver resolution, approval transitions and request validation live here.
//!
//! # Modules
//!
//! - `approval` - Multi-step approval workflow engine
//! - `requests` - Leave, project and task request types

pub mod approval;
pub mod requests;
