//! Shared types, errors, and configuration for HRFlow.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for request and flow references
//! - Application-wide error types
//! - Configuration management
//! - JWT claims and token validation
//! - SMTP email delivery

pub mod auth;
pub mod config;
pub mod email;
pub mod error;
pub mod jwt;
pub mod types;

pub use auth::Claims;
pub use config::{AppConfig, ApprovalConfig, EmailConfig};
pub use email::{EmailError, EmailService};
pub use error::{AppError, AppResult};
pub use jwt::{JwtConfig, JwtError, JwtService};
