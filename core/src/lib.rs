//! # Email Verification Core
//!
//! Core domain layer for the email verification workflow.
//! This crate contains the session entity and its messages, the error
//! taxonomy, and the services that request and submit verification codes
//! against an external backend.

pub mod domain;
pub mod errors;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::*;
pub use errors::*;
pub use services::*;
