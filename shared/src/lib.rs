//! Shared utilities and common types for the email verification workspace
//!
//! This crate provides common functionality used across all workspace crates:
//! - Configuration types
//! - Email address utilities (normalisation, work-domain matching, masking)
//! - Field-level validation errors

pub mod config;
pub mod utils;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, BackendConfig, BackendProvider, Environment, LogFormat, LoggingConfig,
    VerificationConfig,
};
pub use utils::{email, validation};
pub use utils::email::{WorkEmailPattern, WorkEmailPatternError};
pub use utils::validation::FieldError;
