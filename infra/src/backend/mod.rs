//! Verification backend implementations
//!
//! - `in_memory` - Single-user backend holding codes in process memory
//! - `graphql` - Client for the platform's GraphQL mutations

pub mod in_memory;

#[cfg(feature = "graphql-client")]
pub mod graphql;

pub use in_memory::{DispatchedEmail, EmailSlot, InMemoryVerificationBackend, CODE_LENGTH};

#[cfg(feature = "graphql-client")]
pub use graphql::{classify_send_errors, classify_verify_errors, GraphQlError, GraphQlVerificationBackend};
