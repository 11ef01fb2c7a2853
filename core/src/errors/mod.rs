//! Error taxonomy for the verification workflow.
//!
//! Backend failures are classified by the controllers into field-level
//! rejections and transport failures; they never escape unclassified.

use ev_shared::FieldError;
use thiserror::Error;

/// Errors returned by the request and submit operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    /// Business-rule rejection shown on a form field
    #[error("{0}")]
    Field(FieldError),

    /// Network or server failure; safe to retry
    #[error("Verification service unavailable: {message}")]
    Transport { message: String },

    /// The session was reset, verified or torn down
    #[error("Verification session is no longer active")]
    SessionClosed,
}

impl VerificationError {
    /// Field error carried by a business-rule rejection
    pub fn field_error(&self) -> Option<&FieldError> {
        match self {
            VerificationError::Field(error) => Some(error),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, VerificationError::Transport { .. })
    }
}

pub type VerificationResult<T> = Result<T, VerificationError>;

/// Failures reported by the backend's send operation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    #[error("Email address already in use")]
    EmailAddressInUse,

    #[error("Not a Government of Canada email address")]
    NotGovernmentEmail,

    #[error("Unknown send failure: {0}")]
    Unknown(String),
}

/// Failures reported by the backend's verify operation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("Verification failed")]
    InvalidCode,

    #[error("Not a Government of Canada email address")]
    NotGovernmentEmail,

    #[error("Unknown verify failure: {0}")]
    Unknown(String),
}
