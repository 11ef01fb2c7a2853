//! Trait for the backend that sends and checks verification codes

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::domain::entities::email_type::EmailType;
use crate::errors::{SendError, VerifyError};

use super::types::{SendReceipt, VerifyReceipt};

/// Backend operations the workflow depends on
///
/// The backend owns code generation, expiry and email dispatch. It ties a
/// submitted code to the pending request of the authenticated user, so
/// `verify_code` takes only the code.
#[async_trait]
pub trait VerificationBackendTrait: Send + Sync {
    /// Generate a code for `address` covering `email_types` and email it
    async fn send_verification_code(
        &self,
        email_types: &BTreeSet<EmailType>,
        address: &str,
    ) -> Result<SendReceipt, SendError>;

    /// Check a code against the pending request
    async fn verify_code(&self, code: &str) -> Result<VerifyReceipt, VerifyError>;
}
