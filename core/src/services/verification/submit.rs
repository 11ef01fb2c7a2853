//! Code submission controller

use std::sync::Arc;

use ev_shared::email::mask_email;
use ev_shared::FieldError;
use tracing;

use crate::errors::{VerificationError, VerificationResult, VerifyError};

use super::request::NOT_GOVERNMENT_EMAIL_MESSAGE;
use super::session_handle::SessionHandle;
use super::traits::VerificationBackendTrait;
use super::types::{SubmitOutcome, VerificationCompleted};

pub const INVALID_CODE_MESSAGE: &str =
    "The code you've entered is invalid. Please request a new code.";

/// Submits verification codes for one session
pub struct SubmitCodeController<B: VerificationBackendTrait + ?Sized> {
    session: SessionHandle,
    backend: Arc<B>,
}

impl<B: VerificationBackendTrait + ?Sized> SubmitCodeController<B> {
    pub fn new(session: SessionHandle, backend: Arc<B>) -> Self {
        Self { session, backend }
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Submit a code for the address the last request went to
    ///
    /// On success the session becomes terminal and the completion callback
    /// fires. An invalid code leaves the session as it was apart from the
    /// field error, so the user can retry or request a new code.
    ///
    /// # Errors
    ///
    /// * `Field` - The code was rejected, or the address is not a government one
    /// * `Transport` - The backend could not be reached
    /// * `SessionClosed` - The session was reset or closed
    pub async fn submit_code(&self, code: &str) -> VerificationResult<SubmitOutcome> {
        let snapshot = self.session.snapshot();
        if snapshot.is_terminal() {
            return Err(VerificationError::SessionClosed);
        }

        let Some((address, email_types)) = snapshot
            .contacted_address()
            .zip(snapshot.contacted_email_types())
            .map(|(address, types)| (address.to_string(), types.clone()))
        else {
            self.session.update(|session| session.require_request_first());
            tracing::info!(
                session_id = %self.session.id(),
                event = "code_submitted_before_request",
                "Code submitted before any code was requested"
            );
            return Ok(SubmitOutcome::MustRequestCodeFirst);
        };

        let generation = snapshot.generation();
        self.session.update(|session| session.set_code_error(None));

        let result = self.backend.verify_code(code.trim()).await;

        if !self.session.is_current(generation) {
            tracing::debug!(
                session_id = %self.session.id(),
                event = "stale_result_discarded",
                "Discarding verify result for a superseded session"
            );
            return Err(VerificationError::SessionClosed);
        }

        match result {
            Ok(receipt) => {
                tracing::info!(
                    session_id = %self.session.id(),
                    email_type = %snapshot.email_type(),
                    address = %mask_email(&address),
                    slots = email_types.len(),
                    event = "code_verified",
                    "Email address verified"
                );
                let completed = VerificationCompleted {
                    id: receipt.id,
                    address,
                    email_types,
                };
                self.session.complete(completed.clone());
                Ok(SubmitOutcome::Verified(completed))
            }
            Err(VerifyError::InvalidCode) => {
                let error = FieldError::code(INVALID_CODE_MESSAGE, "VERIFICATION_FAILED");
                self.reject(error, "invalid_code")
            }
            Err(VerifyError::NotGovernmentEmail) => {
                let error = FieldError::address(NOT_GOVERNMENT_EMAIL_MESSAGE, "NotGovernmentEmail");
                self.reject(error, "not_government_email")
            }
            Err(VerifyError::Unknown(message)) => {
                tracing::error!(
                    session_id = %self.session.id(),
                    error = %message,
                    event = "code_verify_failed",
                    "Failed to verify code"
                );
                Err(VerificationError::Transport { message })
            }
        }
    }

    fn reject(&self, error: FieldError, reason: &str) -> VerificationResult<SubmitOutcome> {
        tracing::info!(
            session_id = %self.session.id(),
            reason,
            event = "code_rejected",
            "Backend rejected the submitted code"
        );
        let stored = error.clone();
        self.session.update(|session| {
            if stored.is_code_error() {
                session.set_code_error(Some(stored));
            } else {
                session.set_address_error(Some(stored));
            }
        });
        Err(VerificationError::Field(error))
    }
}

impl<B: VerificationBackendTrait + ?Sized> Clone for SubmitCodeController<B> {
    fn clone(&self) -> Self {
        Self {
            session: self.session.clone(),
            backend: self.backend.clone(),
        }
    }
}
