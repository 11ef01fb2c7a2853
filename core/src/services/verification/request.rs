//! Code request controller

use std::sync::Arc;

use ev_shared::email::{mask_email, normalize_address};
use ev_shared::FieldError;
use tracing;

use crate::domain::entities::email_type::EmailType;
use crate::errors::{SendError, VerificationError, VerificationResult};

use super::address_change::{AddressChange, AddressChangeDetector};
use super::config::VerificationServiceConfig;
use super::linkage::EmailTypeLinkageResolver;
use super::session_handle::SessionHandle;
use super::traits::VerificationBackendTrait;
use super::types::RequestOutcome;

pub const ADDRESS_IN_USE_MESSAGE: &str = "Cannot update - this email address is already in use.";
pub const NOT_GOVERNMENT_EMAIL_MESSAGE: &str = "This does not appear to be a Government of Canada email. If you are entering a Government of Canada email and still getting this error, please contact our support team.";

/// Requests verification codes for one session
///
/// Refuses locally while the cooldown runs, resolves which slots the code
/// covers, and classifies backend rejections into field errors.
pub struct RequestCodeController<B: VerificationBackendTrait + ?Sized> {
    session: SessionHandle,
    backend: Arc<B>,
    resolver: EmailTypeLinkageResolver,
    config: VerificationServiceConfig,
}

impl<B: VerificationBackendTrait + ?Sized> RequestCodeController<B> {
    pub fn new(session: SessionHandle, backend: Arc<B>, config: VerificationServiceConfig) -> Self {
        let resolver = EmailTypeLinkageResolver::new(config.work_email_pattern.clone());
        Self {
            session,
            backend,
            resolver,
            config,
        }
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Request a code for `address`
    ///
    /// # Returns
    ///
    /// `Sent` when the backend emailed a code, `Throttled` when the cooldown
    /// refused the request without contacting the backend
    ///
    /// # Errors
    ///
    /// * `Field` - The backend rejected the address
    /// * `Transport` - The backend could not be reached
    /// * `SessionClosed` - The session was reset or closed
    pub async fn request_code(&self, address: &str) -> VerificationResult<RequestOutcome> {
        let snapshot = self.session.snapshot();
        if snapshot.is_terminal() {
            return Err(VerificationError::SessionClosed);
        }

        let email_type = snapshot.email_type();
        if !snapshot.can_request_code() {
            let remaining_seconds = self.session.remaining_cooldown_seconds();
            self.session
                .update(|session| session.record_throttled(remaining_seconds));
            tracing::warn!(
                session_id = %self.session.id(),
                email_type = %email_type,
                remaining_seconds,
                event = "code_request_throttled",
                "Code request refused while cooldown is running"
            );
            return Ok(RequestOutcome::Throttled { remaining_seconds });
        }

        let address = normalize_address(Some(address)).unwrap_or_default();
        let linkage = self.resolver.resolve(email_type, &address);
        let generation = snapshot.generation();
        let field_mirrored = snapshot.candidate_address().is_some();
        self.session.update(|session| {
            if linkage.message.is_some() {
                session.set_submit_message(linkage.message);
            }
            session.set_address_error(None);
        });

        tracing::info!(
            session_id = %self.session.id(),
            email_type = %email_type,
            address = %mask_email(&address),
            linked = linkage.is_linked(),
            event = "code_requested",
            "Requesting verification code"
        );

        let result = self
            .backend
            .send_verification_code(&linkage.email_types, &address)
            .await;

        if !self.session.is_current(generation) {
            tracing::debug!(
                session_id = %self.session.id(),
                event = "stale_result_discarded",
                "Discarding send result for a superseded session"
            );
            return Err(VerificationError::SessionClosed);
        }

        match result {
            Ok(receipt) => {
                let deadline = self.session.start_cooldown(self.config.cooldown());
                let email_types = linkage.email_types.clone();
                // the field may have been edited while the send was pending
                let (change, bypassed) = self.session.update(|session| {
                    session.record_code_sent(&address, linkage.email_types, deadline);
                    if field_mirrored || session.candidate_address().is_some() {
                        AddressChangeDetector::new().apply(session)
                    } else {
                        (AddressChange::Unchanged, false)
                    }
                });
                if change == AddressChange::ChangedAwayFromContacted {
                    self.session.cancel_cooldown();
                }
                tracing::info!(
                    session_id = %self.session.id(),
                    email_type = %email_type,
                    address = %mask_email(&address),
                    cooldown_seconds = self.config.cooldown_seconds,
                    event = "code_sent",
                    "Verification code sent"
                );
                if bypassed {
                    tracing::info!(
                        session_id = %self.session.id(),
                        event = "cooldown_bypassed",
                        "Address field no longer matches the contacted address; code requests re-enabled"
                    );
                }
                Ok(RequestOutcome::Sent {
                    receipt,
                    email_types,
                })
            }
            Err(error) => Err(self.reject(email_type, &address, error)),
        }
    }

    fn reject(&self, email_type: EmailType, address: &str, error: SendError) -> VerificationError {
        let field_error = match &error {
            SendError::EmailAddressInUse => {
                Some(FieldError::address(ADDRESS_IN_USE_MESSAGE, "EmailAddressInUse"))
            }
            SendError::NotGovernmentEmail => {
                Some(FieldError::address(NOT_GOVERNMENT_EMAIL_MESSAGE, "NotGovernmentEmail"))
            }
            SendError::Unknown(_) => None,
        };

        match field_error {
            Some(field_error) => {
                tracing::info!(
                    session_id = %self.session.id(),
                    email_type = %email_type,
                    address = %mask_email(address),
                    reason = %error,
                    event = "code_send_rejected",
                    "Backend rejected the address"
                );
                let stored = field_error.clone();
                self.session
                    .update(|session| session.set_address_error(Some(stored)));
                VerificationError::Field(field_error)
            }
            None => {
                tracing::error!(
                    session_id = %self.session.id(),
                    email_type = %email_type,
                    error = %error,
                    event = "code_send_failed",
                    "Failed to request verification code"
                );
                VerificationError::Transport {
                    message: error.to_string(),
                }
            }
        }
    }
}

impl<B: VerificationBackendTrait + ?Sized> Clone for RequestCodeController<B> {
    fn clone(&self) -> Self {
        Self {
            session: self.session.clone(),
            backend: self.backend.clone(),
            resolver: self.resolver.clone(),
            config: self.config.clone(),
        }
    }
}
