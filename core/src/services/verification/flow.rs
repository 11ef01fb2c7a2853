//! Hosting facade: one session wired to both controllers

use std::sync::Arc;

use tokio::sync::watch;
use tracing;

use crate::domain::entities::email_type::EmailType;
use crate::domain::entities::session::VerificationSession;
use crate::errors::VerificationResult;

use super::address_change::{AddressChange, AddressChangeDetector};
use super::config::VerificationServiceConfig;
use super::request::RequestCodeController;
use super::session_handle::{FlowCallbacks, SessionHandle};
use super::submit::SubmitCodeController;
use super::traits::VerificationBackendTrait;
use super::types::{RequestOutcome, SubmitOutcome};

/// Email verification flow mounted by a dialog, page or wizard step
///
/// Dropping the flow tears the session down: the cooldown is cancelled and
/// results of requests still in flight are discarded.
pub struct EmailVerificationFlow<B: VerificationBackendTrait + ?Sized> {
    session: SessionHandle,
    request: RequestCodeController<B>,
    submit: SubmitCodeController<B>,
    detector: AddressChangeDetector,
}

impl<B: VerificationBackendTrait + ?Sized> EmailVerificationFlow<B> {
    /// Mount a new session for `email_type`
    ///
    /// # Arguments
    ///
    /// * `email_type` - The slot being verified
    /// * `initial_address` - Pre-filled value of the address input
    /// * `backend` - Backend that sends and checks codes
    /// * `config` - Cooldown and work domain settings
    /// * `callbacks` - Completion and skip callbacks
    pub fn mount(
        email_type: EmailType,
        initial_address: Option<&str>,
        backend: Arc<B>,
        config: VerificationServiceConfig,
        callbacks: FlowCallbacks,
    ) -> Self {
        let session = SessionHandle::with_callbacks(
            VerificationSession::new(email_type, initial_address),
            callbacks,
        );
        tracing::debug!(
            session_id = %session.id(),
            email_type = %email_type,
            event = "session_mounted",
            "Verification session mounted"
        );

        Self {
            request: RequestCodeController::new(session.clone(), backend.clone(), config),
            submit: SubmitCodeController::new(session.clone(), backend),
            detector: AddressChangeDetector::new(),
            session,
        }
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn snapshot(&self) -> VerificationSession {
        self.session.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<VerificationSession> {
        self.session.subscribe()
    }

    pub fn request_controller(&self) -> &RequestCodeController<B> {
        &self.request
    }

    pub fn submit_controller(&self) -> &SubmitCodeController<B> {
        &self.submit
    }

    /// Record an edit of the address input
    pub fn set_candidate_address(&self, address: Option<&str>) -> AddressChange {
        self.detector.observe(&self.session, address)
    }

    /// Request a code for `address`, also recording it as the field value
    pub async fn request_code(&self, address: &str) -> VerificationResult<RequestOutcome> {
        if !self.session.snapshot().is_terminal() {
            self.set_candidate_address(Some(address));
        }
        self.request.request_code(address).await
    }

    pub async fn submit_code(&self, code: &str) -> VerificationResult<SubmitOutcome> {
        self.submit.submit_code(code).await
    }

    /// Return to the initial state for the same slot
    pub fn reset(&self) {
        self.session.reset();
    }

    /// Abandon the flow without verifying; fires the skip callback
    pub fn skip(&self) {
        tracing::info!(
            session_id = %self.session.id(),
            event = "verification_skipped",
            "Verification skipped"
        );
        self.session.skip();
    }
}

impl<B: VerificationBackendTrait + ?Sized> Drop for EmailVerificationFlow<B> {
    fn drop(&mut self) {
        self.session.teardown();
    }
}
