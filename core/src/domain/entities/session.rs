//! Verification session entity.
//!
//! The session is the state one hosting surface (dialog, page or wizard step)
//! keeps while a user proves ownership of an address. Its lifecycle is an
//! explicit state machine:
//!
//! ```text
//! Idle --code sent--> Requested --code verified--> Terminal
//!                     Requested --code sent-----> Requested (new address, re-throttled)
//! ```
//!
//! `contacted_address`, `can_request_code` and `throttle_deadline` are derived
//! from the phase rather than stored separately.

use std::collections::BTreeSet;

use ev_shared::email::normalize_address;
use ev_shared::FieldError;
use tokio::time::Instant;
use uuid::Uuid;

use crate::domain::entities::email_type::EmailType;
use crate::domain::value_objects::messages::{RequestMessage, SubmitMessage};

/// Request cooldown state after a code was sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cooldown {
    /// Requests are refused until `deadline`
    Active { deadline: Instant },
    /// Requests are allowed
    Clear,
}

/// Lifecycle phase of a verification session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    /// No code has been sent yet
    Idle,
    /// A code was sent to `contacted_address` for `email_types`
    Requested {
        contacted_address: String,
        email_types: BTreeSet<EmailType>,
        cooldown: Cooldown,
    },
    /// Verified, skipped or torn down; the session accepts no more operations
    Terminal,
}

/// State shared by the request and submit controllers of one hosting surface
#[derive(Debug, Clone)]
pub struct VerificationSession {
    id: Uuid,
    generation: u64,
    email_type: EmailType,
    candidate_address: Option<String>,
    phase: SessionPhase,
    request_message: Option<RequestMessage>,
    submit_message: Option<SubmitMessage>,
    address_error: Option<FieldError>,
    code_error: Option<FieldError>,
}

impl VerificationSession {
    /// Creates a fresh session for one email slot
    ///
    /// # Arguments
    ///
    /// * `email_type` - The slot being verified; fixed for the session's life
    /// * `initial_address` - Pre-filled value of the address input, if any
    pub fn new(email_type: EmailType, initial_address: Option<&str>) -> Self {
        Self {
            id: Uuid::new_v4(),
            generation: 0,
            email_type,
            candidate_address: normalize_address(initial_address),
            phase: SessionPhase::Idle,
            request_message: None,
            submit_message: None,
            address_error: None,
            code_error: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Incremented on every reset or teardown
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn email_type(&self) -> EmailType {
        self.email_type
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn candidate_address(&self) -> Option<&str> {
        self.candidate_address.as_deref()
    }

    /// Address the most recent successful request sent a code to
    pub fn contacted_address(&self) -> Option<&str> {
        match &self.phase {
            SessionPhase::Requested { contacted_address, .. } => Some(contacted_address.as_str()),
            _ => None,
        }
    }

    /// Slots the most recent successful request covered
    pub fn contacted_email_types(&self) -> Option<&BTreeSet<EmailType>> {
        match &self.phase {
            SessionPhase::Requested { email_types, .. } => Some(email_types),
            _ => None,
        }
    }

    /// `true` unless a cooldown is running or the session has ended
    pub fn can_request_code(&self) -> bool {
        match &self.phase {
            SessionPhase::Idle => true,
            SessionPhase::Requested { cooldown, .. } => *cooldown == Cooldown::Clear,
            SessionPhase::Terminal => false,
        }
    }

    /// When requests become possible again, if a cooldown is running
    pub fn throttle_deadline(&self) -> Option<Instant> {
        match &self.phase {
            SessionPhase::Requested {
                cooldown: Cooldown::Active { deadline },
                ..
            } => Some(*deadline),
            _ => None,
        }
    }

    pub fn request_message(&self) -> Option<RequestMessage> {
        self.request_message
    }

    pub fn submit_message(&self) -> Option<SubmitMessage> {
        self.submit_message
    }

    /// Field error currently shown on the address input
    pub fn address_error(&self) -> Option<&FieldError> {
        self.address_error.as_ref()
    }

    /// Field error currently shown on the code input
    pub fn code_error(&self) -> Option<&FieldError> {
        self.code_error.as_ref()
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.phase, SessionPhase::Terminal)
    }

    /// Updates the live value of the address input
    pub fn set_candidate_address(&mut self, address: Option<&str>) {
        self.candidate_address = normalize_address(address);
    }

    /// Sets the request message; a new message clears transient submit messages
    pub fn set_request_message(&mut self, message: Option<RequestMessage>) {
        if message.is_some() && self.submit_message.map_or(false, |m| m.is_transient()) {
            self.submit_message = None;
        }
        self.request_message = message;
    }

    /// Sets the submit message; a new message clears transient request messages
    pub fn set_submit_message(&mut self, message: Option<SubmitMessage>) {
        if message.is_some() && self.request_message.map_or(false, |m| m.is_transient()) {
            self.request_message = None;
        }
        self.submit_message = message;
    }

    /// Records a successful code request
    ///
    /// Moves the session to `Requested` for `address`. When the request covered
    /// both slots the `ContactMatchesWork` message stays; otherwise any submit
    /// message is superseded by `RequestSent`.
    ///
    /// # Arguments
    ///
    /// * `address` - The address the code was sent to
    /// * `email_types` - The slots the request covered
    /// * `deadline` - End of the new cooldown, or `None` when cooldowns are disabled
    pub fn record_code_sent(
        &mut self,
        address: &str,
        email_types: BTreeSet<EmailType>,
        deadline: Option<Instant>,
    ) {
        let linked = email_types.len() > 1;
        let contacted_address =
            normalize_address(Some(address)).unwrap_or_else(|| address.to_string());

        self.phase = SessionPhase::Requested {
            contacted_address,
            email_types,
            cooldown: deadline.map_or(Cooldown::Clear, |deadline| Cooldown::Active { deadline }),
        };
        self.submit_message = if linked {
            Some(SubmitMessage::ContactMatchesWork)
        } else {
            None
        };
        self.set_request_message(Some(RequestMessage::RequestSent));
        self.address_error = None;
        self.code_error = None;
    }

    /// Records a request refused by the cooldown
    pub fn record_throttled(&mut self, remaining_seconds: u64) {
        self.set_request_message(Some(RequestMessage::Throttled { remaining_seconds }));
    }

    /// Ends the cooldown that was started with `deadline`
    ///
    /// Expirations of superseded or bypassed cooldowns are ignored.
    ///
    /// # Returns
    ///
    /// `true` if the session's active cooldown was the one that elapsed
    pub fn cooldown_elapsed(&mut self, deadline: Instant) -> bool {
        let SessionPhase::Requested { cooldown, .. } = &mut self.phase else {
            return false;
        };
        if *cooldown != (Cooldown::Active { deadline }) {
            return false;
        }
        *cooldown = Cooldown::Clear;
        if matches!(self.request_message, Some(RequestMessage::Throttled { .. })) {
            self.request_message = None;
        }
        true
    }

    /// Re-enables requests because the address field moved away from the contacted address
    ///
    /// # Returns
    ///
    /// `true` if a running cooldown was bypassed
    pub fn bypass_cooldown(&mut self) -> bool {
        let SessionPhase::Requested { cooldown, .. } = &mut self.phase else {
            return false;
        };
        let was_active = matches!(cooldown, Cooldown::Active { .. });
        *cooldown = Cooldown::Clear;
        self.set_request_message(Some(RequestMessage::AddressChanged));
        was_active
    }

    /// Clears the `AddressChanged` message after the address field was reverted
    pub fn clear_address_changed(&mut self) -> bool {
        if self.request_message == Some(RequestMessage::AddressChanged) {
            self.request_message = None;
            true
        } else {
            false
        }
    }

    /// Records a submit attempt made before any code was sent
    pub fn require_request_first(&mut self) {
        debug_assert!(self.contacted_address().is_none());
        self.set_submit_message(Some(SubmitMessage::MustRequestCodeFirst));
    }

    pub fn set_address_error(&mut self, error: Option<FieldError>) {
        self.address_error = error;
    }

    pub fn set_code_error(&mut self, error: Option<FieldError>) {
        self.code_error = error;
    }

    /// Marks the session verified and clears everything it holds
    pub fn complete(&mut self) {
        self.phase = SessionPhase::Terminal;
        self.clear_state();
    }

    /// Returns the session to `Idle` for the same email slot
    ///
    /// The address input is still shown by the hosting surface, so its value is kept.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.phase = SessionPhase::Idle;
        let candidate_address = self.candidate_address.take();
        self.clear_state();
        self.candidate_address = candidate_address;
    }

    /// Tears the session down; results of in-flight operations become stale
    pub fn close(&mut self) {
        self.generation += 1;
        self.phase = SessionPhase::Terminal;
        self.clear_state();
    }

    fn clear_state(&mut self) {
        self.candidate_address = None;
        self.request_message = None;
        self.submit_message = None;
        self.address_error = None;
        self.code_error = None;
    }
}
