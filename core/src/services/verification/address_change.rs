//! Detects edits that move the address field away from the contacted address

use ev_shared::email::{addresses_match, mask_email};
use tracing;

use crate::domain::entities::session::VerificationSession;
use crate::domain::value_objects::messages::RequestMessage;

use super::session_handle::SessionHandle;

/// Signal produced each time the address field is evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressChange {
    /// Nothing to report (including when no code has been sent yet)
    Unchanged,
    /// The field differs from the address the code was sent to
    ChangedAwayFromContacted,
    /// The field is back to the contacted address after a change
    RevertedToContacted,
}

/// Compares the live address field with the contacted address
#[derive(Debug, Clone, Copy, Default)]
pub struct AddressChangeDetector;

impl AddressChangeDetector {
    pub fn new() -> Self {
        Self
    }

    /// Classify the current field value
    ///
    /// # Arguments
    ///
    /// * `contacted` - Address the last code was sent to, if any
    /// * `candidate` - Live value of the address field
    /// * `current_message` - The session's current request message
    pub fn evaluate(
        &self,
        contacted: Option<&str>,
        candidate: Option<&str>,
        current_message: Option<RequestMessage>,
    ) -> AddressChange {
        if contacted.is_none() {
            return AddressChange::Unchanged;
        }
        if !addresses_match(contacted, candidate) {
            return AddressChange::ChangedAwayFromContacted;
        }
        if current_message == Some(RequestMessage::AddressChanged) {
            AddressChange::RevertedToContacted
        } else {
            AddressChange::Unchanged
        }
    }

    /// Apply the signal for the session's stored field value
    ///
    /// Moving away from the contacted address re-enables requests at once.
    /// Reverting clears the `AddressChanged` message but leaves requests enabled.
    ///
    /// # Returns
    ///
    /// The signal, and whether a running cooldown was bypassed. The caller
    /// cancels the session's timer on `ChangedAwayFromContacted`.
    pub fn apply(&self, state: &mut VerificationSession) -> (AddressChange, bool) {
        let change = self.evaluate(
            state.contacted_address(),
            state.candidate_address(),
            state.request_message(),
        );
        let bypassed = match change {
            AddressChange::ChangedAwayFromContacted => state.bypass_cooldown(),
            AddressChange::RevertedToContacted => {
                state.clear_address_changed();
                false
            }
            AddressChange::Unchanged => false,
        };
        (change, bypassed)
    }

    /// Record a new field value on the session and apply the resulting signal
    pub fn observe(&self, session: &SessionHandle, candidate: Option<&str>) -> AddressChange {
        let (change, bypassed) = session.update(|state| {
            state.set_candidate_address(candidate);
            self.apply(state)
        });

        if change == AddressChange::ChangedAwayFromContacted {
            session.cancel_cooldown();
        }
        if bypassed {
            tracing::info!(
                session_id = %session.id(),
                candidate = %candidate.map(mask_email).unwrap_or_default(),
                event = "cooldown_bypassed",
                "Address changed away from contacted address; code requests re-enabled"
            );
        }
        change
    }
}
