//! Inline messages shown next to the request and submit controls.

use serde::{Deserialize, Serialize};

/// Message attached to the "request a code" control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RequestMessage {
    /// A code was sent to the contacted address
    RequestSent,
    /// A request was refused because the cooldown is still running
    #[serde(rename_all = "camelCase")]
    Throttled { remaining_seconds: u64 },
    /// The address field no longer matches the address a code was sent to
    AddressChanged,
}

impl RequestMessage {
    /// Transient messages are cleared when the other control reports something new
    pub fn is_transient(&self) -> bool {
        matches!(self, RequestMessage::RequestSent | RequestMessage::AddressChanged)
    }
}

/// Message attached to the "submit code" control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SubmitMessage {
    /// The contact address is also a work address; both slots will be verified
    ContactMatchesWork,
    /// A code was submitted before any code was sent in this session
    MustRequestCodeFirst,
}

impl SubmitMessage {
    /// Submit messages stay until explicitly superseded
    pub fn is_transient(&self) -> bool {
        false
    }
}
