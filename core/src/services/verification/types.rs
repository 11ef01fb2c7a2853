//! Types for verification workflow results

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::entities::email_type::EmailType;

/// Backend acknowledgement of a sent code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendReceipt {
    /// Identifier of the user the code was issued for
    pub id: String,
}

/// Backend acknowledgement of a verified code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyReceipt {
    /// Identifier of the user whose email slots were verified
    pub id: String,
}

/// Result of a code request that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// The backend accepted the request and emailed a code
    Sent {
        receipt: SendReceipt,
        email_types: BTreeSet<EmailType>,
    },
    /// Refused locally because the cooldown is still running
    Throttled { remaining_seconds: u64 },
}

/// Result of a code submission that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The code was accepted; the session is finished
    Verified(VerificationCompleted),
    /// No code has been requested in this session yet
    MustRequestCodeFirst,
}

/// Payload handed to the completion callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationCompleted {
    /// Identifier returned by the backend
    pub id: String,
    /// The address that was verified
    pub address: String,
    /// The slots that now hold the verified address
    pub email_types: BTreeSet<EmailType>,
}
