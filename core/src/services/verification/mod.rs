//! Email verification workflow
//!
//! This module provides the client-side orchestration of proving ownership
//! of a contact or work email address:
//! - Code requests with a per-session cooldown
//! - Code submission with failure classification
//! - Contact/work slot linkage for Government of Canada addresses
//! - Detection of edits that move the address away from the contacted one
//! - A hosting facade bundling one session with both controllers

mod address_change;
mod config;
mod flow;
mod linkage;
mod request;
mod session_handle;
mod submit;
mod throttle;
mod traits;
mod types;

#[cfg(test)]
mod tests;

pub use address_change::{AddressChange, AddressChangeDetector};
pub use config::{VerificationServiceConfig, DEFAULT_COOLDOWN_SECONDS};
pub use flow::EmailVerificationFlow;
pub use linkage::{EmailTypeLinkageResolver, LinkageResolution};
pub use request::{RequestCodeController, ADDRESS_IN_USE_MESSAGE, NOT_GOVERNMENT_EMAIL_MESSAGE};
pub use session_handle::{FlowCallbacks, SessionHandle};
pub use submit::{SubmitCodeController, INVALID_CODE_MESSAGE};
pub use throttle::ThrottleTimer;
pub use traits::VerificationBackendTrait;
pub use types::{RequestOutcome, SendReceipt, SubmitOutcome, VerificationCompleted, VerifyReceipt};
