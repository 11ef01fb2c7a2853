//! Domain entities representing the verification workflow.

pub mod email_type;
pub mod session;

// Re-export commonly used types
pub use email_type::{EmailType, UnknownEmailType};
pub use session::{Cooldown, SessionPhase, VerificationSession};
