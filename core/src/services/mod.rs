//! Business services containing the verification workflow.

pub mod verification;

// Re-export commonly used types
pub use verification::{
    AddressChange, AddressChangeDetector, EmailTypeLinkageResolver, EmailVerificationFlow,
    FlowCallbacks, LinkageResolution, RequestCodeController, RequestOutcome, SendReceipt,
    SessionHandle, SubmitCodeController, SubmitOutcome, ThrottleTimer, VerificationBackendTrait,
    VerificationCompleted, VerificationServiceConfig, VerifyReceipt,
};
