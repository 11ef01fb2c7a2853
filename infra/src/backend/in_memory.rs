//! In-memory verification backend
//!
//! Holds one user's email slots and at most one pending code in process
//! memory. Dispatched emails are kept in an outbox instead of being sent, so
//! development builds and tests can read the code back.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use constant_time_eq::constant_time_eq;
use rand::{rngs::OsRng, Rng};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use ev_core::domain::entities::EmailType;
use ev_core::errors::{SendError, VerifyError};
use ev_core::services::verification::{SendReceipt, VerificationBackendTrait, VerifyReceipt};
use ev_shared::config::VerificationConfig;
use ev_shared::email::mask_email;
use ev_shared::{WorkEmailPattern, WorkEmailPatternError};

/// Number of digits in a verification code
pub const CODE_LENGTH: usize = 6;

/// Default lifetime of a verification code in minutes
const DEFAULT_CODE_EXPIRATION_MINUTES: i64 = 120;

/// One email slot on the user record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailSlot {
    pub address: Option<String>,
    pub verified_at: Option<DateTime<Utc>>,
}

impl EmailSlot {
    pub fn is_verified(&self) -> bool {
        self.verified_at.is_some()
    }

    /// Replace the address; a different address loses its verification
    fn set_address(&mut self, address: Option<&str>) {
        let changed = match (&self.address, address) {
            (Some(current), Some(new)) => !current.eq_ignore_ascii_case(new),
            (None, None) => false,
            _ => true,
        };
        if changed {
            self.verified_at = None;
        }
        self.address = address.map(str::to_string);
    }
}

/// An email the backend would have sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchedEmail {
    pub address: String,
    pub code: String,
    pub email_types: BTreeSet<EmailType>,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct PendingToken {
    code: String,
    email_types: BTreeSet<EmailType>,
    email_address: String,
    expires_at: DateTime<Utc>,
}

impl PendingToken {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Default)]
struct BackendState {
    contact: EmailSlot,
    work: EmailSlot,
    taken_addresses: HashSet<String>,
    pending: Option<PendingToken>,
    outbox: Vec<DispatchedEmail>,
}

impl BackendState {
    fn slot_mut(&mut self, email_type: EmailType) -> &mut EmailSlot {
        match email_type {
            EmailType::Contact => &mut self.contact,
            EmailType::Work => &mut self.work,
        }
    }
}

/// Verification backend for a single user, kept in memory
pub struct InMemoryVerificationBackend {
    user_id: String,
    state: RwLock<BackendState>,
    code_ttl: Duration,
    work_email_pattern: Arc<WorkEmailPattern>,
}

impl InMemoryVerificationBackend {
    /// Create a backend for a new user with default settings
    pub fn new() -> Self {
        Self {
            user_id: Uuid::new_v4().to_string(),
            state: RwLock::new(BackendState::default()),
            code_ttl: Duration::minutes(DEFAULT_CODE_EXPIRATION_MINUTES),
            work_email_pattern: Arc::new(WorkEmailPattern::default()),
        }
    }

    /// Create a backend using the verification settings
    pub fn from_settings(settings: &VerificationConfig) -> Result<Self, WorkEmailPatternError> {
        Ok(Self::new()
            .with_code_expiration_minutes(settings.code_expiration_minutes)
            .with_work_email_pattern(Arc::new(settings.work_email_pattern()?)))
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    /// Set how long a code stays valid; zero makes every code expire at once
    pub fn with_code_expiration_minutes(mut self, minutes: i64) -> Self {
        self.code_ttl = Duration::minutes(minutes.max(0));
        self
    }

    pub fn with_work_email_pattern(mut self, pattern: Arc<WorkEmailPattern>) -> Self {
        self.work_email_pattern = pattern;
        self
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Mark an address as belonging to another user
    pub async fn register_other_user_address(&self, address: &str) {
        self.state
            .write()
            .await
            .taken_addresses
            .insert(address.trim().to_lowercase());
    }

    /// Edit a slot directly, as a profile update would
    pub async fn set_slot_address(&self, email_type: EmailType, address: Option<&str>) {
        self.state.write().await.slot_mut(email_type).set_address(address);
    }

    pub async fn slot(&self, email_type: EmailType) -> EmailSlot {
        let state = self.state.read().await;
        match email_type {
            EmailType::Contact => state.contact.clone(),
            EmailType::Work => state.work.clone(),
        }
    }

    pub async fn outbox(&self) -> Vec<DispatchedEmail> {
        self.state.read().await.outbox.clone()
    }

    /// Code of the most recently dispatched email
    pub async fn last_dispatched_code(&self) -> Option<String> {
        self.state
            .read()
            .await
            .outbox
            .last()
            .map(|email| email.code.clone())
    }

    pub async fn has_pending_code(&self) -> bool {
        self.state.read().await.pending.is_some()
    }

    /// Generate a random verification code using the OS CSPRNG
    fn generate_code() -> String {
        let code: u32 = OsRng.gen_range(0..1_000_000);
        format!("{:0width$}", code, width = CODE_LENGTH)
    }

    fn codes_match(stored: &str, provided: &str) -> bool {
        if stored.len() != provided.len() {
            return false;
        }
        constant_time_eq(stored.as_bytes(), provided.as_bytes())
    }
}

impl Default for InMemoryVerificationBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VerificationBackendTrait for InMemoryVerificationBackend {
    async fn send_verification_code(
        &self,
        email_types: &BTreeSet<EmailType>,
        address: &str,
    ) -> Result<SendReceipt, SendError> {
        let address = address.trim();
        let mut state = self.state.write().await;

        if state.taken_addresses.contains(&address.to_lowercase()) {
            warn!(
                address = %mask_email(address),
                event = "email_address_in_use",
                "Refusing to send code to an address owned by another user"
            );
            return Err(SendError::EmailAddressInUse);
        }

        let now = Utc::now();
        let code = Self::generate_code();
        state.pending = Some(PendingToken {
            code: code.clone(),
            email_types: email_types.clone(),
            email_address: address.to_string(),
            expires_at: now + self.code_ttl,
        });
        state.outbox.push(DispatchedEmail {
            address: address.to_string(),
            code,
            email_types: email_types.clone(),
            sent_at: now,
        });

        info!(
            user_id = %self.user_id,
            address = %mask_email(address),
            slots = email_types.len(),
            event = "verification_email_dispatched",
            "Verification email dispatched"
        );

        Ok(SendReceipt {
            id: self.user_id.clone(),
        })
    }

    async fn verify_code(&self, code: &str) -> Result<VerifyReceipt, VerifyError> {
        let now = Utc::now();
        let mut state = self.state.write().await;

        let Some(token) = state.pending.clone() else {
            debug!(user_id = %self.user_id, event = "no_pending_code", "No pending verification code");
            return Err(VerifyError::InvalidCode);
        };

        if token.is_expired(now) {
            state.pending = None;
            debug!(user_id = %self.user_id, event = "code_expired", "Verification code expired");
            return Err(VerifyError::InvalidCode);
        }

        if !Self::codes_match(&token.code, code.trim()) {
            debug!(user_id = %self.user_id, event = "code_mismatch", "Verification code mismatch");
            return Err(VerifyError::InvalidCode);
        }

        if token.email_types.contains(&EmailType::Work)
            && !self.work_email_pattern.is_match(&token.email_address)
        {
            warn!(
                user_id = %self.user_id,
                address = %mask_email(&token.email_address),
                event = "not_government_email",
                "Work slot requested for a non-government address"
            );
            return Err(VerifyError::NotGovernmentEmail);
        }

        for email_type in &token.email_types {
            let slot = state.slot_mut(*email_type);
            slot.set_address(Some(&token.email_address));
            slot.verified_at = Some(now);
        }
        state.pending = None;

        info!(
            user_id = %self.user_id,
            address = %mask_email(&token.email_address),
            slots = token.email_types.len(),
            event = "emails_verified",
            "Email slots verified"
        );

        Ok(VerifyReceipt {
            id: self.user_id.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types(email_types: &[EmailType]) -> BTreeSet<EmailType> {
        email_types.iter().copied().collect()
    }

    #[test]
    fn test_generate_code_format() {
        for _ in 0..100 {
            let code = InMemoryVerificationBackend::generate_code();
            assert_eq!(code.len(), CODE_LENGTH);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_codes_match() {
        assert!(InMemoryVerificationBackend::codes_match("123456", "123456"));
        assert!(!InMemoryVerificationBackend::codes_match("123456", "123457"));
        assert!(!InMemoryVerificationBackend::codes_match("123456", "12345"));
    }

    #[test]
    fn test_changing_slot_address_clears_verification() {
        let mut slot = EmailSlot {
            address: Some("user@example.org".to_string()),
            verified_at: Some(Utc::now()),
        };

        slot.set_address(Some("USER@example.org"));
        assert!(slot.is_verified());

        slot.set_address(Some("new.email@example.org"));
        assert!(!slot.is_verified());
        assert_eq!(slot.address.as_deref(), Some("new.email@example.org"));
    }

    #[tokio::test]
    async fn test_send_and_verify_contact() {
        let backend = InMemoryVerificationBackend::new().with_user_id("user-1");
        let receipt = backend
            .send_verification_code(&types(&[EmailType::Contact]), "regular.user@example.org")
            .await
            .unwrap();
        assert_eq!(receipt.id, "user-1");

        let code = backend.last_dispatched_code().await.unwrap();
        let receipt = backend.verify_code(&code).await.unwrap();
        assert_eq!(receipt.id, "user-1");

        let contact = backend.slot(EmailType::Contact).await;
        assert_eq!(contact.address.as_deref(), Some("regular.user@example.org"));
        assert!(contact.is_verified());
        assert!(!backend.slot(EmailType::Work).await.is_verified());
        assert!(!backend.has_pending_code().await);
    }

    #[tokio::test]
    async fn test_linked_request_verifies_both_slots() {
        let backend = InMemoryVerificationBackend::new();
        backend
            .send_verification_code(&types(&[EmailType::Contact, EmailType::Work]), "jane@canada.ca")
            .await
            .unwrap();

        let code = backend.last_dispatched_code().await.unwrap();
        backend.verify_code(&code).await.unwrap();

        assert!(backend.slot(EmailType::Contact).await.is_verified());
        assert!(backend.slot(EmailType::Work).await.is_verified());
    }

    #[tokio::test]
    async fn test_bad_code_keeps_pending_token() {
        let backend = InMemoryVerificationBackend::new();
        backend
            .send_verification_code(&types(&[EmailType::Contact]), "user@example.org")
            .await
            .unwrap();
        let code = backend.last_dispatched_code().await.unwrap();
        let wrong = if code == "000000" { "111111" } else { "000000" };

        assert_eq!(backend.verify_code(wrong).await, Err(VerifyError::InvalidCode));
        assert!(backend.has_pending_code().await);
        assert!(backend.verify_code(&code).await.is_ok());
    }

    #[tokio::test]
    async fn test_verify_without_request_fails() {
        let backend = InMemoryVerificationBackend::new();
        assert_eq!(backend.verify_code("123456").await, Err(VerifyError::InvalidCode));
    }

    #[tokio::test]
    async fn test_expired_code_fails() {
        let backend = InMemoryVerificationBackend::new().with_code_expiration_minutes(0);
        backend
            .send_verification_code(&types(&[EmailType::Contact]), "user@example.org")
            .await
            .unwrap();
        let code = backend.last_dispatched_code().await.unwrap();

        assert_eq!(backend.verify_code(&code).await, Err(VerifyError::InvalidCode));
        assert!(!backend.has_pending_code().await);
        assert!(!backend.slot(EmailType::Contact).await.is_verified());
    }

    #[tokio::test]
    async fn test_new_request_replaces_pending_code() {
        let backend = InMemoryVerificationBackend::new();
        let contact = types(&[EmailType::Contact]);
        backend.send_verification_code(&contact, "a@example.org").await.unwrap();
        let first = backend.last_dispatched_code().await.unwrap();
        backend.send_verification_code(&contact, "b@example.org").await.unwrap();
        let second = backend.last_dispatched_code().await.unwrap();

        if first != second {
            assert_eq!(backend.verify_code(&first).await, Err(VerifyError::InvalidCode));
        }
        backend.verify_code(&second).await.unwrap();
        assert_eq!(
            backend.slot(EmailType::Contact).await.address.as_deref(),
            Some("b@example.org")
        );
        assert_eq!(backend.outbox().await.len(), 2);
    }

    #[tokio::test]
    async fn test_work_slot_requires_government_address() {
        let backend = InMemoryVerificationBackend::new();
        backend.set_slot_address(EmailType::Work, Some("regular.user@gc.ca")).await;
        backend
            .send_verification_code(&types(&[EmailType::Work]), "regular.user.2@example.org")
            .await
            .unwrap();
        let code = backend.last_dispatched_code().await.unwrap();

        assert_eq!(
            backend.verify_code(&code).await,
            Err(VerifyError::NotGovernmentEmail)
        );
        let work = backend.slot(EmailType::Work).await;
        assert_eq!(work.address.as_deref(), Some("regular.user@gc.ca"));
        assert!(!work.is_verified());
    }

    #[tokio::test]
    async fn test_address_in_use() {
        let backend = InMemoryVerificationBackend::new();
        backend.register_other_user_address("Taken@Example.org").await;

        let result = backend
            .send_verification_code(&types(&[EmailType::Contact]), "taken@example.org ")
            .await;
        assert_eq!(result, Err(SendError::EmailAddressInUse));
        assert!(backend.outbox().await.is_empty());
        assert!(!backend.has_pending_code().await);
    }
}
