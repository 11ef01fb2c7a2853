//! Verification workflow configuration module

use serde::{Deserialize, Serialize};

use crate::utils::email::{WorkEmailPattern, WorkEmailPatternError, DEFAULT_WORK_EMAIL_DOMAINS};

/// Verification workflow configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VerificationConfig {
    /// Minimum seconds between code requests within one session
    #[serde(default = "default_cooldown_seconds")]
    pub cooldown_seconds: u64,

    /// Minutes a sent code stays valid on the backend
    #[serde(default = "default_code_expiration_minutes")]
    pub code_expiration_minutes: i64,

    /// Domain suffixes recognised as Government of Canada work email domains
    #[serde(default = "default_work_email_domains")]
    pub work_email_domains: Vec<String>,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            cooldown_seconds: default_cooldown_seconds(),
            code_expiration_minutes: default_code_expiration_minutes(),
            work_email_domains: default_work_email_domains(),
        }
    }
}

impl VerificationConfig {
    /// Compile the configured work email domains into a matcher
    pub fn work_email_pattern(&self) -> Result<WorkEmailPattern, WorkEmailPatternError> {
        WorkEmailPattern::new(&self.work_email_domains)
    }
}

fn default_cooldown_seconds() -> u64 {
    60  // 1 minute
}

fn default_code_expiration_minutes() -> i64 {
    120  // 2 hours
}

fn default_work_email_domains() -> Vec<String> {
    DEFAULT_WORK_EMAIL_DOMAINS
        .iter()
        .map(|domain| domain.to_string())
        .collect()
}
