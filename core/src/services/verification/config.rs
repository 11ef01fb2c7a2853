//! Configuration for the verification workflow

use std::sync::Arc;
use std::time::Duration;

use ev_shared::config::VerificationConfig;
use ev_shared::{WorkEmailPattern, WorkEmailPatternError};

/// Minimum seconds between code requests within one session
pub const DEFAULT_COOLDOWN_SECONDS: u64 = 60;

/// Configuration for the verification workflow
#[derive(Debug, Clone)]
pub struct VerificationServiceConfig {
    /// Seconds a successful request blocks further requests; 0 disables the cooldown
    pub cooldown_seconds: u64,
    /// Work email domain matcher shared by every session
    pub work_email_pattern: Arc<WorkEmailPattern>,
}

impl Default for VerificationServiceConfig {
    fn default() -> Self {
        Self {
            cooldown_seconds: DEFAULT_COOLDOWN_SECONDS,
            work_email_pattern: Arc::new(WorkEmailPattern::default()),
        }
    }
}

impl VerificationServiceConfig {
    /// Build from the application's verification settings
    pub fn from_settings(settings: &VerificationConfig) -> Result<Self, WorkEmailPatternError> {
        Ok(Self {
            cooldown_seconds: settings.cooldown_seconds,
            work_email_pattern: Arc::new(settings.work_email_pattern()?),
        })
    }

    /// Override the cooldown length
    pub fn with_cooldown_seconds(mut self, seconds: u64) -> Self {
        self.cooldown_seconds = seconds;
        self
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_seconds)
    }
}
