//! Configuration module with workflow-specific sub-modules
//!
//! This module organizes configuration into logical areas:
//! - `backend` - Which verification backend to talk to and how
//! - `environment` - Environment detection and logging configuration
//! - `verification` - Cooldown, code lifetime and work email domains

pub mod backend;
pub mod environment;
pub mod verification;

use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use backend::{BackendConfig, BackendProvider};
pub use environment::{Environment, LogFormat, LoggingConfig};
pub use verification::VerificationConfig;

/// Complete application configuration combining all sub-configurations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Environment configuration
    #[serde(default)]
    pub environment: Environment,

    /// Verification workflow configuration
    #[serde(default)]
    pub verification: VerificationConfig,

    /// Verification backend configuration
    #[serde(default)]
    pub backend: BackendConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let env = Environment::default();
        Self {
            environment: env,
            verification: VerificationConfig::default(),
            backend: BackendConfig::default(),
            logging: LoggingConfig::for_environment(env),
        }
    }
}

impl AppConfig {
    /// Create configuration for development environment
    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            verification: VerificationConfig::default(),
            backend: BackendConfig::in_memory(),
            logging: LoggingConfig::for_environment(Environment::Development),
        }
    }

    /// Create configuration for production environment
    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            verification: VerificationConfig::default(),
            backend: BackendConfig::graphql("https://talent.canada.ca/graphql"),
            logging: LoggingConfig::for_environment(Environment::Production),
        }
    }

    /// Defaults for the environment named in the process environment
    pub fn from_env() -> Self {
        Self::for_environment(Environment::from_env())
    }

    /// Defaults for a specific environment
    pub fn for_environment(env: Environment) -> Self {
        match env {
            Environment::Development => Self::development(),
            Environment::Production => Self::production(),
            Environment::Staging => {
                let mut config = Self::development();
                config.environment = Environment::Staging;
                config.backend = BackendConfig::graphql("https://talent-staging.canada.ca/graphql");
                config.logging = LoggingConfig::for_environment(Environment::Staging);
                config
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_presets() {
        let dev = AppConfig::development();
        assert_eq!(dev.backend.provider, BackendProvider::InMemory);
        assert!(dev.logging.level.contains("ev_core=debug"));

        let prod = AppConfig::production();
        assert_eq!(prod.backend.provider, BackendProvider::GraphQl);
        assert_eq!(prod.verification.cooldown_seconds, 60);

        let staging = AppConfig::for_environment(Environment::Staging);
        assert_eq!(staging.environment, Environment::Staging);
        assert_eq!(staging.backend.provider, BackendProvider::GraphQl);
    }

    #[test]
    fn test_partial_deserialization_uses_defaults() {
        let config: AppConfig = serde_json::from_str(
            r#"{ "verification": { "cooldown_seconds": 30 } }"#,
        )
        .unwrap();
        assert_eq!(config.verification.cooldown_seconds, 30);
        assert_eq!(config.verification.code_expiration_minutes, 120);
        assert!(!config.verification.work_email_domains.is_empty());
        assert_eq!(config.backend.provider, BackendProvider::InMemory);
    }
}
