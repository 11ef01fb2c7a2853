//! # Infrastructure Layer
//!
//! This crate provides the concrete pieces the verification workflow runs on:
//!
//! - **Backends**: an in-memory backend for development and tests, and a
//!   GraphQL client for the platform API
//! - **Settings**: layered configuration loading (defaults, TOML file, `.env`,
//!   `EV__` environment variables)
//! - **Telemetry**: `tracing-subscriber` initialisation from the logging config
//!
//! ## Features
//!
//! - `graphql-client`: Enable the GraphQL backend (default)

use std::sync::Arc;

use ev_core::services::verification::VerificationBackendTrait;
use ev_shared::config::{AppConfig, BackendProvider};

// Re-export core types for convenience
pub use ev_core::errors::*;

/// Verification backend implementations
pub mod backend;

/// Configuration loading
pub mod settings;

/// Tracing subscriber setup
pub mod telemetry;

pub use backend::InMemoryVerificationBackend;
#[cfg(feature = "graphql-client")]
pub use backend::GraphQlVerificationBackend;
pub use settings::load_config;
pub use telemetry::init_tracing;

/// Build the backend named in the configuration
///
/// # Errors
///
/// * `Config` - The provider is not available in this build, or its settings are invalid
/// * `Http` - The HTTP client could not be built
pub fn create_backend(
    config: &AppConfig,
) -> Result<Arc<dyn VerificationBackendTrait>, InfrastructureError> {
    match config.backend.provider {
        BackendProvider::InMemory => {
            let backend = InMemoryVerificationBackend::from_settings(&config.verification)?;
            tracing::info!(provider = "in_memory", "Verification backend initialized");
            Ok(Arc::new(backend))
        }
        #[cfg(feature = "graphql-client")]
        BackendProvider::GraphQl => {
            let backend = GraphQlVerificationBackend::new(&config.backend)?;
            tracing::info!(
                provider = "graphql",
                url = %config.backend.graphql_url,
                "Verification backend initialized"
            );
            Ok(Arc::new(backend))
        }
        #[cfg(not(feature = "graphql-client"))]
        BackendProvider::GraphQl => Err(InfrastructureError::Config(
            "GraphQL backend requires the `graphql-client` feature".to_string(),
        )),
    }
}

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Work email domain list could not be compiled
    #[error("Invalid work email domains: {0}")]
    Pattern(#[from] ev_shared::WorkEmailPatternError),

    /// HTTP client error for the GraphQL API
    #[cfg(feature = "graphql-client")]
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Tracing subscriber could not be installed
    #[error("Tracing initialization error: {0}")]
    Tracing(String),
}

impl From<config::ConfigError> for InfrastructureError {
    fn from(error: config::ConfigError) -> Self {
        InfrastructureError::Config(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_in_memory_backend() {
        let config = AppConfig::development();
        assert!(create_backend(&config).is_ok());
    }

    #[test]
    fn test_invalid_domains_are_rejected() {
        let mut config = AppConfig::development();
        config.verification.work_email_domains = vec!["not a domain".to_string()];
        assert!(matches!(
            create_backend(&config),
            Err(InfrastructureError::Pattern(_))
        ));
    }

    #[cfg(feature = "graphql-client")]
    #[test]
    fn test_create_graphql_backend() {
        use ev_shared::config::BackendConfig;

        let mut config = AppConfig::development();
        config.backend = BackendConfig::graphql("http://localhost:8000/graphql");
        assert!(create_backend(&config).is_ok());
    }
}
