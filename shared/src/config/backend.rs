//! Verification backend configuration module

use serde::{Deserialize, Serialize};

/// Which backend implementation serves send/verify requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendProvider {
    /// Process-local reference backend (development and tests)
    InMemory,
    /// Talent platform GraphQL API
    #[serde(rename = "graphql")]
    GraphQl,
}

impl Default for BackendProvider {
    fn default() -> Self {
        BackendProvider::InMemory
    }
}

/// Backend connection configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Backend implementation to use
    #[serde(default)]
    pub provider: BackendProvider,

    /// GraphQL endpoint URL
    #[serde(default = "default_graphql_url")]
    pub graphql_url: String,

    /// Bearer token for the authenticated user, if any
    #[serde(default)]
    pub bearer_token: Option<String>,

    /// Timeout for a single API request in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            provider: BackendProvider::default(),
            graphql_url: default_graphql_url(),
            bearer_token: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl BackendConfig {
    /// Use the in-memory backend
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Use the GraphQL API at `url`
    pub fn graphql(url: impl Into<String>) -> Self {
        Self {
            provider: BackendProvider::GraphQl,
            graphql_url: url.into(),
            ..Default::default()
        }
    }

    /// Attach a bearer token
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }
}

fn default_graphql_url() -> String {
    String::from("http://localhost:8000/graphql")
}

fn default_request_timeout() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_serde_names() {
        let provider: BackendProvider = serde_json::from_str("\"graphql\"").unwrap();
        assert_eq!(provider, BackendProvider::GraphQl);
        let provider: BackendProvider = serde_json::from_str("\"in_memory\"").unwrap();
        assert_eq!(provider, BackendProvider::InMemory);
    }

    #[test]
    fn test_builders() {
        let config = BackendConfig::graphql("https://example.test/graphql").with_bearer_token("abc");
        assert_eq!(config.provider, BackendProvider::GraphQl);
        assert_eq!(config.graphql_url, "https://example.test/graphql");
        assert_eq!(config.bearer_token.as_deref(), Some("abc"));
        assert_eq!(config.request_timeout_secs, 30);
    }
}
