//! GraphQL verification backend
//!
//! Talks to the platform API through two mutations:
//!
//! - `SendVerificationEmail` issues a code for an address and a set of slots
//! - `VerifyMyEmails` checks a code against the user's pending request
//!
//! Failures come back as GraphQL errors. Business rejections are recognised
//! by their message or by Laravel validation keys in the error extensions;
//! everything else is reported as `Unknown`.

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error, warn};

use ev_core::domain::entities::EmailType;
use ev_core::errors::{SendError, VerifyError};
use ev_core::services::verification::{SendReceipt, VerificationBackendTrait, VerifyReceipt};
use ev_shared::config::BackendConfig;
use ev_shared::email::mask_email;

use crate::InfrastructureError;

pub const SEND_VERIFICATION_EMAIL_MUTATION: &str = r#"mutation SendVerificationEmail($input: SendUserEmailsVerificationInput!) {
  sendUserEmailsVerification(sendUserEmailsVerificationInput: $input) {
    id
  }
}"#;

pub const VERIFY_MY_EMAILS_MUTATION: &str = r#"mutation VerifyMyEmails($code: String!) {
  verifyUserEmails(code: $code) {
    id
  }
}"#;

const EMAIL_ADDRESS_IN_USE: &str = "EmailAddressInUse";
const NOT_GOVERNMENT_EMAIL: &str = "NotGovernmentEmail";
const VERIFICATION_FAILED: &str = "VERIFICATION_FAILED";

/// One entry of a GraphQL `errors` array
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GraphQlError {
    pub message: String,
    #[serde(default)]
    pub extensions: Option<Value>,
}

impl GraphQlError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            extensions: None,
        }
    }

    /// The message plus every string under `extensions.validation`
    fn keys(&self) -> Vec<&str> {
        let mut keys = vec![self.message.as_str()];
        if let Some(Value::Object(validation)) = self
            .extensions
            .as_ref()
            .and_then(|extensions| extensions.get("validation"))
        {
            for value in validation.values() {
                match value {
                    Value::String(key) => keys.push(key),
                    Value::Array(items) => keys.extend(items.iter().filter_map(Value::as_str)),
                    _ => {}
                }
            }
        }
        keys
    }

    fn has_key(&self, key: &str) -> bool {
        self.keys().iter().any(|candidate| *candidate == key)
    }
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendInput<'a> {
    email_address: &'a str,
    email_types: Vec<EmailType>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendData {
    send_user_emails_verification: Option<IdPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyData {
    verify_user_emails: Option<IdPayload>,
}

#[derive(Debug, Deserialize)]
struct IdPayload {
    id: String,
}

fn joined_messages(errors: &[GraphQlError]) -> String {
    errors
        .iter()
        .map(|error| error.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Classify the errors of a failed `SendVerificationEmail` call
pub fn classify_send_errors(errors: &[GraphQlError]) -> SendError {
    if errors.iter().any(|error| error.has_key(EMAIL_ADDRESS_IN_USE)) {
        SendError::EmailAddressInUse
    } else if errors.iter().any(|error| error.has_key(NOT_GOVERNMENT_EMAIL)) {
        SendError::NotGovernmentEmail
    } else {
        SendError::Unknown(joined_messages(errors))
    }
}

/// Classify the errors of a failed `VerifyMyEmails` call
pub fn classify_verify_errors(errors: &[GraphQlError]) -> VerifyError {
    if errors.iter().any(|error| error.has_key(VERIFICATION_FAILED)) {
        VerifyError::InvalidCode
    } else if errors.iter().any(|error| error.has_key(NOT_GOVERNMENT_EMAIL)) {
        VerifyError::NotGovernmentEmail
    } else {
        VerifyError::Unknown(joined_messages(errors))
    }
}

/// Verification backend backed by the platform's GraphQL API
pub struct GraphQlVerificationBackend {
    client: Client,
    url: String,
    bearer_token: Option<String>,
}

impl GraphQlVerificationBackend {
    /// Create a client from the backend settings
    pub fn new(config: &BackendConfig) -> Result<Self, InfrastructureError> {
        if config.graphql_url.trim().is_empty() {
            return Err(InfrastructureError::Config("GraphQL URL is not set".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: config.graphql_url.clone(),
            bearer_token: config.bearer_token.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Post one operation and decode its response
    ///
    /// Transport failures and undecodable bodies come back as a single
    /// synthetic error so callers classify them as `Unknown`.
    async fn execute<T>(
        &self,
        operation: &str,
        query: &str,
        variables: Value,
    ) -> Result<T, Vec<GraphQlError>>
    where
        T: DeserializeOwned,
    {
        let mut request = self.client.post(&self.url).json(&json!({
            "operationName": operation,
            "query": query,
            "variables": variables,
        }));
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            error!(operation, error = %e, event = "graphql_request_failed", "GraphQL request failed");
            vec![GraphQlError::new(format!("Request failed: {}", e))]
        })?;

        let status = response.status();
        let body: GraphQlResponse<T> = response.json().await.map_err(|e| {
            error!(
                operation,
                status = %status,
                error = %e,
                event = "graphql_response_invalid",
                "Failed to decode GraphQL response"
            );
            vec![GraphQlError::new(format!("HTTP {}: {}", status, e))]
        })?;

        if !body.errors.is_empty() {
            debug!(
                operation,
                errors = %joined_messages(&body.errors),
                event = "graphql_errors",
                "GraphQL operation returned errors"
            );
            return Err(body.errors);
        }

        body.data.ok_or_else(|| {
            warn!(operation, event = "graphql_empty_data", "GraphQL response had no data");
            vec![GraphQlError::new("Response contained no data")]
        })
    }
}

#[async_trait]
impl VerificationBackendTrait for GraphQlVerificationBackend {
    async fn send_verification_code(
        &self,
        email_types: &BTreeSet<EmailType>,
        address: &str,
    ) -> Result<SendReceipt, SendError> {
        debug!(
            address = %mask_email(address),
            slots = email_types.len(),
            event = "graphql_send_code",
            "Sending verification code via GraphQL"
        );
        let input = SendInput {
            email_address: address,
            email_types: email_types.iter().copied().collect(),
        };

        let data: SendData = self
            .execute(
                "SendVerificationEmail",
                SEND_VERIFICATION_EMAIL_MUTATION,
                json!({ "input": input }),
            )
            .await
            .map_err(|errors| classify_send_errors(&errors))?;

        data.send_user_emails_verification
            .map(|payload| SendReceipt { id: payload.id })
            .ok_or_else(|| SendError::Unknown("Mutation returned no user".to_string()))
    }

    async fn verify_code(&self, code: &str) -> Result<VerifyReceipt, VerifyError> {
        let data: VerifyData = self
            .execute("VerifyMyEmails", VERIFY_MY_EMAILS_MUTATION, json!({ "code": code }))
            .await
            .map_err(|errors| classify_verify_errors(&errors))?;

        data.verify_user_emails
            .map(|payload| VerifyReceipt { id: payload.id })
            .ok_or_else(|| VerifyError::Unknown("Mutation returned no user".to_string()))
    }
}
