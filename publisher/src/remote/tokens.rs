//! Token broker client for assumed-role sessions

use async_trait::async_trait;
use reqwest::Client;
use secrecy::SecretString;
use serde::Deserialize;
use tracing::{debug, error};

use crate::errors::PublishError;

/// Temporary session keys granted for an assumed role
pub struct SessionKeys {
    pub access_key: String,
    pub secret_key: SecretString,
    pub session_token: SecretString,
}

/// Security-token service interface
#[async_trait]
pub trait TokenBroker: Send + Sync {
    /// Assume a role and return temporary session keys
    async fn assume_role(
        &self,
        role_arn: &str,
        external_id: &str,
        session_name: &str,
        duration_secs: u64,
    ) -> Result<SessionKeys, PublishError>;
}

/// HTTP token broker client
///
/// The broker endpoint is global and receives no proxy; the call itself is
/// what authenticates the caller, so requests go out unsigned.
pub struct HttpTokenBroker {
    client: Client,
    base_url: String,
}

impl HttpTokenBroker {
    pub fn new(base_url: &str) -> Result<Self, PublishError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[derive(Deserialize)]
struct AssumeRoleResponse {
    access_key: String,
    secret_key: SecretString,
    session_token: SecretString,
}

#[async_trait]
impl TokenBroker for HttpTokenBroker {
    async fn assume_role(
        &self,
        role_arn: &str,
        external_id: &str,
        session_name: &str,
        duration_secs: u64,
    ) -> Result<SessionKeys, PublishError> {
        let url = format!("{}/v1/assume-role", self.base_url);
        debug!("POST {} (assume role {})", url, role_arn);

        let body = serde_json::json!({
            "role_arn": role_arn,
            "external_id": external_id,
            "session_name": session_name,
            "duration_secs": duration_secs,
        });

        let response = self.client.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Role assumption failed: {} - {}", status, body);
            return Err(PublishError::AssumeRoleFailed(format!(
                "{}: {}",
                status, body
            )));
        }

        let body: AssumeRoleResponse = response.json().await?;
        Ok(SessionKeys {
            access_key: body.access_key,
            secret_key: body.secret_key,
            session_token: body.session_token,
        })
    }
}
