//! Credential resolution
//!
//! Turns the configured [`AuthStrategy`] into a usable [`Credential`]. This
//! runs exactly once per pipeline execution; only the assumed-role strategy
//! touches the network. Secret material stays inside [`SecretString`] so it
//! never shows up in Debug or log output.

use secrecy::SecretString;

use crate::config::{AuthStrategy, PollingPolicy};
use crate::errors::PublishError;
use crate::remote::tokens::TokenBroker;

/// Shortest session the token broker will grant
const MIN_SESSION_SECS: u64 = 900;

/// Longest session the token broker will grant
const MAX_SESSION_SECS: u64 = 3600;

/// A resolved client credential set
#[derive(Debug, Clone)]
pub enum Credential {
    /// Fixed or temporary keys attached to every request
    Static {
        access_key: String,
        secret_key: SecretString,
        session_token: Option<SecretString>,
    },

    /// Host-ambient discovery; clients read keys from the environment
    Ambient,
}

/// Session duration requested when assuming a role
///
/// Derived from the polling timeout so the session outlives the poll loop,
/// clamped to the broker's accepted range. An explicit override from the
/// config wins but is clamped the same way.
pub fn session_duration_secs(policy: &PollingPolicy, explicit: Option<u64>) -> u64 {
    explicit
        .unwrap_or(policy.timeout_secs)
        .clamp(MIN_SESSION_SECS, MAX_SESSION_SECS)
}

/// Resolve a strategy into a credential set
pub async fn resolve(
    strategy: &AuthStrategy,
    broker: &dyn TokenBroker,
    polling: &PollingPolicy,
) -> Result<Credential, PublishError> {
    match strategy {
        AuthStrategy::DirectKeys {
            access_key,
            secret_key,
        } => {
            use secrecy::ExposeSecret;
            if access_key.is_empty() && secret_key.expose_secret().is_empty() {
                return Err(PublishError::MissingKeys);
            }
            Ok(Credential::Static {
                access_key: access_key.clone(),
                secret_key: secret_key.clone(),
                session_token: None,
            })
        }

        AuthStrategy::AmbientChain => Ok(Credential::Ambient),

        AuthStrategy::AssumedRole {
            role_arn,
            external_id,
            session_name,
            duration_secs,
        } => {
            let duration = session_duration_secs(polling, *duration_secs);
            let session = broker
                .assume_role(role_arn, external_id, session_name, duration)
                .await?;
            Ok(Credential::Static {
                access_key: session.access_key,
                secret_key: session.secret_key,
                session_token: Some(session.session_token),
            })
        }
    }
}
