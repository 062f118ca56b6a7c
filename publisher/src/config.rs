//! Publisher configuration
//!
//! The configuration is an immutable value loaded once at startup from a JSON
//! file and threaded through the pipeline. Validation happens at load time so
//! every later stage can assume a well-formed config.

use secrecy::SecretString;
use serde::Deserialize;
use std::path::Path;

use crate::errors::PublishError;
use crate::logs::LogLevel;

/// How the publisher authenticates against the remote services
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum AuthStrategy {
    /// A fixed access/secret key pair
    DirectKeys {
        #[serde(default)]
        access_key: String,
        #[serde(default = "empty_secret")]
        secret_key: SecretString,
    },

    /// Host-ambient credential discovery (environment variables)
    AmbientChain,

    /// Temporary session keys obtained by assuming a role
    AssumedRole {
        role_arn: String,
        external_id: String,
        #[serde(default = "default_session_name")]
        session_name: String,
        /// Overrides the session duration derived from the polling timeout
        #[serde(default)]
        duration_secs: Option<u64>,
    },
}

impl Default for AuthStrategy {
    fn default() -> Self {
        AuthStrategy::AmbientChain
    }
}

fn empty_secret() -> SecretString {
    SecretString::from("")
}

fn default_session_name() -> String {
    "drydock-publisher".to_string()
}

/// Whether a deployment is created, or registration alone counts as success
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentMethod {
    #[default]
    CreateAndWait,
    RegisterOnly,
}

/// Completion-polling budget
#[derive(Debug, Clone, Deserialize)]
pub struct PollingPolicy {
    /// Give up after this many seconds of polling
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Sleep this long between status reads
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

fn default_timeout_secs() -> u64 {
    900
}

fn default_interval_secs() -> u64 {
    15
}

impl Default for PollingPolicy {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            interval_secs: default_interval_secs(),
        }
    }
}

/// Outbound proxy, applied to both remote-service clients when set
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProxySettings {
    #[serde(default)]
    pub host: String,

    #[serde(default)]
    pub port: u16,
}

impl ProxySettings {
    pub fn is_enabled(&self) -> bool {
        !self.host.is_empty() && self.port != 0
    }
}

/// Publisher settings
#[derive(Debug, Clone, Deserialize)]
pub struct PublisherConfig {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Target object-store bucket (name only, no subpaths)
    pub bucket: String,

    /// Key prefix inside the bucket
    #[serde(default)]
    pub prefix: String,

    /// Drydock application to deploy
    pub application_name: String,

    /// Deployment group within the application
    pub deployment_group_name: String,

    /// Optional named deployment configuration
    #[serde(default)]
    pub deployment_config_name: Option<String>,

    /// Service region, e.g. "us-east-1"
    pub region: String,

    /// Comma-separated include globs; empty means everything
    #[serde(default)]
    pub includes: String,

    /// Comma-separated exclude globs
    #[serde(default)]
    pub excludes: String,

    /// Subdirectory of the workspace to package; empty means the whole workspace
    #[serde(default)]
    pub subdirectory: String,

    /// Outbound proxy
    #[serde(default)]
    pub proxy: ProxySettings,

    /// Authentication strategy
    #[serde(default)]
    pub auth: AuthStrategy,

    /// Wait for the created deployment to finish
    #[serde(default = "default_true")]
    pub wait_for_completion: bool,

    /// Completion-polling budget
    #[serde(default)]
    pub polling: PollingPolicy,

    /// Deployment method
    #[serde(default)]
    pub deployment_method: DeploymentMethod,

    /// Pick appspec.<group>.yml over the plain appspec.yml
    #[serde(default)]
    pub deployment_group_appspec: bool,

    /// File inside the source directory naming the build version
    #[serde(default)]
    pub version_file_name: String,

    /// Project name used in archive file names
    #[serde(default = "default_project_name")]
    pub project_name: String,
}

fn default_true() -> bool {
    true
}

fn default_project_name() -> String {
    "build".to_string()
}

impl PublisherConfig {
    /// Load a config file, normalize it and validate it
    pub async fn load(path: &Path) -> Result<Self, PublishError> {
        let raw = tokio::fs::read_to_string(path).await?;
        let mut config: PublisherConfig = serde_json::from_str(&raw)?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Field normalizations applied before validation
    pub fn normalize(&mut self) {
        if self.prefix == "/" {
            self.prefix.clear();
        }
        if matches!(self.deployment_config_name.as_deref(), Some("")) {
            self.deployment_config_name = None;
        }
    }

    /// Reject configs no pipeline stage could act on
    pub fn validate(&self) -> Result<(), PublishError> {
        if self.bucket.is_empty() {
            return Err(PublishError::ConfigError("bucket must not be empty".into()));
        }
        if self.application_name.is_empty() {
            return Err(PublishError::ConfigError(
                "application_name must not be empty".into(),
            ));
        }
        if self.deployment_group_name.is_empty() {
            return Err(PublishError::ConfigError(
                "deployment_group_name must not be empty".into(),
            ));
        }
        if self.region.is_empty() {
            return Err(PublishError::ConfigError("region must not be empty".into()));
        }
        if self.polling.timeout_secs == 0 || self.polling.interval_secs == 0 {
            return Err(PublishError::ConfigError(
                "polling timeout and interval must be positive".into(),
            ));
        }
        if !self.proxy.host.is_empty() && self.proxy.port == 0 {
            return Err(PublishError::ConfigError(
                "proxy port must be set when a proxy host is given".into(),
            ));
        }
        Ok(())
    }
}
