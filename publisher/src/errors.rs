//! Error types for the Drydock publisher

use thiserror::Error;

/// Main error type for the publisher pipeline
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Access key and secret key are both empty")]
    MissingKeys,

    #[error("Role assumption failed: {0}")]
    AssumeRoleFailed(String),

    #[error("Unsupported region: {0}")]
    UnknownRegion(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Source directory does not exist: {0}")]
    SourceNotFound(String),

    #[error("Provided path (resolved as '{path}') is not a subdirectory of the workspace (resolved as '{workspace}')")]
    SourceOutsideWorkspace { path: String, workspace: String },

    #[error("Manifest file '{0}' does not exist")]
    ManifestMissing(String),

    #[error("Packaging error: {0}")]
    PackagingError(String),

    #[error("Bucket field cannot contain any subdirectories, bucket name only: {0}")]
    InvalidBucket(String),

    #[error("Upload error: {0}")]
    UploadError(String),

    #[error("Revision registration error: {0}")]
    RegistrationError(String),

    #[error("Cannot find application named '{0}'")]
    ApplicationNotFound(String),

    #[error("Cannot find deployment group named '{0}'")]
    DeploymentGroupNotFound(String),

    #[error("Deployment service error: {0}")]
    ServiceError(String),

    #[error("Deployment did not succeed, final status: {0}")]
    DeploymentFailed(String),

    #[error("Exceeded maximum polling time of {0} seconds")]
    PollTimeout(u64),

    #[error("Interrupted while waiting for deployment")]
    Interrupted,
}
