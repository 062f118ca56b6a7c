//! Deployment models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Deployment status as reported by the deployment service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStatus {
    Created,
    Queued,
    InProgress,
    Succeeded,
    Failed,
    Stopped,
}

impl std::fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DeploymentStatus::Created => "created",
            DeploymentStatus::Queued => "queued",
            DeploymentStatus::InProgress => "in_progress",
            DeploymentStatus::Succeeded => "succeeded",
            DeploymentStatus::Failed => "failed",
            DeploymentStatus::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Per-instance progress counts for a deployment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstanceOverview {
    #[serde(default)]
    pub pending: u64,

    #[serde(default)]
    pub in_progress: u64,

    #[serde(default)]
    pub succeeded: u64,

    #[serde(default)]
    pub failed: u64,

    #[serde(default)]
    pub skipped: u64,
}

impl std::fmt::Display for InstanceOverview {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "pending: {}, in progress: {}, succeeded: {}, failed: {}, skipped: {}",
            self.pending, self.in_progress, self.succeeded, self.failed, self.skipped
        )
    }
}

/// One server-side deployment run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentRun {
    /// Unique deployment ID
    pub deployment_id: String,

    /// Current status
    pub status: DeploymentStatus,

    /// When the service started the deployment
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,

    /// Set once the deployment reached a terminal status
    #[serde(default)]
    pub complete_time: Option<DateTime<Utc>>,

    /// Instance progress counts
    #[serde(default)]
    pub overview: Option<InstanceOverview>,
}

impl DeploymentRun {
    /// A run is terminal once the service stamped a completion time
    pub fn is_terminal(&self) -> bool {
        self.complete_time.is_some()
    }
}
