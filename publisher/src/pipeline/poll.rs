//! Completion-polling state machine
//!
//! The deployment service offers no push channel, so the publisher polls
//! [`DeployApi::get_deployment`] on a fixed interval until the run reaches a
//! terminal status, the polling budget runs out, or the caller cancels. A
//! failed status read after the first is degraded to "unknown" and the loop
//! carries on; terminal states never transition again.

use chrono::Utc;
use futures::future::BoxFuture;
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::PollingPolicy;
use crate::errors::PublishError;
use crate::models::deployment::{DeploymentRun, DeploymentStatus};
use crate::remote::drydock::DeployApi;

/// Poll-loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// No status fetched yet, or the last read failed
    Unknown,

    /// The service reported a non-terminal status
    InProgress,

    /// Terminal: the run completed with the success status
    Succeeded,

    /// Terminal: the run completed with any other status
    Failed,

    /// Terminal: the polling budget ran out
    TimedOut,
}

impl PollState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PollState::Succeeded | PollState::Failed | PollState::TimedOut
        )
    }

    /// Ingest one status read; `None` means the read failed
    pub fn observe(&mut self, read: Option<&DeploymentRun>) {
        if self.is_terminal() {
            return;
        }
        *self = match read {
            None => PollState::Unknown,
            Some(run) if run.is_terminal() => {
                if run.status == DeploymentStatus::Succeeded {
                    PollState::Succeeded
                } else {
                    PollState::Failed
                }
            }
            Some(_) => PollState::InProgress,
        };
    }

    /// Force the timeout terminal unless already terminal
    pub fn mark_timed_out(&mut self) {
        if !self.is_terminal() {
            *self = PollState::TimedOut;
        }
    }
}

/// Poll one deployment to completion
///
/// `sleep_fn` is injected so tests can script timing; `cancel` aborts the
/// run without marking the deployment as failed.
pub async fn wait_for_deployment<S, F>(
    api: &dyn DeployApi,
    deployment_id: &str,
    policy: &PollingPolicy,
    sleep_fn: S,
    mut cancel: BoxFuture<'static, ()>,
) -> Result<(), PublishError>
where
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    info!("Monitoring deployment with ID {}...", deployment_id);

    // The very first read is allowed to fail outright; its absence only
    // means the clock starts now instead of at the server's start time.
    let mut last_read = match api.get_deployment(deployment_id).await {
        Ok(read) => read,
        Err(e) => {
            warn!("Failed to fetch deployment status: {}", e);
            None
        }
    };

    let started_at = last_read
        .as_ref()
        .and_then(|run| run.start_time)
        .unwrap_or_else(Utc::now);
    let budget = chrono::Duration::seconds(policy.timeout_secs as i64);

    let mut state = PollState::Unknown;
    loop {
        state.observe(last_read.as_ref());

        match state {
            PollState::Succeeded => {
                log_status(last_read.as_ref());
                info!("Deployment {} succeeded", deployment_id);
                return Ok(());
            }
            PollState::Failed => {
                let status = last_read
                    .as_ref()
                    .map(|run| run.status.to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                log_status(last_read.as_ref());
                return Err(PublishError::DeploymentFailed(status));
            }
            _ => {}
        }

        // Terminal status wins over the budget; only a still-running
        // deployment can time out.
        if Utc::now() - started_at >= budget {
            state.mark_timed_out();
            return Err(PublishError::PollTimeout(policy.timeout_secs));
        }

        log_status(last_read.as_ref());

        tokio::select! {
            _ = &mut cancel => {
                return Err(PublishError::Interrupted);
            }
            _ = sleep_fn(Duration::from_secs(policy.interval_secs)) => {}
        }

        last_read = match api.get_deployment(deployment_id).await {
            Ok(read) => read,
            Err(e) => {
                warn!("Failed to fetch deployment status: {}", e);
                None
            }
        };
    }
}

fn log_status(read: Option<&DeploymentRun>) {
    match read {
        None => info!("Deployment status: unknown"),
        Some(run) => match &run.overview {
            Some(overview) => {
                info!("Deployment status: {}; instances: {}", run.status, overview)
            }
            None => info!("Deployment status: {}", run.status),
        },
    }
}
