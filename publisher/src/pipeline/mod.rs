//! The publish pipeline
//!
//! One sequential, fail-fast run: resolve credentials, build clients, verify
//! the target, package the source, upload and register the revision, then
//! create the deployment and poll it to completion. Every failure is caught
//! here and folded into a single success/failure verdict; diagnostics go to
//! the log only.

pub mod check;
pub mod deploy;
pub mod poll;
pub mod upload;

use futures::future::BoxFuture;
use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::bundle::archive::{build_archive, ArchiveRequest};
use crate::bundle::source::resolve_source_dir;
use crate::config::{AuthStrategy, DeploymentMethod, PublisherConfig};
use crate::creds;
use crate::errors::PublishError;
use crate::remote::depot::ObjectStore;
use crate::remote::drydock::DeployApi;
use crate::remote::region::TOKEN_BROKER_URL;
use crate::remote::tokens::HttpTokenBroker;
use crate::remote::ClientBundle;

/// Targeting fields with macros expanded, computed once per run
#[derive(Debug, Clone)]
pub struct ResolvedTarget {
    pub bucket: String,
    pub prefix: String,
    pub application_name: String,
    pub deployment_group_name: String,
    pub deployment_config_name: Option<String>,
    pub subdirectory: String,
    pub includes: String,
    pub excludes: String,
    pub version_file_name: String,
}

/// Expand `${VAR}` macros in every targeting field
///
/// Credential material is deliberately never expanded.
pub fn resolve_target(
    config: &PublisherConfig,
    vars: &HashMap<String, String>,
) -> ResolvedTarget {
    let expand = |s: &str| crate::vars::expand(s, vars);
    ResolvedTarget {
        bucket: expand(&config.bucket),
        prefix: expand(&config.prefix),
        application_name: expand(&config.application_name),
        deployment_group_name: expand(&config.deployment_group_name),
        deployment_config_name: config.deployment_config_name.as_deref().map(expand),
        subdirectory: expand(&config.subdirectory),
        includes: expand(&config.includes),
        excludes: expand(&config.excludes),
        version_file_name: expand(&config.version_file_name),
    }
}

/// Map an all-empty direct-keys config to the ambient chain
///
/// The fallback is this explicit caller-level branch; the resolver itself
/// treats empty direct keys as an error.
pub fn effective_strategy(strategy: &AuthStrategy) -> AuthStrategy {
    use secrecy::ExposeSecret;
    match strategy {
        AuthStrategy::DirectKeys {
            access_key,
            secret_key,
        } if access_key.is_empty() && secret_key.expose_secret().is_empty() => {
            AuthStrategy::AmbientChain
        }
        other => other.clone(),
    }
}

/// Run the pipeline stages against already-built clients
///
/// Split out from [`run_publish`] so tests can inject fake clients and a
/// scripted sleep.
pub async fn publish_with<S, F>(
    depot: &dyn ObjectStore,
    api: &dyn DeployApi,
    config: &PublisherConfig,
    target: &ResolvedTarget,
    workspace_root: &Path,
    sleep_fn: S,
    cancel: BoxFuture<'static, ()>,
) -> Result<(), PublishError>
where
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    deploy::verify_target(api, &target.application_name, &target.deployment_group_name).await?;

    let source_dir = resolve_source_dir(workspace_root, &target.subdirectory)?;

    let archive = build_archive(ArchiveRequest {
        source_dir,
        project_name: config.project_name.clone(),
        includes: target.includes.clone(),
        excludes: target.excludes.clone(),
        deployment_group_appspec: config.deployment_group_appspec,
        deployment_group_name: target.deployment_group_name.clone(),
        version_file_name: target.version_file_name.clone(),
    })
    .await?;

    let locator = upload::upload_bundle(depot, &target.bucket, &target.prefix, &archive).await?;
    // The staging directory goes away here whatever happens next
    drop(archive);

    upload::register_revision(api, &target.application_name, &locator).await?;

    if config.deployment_method == DeploymentMethod::RegisterOnly {
        info!("Revision registered; deployment creation skipped");
        return Ok(());
    }

    let deployment_id = deploy::create_deployment(api, target, &locator).await?;

    if !config.wait_for_completion {
        info!("Deployment {} created; not waiting for completion", deployment_id);
        return Ok(());
    }

    poll::wait_for_deployment(api, &deployment_id, &config.polling, sleep_fn, cancel).await
}

/// Run one publish and fold the outcome into a verdict
///
/// The caller only learns success or failure; an interrupted run is logged
/// as aborted rather than as a deployment failure, but still verdicts false.
pub async fn run_publish(
    config: &PublisherConfig,
    workspace_root: &Path,
    cancel: BoxFuture<'static, ()>,
) -> bool {
    let result = publish(config, workspace_root, cancel).await;
    match result {
        Ok(()) => {
            info!("Publish succeeded");
            true
        }
        Err(PublishError::Interrupted) => {
            warn!("Publish aborted before completion");
            false
        }
        Err(e) => {
            error!("Failed publish step: {}", e);
            let mut cause = std::error::Error::source(&e);
            while let Some(err) = cause {
                error!("  caused by: {}", err);
                cause = err.source();
            }
            false
        }
    }
}

async fn publish(
    config: &PublisherConfig,
    workspace_root: &Path,
    cancel: BoxFuture<'static, ()>,
) -> Result<(), PublishError> {
    let vars: HashMap<String, String> = std::env::vars().collect();
    let target = resolve_target(config, &vars);

    let strategy = effective_strategy(&config.auth);
    let broker = HttpTokenBroker::new(TOKEN_BROKER_URL)?;
    let credential = creds::resolve(&strategy, &broker, &config.polling).await?;

    let bundle = ClientBundle::build(&config.region, credential, &config.proxy)?;

    publish_with(
        bundle.depot.as_ref(),
        bundle.deploy.as_ref(),
        config,
        &target,
        workspace_root,
        |duration| tokio::time::sleep(duration),
        cancel,
    )
    .await
}
