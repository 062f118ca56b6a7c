//! Target verification and deployment creation

use tracing::info;

use crate::errors::PublishError;
use crate::models::revision::RevisionLocator;
use crate::pipeline::ResolvedTarget;
use crate::remote::drydock::DeployApi;

/// Description attached to created deployments
const DEPLOYMENT_DESCRIPTION: &str = "Deployment created by drydock-publisher";

/// Check the application and deployment group exist before doing any work
pub async fn verify_target(
    api: &dyn DeployApi,
    application: &str,
    group: &str,
) -> Result<(), PublishError> {
    let applications = api.list_applications().await?;
    if !applications.iter().any(|name| name == application) {
        return Err(PublishError::ApplicationNotFound(application.to_string()));
    }

    let groups = api.list_deployment_groups(application).await?;
    if !groups.iter().any(|name| name == group) {
        return Err(PublishError::DeploymentGroupNotFound(group.to_string()));
    }

    Ok(())
}

/// Create a deployment of the registered revision and return its ID
pub async fn create_deployment(
    api: &dyn DeployApi,
    target: &ResolvedTarget,
    locator: &RevisionLocator,
) -> Result<String, PublishError> {
    info!(
        "Creating deployment with revision at {}/{}",
        locator.bucket, locator.key
    );

    api.create_deployment(
        &target.application_name,
        &target.deployment_group_name,
        target.deployment_config_name.as_deref(),
        locator,
        DEPLOYMENT_DESCRIPTION,
    )
    .await
}
