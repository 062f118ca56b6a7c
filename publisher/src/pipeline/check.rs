//! Connection check
//!
//! Exercises both remote clients with the configured credentials: uploads a
//! tiny probe object to the bucket and confirms the application is listed.

use tracing::info;

use crate::errors::PublishError;
use crate::remote::depot::ObjectStore;
use crate::remote::drydock::DeployApi;

/// Probe the object store and the deployment service
pub async fn run_check(
    depot: &dyn ObjectStore,
    api: &dyn DeployApi,
    bucket: &str,
    application: &str,
) -> Result<(), PublishError> {
    let staging = tempfile::tempdir()?;
    let probe = staging.path().join("probe.txt");
    tokio::fs::write(&probe, b"").await?;

    let key = format!("tmp-{}.txt", uuid::Uuid::new_v4());
    info!("Uploading probe object {}/{}", bucket, key);
    depot.put_object(bucket, &key, &probe).await?;

    let applications = api.list_applications().await?;
    if !applications.iter().any(|name| name == application) {
        return Err(PublishError::ApplicationNotFound(application.to_string()));
    }

    info!("Connection check passed");
    Ok(())
}
