//! Archive upload and revision registration

use tracing::info;

use crate::bundle::archive::BundleArchive;
use crate::errors::PublishError;
use crate::models::revision::{BundleFormat, RevisionLocator};
use crate::remote::depot::ObjectStore;
use crate::remote::drydock::DeployApi;

/// Description attached to registered revisions
const REVISION_DESCRIPTION: &str = "Application revision registered by drydock-publisher";

/// Compute the object key for an archive under an optional prefix
pub fn object_key(prefix: &str, archive_name: &str) -> String {
    if prefix.is_empty() {
        archive_name.to_string()
    } else if prefix.ends_with('/') {
        format!("{}{}", prefix, archive_name)
    } else {
        format!("{}/{}", prefix, archive_name)
    }
}

/// Upload the archive and return its revision locator
pub async fn upload_bundle(
    depot: &dyn ObjectStore,
    bucket: &str,
    prefix: &str,
    archive: &BundleArchive,
) -> Result<RevisionLocator, PublishError> {
    if bucket.contains('/') {
        return Err(PublishError::InvalidBucket(bucket.to_string()));
    }

    let key = object_key(prefix, archive.file_name());
    info!("Uploading zip to {}/{}", bucket, key);

    let outcome = depot.put_object(bucket, &key, archive.path()).await?;

    Ok(RevisionLocator {
        bucket: bucket.to_string(),
        key,
        content_tag: outcome.e_tag,
        bundle_format: BundleFormat::Zip,
    })
}

/// Register an uploaded revision with the application
pub async fn register_revision(
    api: &dyn DeployApi,
    application: &str,
    locator: &RevisionLocator,
) -> Result<(), PublishError> {
    info!("Registering revision for application '{}'", application);
    api.register_revision(application, locator, REVISION_DESCRIPTION)
        .await
}
