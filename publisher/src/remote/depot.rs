//! Depot object-store client

use async_trait::async_trait;
use reqwest::Client;
use std::path::Path;
use tracing::{debug, error};

use crate::creds::Credential;
use crate::errors::PublishError;
use crate::models::revision::PutOutcome;
use crate::remote::http::sign;
use crate::utils::sha256_file;

/// Object store interface
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload a file under `bucket`/`key` and return the store's outcome
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        file: &Path,
    ) -> Result<PutOutcome, PublishError>;
}

/// HTTP Depot client
pub struct HttpDepotClient {
    client: Client,
    base_url: String,
    credential: Credential,
}

impl HttpDepotClient {
    pub fn new(client: Client, base_url: &str, credential: Credential) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credential,
        }
    }
}

#[async_trait]
impl ObjectStore for HttpDepotClient {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        file: &Path,
    ) -> Result<PutOutcome, PublishError> {
        let url = format!("{}/v1/{}/{}", self.base_url, bucket, key);
        debug!("PUT {}", url);

        let digest = {
            let file = file.to_owned();
            tokio::task::spawn_blocking(move || sha256_file(&file))
                .await
                .map_err(|e| PublishError::UploadError(e.to_string()))??
        };
        let body = tokio::fs::read(file).await?;

        let request = self
            .client
            .put(&url)
            .header("x-depot-content-sha256", &digest)
            .header(reqwest::header::CONTENT_TYPE, "application/zip")
            .body(body);

        let response = sign(request, &self.credential).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("HTTP PUT failed: {} - {}", status, body);
            return Err(PublishError::UploadError(format!("{}: {}", status, body)));
        }

        let outcome = response.json().await?;
        Ok(outcome)
    }
}
