//! Drydock deployment-service client

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, error};

use crate::creds::Credential;
use crate::errors::PublishError;
use crate::models::deployment::DeploymentRun;
use crate::models::revision::RevisionLocator;
use crate::remote::http::sign;

/// Deployment service interface
#[async_trait]
pub trait DeployApi: Send + Sync {
    /// List all application names
    async fn list_applications(&self) -> Result<Vec<String>, PublishError>;

    /// List the deployment group names of one application
    async fn list_deployment_groups(
        &self,
        application: &str,
    ) -> Result<Vec<String>, PublishError>;

    /// Register an uploaded revision with an application
    async fn register_revision(
        &self,
        application: &str,
        locator: &RevisionLocator,
        description: &str,
    ) -> Result<(), PublishError>;

    /// Create a deployment and return its ID
    async fn create_deployment(
        &self,
        application: &str,
        group: &str,
        config_name: Option<&str>,
        locator: &RevisionLocator,
        description: &str,
    ) -> Result<String, PublishError>;

    /// Fetch one deployment's current state; `None` when the service has no
    /// record yet
    async fn get_deployment(
        &self,
        deployment_id: &str,
    ) -> Result<Option<DeploymentRun>, PublishError>;
}

/// HTTP Drydock client
pub struct HttpDrydockClient {
    client: Client,
    base_url: String,
    credential: Credential,
}

impl HttpDrydockClient {
    pub fn new(client: Client, base_url: &str, credential: Credential) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credential,
        }
    }

    /// Make a GET request
    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, PublishError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let request = sign(self.client.get(&url), &self.credential);
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("HTTP GET failed: {} - {}", status, body);
            return Err(PublishError::ServiceError(format!("{}: {}", status, body)));
        }

        let body = response.json().await?;
        Ok(body)
    }

    /// Make a POST request
    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, PublishError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);

        let request = sign(self.client.post(&url), &self.credential).json(body);
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("HTTP POST failed: {} - {}", status, body);
            return Err(PublishError::ServiceError(format!("{}: {}", status, body)));
        }

        let body = response.json().await?;
        Ok(body)
    }
}

#[derive(Deserialize)]
struct ApplicationListResponse {
    applications: Vec<String>,
}

#[derive(Deserialize)]
struct DeploymentGroupListResponse {
    deployment_groups: Vec<String>,
}

#[derive(Serialize)]
struct RegisterRevisionRequest<'a> {
    revision: &'a RevisionLocator,
    description: &'a str,
}

#[derive(Serialize)]
struct CreateDeploymentRequest<'a> {
    deployment_group_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    deployment_config_name: Option<&'a str>,
    revision: &'a RevisionLocator,
    description: &'a str,
}

#[derive(Deserialize)]
struct CreateDeploymentResponse {
    deployment_id: String,
}

#[derive(Deserialize)]
struct GetDeploymentResponse {
    #[serde(default)]
    deployment: Option<DeploymentRun>,
}

#[async_trait]
impl DeployApi for HttpDrydockClient {
    async fn list_applications(&self) -> Result<Vec<String>, PublishError> {
        let response: ApplicationListResponse = self.get("/v1/applications").await?;
        Ok(response.applications)
    }

    async fn list_deployment_groups(
        &self,
        application: &str,
    ) -> Result<Vec<String>, PublishError> {
        let path = format!("/v1/applications/{}/deployment-groups", application);
        let response: DeploymentGroupListResponse = self.get(&path).await?;
        Ok(response.deployment_groups)
    }

    async fn register_revision(
        &self,
        application: &str,
        locator: &RevisionLocator,
        description: &str,
    ) -> Result<(), PublishError> {
        let path = format!("/v1/applications/{}/revisions", application);
        let body = RegisterRevisionRequest {
            revision: locator,
            description,
        };
        let _: serde_json::Value = self.post(&path, &body).await.map_err(|e| match e {
            PublishError::ServiceError(msg) => PublishError::RegistrationError(msg),
            other => other,
        })?;
        Ok(())
    }

    async fn create_deployment(
        &self,
        application: &str,
        group: &str,
        config_name: Option<&str>,
        locator: &RevisionLocator,
        description: &str,
    ) -> Result<String, PublishError> {
        let path = format!("/v1/applications/{}/deployments", application);
        let body = CreateDeploymentRequest {
            deployment_group_name: group,
            deployment_config_name: config_name,
            revision: locator,
            description,
        };
        let response: CreateDeploymentResponse = self.post(&path, &body).await?;
        Ok(response.deployment_id)
    }

    async fn get_deployment(
        &self,
        deployment_id: &str,
    ) -> Result<Option<DeploymentRun>, PublishError> {
        let path = format!("/v1/deployments/{}", deployment_id);
        let response: GetDeploymentResponse = self.get(&path).await?;
        Ok(response.deployment)
    }
}
