//! Remote service clients

pub mod depot;
pub mod drydock;
pub mod http;
pub mod region;
pub mod tokens;

use std::sync::Arc;

use crate::config::ProxySettings;
use crate::creds::Credential;
use crate::errors::PublishError;

use depot::{HttpDepotClient, ObjectStore};
use drydock::{DeployApi, HttpDrydockClient};

/// The region-bound client pair one pipeline execution works with
///
/// Built fresh per run and discarded at run end; both clients share one
/// HTTP client, so proxy settings apply to both identically.
pub struct ClientBundle {
    pub depot: Arc<dyn ObjectStore>,
    pub deploy: Arc<dyn DeployApi>,
}

impl ClientBundle {
    /// Build clients for `region`, authenticated with `credential`
    pub fn build(
        region: &str,
        credential: Credential,
        proxy: &ProxySettings,
    ) -> Result<Self, PublishError> {
        let endpoints = region::endpoints_for(region)?;
        let client = http::build_http_client(proxy)?;

        let depot = HttpDepotClient::new(
            client.clone(),
            endpoints.depot.as_str(),
            credential.clone(),
        );
        let deploy = HttpDrydockClient::new(client, endpoints.deploy.as_str(), credential);

        Ok(Self {
            depot: Arc::new(depot),
            deploy: Arc::new(deploy),
        })
    }
}
