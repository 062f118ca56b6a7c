//! Supported regions and their service endpoints

use url::Url;

use crate::errors::PublishError;

/// Regions the Depot and Drydock services are offered in
const SUPPORTED_REGIONS: &[&str] = &[
    "ap-northeast-1",
    "ap-northeast-2",
    "ap-south-1",
    "ap-southeast-1",
    "ap-southeast-2",
    "ca-central-1",
    "cn-north-1",
    "eu-central-1",
    "eu-west-1",
    "eu-west-2",
    "sa-east-1",
    "us-east-1",
    "us-east-2",
    "us-west-1",
    "us-west-2",
];

/// Token broker endpoint; global, not region-bound
pub const TOKEN_BROKER_URL: &str = "https://tokens.drydock.io";

/// Region-bound service endpoints
#[derive(Debug, Clone)]
pub struct RegionEndpoints {
    pub depot: Url,
    pub deploy: Url,
}

/// Look up the endpoints for a region string
pub fn endpoints_for(region: &str) -> Result<RegionEndpoints, PublishError> {
    if !SUPPORTED_REGIONS.contains(&region) {
        return Err(PublishError::UnknownRegion(region.to_string()));
    }

    let parse = |url: String| {
        Url::parse(&url).map_err(|e| PublishError::ConfigError(format!("{}: {}", url, e)))
    };

    Ok(RegionEndpoints {
        depot: parse(format!("https://depot.{}.drydock.io", region))?,
        deploy: parse(format!("https://deploy.{}.drydock.io", region))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_region_endpoints() {
        let endpoints = endpoints_for("us-east-1").unwrap();
        assert_eq!(endpoints.depot.as_str(), "https://depot.us-east-1.drydock.io/");
        assert_eq!(endpoints.deploy.as_str(), "https://deploy.us-east-1.drydock.io/");
    }

    #[test]
    fn test_unknown_region_rejected() {
        let result = endpoints_for("mars-north-1");
        assert!(matches!(result, Err(PublishError::UnknownRegion(_))));
    }
}
