//! Shared HTTP client construction and request signing

use reqwest::{Client, RequestBuilder};
use secrecy::ExposeSecret;

use crate::config::ProxySettings;
use crate::creds::Credential;
use crate::errors::PublishError;

/// Request header carrying the access key
pub const ACCESS_KEY_HEADER: &str = "x-drydock-access-key";

/// Request header carrying the secret key
pub const SECRET_KEY_HEADER: &str = "x-drydock-secret-key";

/// Request header carrying the session token for assumed-role credentials
pub const SESSION_TOKEN_HEADER: &str = "x-drydock-session-token";

/// Build the HTTP client shared by the Depot and Drydock clients
pub fn build_http_client(proxy: &ProxySettings) -> Result<Client, PublishError> {
    let mut builder = Client::builder().timeout(std::time::Duration::from_secs(30));

    if proxy.is_enabled() {
        let proxy_url = format!("http://{}:{}", proxy.host, proxy.port);
        builder = builder.proxy(reqwest::Proxy::all(&proxy_url)?);
    }

    Ok(builder.build()?)
}

/// Attach credential headers to a request
///
/// Ambient credentials resolve from the host environment at request-build
/// time; a request goes out unsigned when the environment carries nothing.
pub fn sign(request: RequestBuilder, credential: &Credential) -> RequestBuilder {
    match credential {
        Credential::Static {
            access_key,
            secret_key,
            session_token,
        } => {
            let mut request = request
                .header(ACCESS_KEY_HEADER, access_key)
                .header(SECRET_KEY_HEADER, secret_key.expose_secret());
            if let Some(token) = session_token {
                request = request.header(SESSION_TOKEN_HEADER, token.expose_secret());
            }
            request
        }

        Credential::Ambient => {
            let mut request = request;
            if let Ok(access_key) = std::env::var("DRYDOCK_ACCESS_KEY") {
                request = request.header(ACCESS_KEY_HEADER, access_key);
            }
            if let Ok(secret_key) = std::env::var("DRYDOCK_SECRET_KEY") {
                request = request.header(SECRET_KEY_HEADER, secret_key);
            }
            if let Ok(token) = std::env::var("DRYDOCK_SESSION_TOKEN") {
                request = request.header(SESSION_TOKEN_HEADER, token);
            }
            request
        }
    }
}
