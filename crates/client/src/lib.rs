//! GleSYS API Client
//!
//! Typed access to the parts of the GleSYS API used by the Terraform
//! provider: private networks and load balancer targets. Every endpoint is a
//! JSON `POST` authenticated with the project id and API key.

pub mod error;
pub mod loadbalancers;
pub mod networks;

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use error::{Error, Result};
pub use loadbalancers::{
    AddTargetParams, EditTargetParams, LoadBalancerApi, LoadBalancerBackend,
    LoadBalancerDetails, LoadBalancerTarget, RemoveTargetParams, ToggleTargetParams,
};
pub use networks::{CreateNetworkParams, EditNetworkParams, Network, NetworkApi};

/// Default GleSYS API endpoint
pub const DEFAULT_API_URL: &str = "https://api.glesys.com";

/// Default per-request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Project id, e.g. `CL12345`
    pub userid: String,

    /// API key
    pub token: String,

    /// Base URL of the API
    pub api_url: String,

    /// Per-request timeout
    pub timeout_secs: u64,

    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            userid: String::new(),
            token: String::new(),
            api_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: format!("glesys-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// GleSYS API client
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    userid: String,
    token: String,
}

/// Successful responses are wrapped in `{"response": {...}}`.
#[derive(Deserialize)]
struct Envelope<T> {
    response: T,
}

impl Client {
    /// Create a new client
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.userid.is_empty() {
            return Err(Error::InvalidConfig("userid must not be empty".to_string()));
        }
        if config.token.is_empty() {
            return Err(Error::InvalidConfig("token must not be empty".to_string()));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent)
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            userid: config.userid,
            token: config.token,
        })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST `body` to `path` and decode the `response` object.
    pub(crate) async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, path);
        debug!(%url, "GleSYS API request");

        let response = self
            .http
            .post(&url)
            .basic_auth(&self.userid, Some(&self.token))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let err = Error::from_response(status.as_u16(), &bytes);
            debug!(%url, error = %err, "GleSYS API request failed");
            return Err(err);
        }

        let envelope: Envelope<T> =
            serde_json::from_slice(&bytes).map_err(|source| Error::Decode {
                path: path.to_string(),
                source,
            })?;

        Ok(envelope.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_requires_credentials() {
        let err = Client::new(ClientConfig::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));

        let err = Client::new(ClientConfig {
            userid: "CL12345".to_string(),
            ..Default::default()
        })
        .unwrap_err();
        assert!(err.to_string().contains("token"));
    }

    #[test]
    fn test_base_url_is_normalized() {
        let client = Client::new(ClientConfig {
            userid: "CL12345".to_string(),
            token: "secret".to_string(),
            api_url: "http://127.0.0.1:8080/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:8080");
    }
}
