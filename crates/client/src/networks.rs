//! Private network endpoints

use async_trait::async_trait;
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

use crate::{Client, Result};

/// A private network
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    #[serde(rename = "networkid")]
    pub id: String,
    pub datacenter: String,
    #[serde(default)]
    pub description: String,
    /// `yes` when the network is externally routed
    #[serde(default)]
    pub public: String,
}

/// Parameters for `network/create`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateNetworkParams {
    pub datacenter: String,
    pub description: String,
}

/// Parameters for `network/edit`. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EditNetworkParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Serialize)]
struct NetworkId<'a> {
    networkid: &'a str,
}

#[derive(Serialize)]
struct NetworkRequest<'a, P: Serialize> {
    networkid: &'a str,
    #[serde(flatten)]
    params: P,
}

#[derive(Deserialize)]
struct NetworkResponse {
    network: Network,
}

/// Network operations
#[async_trait]
pub trait NetworkApi: Send + Sync {
    async fn create_network(&self, params: &CreateNetworkParams) -> Result<Network>;

    async fn network_details(&self, id: &str) -> Result<Network>;

    async fn edit_network(&self, id: &str, params: &EditNetworkParams) -> Result<Network>;

    async fn destroy_network(&self, id: &str) -> Result<()>;
}

#[async_trait]
impl NetworkApi for Client {
    async fn create_network(&self, params: &CreateNetworkParams) -> Result<Network> {
        let response: NetworkResponse = self.post("network/create", params).await?;
        Ok(response.network)
    }

    async fn network_details(&self, id: &str) -> Result<Network> {
        let body = NetworkId { networkid: id };
        let response: NetworkResponse = self.post("network/details", &body).await?;
        Ok(response.network)
    }

    async fn edit_network(&self, id: &str, params: &EditNetworkParams) -> Result<Network> {
        let body = NetworkRequest { networkid: id, params };
        let response: NetworkResponse = self.post("network/edit", &body).await?;
        Ok(response.network)
    }

    async fn destroy_network(&self, id: &str) -> Result<()> {
        let body = NetworkId { networkid: id };
        let _: IgnoredAny = self.post("network/delete", &body).await?;
        Ok(())
    }
}
