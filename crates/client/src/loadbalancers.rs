//! Load balancer target endpoints

use async_trait::async_trait;
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

use crate::{Client, Result};

/// Load balancer as returned by `loadbalancer/details`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancerDetails {
    #[serde(rename = "loadbalancerid", default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "backends", default)]
    pub backends: Vec<LoadBalancerBackend>,
}

/// Backend of a load balancer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancerBackend {
    pub name: String,
    #[serde(default)]
    pub targets: Vec<LoadBalancerTarget>,
}

/// Target of a backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancerTarget {
    pub name: String,
    pub port: u16,
    #[serde(rename = "targetip")]
    pub target_ip: String,
    pub weight: u16,
    /// `UP` or `DOWN`
    #[serde(default)]
    pub status: String,
    pub enabled: bool,
}

impl LoadBalancerDetails {
    /// Look up a target by backend and target name.
    ///
    /// Only the backend named `backend` is searched; targets with the same
    /// name under other backends never match.
    pub fn target(&self, backend: &str, name: &str) -> Option<&LoadBalancerTarget> {
        self.backends
            .iter()
            .find(|b| b.name == backend)?
            .targets
            .iter()
            .find(|t| t.name == name)
    }
}

/// Parameters for `loadbalancer/addtarget`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddTargetParams {
    #[serde(rename = "backendname")]
    pub backend: String,
    #[serde(rename = "targetname")]
    pub name: String,
    pub port: u16,
    #[serde(rename = "targetip")]
    pub target_ip: String,
    pub weight: u16,
}

/// Parameters for `loadbalancer/edittarget`. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EditTargetParams {
    #[serde(rename = "backendname")]
    pub backend: String,
    #[serde(rename = "targetname")]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(rename = "targetip", skip_serializing_if = "Option::is_none")]
    pub target_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<u16>,
}

/// Parameters for `loadbalancer/enabletarget` and `loadbalancer/disabletarget`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToggleTargetParams {
    #[serde(rename = "backendname")]
    pub backend: String,
    #[serde(rename = "targetname")]
    pub name: String,
}

/// Parameters for `loadbalancer/removetarget`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoveTargetParams {
    #[serde(rename = "backendname")]
    pub backend: String,
    #[serde(rename = "targetname")]
    pub name: String,
}

#[derive(Serialize)]
struct LoadBalancerRequest<'a, P: Serialize> {
    loadbalancerid: &'a str,
    #[serde(flatten)]
    params: P,
}

#[derive(Serialize)]
struct LoadBalancerId<'a> {
    loadbalancerid: &'a str,
}

#[derive(Deserialize)]
struct LoadBalancerResponse {
    loadbalancer: LoadBalancerDetails,
}

/// Load balancer target operations
#[async_trait]
pub trait LoadBalancerApi: Send + Sync {
    async fn load_balancer_details(&self, id: &str) -> Result<LoadBalancerDetails>;

    async fn add_target(&self, id: &str, params: &AddTargetParams) -> Result<LoadBalancerDetails>;

    async fn edit_target(&self, id: &str, params: &EditTargetParams) -> Result<LoadBalancerDetails>;

    async fn enable_target(
        &self,
        id: &str,
        params: &ToggleTargetParams,
    ) -> Result<LoadBalancerDetails>;

    async fn disable_target(
        &self,
        id: &str,
        params: &ToggleTargetParams,
    ) -> Result<LoadBalancerDetails>;

    async fn remove_target(&self, id: &str, params: &RemoveTargetParams) -> Result<()>;
}

impl Client {
    async fn load_balancer_call<P>(
        &self,
        path: &str,
        id: &str,
        params: &P,
    ) -> Result<LoadBalancerDetails>
    where
        P: Serialize + Sync,
    {
        let body = LoadBalancerRequest { loadbalancerid: id, params };
        let response: LoadBalancerResponse = self.post(path, &body).await?;
        Ok(response.loadbalancer)
    }
}

#[async_trait]
impl LoadBalancerApi for Client {
    async fn load_balancer_details(&self, id: &str) -> Result<LoadBalancerDetails> {
        let body = LoadBalancerId { loadbalancerid: id };
        let response: LoadBalancerResponse = self.post("loadbalancer/details", &body).await?;
        Ok(response.loadbalancer)
    }

    async fn add_target(&self, id: &str, params: &AddTargetParams) -> Result<LoadBalancerDetails> {
        self.load_balancer_call("loadbalancer/addtarget", id, params).await
    }

    async fn edit_target(
        &self,
        id: &str,
        params: &EditTargetParams,
    ) -> Result<LoadBalancerDetails> {
        self.load_balancer_call("loadbalancer/edittarget", id, params).await
    }

    async fn enable_target(
        &self,
        id: &str,
        params: &ToggleTargetParams,
    ) -> Result<LoadBalancerDetails> {
        self.load_balancer_call("loadbalancer/enabletarget", id, params).await
    }

    async fn disable_target(
        &self,
        id: &str,
        params: &ToggleTargetParams,
    ) -> Result<LoadBalancerDetails> {
        self.load_balancer_call("loadbalancer/disabletarget", id, params).await
    }

    async fn remove_target(&self, id: &str, params: &RemoveTargetParams) -> Result<()> {
        let body = LoadBalancerRequest { loadbalancerid: id, params };
        let _: IgnoredAny = self.post("loadbalancer/removetarget", &body).await?;
        Ok(())
    }
}
