//! Resource Implementations
//!
//! Implements the CRUD operations for each resource type.

pub mod loadbalancer_target;
pub mod network;

use async_trait::async_trait;
use glesys_client::{LoadBalancerApi, NetworkApi};

use crate::error::Result;
use crate::resource_data::ResourceData;
use crate::schema::ResourceSchema;
use crate::state::DynamicValue;

use loadbalancer_target::LoadBalancerTargetResource;
use network::NetworkResource;

/// Everything the resources need from the GleSYS API
pub trait GlesysApi: NetworkApi + LoadBalancerApi {}

impl<T: NetworkApi + LoadBalancerApi> GlesysApi for T {}

/// Trait for resource operations
#[async_trait]
pub trait Resource: Send + Sync {
    fn schema(&self) -> &'static ResourceSchema;

    /// Resource type name
    fn type_name(&self) -> &'static str {
        self.schema().type_name
    }

    /// Create the remote object and record its identity
    async fn create(&self, api: &dyn GlesysApi, data: &mut ResourceData) -> Result<()>;

    /// Refresh every tracked field; clears the identity when the object is gone
    async fn read(&self, api: &dyn GlesysApi, data: &mut ResourceData) -> Result<()>;

    /// Apply changed fields, then refresh
    async fn update(&self, api: &dyn GlesysApi, data: &mut ResourceData) -> Result<()>;

    /// Remove the remote object and clear the identity
    async fn delete(&self, api: &dyn GlesysApi, data: &mut ResourceData) -> Result<()>;

    /// Check configuration values beyond their types
    fn validate(&self, _config: &DynamicValue) -> Vec<crate::error::ProviderError> {
        vec![]
    }

    /// Initial state for `terraform import`, read afterwards
    fn import_state(&self, id: &str) -> Result<DynamicValue>;
}

static LOADBALANCER_TARGET: LoadBalancerTargetResource = LoadBalancerTargetResource;
static NETWORK: NetworkResource = NetworkResource;

/// All resources served by the provider
pub fn all() -> [&'static dyn Resource; 2] {
    [&LOADBALANCER_TARGET, &NETWORK]
}

/// Look up a resource by type name
pub fn lookup(type_name: &str) -> Option<&'static dyn Resource> {
    all().into_iter().find(|r| r.type_name() == type_name)
}

#[cfg(test)]
pub(crate) mod fake;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert!(lookup("glesys_network").is_some());
        assert!(lookup("glesys_loadbalancer_target").is_some());
        assert!(lookup("glesys_server").is_none());
    }

    #[test]
    fn test_every_resource_has_id() {
        for resource in all() {
            let id = resource.schema().attribute("id").unwrap();
            assert!(id.is_computed(), "{} id must be computed", resource.type_name());
        }
    }
}
