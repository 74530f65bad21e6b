//! In-memory GleSYS API that records every call, for handler tests.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use glesys_client::{
    AddTargetParams, CreateNetworkParams, EditNetworkParams, EditTargetParams, Error,
    LoadBalancerApi, LoadBalancerBackend, LoadBalancerDetails, LoadBalancerTarget, Network,
    NetworkApi, RemoveTargetParams, Result, ToggleTargetParams,
};
use parking_lot::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    LoadBalancerDetails(String),
    AddTarget(String, AddTargetParams),
    EditTarget(String, EditTargetParams),
    EnableTarget(String, ToggleTargetParams),
    DisableTarget(String, ToggleTargetParams),
    RemoveTarget(String, RemoveTargetParams),
    CreateNetwork(CreateNetworkParams),
    NetworkDetails(String),
    EditNetwork(String, EditNetworkParams),
    DestroyNetwork(String),
}

impl Call {
    pub fn name(&self) -> &'static str {
        match self {
            Call::LoadBalancerDetails(_) => "load_balancer_details",
            Call::AddTarget(..) => "add_target",
            Call::EditTarget(..) => "edit_target",
            Call::EnableTarget(..) => "enable_target",
            Call::DisableTarget(..) => "disable_target",
            Call::RemoveTarget(..) => "remove_target",
            Call::CreateNetwork(_) => "create_network",
            Call::NetworkDetails(_) => "network_details",
            Call::EditNetwork(..) => "edit_network",
            Call::DestroyNetwork(_) => "destroy_network",
        }
    }
}

#[derive(Default)]
pub struct FakeApi {
    calls: Mutex<Vec<Call>>,
    failing: Mutex<HashSet<&'static str>>,
    load_balancers: Mutex<BTreeMap<String, LoadBalancerDetails>>,
    networks: Mutex<BTreeMap<String, Network>>,
}

fn not_found(what: &str) -> Error {
    Error::Api {
        code: 404,
        text: format!("{what} not found"),
    }
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an empty load balancer with the given backends
    pub fn with_load_balancer(self, id: &str, backends: &[&str]) -> Self {
        self.load_balancers.lock().insert(
            id.to_string(),
            LoadBalancerDetails {
                id: id.to_string(),
                name: id.to_string(),
                backends: backends
                    .iter()
                    .map(|name| LoadBalancerBackend {
                        name: name.to_string(),
                        targets: vec![],
                    })
                    .collect(),
            },
        );
        self
    }

    pub fn with_target(self, lb: &str, backend: &str, target: LoadBalancerTarget) -> Self {
        if let Some(details) = self.load_balancers.lock().get_mut(lb) {
            if let Some(b) = details.backends.iter_mut().find(|b| b.name == backend) {
                b.targets.push(target);
            }
        }
        self
    }

    pub fn with_network(self, network: Network) -> Self {
        self.networks.lock().insert(network.id.clone(), network);
        self
    }

    /// Make every call of the named operation fail with a server error
    pub fn fail_on(&self, operation: &'static str) {
        self.failing.lock().insert(operation);
    }

    pub fn remove_load_balancer(&self, id: &str) {
        self.load_balancers.lock().remove(id);
    }

    pub fn remove_network(&self, id: &str) {
        self.networks.lock().remove(id);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn call_names(&self) -> Vec<&'static str> {
        self.calls.lock().iter().map(Call::name).collect()
    }

    pub fn target(&self, lb: &str, backend: &str, name: &str) -> Option<LoadBalancerTarget> {
        self.load_balancers
            .lock()
            .get(lb)
            .and_then(|d| d.target(backend, name).cloned())
    }

    fn record(&self, call: Call) -> Result<()> {
        let name = call.name();
        self.calls.lock().push(call);
        if self.failing.lock().contains(name) {
            return Err(Error::Api {
                code: 500,
                text: format!("{name} failed"),
            });
        }
        Ok(())
    }

    fn with_target_mut<F>(
        &self,
        lb: &str,
        backend: &str,
        name: &str,
        f: F,
    ) -> Result<LoadBalancerDetails>
    where
        F: FnOnce(&mut LoadBalancerTarget),
    {
        let mut lbs = self.load_balancers.lock();
        let details = lbs.get_mut(lb).ok_or_else(|| not_found("LoadBalancer"))?;
        let target = details
            .backends
            .iter_mut()
            .find(|b| b.name == backend)
            .and_then(|b| b.targets.iter_mut().find(|t| t.name == name))
            .ok_or_else(|| not_found("Target"))?;
        f(target);
        Ok(details.clone())
    }
}

#[async_trait]
impl LoadBalancerApi for FakeApi {
    async fn load_balancer_details(&self, id: &str) -> Result<LoadBalancerDetails> {
        self.record(Call::LoadBalancerDetails(id.to_string()))?;
        self.load_balancers
            .lock()
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("LoadBalancer"))
    }

    async fn add_target(&self, id: &str, params: &AddTargetParams) -> Result<LoadBalancerDetails> {
        self.record(Call::AddTarget(id.to_string(), params.clone()))?;
        let mut lbs = self.load_balancers.lock();
        let details = lbs.get_mut(id).ok_or_else(|| not_found("LoadBalancer"))?;
        let backend = details
            .backends
            .iter_mut()
            .find(|b| b.name == params.backend)
            .ok_or_else(|| not_found("Backend"))?;
        backend.targets.push(LoadBalancerTarget {
            name: params.name.clone(),
            port: params.port,
            target_ip: params.target_ip.clone(),
            weight: params.weight,
            status: "UP".to_string(),
            enabled: true,
        });
        Ok(details.clone())
    }

    async fn edit_target(
        &self,
        id: &str,
        params: &EditTargetParams,
    ) -> Result<LoadBalancerDetails> {
        self.record(Call::EditTarget(id.to_string(), params.clone()))?;
        self.with_target_mut(id, &params.backend, &params.name, |t| {
            if let Some(port) = params.port {
                t.port = port;
            }
            if let Some(ip) = &params.target_ip {
                t.target_ip = ip.clone();
            }
            if let Some(weight) = params.weight {
                t.weight = weight;
            }
        })
    }

    async fn enable_target(
        &self,
        id: &str,
        params: &ToggleTargetParams,
    ) -> Result<LoadBalancerDetails> {
        self.record(Call::EnableTarget(id.to_string(), params.clone()))?;
        self.with_target_mut(id, &params.backend, &params.name, |t| t.enabled = true)
    }

    async fn disable_target(
        &self,
        id: &str,
        params: &ToggleTargetParams,
    ) -> Result<LoadBalancerDetails> {
        self.record(Call::DisableTarget(id.to_string(), params.clone()))?;
        self.with_target_mut(id, &params.backend, &params.name, |t| t.enabled = false)
    }

    async fn remove_target(&self, id: &str, params: &RemoveTargetParams) -> Result<()> {
        self.record(Call::RemoveTarget(id.to_string(), params.clone()))?;
        let mut lbs = self.load_balancers.lock();
        let details = lbs.get_mut(id).ok_or_else(|| not_found("LoadBalancer"))?;
        for backend in details.backends.iter_mut().filter(|b| b.name == params.backend) {
            backend.targets.retain(|t| t.name != params.name);
        }
        Ok(())
    }
}

#[async_trait]
impl NetworkApi for FakeApi {
    async fn create_network(&self, params: &CreateNetworkParams) -> Result<Network> {
        self.record(Call::CreateNetwork(params.clone()))?;
        let mut networks = self.networks.lock();
        let network = Network {
            id: format!("vl{}", 100 + networks.len()),
            datacenter: params.datacenter.clone(),
            description: params.description.clone(),
            public: "no".to_string(),
        };
        networks.insert(network.id.clone(), network.clone());
        Ok(network)
    }

    async fn network_details(&self, id: &str) -> Result<Network> {
        self.record(Call::NetworkDetails(id.to_string()))?;
        self.networks
            .lock()
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("Network"))
    }

    async fn edit_network(&self, id: &str, params: &EditNetworkParams) -> Result<Network> {
        self.record(Call::EditNetwork(id.to_string(), params.clone()))?;
        let mut networks = self.networks.lock();
        let network = networks.get_mut(id).ok_or_else(|| not_found("Network"))?;
        if let Some(description) = &params.description {
            network.description = description.clone();
        }
        Ok(network.clone())
    }

    async fn destroy_network(&self, id: &str) -> Result<()> {
        self.record(Call::DestroyNetwork(id.to_string()))?;
        self.networks
            .lock()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| not_found("Network"))
    }
}
