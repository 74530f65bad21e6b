//! Load balancer target resource
//!
//! A target lives inside one backend of one load balancer and is addressed by
//! the compound key (`loadbalancerid`, `backend`, `name`). The Terraform ID is
//! the target name. `enabled` is not part of the edit call; it is switched
//! through the enable/disable endpoints.

use async_trait::async_trait;
use glesys_client::{
    AddTargetParams, EditTargetParams, LoadBalancerTarget, RemoveTargetParams, ToggleTargetParams,
};
use tracing::{debug, info, warn};

use super::{GlesysApi, Resource};
use crate::error::{ProviderError, Result};
use crate::reconcile::{reconcile, MutableField, Toggle};
use crate::resource_data::{ResourceData, ID_ATTRIBUTE};
use crate::schema::{Attribute, AttributeType, ResourceSchema};
use crate::state::{bool_value, int_value, make_state, string_value, DynamicValue};

pub const TYPE_NAME: &str = "glesys_loadbalancer_target";

const MIN_WEIGHT: i64 = 1;
const MAX_WEIGHT: i64 = 256;

pub static SCHEMA: ResourceSchema = ResourceSchema {
    type_name: TYPE_NAME,
    version: 0,
    description: "A target in a GleSYS load balancer backend.",
    attributes: &[
        Attribute::computed("id", AttributeType::String, "Target name."),
        Attribute::required(
            "backend",
            AttributeType::String,
            "Name of the backend the target belongs to.",
        )
        .force_new(),
        Attribute::optional_computed(
            "enabled",
            AttributeType::Bool,
            "Whether the target receives traffic.",
        ),
        Attribute::required("loadbalancerid", AttributeType::String, "ID of the load balancer.")
            .force_new(),
        Attribute::required("name", AttributeType::String, "Target name.").force_new(),
        Attribute::required("port", AttributeType::Number, "Port on the target."),
        Attribute::computed("status", AttributeType::String, "Target health, `UP` or `DOWN`."),
        Attribute::required("targetip", AttributeType::String, "IP address of the target."),
        Attribute::required("weight", AttributeType::Number, "Relative weight, 1 to 256."),
    ],
};

fn edit_port(params: &mut EditTargetParams, data: &ResourceData) -> Result<()> {
    params.port = Some(data.get_int("port")?);
    Ok(())
}

fn edit_target_ip(params: &mut EditTargetParams, data: &ResourceData) -> Result<()> {
    params.target_ip = Some(data.get_string("targetip"));
    Ok(())
}

fn edit_weight(params: &mut EditTargetParams, data: &ResourceData) -> Result<()> {
    params.weight = Some(data.get_int("weight")?);
    Ok(())
}

static MUTABLE_FIELDS: &[MutableField<EditTargetParams>] = &[
    MutableField::toggle("enabled"),
    MutableField::edit("port", edit_port),
    MutableField::edit("targetip", edit_target_ip),
    MutableField::edit("weight", edit_weight),
];

/// Addressing keys of a target
struct TargetKey {
    loadbalancer: String,
    backend: String,
    name: String,
}

impl TargetKey {
    /// Key of a target that already has an identity
    fn from_data(data: &ResourceData) -> Self {
        Self {
            loadbalancer: data.get_string("loadbalancerid"),
            backend: data.get_string("backend"),
            name: data.id().to_string(),
        }
    }

    fn toggle_params(&self) -> ToggleTargetParams {
        ToggleTargetParams {
            backend: self.backend.clone(),
            name: self.name.clone(),
        }
    }
}

impl std::fmt::Display for TargetKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.loadbalancer, self.backend, self.name)
    }
}

fn apply_target(data: &mut ResourceData, target: &LoadBalancerTarget) {
    data.set("name", string_value(&target.name));
    data.set("port", int_value(target.port.into()));
    data.set("targetip", string_value(&target.target_ip));
    data.set("weight", int_value(target.weight.into()));
    data.set("status", string_value(&target.status));
    data.set("enabled", bool_value(target.enabled));
}

async fn toggle(api: &dyn GlesysApi, key: &TargetKey, direction: Toggle) -> Result<()> {
    let params = key.toggle_params();
    match direction {
        Toggle::Enable => api
            .enable_target(&key.loadbalancer, &params)
            .await
            .map_err(ProviderError::remote("enabling target", key.to_string()))?,
        Toggle::Disable => api
            .disable_target(&key.loadbalancer, &params)
            .await
            .map_err(ProviderError::remote("disabling target", key.to_string()))?,
    };
    Ok(())
}

pub struct LoadBalancerTargetResource;

#[async_trait]
impl Resource for LoadBalancerTargetResource {
    fn schema(&self) -> &'static ResourceSchema {
        &SCHEMA
    }

    async fn create(&self, api: &dyn GlesysApi, data: &mut ResourceData) -> Result<()> {
        let params = AddTargetParams {
            backend: data.get_string("backend"),
            name: data.get_string("name"),
            port: data.get_int("port")?,
            target_ip: data.get_string("targetip"),
            weight: data.get_int("weight")?,
        };
        let loadbalancer = data.get_string("loadbalancerid");

        info!(
            loadbalancer = %loadbalancer,
            backend = %params.backend,
            target_id = %params.name,
            "Adding load balancer target"
        );
        api.add_target(&loadbalancer, &params).await.map_err(ProviderError::remote(
            "adding target",
            format!("{}/{}/{}", loadbalancer, params.backend, params.name),
        ))?;
        data.set_id(params.name.as_str());

        // Targets start disabled unless explicitly enabled
        if data.get_bool("enabled") != Some(true) {
            let key = TargetKey::from_data(data);
            debug!(target_id = %key, "Disabling new target");
            toggle(api, &key, Toggle::Disable).await?;
        }

        self.read(api, data).await
    }

    async fn read(&self, api: &dyn GlesysApi, data: &mut ResourceData) -> Result<()> {
        let key = TargetKey::from_data(data);

        let details = match api.load_balancer_details(&key.loadbalancer).await {
            Ok(details) => details,
            Err(e) if e.is_not_found() => {
                warn!(
                    loadbalancer = %key.loadbalancer,
                    "Load balancer not found, removing target from state"
                );
                data.clear_id();
                return Ok(());
            }
            Err(e) => return Err(ProviderError::remote("reading target", key.to_string())(e)),
        };

        match details.target(&key.backend, &key.name) {
            Some(target) => {
                apply_target(data, target);
                Ok(())
            }
            None => {
                warn!(target_id = %key, "Target not found, removing from state");
                data.clear_id();
                Ok(())
            }
        }
    }

    async fn update(&self, api: &dyn GlesysApi, data: &mut ResourceData) -> Result<()> {
        let key = TargetKey::from_data(data);
        let base = EditTargetParams {
            backend: key.backend.clone(),
            name: key.name.clone(),
            ..Default::default()
        };
        let plan = reconcile(MUTABLE_FIELDS, data, base)?;

        info!(
            target_id = %key,
            toggles = plan.toggles.len(),
            edit = plan.edit.is_some(),
            "Updating load balancer target"
        );

        for (_, direction) in &plan.toggles {
            toggle(api, &key, *direction).await?;
        }

        if let Some(edit) = plan.edit {
            api.edit_target(&key.loadbalancer, &edit)
                .await
                .map_err(ProviderError::remote("editing target", key.to_string()))?;
        }

        self.read(api, data).await
    }

    async fn delete(&self, api: &dyn GlesysApi, data: &mut ResourceData) -> Result<()> {
        let key = TargetKey::from_data(data);
        info!(target_id = %key, "Removing load balancer target");

        let params = RemoveTargetParams {
            backend: key.backend.clone(),
            name: key.name.clone(),
        };
        api.remove_target(&key.loadbalancer, &params)
            .await
            .map_err(ProviderError::remote("removing target", key.to_string()))?;

        data.clear_id();
        Ok(())
    }

    fn validate(&self, config: &DynamicValue) -> Vec<ProviderError> {
        let mut errors = vec![];

        for attribute in ["weight", "port"] {
            if let DynamicValue::Number(n) = config.get(attribute) {
                if n.as_i64().is_none() {
                    errors.push(ProviderError::invalid_attribute(
                        attribute,
                        format!("must be a whole number, got {n}"),
                    ));
                }
            }
        }

        if let Some(weight) = config.get("weight").as_i64() {
            if !(MIN_WEIGHT..=MAX_WEIGHT).contains(&weight) {
                errors.push(ProviderError::invalid_attribute(
                    "weight",
                    format!("must be between {MIN_WEIGHT} and {MAX_WEIGHT}, got {weight}"),
                ));
            }
        }

        if let Some(port) = config.get("port").as_i64() {
            if u16::try_from(port).map_or(true, |p| p == 0) {
                errors.push(ProviderError::invalid_attribute(
                    "port",
                    format!("must be between 1 and 65535, got {port}"),
                ));
            }
        }

        errors
    }

    /// Import IDs have the form `<loadbalancerid>/<backend>/<name>`.
    fn import_state(&self, id: &str) -> Result<DynamicValue> {
        let parts: Vec<&str> = id.split('/').collect();
        let [loadbalancer, backend, name] = parts.as_slice() else {
            return Err(malformed_import_id(id));
        };
        if [loadbalancer, backend, name].iter().any(|p| p.is_empty()) {
            return Err(malformed_import_id(id));
        }

        Ok(make_state(vec![
            (ID_ATTRIBUTE, string_value(*name)),
            ("backend", string_value(*backend)),
            ("enabled", DynamicValue::Null),
            ("loadbalancerid", string_value(*loadbalancer)),
            ("name", string_value(*name)),
            ("port", DynamicValue::Null),
            ("status", DynamicValue::Null),
            ("targetip", DynamicValue::Null),
            ("weight", DynamicValue::Null),
        ]))
    }
}

fn malformed_import_id(id: &str) -> ProviderError {
    ProviderError::State(format!(
        "unexpected import ID {id:?}, expected <loadbalancerid>/<backend>/<name>"
    ))
}
