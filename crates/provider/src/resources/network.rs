//! Private network resource

use async_trait::async_trait;
use glesys_client::{CreateNetworkParams, EditNetworkParams, Network};
use tracing::{info, warn};

use super::{GlesysApi, Resource};
use crate::error::{ProviderError, Result};
use crate::reconcile::{reconcile, MutableField};
use crate::resource_data::{ResourceData, ID_ATTRIBUTE};
use crate::schema::{Attribute, AttributeType, ResourceSchema};
use crate::state::{make_state, string_value, DynamicValue};

pub const TYPE_NAME: &str = "glesys_network";

/// Datacenters offering private networks
pub const DATACENTERS: &[&str] = &["Falkenberg", "Stockholm", "Amsterdam", "London", "Oslo"];

pub static SCHEMA: ResourceSchema = ResourceSchema {
    type_name: TYPE_NAME,
    version: 0,
    description: "A GleSYS private network.",
    attributes: &[
        Attribute::computed("id", AttributeType::String, "Network ID."),
        Attribute::required(
            "datacenter",
            AttributeType::String,
            "Datacenter of the network: `Falkenberg`, `Stockholm`, `Amsterdam`, \
             `London` or `Oslo`.",
        )
        .force_new(),
        Attribute::required("description", AttributeType::String, "Network description."),
        Attribute::computed(
            "public",
            AttributeType::String,
            "Whether the network is public, `yes` or `no`.",
        ),
    ],
};

fn edit_description(params: &mut EditNetworkParams, data: &ResourceData) -> Result<()> {
    params.description = Some(data.get_string("description"));
    Ok(())
}

static MUTABLE_FIELDS: &[MutableField<EditNetworkParams>] =
    &[MutableField::edit("description", edit_description)];

fn apply_network(data: &mut ResourceData, network: &Network) {
    data.set("datacenter", string_value(&network.datacenter));
    data.set("description", string_value(&network.description));
    data.set("public", string_value(&network.public));
}

pub struct NetworkResource;

#[async_trait]
impl Resource for NetworkResource {
    fn schema(&self) -> &'static ResourceSchema {
        &SCHEMA
    }

    async fn create(&self, api: &dyn GlesysApi, data: &mut ResourceData) -> Result<()> {
        let params = CreateNetworkParams {
            datacenter: data.get_string("datacenter"),
            description: data.get_string("description"),
        };
        info!(datacenter = %params.datacenter, "Creating network");

        let network = api
            .create_network(&params)
            .await
            .map_err(ProviderError::remote("creating network", params.description.as_str()))?;
        info!(network = %network.id, "Created network");
        data.set_id(network.id);

        self.read(api, data).await
    }

    async fn read(&self, api: &dyn GlesysApi, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();
        match api.network_details(&id).await {
            Ok(network) => {
                apply_network(data, &network);
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                warn!(network = %id, "Network not found, removing from state");
                data.clear_id();
                Ok(())
            }
            Err(e) => Err(ProviderError::remote("reading network", id)(e)),
        }
    }

    async fn update(&self, api: &dyn GlesysApi, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();
        let plan = reconcile(MUTABLE_FIELDS, data, EditNetworkParams::default())?;

        if let Some(edit) = plan.edit {
            info!(network = %id, "Updating network");
            api.edit_network(&id, &edit)
                .await
                .map_err(ProviderError::remote("updating network", id.as_str()))?;
        }

        self.read(api, data).await
    }

    async fn delete(&self, api: &dyn GlesysApi, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();
        info!(network = %id, "Deleting network");

        api.destroy_network(&id)
            .await
            .map_err(ProviderError::remote("deleting network", id.as_str()))?;

        data.clear_id();
        Ok(())
    }

    fn validate(&self, config: &DynamicValue) -> Vec<ProviderError> {
        match config.get("datacenter").as_string() {
            Some(dc) if !DATACENTERS.contains(&dc) => vec![ProviderError::invalid_attribute(
                "datacenter",
                format!("expected one of {}, got {dc:?}", DATACENTERS.join(", ")),
            )],
            _ => vec![],
        }
    }

    fn import_state(&self, id: &str) -> Result<DynamicValue> {
        if id.is_empty() {
            return Err(ProviderError::State("network import ID must not be empty".to_string()));
        }
        Ok(make_state(vec![
            (ID_ATTRIBUTE, string_value(id)),
            ("datacenter", DynamicValue::Null),
            ("description", DynamicValue::Null),
            ("public", DynamicValue::Null),
        ]))
    }
}
