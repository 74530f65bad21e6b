//! GleSYS Terraform Provider Implementation
//!
//! Implements the Terraform Plugin Protocol v6 Provider service. Protocol
//! values are decoded here, handed to the resource handlers as
//! [`ResourceData`] and encoded back; handler errors become diagnostics.

use std::collections::HashMap;
use std::sync::Arc;

use glesys_client::Client;
use tokio::sync::{Notify, RwLock};
use tonic::{Request, Response, Status};
use tracing::{debug, error, info, warn};

use crate::config::ProviderConfig;
use crate::error::{attribute_path, ProviderError};
use crate::plan::plan_change;
use crate::resource_data::ResourceData;
use crate::resources::{self, GlesysApi, Resource};
use crate::schema::PROVIDER_SCHEMA;
use crate::state::{decode_optional, to_proto, DynamicValue as LocalDynamicValue};
use crate::tfplugin6::provider_server::Provider;
use crate::tfplugin6::*;

/// GleSYS Terraform Provider
pub struct GlesysProvider {
    /// API client, set once by ConfigureProvider
    api: Arc<RwLock<Option<Arc<dyn GlesysApi>>>>,
    /// Signalled by StopProvider
    shutdown: Arc<Notify>,
}

impl GlesysProvider {
    pub fn new(shutdown: Arc<Notify>) -> Self {
        Self {
            api: Arc::new(RwLock::new(None)),
            shutdown,
        }
    }

    /// Provider that is already configured with `api`
    pub fn with_api(api: Arc<dyn GlesysApi>) -> Self {
        Self {
            api: Arc::new(RwLock::new(Some(api))),
            shutdown: Arc::new(Notify::new()),
        }
    }

    async fn api(&self) -> Result<Arc<dyn GlesysApi>, Status> {
        self.api
            .read()
            .await
            .clone()
            .ok_or_else(|| ProviderError::NotConfigured.into())
    }
}

fn resource(type_name: &str) -> Result<&'static dyn Resource, Status> {
    resources::lookup(type_name)
        .ok_or_else(|| ProviderError::UnknownResourceType(type_name.to_string()).into())
}

fn decode(value: Option<&DynamicValue>) -> Result<LocalDynamicValue, Status> {
    Ok(decode_optional(value)?)
}

fn encode(value: &LocalDynamicValue) -> Result<DynamicValue, Status> {
    Ok(to_proto(value)?)
}

fn error_diagnostic(summary: impl Into<String>, detail: impl Into<String>) -> Diagnostic {
    Diagnostic {
        severity: diagnostic::Severity::Error as i32,
        summary: summary.into(),
        detail: detail.into(),
        attribute: None,
    }
}

#[tonic::async_trait]
impl Provider for GlesysProvider {
    async fn get_provider_schema(
        &self,
        _request: Request<get_provider_schema::Request>,
    ) -> Result<Response<get_provider_schema::Response>, Status> {
        info!("GetProviderSchema called");

        let resource_schemas: HashMap<String, Schema> = resources::all()
            .into_iter()
            .map(|r| (r.type_name().to_string(), r.schema().to_proto()))
            .collect();

        Ok(Response::new(get_provider_schema::Response {
            provider: Some(PROVIDER_SCHEMA.to_proto()),
            resource_schemas,
            data_source_schemas: HashMap::new(),
            diagnostics: vec![],
            provider_meta: None,
            server_capabilities: Some(ServerCapabilities {
                plan_destroy: true,
                get_provider_schema_optional: false,
            }),
        }))
    }

    async fn validate_provider_config(
        &self,
        _request: Request<validate_provider_config::Request>,
    ) -> Result<Response<validate_provider_config::Response>, Status> {
        // Credentials may come from the environment at configure time
        debug!("ValidateProviderConfig called");
        Ok(Response::new(validate_provider_config::Response {
            diagnostics: vec![],
        }))
    }

    async fn validate_resource_config(
        &self,
        request: Request<validate_resource_config::Request>,
    ) -> Result<Response<validate_resource_config::Response>, Status> {
        let req = request.into_inner();
        debug!("ValidateResourceConfig called for {}", req.type_name);

        let resource = resource(&req.type_name)?;
        let config = decode(req.config.as_ref())?;
        let diagnostics = resource
            .validate(&config)
            .iter()
            .map(ProviderError::to_diagnostic)
            .collect();

        Ok(Response::new(validate_resource_config::Response { diagnostics }))
    }

    async fn validate_data_resource_config(
        &self,
        request: Request<validate_data_resource_config::Request>,
    ) -> Result<Response<validate_data_resource_config::Response>, Status> {
        let req = request.into_inner();
        Ok(Response::new(validate_data_resource_config::Response {
            diagnostics: vec![error_diagnostic(
                "Unknown data source",
                format!("The provider has no data source named {}", req.type_name),
            )],
        }))
    }

    async fn upgrade_resource_state(
        &self,
        request: Request<upgrade_resource_state::Request>,
    ) -> Result<Response<upgrade_resource_state::Response>, Status> {
        let req = request.into_inner();
        debug!(
            "UpgradeResourceState called for {} (version {})",
            req.type_name, req.version
        );

        let schema = resource(&req.type_name)?.schema();
        let raw = req.raw_state.unwrap_or_default();

        if raw.json.is_empty() {
            if !raw.flatmap.is_empty() {
                return Ok(Response::new(upgrade_resource_state::Response {
                    upgraded_state: None,
                    diagnostics: vec![error_diagnostic(
                        "Unsupported state format",
                        "Flatmap state from Terraform 0.11 cannot be upgraded",
                    )],
                }));
            }
            return Ok(Response::new(upgrade_resource_state::Response {
                upgraded_state: Some(encode(&LocalDynamicValue::Null)?),
                diagnostics: vec![],
            }));
        }

        let json: serde_json::Value = serde_json::from_slice(&raw.json)
            .map_err(|e| Status::from(ProviderError::State(format!("invalid raw state: {e}"))))?;
        let state = schema.conform(&LocalDynamicValue::from_json(json));

        Ok(Response::new(upgrade_resource_state::Response {
            upgraded_state: Some(encode(&state)?),
            diagnostics: vec![],
        }))
    }

    async fn configure_provider(
        &self,
        request: Request<configure_provider::Request>,
    ) -> Result<Response<configure_provider::Response>, Status> {
        let req = request.into_inner();
        info!(terraform_version = %req.terraform_version, "ConfigureProvider called");

        let config = ProviderConfig::from_value(&decode(req.config.as_ref())?);
        let client = config
            .resolve(|key| std::env::var(key).ok())
            .and_then(|cfg| {
                Client::new(cfg).map_err(|e| ProviderError::InvalidConfig(e.to_string()))
            });

        match client {
            Ok(client) => {
                info!("Configured GleSYS API client for {}", client.base_url());
                *self.api.write().await = Some(Arc::new(client));
                Ok(Response::new(configure_provider::Response {
                    diagnostics: vec![],
                }))
            }
            Err(e) => {
                error!("Failed to configure provider: {}", e);
                Ok(Response::new(configure_provider::Response {
                    diagnostics: vec![e.to_diagnostic()],
                }))
            }
        }
    }

    async fn read_resource(
        &self,
        request: Request<read_resource::Request>,
    ) -> Result<Response<read_resource::Response>, Status> {
        let req = request.into_inner();
        info!("ReadResource called for {}", req.type_name);

        let resource = resource(&req.type_name)?;
        let current = decode(req.current_state.as_ref())?;
        if current.is_null() {
            return Ok(Response::new(read_resource::Response {
                new_state: req.current_state,
                diagnostics: vec![],
                private: req.private,
            }));
        }

        let api = self.api().await?;
        let schema = resource.schema();
        let mut data = ResourceData::from_state(schema, &schema.conform(&current));

        match resource.read(api.as_ref(), &mut data).await {
            Ok(()) => Ok(Response::new(read_resource::Response {
                new_state: Some(encode(&data.to_state())?),
                diagnostics: vec![],
                private: req.private,
            })),
            Err(e) => {
                warn!("Read of {} failed: {}", req.type_name, e);
                Ok(Response::new(read_resource::Response {
                    new_state: req.current_state,
                    diagnostics: vec![e.to_diagnostic()],
                    private: req.private,
                }))
            }
        }
    }

    async fn plan_resource_change(
        &self,
        request: Request<plan_resource_change::Request>,
    ) -> Result<Response<plan_resource_change::Response>, Status> {
        let req = request.into_inner();
        debug!("PlanResourceChange called for {}", req.type_name);

        let schema = resource(&req.type_name)?.schema();
        let prior = decode(req.prior_state.as_ref())?;
        let proposed = decode(req.proposed_new_state.as_ref())?;
        let config = decode(req.config.as_ref())?;

        let planned = plan_change(schema, &prior, &proposed, &config);
        if !planned.requires_replace.is_empty() {
            debug!(
                "{} requires replacement due to {:?}",
                req.type_name, planned.requires_replace
            );
        }

        Ok(Response::new(plan_resource_change::Response {
            planned_state: Some(encode(&planned.planned_state)?),
            requires_replace: planned
                .requires_replace
                .iter()
                .map(|name| attribute_path(name))
                .collect(),
            planned_private: req.prior_private,
            diagnostics: vec![],
            legacy_type_system: true,
        }))
    }

    async fn apply_resource_change(
        &self,
        request: Request<apply_resource_change::Request>,
    ) -> Result<Response<apply_resource_change::Response>, Status> {
        let req = request.into_inner();
        info!("ApplyResourceChange called for {}", req.type_name);

        let resource = resource(&req.type_name)?;
        let schema = resource.schema();
        let prior = schema.conform(&decode(req.prior_state.as_ref())?);
        let planned = schema.conform(&decode(req.planned_state.as_ref())?);
        let api = self.api().await?;

        let (new_state, result) = if planned.is_null() {
            // Delete
            let mut data = ResourceData::from_state(schema, &prior);
            let result = resource.delete(api.as_ref(), &mut data).await;
            (data.to_state(), result)
        } else if prior.is_null() {
            // Create; a failure after the identity is set still returns that identity
            let mut data = ResourceData::new(schema, &prior, &planned);
            let result = resource.create(api.as_ref(), &mut data).await;
            (data.to_state(), result)
        } else {
            // Update
            let mut data = ResourceData::new(schema, &prior, &planned);
            match resource.update(api.as_ref(), &mut data).await {
                Ok(()) => (data.to_state(), Ok(())),
                Err(e) => (prior, Err(e)),
            }
        };

        let diagnostics = match result {
            Ok(()) => vec![],
            Err(e) => {
                error!("Apply of {} failed: {}", req.type_name, e);
                vec![e.to_diagnostic()]
            }
        };

        Ok(Response::new(apply_resource_change::Response {
            new_state: Some(encode(&new_state)?),
            private: req.planned_private,
            diagnostics,
            legacy_type_system: true,
        }))
    }

    async fn import_resource_state(
        &self,
        request: Request<import_resource_state::Request>,
    ) -> Result<Response<import_resource_state::Response>, Status> {
        let req = request.into_inner();
        info!("ImportResourceState called for {} with ID {}", req.type_name, req.id);

        let resource = resource(&req.type_name)?;
        type ImportResult = Result<Response<import_resource_state::Response>, Status>;
        let failed = |diagnostic: Diagnostic| -> ImportResult {
            Ok(Response::new(import_resource_state::Response {
                imported_resources: vec![],
                diagnostics: vec![diagnostic],
            }))
        };

        let initial = match resource.import_state(&req.id) {
            Ok(state) => state,
            Err(e) => return failed(error_diagnostic("Invalid import ID", e.to_string())),
        };

        let api = self.api().await?;
        let mut data = ResourceData::from_state(resource.schema(), &initial);
        if let Err(e) = resource.read(api.as_ref(), &mut data).await {
            return failed(e.to_diagnostic());
        }
        if data.id().is_empty() {
            return failed(error_diagnostic(
                "Cannot import non-existent remote object",
                format!("No {} with ID {} exists", req.type_name, req.id),
            ));
        }

        Ok(Response::new(import_resource_state::Response {
            imported_resources: vec![import_resource_state::ImportedResource {
                type_name: req.type_name,
                state: Some(encode(&data.to_state())?),
                private: vec![],
            }],
            diagnostics: vec![],
        }))
    }

    async fn read_data_source(
        &self,
        request: Request<read_data_source::Request>,
    ) -> Result<Response<read_data_source::Response>, Status> {
        let req = request.into_inner();
        Ok(Response::new(read_data_source::Response {
            state: None,
            diagnostics: vec![error_diagnostic(
                "Unknown data source",
                format!("The provider has no data source named {}", req.type_name),
            )],
        }))
    }

    async fn stop_provider(
        &self,
        _request: Request<stop_provider::Request>,
    ) -> Result<Response<stop_provider::Response>, Status> {
        info!("StopProvider called");
        self.shutdown.notify_one();
        Ok(Response::new(stop_provider::Response {
            error: String::new(),
        }))
    }
}
