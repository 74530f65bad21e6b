//! Error types for the provider

use thiserror::Error;

use crate::tfplugin6;
use crate::tfplugin6::attribute_path::step::Selector;

/// Result type alias using the provider error
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Provider error types
#[derive(Error, Debug)]
pub enum ProviderError {
    /// A GleSYS API call failed
    #[error("Error {operation} {resource}: {source}")]
    Remote {
        operation: &'static str,
        resource: String,
        #[source]
        source: glesys_client::Error,
    },

    #[error("Invalid value for {attribute}: {reason}")]
    InvalidAttribute { attribute: String, reason: String },

    #[error("Invalid provider configuration: {0}")]
    InvalidConfig(String),

    #[error("State error: {0}")]
    State(String),

    #[error("Provider is not configured")]
    NotConfigured,

    #[error("Unknown resource type: {0}")]
    UnknownResourceType(String),
}

impl ProviderError {
    /// Wrap a client error with the operation and resource it concerns.
    ///
    /// Meant for `map_err`:
    /// `api.call().await.map_err(ProviderError::remote("creating network", &id))?`
    pub fn remote(
        operation: &'static str,
        resource: impl Into<String>,
    ) -> impl FnOnce(glesys_client::Error) -> ProviderError {
        let resource = resource.into();
        move |source| ProviderError::Remote {
            operation,
            resource,
            source,
        }
    }

    pub fn invalid_attribute(attribute: &str, reason: impl Into<String>) -> Self {
        ProviderError::InvalidAttribute {
            attribute: attribute.to_string(),
            reason: reason.into(),
        }
    }

    /// Render as an error diagnostic for Terraform
    pub fn to_diagnostic(&self) -> tfplugin6::Diagnostic {
        let (summary, detail, attribute) = match self {
            ProviderError::Remote {
                operation,
                resource,
                source,
            } => (
                format!("Error {operation}"),
                format!("{resource}: {source}"),
                None,
            ),
            ProviderError::InvalidAttribute { attribute, reason } => (
                format!("Invalid value for {attribute}"),
                reason.clone(),
                Some(attribute_path(attribute)),
            ),
            other => (other.to_string(), String::new(), None),
        };

        tfplugin6::Diagnostic {
            severity: tfplugin6::diagnostic::Severity::Error as i32,
            summary,
            detail,
            attribute,
        }
    }
}

/// Path to a top-level attribute
pub fn attribute_path(name: &str) -> tfplugin6::AttributePath {
    tfplugin6::AttributePath {
        steps: vec![tfplugin6::attribute_path::Step {
            selector: Some(Selector::AttributeName(name.to_string())),
        }],
    }
}

impl From<ProviderError> for tonic::Status {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::UnknownResourceType(name) => {
                tonic::Status::not_found(format!("Unknown resource type: {}", name))
            }
            ProviderError::NotConfigured => tonic::Status::failed_precondition(e.to_string()),
            ProviderError::State(msg) => tonic::Status::invalid_argument(msg),
            _ => tonic::Status::internal(e.to_string()),
        }
    }
}
