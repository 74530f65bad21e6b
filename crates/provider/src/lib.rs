//! GleSYS Terraform Provider
//!
//! This crate implements a Terraform provider for GleSYS load balancer
//! targets and private networks using the Terraform Plugin Protocol v6.

pub mod config;
pub mod error;
pub mod plan;
pub mod provider;
pub mod reconcile;
pub mod resource_data;
pub mod resources;
pub mod schema;
pub mod server;
pub mod state;

pub mod tfplugin6 {
    tonic::include_proto!("tfplugin6");
}

/// Provider version reported in the API user agent
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
