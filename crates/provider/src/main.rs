//! Terraform Provider for GleSYS
//!
//! This binary implements the Terraform Plugin Protocol v6 for managing
//! GleSYS load balancer targets and private networks. It is meant to be
//! launched by Terraform, not run directly.
//!
//! The handshake announces a plaintext gRPC server without a certificate,
//! so Terraform's automatic mTLS must be off: launch Terraform with
//! `TF_DISABLE_PLUGIN_TLS=1`.

use std::io;

use anyhow::bail;
use tracing::info;

use glesys_provider::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the handshake, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    if !server::launched_by_terraform(|key| std::env::var(key).ok()) {
        bail!(
            "This binary is a plugin. These are not meant to be executed directly. \
             Please execute the program that consumes these plugins, which will \
             load any plugins automatically"
        );
    }

    info!("Starting GleSYS Terraform Provider {}", glesys_provider::VERSION);
    server::serve(&mut io::stdout()).await
}
