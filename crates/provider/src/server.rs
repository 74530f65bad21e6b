//! Plugin server
//!
//! Terraform starts the provider as a child process and talks to it through
//! the go-plugin protocol: the provider prints a handshake line on stdout
//! naming the address of its gRPC server, then serves until told to stop.

use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tracing::info;

use crate::provider::GlesysProvider;
use crate::tfplugin6::provider_server::ProviderServer;

/// Environment variable Terraform sets when launching a plugin
pub const MAGIC_COOKIE_KEY: &str = "TF_PLUGIN_MAGIC_COOKIE";
pub const MAGIC_COOKIE_VALUE: &str =
    "d602bf8f470bc67ca7faa0386276bbdd4330efaf76d1a219cb4d6991ca9872b2";

/// go-plugin core protocol version
const CORE_PROTOCOL_VERSION: u32 = 1;
/// Terraform plugin protocol version
const PLUGIN_PROTOCOL_VERSION: u32 = 6;

/// Line announcing the server to Terraform
pub fn handshake_line(addr: SocketAddr) -> String {
    format!("{CORE_PROTOCOL_VERSION}|{PLUGIN_PROTOCOL_VERSION}|tcp|{addr}|grpc")
}

/// True when the process was launched by Terraform
pub fn launched_by_terraform<F>(env: F) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    env(MAGIC_COOKIE_KEY).as_deref() == Some(MAGIC_COOKIE_VALUE)
}

/// Bind a local port, announce it on `out` and serve until StopProvider.
pub async fn serve<W: Write>(out: &mut W) -> anyhow::Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    info!("Provider listening on {}", addr);

    let shutdown = Arc::new(Notify::new());
    let provider = GlesysProvider::new(shutdown.clone());

    writeln!(out, "{}", handshake_line(addr))?;
    out.flush()?;
    info!("Handshake sent, starting gRPC server");

    Server::builder()
        .add_service(ProviderServer::new(provider))
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async move {
            shutdown.notified().await;
            info!("Shutting down provider");
        })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handshake_line() {
        let addr: SocketAddr = "127.0.0.1:41234".parse().unwrap();
        assert_eq!(handshake_line(addr), "1|6|tcp|127.0.0.1:41234|grpc");
    }

    #[test]
    fn test_magic_cookie() {
        assert!(launched_by_terraform(|_| Some(MAGIC_COOKIE_VALUE.to_string())));
        assert!(!launched_by_terraform(|_| Some("nope".to_string())));
        assert!(!launched_by_terraform(|_| None));
    }
}
