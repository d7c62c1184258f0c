//! RemotePad server entry point.
//!
//! Loads the TOML configuration, starts the control-channel dispatcher and
//! the discovery responder, and logs server events until Ctrl-C.
//!
//! The headless build injects input through [`LoggingInjector`]; packaging
//! for a real desktop swaps in a platform implementation of
//! [`InputInjector`](remotepad_server::inject::InputInjector).

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use remotepad_server::config;
use remotepad_server::dispatcher::{self, ServerEvent};
use remotepad_server::inject::LoggingInjector;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::load_config().context("loading server config")?;

    // Level is taken from the config file; `RUST_LOG` overrides it.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.server.log_level.clone())),
        )
        .init();

    info!(
        "RemotePad server starting as \"{}\" v{}",
        config.server.name, config.server.version
    );
    if config.server.password.is_empty() {
        warn!("no password configured; any client on the network can connect");
    }

    let injector = Arc::new(LoggingInjector);
    let (handle, mut events) = dispatcher::start_server(config, injector).await;

    if handle.tcp_addr.is_none() && handle.udp_addr.is_none() {
        anyhow::bail!("neither the control listener nor discovery could bind");
    }

    let pump = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                ServerEvent::TcpListening { addr } => info!("listening on tcp {addr}"),
                ServerEvent::DiscoveryListening { addr } => {
                    info!("discovery on udp {addr}")
                }
                ServerEvent::ClientConnected { remote, .. } => info!("client connected: {remote}"),
                ServerEvent::ClientAuthenticated { remote, .. } => {
                    info!("client authenticated: {remote}")
                }
                ServerEvent::ClientDisconnected { remote, .. } => {
                    info!("client disconnected: {remote}")
                }
                ServerEvent::Status(text) => info!("{text}"),
            }
        }
    });

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    info!("shutdown signal received");
    handle.shutdown();
    pump.abort();

    info!("RemotePad server stopped");
    Ok(())
}
