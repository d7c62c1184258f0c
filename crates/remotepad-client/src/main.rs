//! Headless RemotePad client.
//!
//! Connects to a server given as `host [port] [password]`, falling back to
//! saved preferences and then to LAN discovery, then logs session events
//! until Ctrl-C. The touch and keyboard surfaces live in the mobile UI
//! layer; this binary exercises the session plumbing end to end.

use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use remotepad_client::discovery::{self, DEFAULT_DISCOVERY_PORT};
use remotepad_client::prefs::{self, ClientPrefs, HistoryEntry};
use remotepad_client::session::{SessionEvent, SessionManager};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut prefs = prefs::load_prefs().unwrap_or_else(|e| {
        warn!("could not load prefs: {e}");
        ClientPrefs::default()
    });

    let mut args = std::env::args().skip(1);
    let mut host = args
        .next()
        .unwrap_or_else(|| prefs.connection.last_host.clone());
    let mut port = args
        .next()
        .and_then(|p| p.parse().ok())
        .unwrap_or(prefs.connection.last_port);
    let password = args
        .next()
        .unwrap_or_else(|| prefs.connection.password.clone());

    if host.is_empty() {
        info!("no saved host; probing the local network");
        let found = discovery::discover_servers(DEFAULT_DISCOVERY_PORT, Duration::from_secs(2))
            .await
            .context("discovery probe failed")?;
        let first = found
            .first()
            .context("no servers answered the discovery probe")?;
        info!("discovered server at {}:{}", first.ip, first.tcp_port);
        host = first.ip.clone();
        port = first.tcp_port;
    }

    let (session, mut events) = SessionManager::new();
    info!("connecting to {host}:{port}");
    session.connect(&host, port, &password);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(SessionEvent::Connected { server_name, server_version }) => {
                    info!("connected to \"{server_name}\" v{server_version}");
                    prefs.connection.last_host = host.clone();
                    prefs.connection.last_port = port;
                    prefs.connection.password = password.clone();
                    prefs.push_history(HistoryEntry {
                        name: server_name,
                        host: host.clone(),
                        port,
                    });
                    if let Err(e) = prefs::save_prefs(&prefs) {
                        warn!("could not save prefs: {e}");
                    }
                }
                Some(SessionEvent::AuthFailed(error)) => {
                    anyhow::bail!("authentication failed: {error}");
                }
                Some(SessionEvent::ClipboardData(text)) => {
                    info!("server clipboard: {} bytes", text.len());
                }
                Some(SessionEvent::Disconnected { reason }) => {
                    match reason {
                        Some(reason) => warn!("disconnected: {reason}"),
                        None => info!("disconnected"),
                    }
                    break;
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                session.disconnect().await;
            }
        }
    }

    Ok(())
}
