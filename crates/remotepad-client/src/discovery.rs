//! Client-side server discovery.
//!
//! Broadcasts the fixed-text probe on the discovery port and collects the
//! JSON answers for a bounded window, so a handheld can find servers on the
//! local network without knowing an address. A unicast variant probes one
//! saved host to check it is still alive.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use remotepad_core::protocol::discovery::{parse_discovery_response, DISCOVERY_PROBE};
use tokio::net::UdpSocket;
use tokio::time;
use tracing::debug;

/// Discovery port servers listen on by default.
pub const DEFAULT_DISCOVERY_PORT: u16 = 1978;

/// One server that answered a probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredServer {
    /// Advertised IPv4 address of the server.
    pub ip: String,
    /// Advertised control-channel TCP port.
    pub tcp_port: u16,
}

/// Broadcasts a probe and collects every distinct answer within `wait`.
///
/// # Errors
///
/// Returns the underlying I/O error when the probe socket cannot be bound
/// or the broadcast cannot be sent.
pub async fn discover_servers(
    udp_port: u16,
    wait: Duration,
) -> std::io::Result<Vec<DiscoveredServer>> {
    probe(SocketAddr::from((Ipv4Addr::BROADCAST, udp_port)), wait, true).await
}

/// Probes one known address and collects its answer, if any.
///
/// # Errors
///
/// Returns the underlying I/O error when the probe cannot be sent.
pub async fn probe_server(
    target: SocketAddr,
    wait: Duration,
) -> std::io::Result<Vec<DiscoveredServer>> {
    probe(target, wait, false).await
}

async fn probe(
    target: SocketAddr,
    wait: Duration,
    broadcast: bool,
) -> std::io::Result<Vec<DiscoveredServer>> {
    let socket = UdpSocket::bind(("0.0.0.0", 0)).await?;
    if broadcast {
        socket.set_broadcast(true)?;
    }
    socket.send_to(DISCOVERY_PROBE, target).await?;

    let deadline = time::Instant::now() + wait;
    let mut found = Vec::new();
    let mut buf = [0u8; 512];
    loop {
        let remaining = deadline.saturating_duration_since(time::Instant::now());
        if remaining.is_zero() {
            break;
        }
        match time::timeout(remaining, socket.recv_from(&mut buf)).await {
            Ok(Ok((len, src))) => {
                let Some(response) = parse_discovery_response(&buf[..len]) else {
                    debug!("ignoring non-discovery datagram from {src}");
                    continue;
                };
                let server = DiscoveredServer {
                    ip: response.ip,
                    tcp_port: response.tcp_port,
                };
                if !found.contains(&server) {
                    found.push(server);
                }
            }
            Ok(Err(e)) => return Err(e),
            // Collection window elapsed.
            Err(_) => break,
        }
    }
    Ok(found)
}
