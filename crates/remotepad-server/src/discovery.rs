//! UDP discovery responder.
//!
//! Clients that do not know the server's address broadcast a fixed-text
//! probe on the discovery port. The responder answers each probe with the
//! control-channel TCP port and the host's primary IPv4 address, unless
//! silent mode is enabled, in which case probes are dropped and the server
//! stays invisible to scans.
//!
//! The responder shares nothing mutable with the TCP side except the silence
//! flag; it runs on its own task and is stopped by the server-wide stop
//! channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use remotepad_core::protocol::discovery::{encode_discovery_response, is_discovery_probe};
use tokio::net::UdpSocket;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::netutil::resolve_primary_local_ipv4;

pub(crate) async fn discovery_loop(
    socket: UdpSocket,
    advertised_tcp_port: u16,
    silent: Arc<AtomicBool>,
    mut stop_rx: watch::Receiver<bool>,
) {
    let mut buf = [0u8; 512];
    loop {
        tokio::select! {
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
            }
            received = socket.recv_from(&mut buf) => match received {
                Ok((len, src)) => {
                    if !is_discovery_probe(&buf[..len]) {
                        debug!("ignoring non-probe datagram from {src}");
                        continue;
                    }
                    if silent.load(Ordering::Relaxed) {
                        debug!("silent mode: ignoring probe from {src}");
                        continue;
                    }
                    let response =
                        encode_discovery_response(advertised_tcp_port, &resolve_primary_local_ipv4());
                    debug!("answering probe from {src}");
                    if let Err(e) = socket.send_to(response.as_bytes(), src).await {
                        warn!("discovery reply to {src} failed: {e}");
                    }
                }
                Err(e) => warn!("discovery recv error: {e}"),
            }
        }
    }
    info!("discovery responder stopped");
}
