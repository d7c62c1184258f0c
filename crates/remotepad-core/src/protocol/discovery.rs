//! Discovery wire strings shared by the UDP responder and the probe sender.
//!
//! A client broadcasts the literal ASCII probe on the discovery port; a
//! server answers with `RM_RESPONSE ` followed by a JSON object naming its
//! TCP port and primary IPv4 address. Both halves of the exchange live here
//! so they cannot drift apart.

use serde::{Deserialize, Serialize};

/// The 12-byte ASCII probe a client broadcasts to find servers.
pub const DISCOVERY_PROBE: &[u8] = b"RM_DISCOVER?";

/// Prefix of every discovery answer, including the trailing space.
pub const DISCOVERY_RESPONSE_PREFIX: &str = "RM_RESPONSE ";

/// JSON body of a discovery answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryResponse {
    /// TCP port the server accepts control connections on.
    pub tcp_port: u16,
    /// Primary IPv4 address of the host, as a dotted string.
    pub ip: String,
}

/// Builds the full response datagram text for a probe.
pub fn encode_discovery_response(tcp_port: u16, ip: &str) -> String {
    let body = serde_json::to_string(&DiscoveryResponse {
        tcp_port,
        ip: ip.to_string(),
    })
    .unwrap_or_else(|_| format!("{{\"tcp_port\":{tcp_port},\"ip\":\"{ip}\"}}"));
    format!("{DISCOVERY_RESPONSE_PREFIX}{body}")
}

/// Parses a response datagram, returning `None` for anything that is not a
/// well-formed discovery answer.
pub fn parse_discovery_response(datagram: &[u8]) -> Option<DiscoveryResponse> {
    let text = std::str::from_utf8(datagram).ok()?;
    let body = text.strip_prefix(DISCOVERY_RESPONSE_PREFIX)?;
    serde_json::from_str(body).ok()
}

/// Returns `true` when a datagram is a discovery probe. Trailing bytes after
/// the probe text are tolerated.
pub fn is_discovery_probe(datagram: &[u8]) -> bool {
    datagram.len() >= DISCOVERY_PROBE.len() && datagram.starts_with(DISCOVERY_PROBE)
}
