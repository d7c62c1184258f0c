//! Local address resolution for discovery responses.

/// Returns the host's primary IPv4 address as a dotted string, falling back
/// to `127.0.0.1` when it cannot be determined (no route, no interface).
///
/// Uses the connected-UDP-socket trick: connecting a datagram socket to a
/// public address selects the outbound interface without sending a packet.
pub fn resolve_primary_local_ipv4() -> String {
    primary_ipv4().unwrap_or_else(|| "127.0.0.1".to_string())
}

fn primary_ipv4() -> Option<String> {
    let socket = std::net::UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    let addr = socket.local_addr().ok()?;
    addr.is_ipv4().then(|| addr.ip().to_string())
}
