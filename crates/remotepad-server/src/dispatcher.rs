//! Control-channel dispatcher.
//!
//! Accepts TCP connections, runs one frame loop per connection, gates
//! everything behind the password handshake, and maps authenticated commands
//! onto the [`InputInjector`] collaborator. A second, independent UDP task
//! answers discovery probes.
//!
//! Per-connection reads use exact-length reads into fixed-size buffers: the
//! 7-byte header first, then exactly the declared payload. The length field
//! is 16-bit, so a payload read is bounded by 64 KiB. A bad magic is a
//! protocol error that tears down that connection only; unknown or
//! malformed commands are skipped.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use remotepad_core::protocol::codec::{decode_header, decode_payload, encode_message, ProtocolError};
use remotepad_core::protocol::messages::{PadMessage, HEADER_SIZE};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::sync::{mpsc, watch, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::discovery::discovery_loop;
use crate::inject::{InjectError, InputInjector};

/// Per-connection state tracked in the shared registry.
#[derive(Debug, Clone)]
pub struct ConnectionState {
    pub authenticated: bool,
    pub remote: SocketAddr,
}

/// Shared registry of live connections, keyed by connection identity.
pub type ConnectionMap = Arc<RwLock<HashMap<Uuid, ConnectionState>>>;

/// Events emitted by the server to the embedding application.
#[derive(Debug)]
pub enum ServerEvent {
    TcpListening { addr: SocketAddr },
    DiscoveryListening { addr: SocketAddr },
    ClientConnected { conn_id: Uuid, remote: SocketAddr },
    ClientAuthenticated { conn_id: Uuid, remote: SocketAddr },
    ClientDisconnected { conn_id: Uuid, remote: SocketAddr },
    /// Human-readable status line, including bind failures. The TCP and UDP
    /// listeners are independent: one failing never stops the other.
    Status(String),
}

/// Handle to a running server.
pub struct ServerHandle {
    /// Bound control-channel address, when the TCP bind succeeded.
    pub tcp_addr: Option<SocketAddr>,
    /// Bound discovery address, when the UDP bind succeeded.
    pub udp_addr: Option<SocketAddr>,
    stop_tx: watch::Sender<bool>,
    silent: Arc<AtomicBool>,
    connections: ConnectionMap,
}

impl ServerHandle {
    /// Stops the accept loop, every connection loop, and the discovery
    /// responder. Safe to call more than once.
    pub fn shutdown(&self) {
        self.stop_tx.send_replace(true);
    }

    /// Toggles discovery silence at runtime.
    pub fn set_discovery_silent(&self, silent: bool) {
        self.silent.store(silent, Ordering::Relaxed);
    }

    /// Number of currently tracked connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }
}

/// Starts the TCP dispatcher and the UDP discovery responder.
///
/// Both listeners are bound independently; a bind failure on either is
/// reported as a [`ServerEvent::Status`] string and leaves the other
/// running. Callers should drain the returned event receiver.
pub async fn start_server(
    config: ServerConfig,
    injector: Arc<dyn InputInjector>,
) -> (ServerHandle, mpsc::Receiver<ServerEvent>) {
    let (events_tx, events_rx) = mpsc::channel(64);
    let (stop_tx, stop_rx) = watch::channel(false);
    let silent = Arc::new(AtomicBool::new(config.server.silent_discovery));
    let connections: ConnectionMap = Arc::new(RwLock::new(HashMap::new()));
    let config = Arc::new(config);

    let bind_host = config.network.bind_address.clone();

    let tcp_addr = match TcpListener::bind((bind_host.as_str(), config.network.tcp_port)).await {
        Ok(listener) => {
            let addr = listener.local_addr().ok();
            if let Some(addr) = addr {
                info!("control listener on tcp {addr}");
                let _ = events_tx.send(ServerEvent::TcpListening { addr }).await;
            }
            tokio::spawn(accept_loop(
                listener,
                Arc::clone(&config),
                Arc::clone(&injector),
                Arc::clone(&connections),
                events_tx.clone(),
                stop_rx.clone(),
            ));
            addr
        }
        Err(e) => {
            warn!("tcp bind failed on port {}: {e}", config.network.tcp_port);
            let _ = events_tx
                .send(ServerEvent::Status(format!(
                    "tcp bind failed on port {}: {e}",
                    config.network.tcp_port
                )))
                .await;
            None
        }
    };

    let advertised_port = tcp_addr.map(|a| a.port()).unwrap_or(config.network.tcp_port);
    let udp_addr = match UdpSocket::bind((bind_host.as_str(), config.network.udp_port)).await {
        Ok(socket) => {
            let addr = socket.local_addr().ok();
            if let Some(addr) = addr {
                info!("discovery responder on udp {addr}");
                let _ = events_tx.send(ServerEvent::DiscoveryListening { addr }).await;
            }
            tokio::spawn(discovery_loop(
                socket,
                advertised_port,
                Arc::clone(&silent),
                stop_rx,
            ));
            addr
        }
        Err(e) => {
            warn!("udp bind failed on port {}: {e}", config.network.udp_port);
            let _ = events_tx
                .send(ServerEvent::Status(format!(
                    "udp bind failed on port {}: {e}",
                    config.network.udp_port
                )))
                .await;
            None
        }
    };

    let handle = ServerHandle {
        tcp_addr,
        udp_addr,
        stop_tx,
        silent,
        connections,
    };
    (handle, events_rx)
}

async fn accept_loop(
    listener: TcpListener,
    config: Arc<ServerConfig>,
    injector: Arc<dyn InputInjector>,
    connections: ConnectionMap,
    events: mpsc::Sender<ServerEvent>,
    mut stop_rx: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            changed = stop_rx.changed() => {
                // A dropped handle stops the server just like shutdown().
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
            }
            accepted = listener.accept() => match accepted {
                Ok((stream, remote)) => {
                    tokio::spawn(handle_connection(
                        stream,
                        remote,
                        Arc::clone(&config),
                        Arc::clone(&injector),
                        Arc::clone(&connections),
                        events.clone(),
                        stop_rx.clone(),
                    ));
                }
                Err(e) => warn!("accept failed: {e}"),
            }
        }
    }
    info!("control listener stopped");
}

async fn handle_connection(
    mut stream: TcpStream,
    remote: SocketAddr,
    config: Arc<ServerConfig>,
    injector: Arc<dyn InputInjector>,
    connections: ConnectionMap,
    events: mpsc::Sender<ServerEvent>,
    mut stop_rx: watch::Receiver<bool>,
) {
    let conn_id = Uuid::new_v4();
    // An empty configured password means every connection starts
    // authenticated.
    let mut authenticated = config.server.password.is_empty();
    connections.write().await.insert(
        conn_id,
        ConnectionState {
            authenticated,
            remote,
        },
    );
    let _ = events.send(ServerEvent::ClientConnected { conn_id, remote }).await;
    info!("connection from {remote}");

    loop {
        let frame = tokio::select! {
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
                continue;
            }
            frame = read_raw_frame(&mut stream) => frame,
        };

        let (command, payload) = match frame {
            Ok(pair) => pair,
            Err(FrameReadError::Closed) => break,
            Err(FrameReadError::Io(e)) => {
                debug!("read error from {remote}: {e}");
                break;
            }
            Err(FrameReadError::Protocol(e)) => {
                warn!("protocol error from {remote}: {e}");
                break;
            }
        };

        let msg = match decode_payload(command, &payload) {
            Ok(msg) => msg,
            Err(e) => {
                // Unknown and malformed commands are skipped, not fatal.
                debug!("ignoring frame 0x{command:02X} from {remote}: {e}");
                continue;
            }
        };

        match msg {
            PadMessage::Auth(submitted) => {
                if submitted == config.server.password {
                    authenticated = true;
                    if let Some(state) = connections.write().await.get_mut(&conn_id) {
                        state.authenticated = true;
                    }
                    if write_message(&mut stream, &PadMessage::AuthOk).await.is_err() {
                        break;
                    }
                    let server_info = PadMessage::ServerInfo {
                        name: config.server.name.clone(),
                        version: config.server.version.clone(),
                    };
                    if write_message(&mut stream, &server_info).await.is_err() {
                        break;
                    }
                    let _ = events
                        .send(ServerEvent::ClientAuthenticated { conn_id, remote })
                        .await;
                    info!("{remote} authenticated");
                } else {
                    let _ = write_message(&mut stream, &PadMessage::AuthFail).await;
                    info!("{remote} failed authentication");
                    break;
                }
            }
            // Liveness probes are answered regardless of auth state.
            PadMessage::Ping => {
                if write_message(&mut stream, &PadMessage::Pong).await.is_err() {
                    break;
                }
            }
            // Anything else before auth is ignored rather than dropped, so a
            // client that sends input early is not punished with a
            // disconnect.
            other if !authenticated => {
                debug!("unauthenticated {remote} sent {:?}", other.command());
            }
            PadMessage::MouseMove { dx, dy } => report(injector.pointer_move(dx, dy)),
            PadMessage::MouseButton { button, down } => {
                report(injector.pointer_button(button, down))
            }
            PadMessage::MouseScroll { dx, dy } => report(injector.scroll(dx, dy)),
            PadMessage::KeyDown(code) => report(injector.key(code, true)),
            PadMessage::KeyUp(code) => report(injector.key(code, false)),
            PadMessage::KeyPress(code) => report(injector.key_press(code)),
            PadMessage::Char(code_point) => report(injector.unicode_char(code_point)),
            PadMessage::ClipboardSet(text) => report(injector.set_clipboard_text(&text)),
            PadMessage::ClipboardGet => match injector.clipboard_text() {
                Ok(text) => {
                    if write_message(&mut stream, &PadMessage::ClipboardData(text))
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                Err(e) => warn!("clipboard read failed: {e}"),
            },
            PadMessage::Power(action) => report(injector.power(action)),
            PadMessage::Volume(action) => report(injector.volume(action)),
            // Reply frames have no meaning inbound.
            PadMessage::AuthOk
            | PadMessage::AuthFail
            | PadMessage::ServerInfo { .. }
            | PadMessage::ClipboardData(_)
            | PadMessage::Pong => {}
        }
    }

    connections.write().await.remove(&conn_id);
    let _ = events
        .send(ServerEvent::ClientDisconnected { conn_id, remote })
        .await;
    info!("connection closed: {remote}");
}

fn report(result: Result<(), InjectError>) {
    if let Err(e) = result {
        warn!("input injection failed: {e}");
    }
}

#[derive(Debug, Error)]
enum FrameReadError {
    #[error("connection closed")]
    Closed,
    #[error("{0}")]
    Io(std::io::Error),
    #[error("{0}")]
    Protocol(#[from] ProtocolError),
}

/// Reads one frame: exact header, then exactly the declared payload.
async fn read_raw_frame<R: AsyncRead + Unpin>(
    reader: &mut R,
) -> Result<(u8, Vec<u8>), FrameReadError> {
    let mut header = [0u8; HEADER_SIZE];
    match reader.read_exact(&mut header).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(FrameReadError::Closed)
        }
        Err(e) => return Err(FrameReadError::Io(e)),
    }
    let parsed = decode_header(&header)?;
    let mut payload = vec![0u8; parsed.payload_len];
    if parsed.payload_len > 0 {
        reader
            .read_exact(&mut payload)
            .await
            .map_err(FrameReadError::Io)?;
    }
    Ok((parsed.command, payload))
}

async fn write_message(stream: &mut TcpStream, msg: &PadMessage) -> std::io::Result<()> {
    match encode_message(msg) {
        Ok(bytes) => stream.write_all(&bytes).await,
        Err(e) => {
            warn!("failed to encode {:?}: {e}", msg.command());
            Ok(())
        }
    }
}
