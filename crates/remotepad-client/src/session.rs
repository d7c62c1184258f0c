//! Control-channel session management.
//!
//! One session is three cooperating tasks: the handshake task (connect,
//! authenticate, read the server identity), then a send loop that owns the
//! write half and drains a FIFO of pre-encoded frames, and a receive loop
//! that owns the read half and surfaces inbound clipboard data. The tasks
//! share only an atomic connected flag, a stop channel, and the send queue;
//! the embedding UI talks to all of them through [`SessionEvent`]s on an
//! `mpsc` channel, never synchronously.
//!
//! Teardown is cooperative: flipping the stop channel plus a zero-length
//! sentinel on the send queue unwinds both loops, and each socket half is
//! owned by exactly one task so a double close cannot happen. Nothing
//! reconnects on its own; a dropped session surfaces one `Disconnected`
//! event and waits for an explicit new [`SessionManager::connect`] call.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use remotepad_core::protocol::codec::{
    decode_header, decode_payload, encode_message, ProtocolError,
};
use remotepad_core::protocol::messages::{Command, PadMessage, HEADER_SIZE};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::time;
use tracing::{debug, info, warn};

/// Bound on the TCP connect attempt.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Bound on the best-effort ServerInfo read right after AuthOk.
pub const SERVER_INFO_TIMEOUT: Duration = Duration::from_secs(2);

/// Lifecycle of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    AwaitingAuthReply,
    Authenticated,
}

/// Why authentication was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("wrong password")]
    WrongPassword,
    #[error("password required")]
    PasswordRequired,
}

/// Events delivered to the embedding UI.
#[derive(Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// The handshake completed. Name and version are empty when the server
    /// did not identify itself in time.
    Connected {
        server_name: String,
        server_version: String,
    },
    /// The server refused the password. The connection is closed; there is
    /// no retry.
    AuthFailed(AuthError),
    /// The session ended. `reason` is `None` for a local `disconnect()` and
    /// a human-readable hint otherwise. Emitted exactly once per session.
    Disconnected { reason: Option<String> },
    /// The server pushed clipboard content.
    ClipboardData(String),
}

/// State shared by the tasks of one connection attempt. A new `Link` is
/// created per `connect` call so a stale loop can never poison a newer
/// session.
struct Link {
    connected: AtomicBool,
    /// Guards the single `Disconnected`/`AuthFailed` report per session.
    reported: AtomicBool,
    stop_tx: watch::Sender<bool>,
    /// Set once authentication succeeds and the send loop exists.
    send_tx: OnceLock<mpsc::UnboundedSender<Vec<u8>>>,
}

impl Link {
    fn new() -> Arc<Self> {
        let (stop_tx, _) = watch::channel(false);
        Arc::new(Self {
            connected: AtomicBool::new(false),
            reported: AtomicBool::new(false),
            stop_tx,
            send_tx: OnceLock::new(),
        })
    }

    fn stopped(&self) -> bool {
        *self.stop_tx.borrow()
    }

    /// Unblocks both loops. Idempotent.
    fn stop_io(&self) {
        self.connected.store(false, Ordering::SeqCst);
        self.stop_tx.send_replace(true);
        if let Some(tx) = self.send_tx.get() {
            let _ = tx.send(Vec::new());
        }
    }

    /// Tears down without emitting an event, for when a newer connect
    /// attempt replaces this link.
    fn cancel_silently(&self) {
        self.reported.store(true, Ordering::SeqCst);
        self.stop_io();
    }
}

/// Owns the client side of the control channel.
pub struct SessionManager {
    events: mpsc::Sender<SessionEvent>,
    link: Mutex<Option<Arc<Link>>>,
    state: Arc<Mutex<SessionState>>,
}

impl SessionManager {
    /// Creates a manager and the receiver its events arrive on.
    pub fn new() -> (Self, mpsc::Receiver<SessionEvent>) {
        let (tx, rx) = mpsc::channel(64);
        (
            Self {
                events: tx,
                link: Mutex::new(None),
                state: Arc::new(Mutex::new(SessionState::Disconnected)),
            },
            rx,
        )
    }

    /// Current lifecycle state snapshot.
    pub fn state(&self) -> SessionState {
        *self.state.lock().unwrap()
    }

    /// Whether the session is authenticated and its loops are running.
    pub fn is_connected(&self) -> bool {
        self.link
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|link| link.connected.load(Ordering::SeqCst))
    }

    /// Starts a connection attempt. Any attempt already in flight is torn
    /// down silently first. Must be called from within a tokio runtime.
    pub fn connect(&self, host: &str, port: u16, password: &str) {
        let link = Link::new();
        {
            let mut guard = self.link.lock().unwrap();
            if let Some(previous) = guard.take() {
                previous.cancel_silently();
            }
            *guard = Some(Arc::clone(&link));
        }
        tokio::spawn(run_handshake(
            link,
            self.events.clone(),
            Arc::clone(&self.state),
            host.to_string(),
            port,
            password.to_string(),
        ));
    }

    /// Enqueues one pre-encoded frame. Non-blocking; a no-op when not
    /// connected. Empty frames are reserved as the internal stop sentinel
    /// and are never sent.
    pub fn send(&self, frame: Vec<u8>) {
        if frame.is_empty() {
            return;
        }
        let guard = self.link.lock().unwrap();
        if let Some(link) = guard.as_ref() {
            if link.connected.load(Ordering::SeqCst) {
                if let Some(tx) = link.send_tx.get() {
                    let _ = tx.send(frame);
                }
            }
        }
    }

    /// Encodes and enqueues one message.
    pub fn send_message(&self, msg: &PadMessage) {
        match encode_message(msg) {
            Ok(bytes) => self.send(bytes),
            Err(e) => warn!("failed to encode {:?}: {e}", msg.command()),
        }
    }

    /// Ends the session. Idempotent: the first call reports one
    /// `Disconnected` event with no reason; later calls do nothing.
    pub async fn disconnect(&self) {
        let link = self.link.lock().unwrap().take();
        if let Some(link) = link {
            link.stop_io();
            *self.state.lock().unwrap() = SessionState::Disconnected;
            if !link.reported.swap(true, Ordering::SeqCst) {
                let _ = self
                    .events
                    .send(SessionEvent::Disconnected { reason: None })
                    .await;
            }
        }
    }
}

fn set_state(state: &Arc<Mutex<SessionState>>, value: SessionState) {
    *state.lock().unwrap() = value;
}

/// Reports a failed session exactly once and unwinds the loops.
async fn report_disconnect(
    link: &Link,
    events: &mpsc::Sender<SessionEvent>,
    state: &Arc<Mutex<SessionState>>,
    reason: Option<String>,
) {
    link.stop_io();
    set_state(state, SessionState::Disconnected);
    if !link.reported.swap(true, Ordering::SeqCst) {
        let _ = events.send(SessionEvent::Disconnected { reason }).await;
    }
}

async fn run_handshake(
    link: Arc<Link>,
    events: mpsc::Sender<SessionEvent>,
    state: Arc<Mutex<SessionState>>,
    host: String,
    port: u16,
    password: String,
) {
    set_state(&state, SessionState::Connecting);

    let stream = match time::timeout(CONNECT_TIMEOUT, TcpStream::connect((host.as_str(), port))).await
    {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            report_disconnect(
                &link,
                &events,
                &state,
                Some(format!("could not connect to {host}:{port}: {e}")),
            )
            .await;
            return;
        }
        Err(_) => {
            report_disconnect(
                &link,
                &events,
                &state,
                Some(format!("connection to {host}:{port} timed out")),
            )
            .await;
            return;
        }
    };
    if link.stopped() {
        return;
    }
    let _ = stream.set_nodelay(true);
    let mut stream = stream;

    let auth_frame = match encode_message(&PadMessage::Auth(password.clone())) {
        Ok(bytes) => bytes,
        Err(e) => {
            report_disconnect(&link, &events, &state, Some(format!("bad password data: {e}")))
                .await;
            return;
        }
    };
    if let Err(e) = stream.write_all(&auth_frame).await {
        report_disconnect(
            &link,
            &events,
            &state,
            Some(format!("sending auth request failed: {e}")),
        )
        .await;
        return;
    }
    set_state(&state, SessionState::AwaitingAuthReply);

    let (reply_command, _) = match read_raw_frame(&mut stream).await {
        Ok(frame) => frame,
        Err(e) => {
            report_disconnect(&link, &events, &state, Some(format!("handshake failed: {e}")))
                .await;
            return;
        }
    };
    if link.stopped() {
        return;
    }

    match Command::try_from(reply_command) {
        Ok(Command::AuthOk) => {
            // Best-effort secondary read: the server identifies itself right
            // after AuthOk, but an old server that never will must not hang
            // the handshake.
            let mut server_name = String::new();
            let mut server_version = String::new();
            if let Ok(Ok((info_command, info_payload))) =
                time::timeout(SERVER_INFO_TIMEOUT, read_raw_frame(&mut stream)).await
            {
                if let Ok(PadMessage::ServerInfo { name, version }) =
                    decode_payload(info_command, &info_payload)
                {
                    server_name = name;
                    server_version = version;
                }
            }

            link.connected.store(true, Ordering::SeqCst);
            set_state(&state, SessionState::Authenticated);
            let (send_tx, send_rx) = mpsc::unbounded_channel();
            let _ = link.send_tx.set(send_tx);
            let (read_half, write_half) = stream.into_split();
            info!("authenticated with {host}:{port} ({server_name} {server_version})");
            let _ = events
                .send(SessionEvent::Connected {
                    server_name,
                    server_version,
                })
                .await;
            tokio::spawn(send_loop(
                write_half,
                send_rx,
                Arc::clone(&link),
                events.clone(),
                Arc::clone(&state),
            ));
            tokio::spawn(recv_loop(read_half, link, events, state));
        }
        Ok(Command::AuthFail) => {
            set_state(&state, SessionState::Disconnected);
            link.reported.store(true, Ordering::SeqCst);
            let error = if password.is_empty() {
                AuthError::PasswordRequired
            } else {
                AuthError::WrongPassword
            };
            info!("authentication refused by {host}:{port}: {error}");
            let _ = events.send(SessionEvent::AuthFailed(error)).await;
        }
        _ => {
            report_disconnect(
                &link,
                &events,
                &state,
                Some(format!("unexpected handshake reply 0x{reply_command:02X}")),
            )
            .await;
        }
    }
}

/// Drains the send queue into the socket. The write half lives here and
/// nowhere else.
async fn send_loop(
    mut writer: OwnedWriteHalf,
    mut queue: mpsc::UnboundedReceiver<Vec<u8>>,
    link: Arc<Link>,
    events: mpsc::Sender<SessionEvent>,
    state: Arc<Mutex<SessionState>>,
) {
    while let Some(frame) = queue.recv().await {
        if frame.is_empty() || !link.connected.load(Ordering::SeqCst) {
            break;
        }
        if let Err(e) = writer.write_all(&frame).await {
            report_disconnect(&link, &events, &state, Some(format!("send failed: {e}"))).await;
            break;
        }
    }
    let _ = writer.shutdown().await;
    debug!("send loop stopped");
}

/// Decodes inbound frames until the socket drops or the session stops.
/// Only clipboard pushes carry data the client acts on.
async fn recv_loop(
    mut reader: OwnedReadHalf,
    link: Arc<Link>,
    events: mpsc::Sender<SessionEvent>,
    state: Arc<Mutex<SessionState>>,
) {
    let mut stop_rx = link.stop_tx.subscribe();
    loop {
        if *stop_rx.borrow() {
            break;
        }
        tokio::select! {
            _ = stop_rx.changed() => {}
            frame = read_raw_frame(&mut reader) => match frame {
                Ok((command, payload)) => {
                    if command == Command::ClipboardData as u8 {
                        match decode_payload(command, &payload) {
                            Ok(PadMessage::ClipboardData(text)) => {
                                let _ = events.send(SessionEvent::ClipboardData(text)).await;
                            }
                            Ok(_) => {}
                            Err(e) => debug!("ignoring malformed clipboard frame: {e}"),
                        }
                    }
                }
                Err(FrameError::Io(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    report_disconnect(
                        &link,
                        &events,
                        &state,
                        Some("connection closed by server".to_string()),
                    )
                    .await;
                    break;
                }
                Err(e) => {
                    report_disconnect(&link, &events, &state, Some(format!("receive failed: {e}")))
                        .await;
                    break;
                }
            }
        }
    }
    debug!("receive loop stopped");
}

#[derive(Debug, Error)]
enum FrameError {
    #[error("{0}")]
    Protocol(#[from] ProtocolError),
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// Reads one frame: exact header, then exactly the declared payload.
async fn read_raw_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<(u8, Vec<u8>), FrameError> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header).await?;
    let parsed = decode_header(&header)?;
    let mut payload = vec![0u8; parsed.payload_len];
    if parsed.payload_len > 0 {
        reader.read_exact(&mut payload).await?;
    }
    Ok((parsed.command, payload))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
