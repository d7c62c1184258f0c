//! Integration tests for the session manager and connection lifecycle.
//!
//! # Purpose
//!
//! These tests exercise the `SessionManager` through its *public* API in the
//! same way that the UI layer uses it, against scripted servers on loopback
//! sockets.  They verify:
//!
//! - The happy path: connect, authenticate, read the server identity, send
//!   frames in FIFO order, and receive pushed clipboard content.
//! - The error paths: `AuthFail` is classified as "password required" when
//!   the submitted password was empty and "wrong password" otherwise, and a
//!   refused connect surfaces one `Disconnected` event with a hint.
//! - Edge cases: a server that never identifies itself, double disconnect,
//!   and a second `connect` replacing an in-flight attempt silently.
//!
//! # What is the handshake flow?
//!
//! ```text
//! Client                              Server
//! ──────                              ──────
//! connect(host, port, password)
//! Auth(password)          ────────►
//!                         ◄────────  AuthOk | AuthFail
//!                         ◄────────  ServerInfo(name, version)   (after AuthOk)
//! event: Connected { name, version }
//! send loop / receive loop start
//! ```
//!
//! On `AuthFail` the server closes the socket and the client reports
//! `AuthFailed` instead; no loop ever starts.

use std::time::Duration;

use remotepad_core::protocol::codec::{decode_header, decode_payload, encode_message};
use remotepad_core::protocol::messages::{Command, PadMessage, HEADER_SIZE};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

use remotepad_client::session::{AuthError, SessionEvent, SessionManager, SessionState};

async fn read_frame(stream: &mut TcpStream) -> (u8, Vec<u8>) {
    let mut header = [0u8; HEADER_SIZE];
    timeout(Duration::from_secs(5), stream.read_exact(&mut header))
        .await
        .expect("header read timed out")
        .expect("header read failed");
    let parsed = decode_header(&header).expect("valid header");
    let mut payload = vec![0u8; parsed.payload_len];
    if parsed.payload_len > 0 {
        timeout(Duration::from_secs(5), stream.read_exact(&mut payload))
            .await
            .expect("payload read timed out")
            .expect("payload read failed");
    }
    (parsed.command, payload)
}

async fn write_msg(stream: &mut TcpStream, msg: &PadMessage) {
    stream
        .write_all(&encode_message(msg).expect("encode"))
        .await
        .expect("write");
}

async fn next_event(rx: &mut tokio::sync::mpsc::Receiver<SessionEvent>) -> SessionEvent {
    timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("event timed out")
        .expect("event channel closed")
}

/// Accepts one connection and performs the server half of a successful
/// handshake, asserting the submitted password on the way.
async fn accept_and_authenticate(
    listener: TcpListener,
    expected_password: &str,
) -> TcpStream {
    let (mut stream, _) = listener.accept().await.expect("accept");
    let (command, payload) = read_frame(&mut stream).await;
    assert_eq!(command, Command::Auth as u8);
    assert_eq!(payload, expected_password.as_bytes());
    write_msg(&mut stream, &PadMessage::AuthOk).await;
    write_msg(
        &mut stream,
        &PadMessage::ServerInfo {
            name: "Desk-PC".to_string(),
            version: "1.4.2".to_string(),
        },
    )
    .await;
    stream
}

#[tokio::test]
async fn test_handshake_reports_server_identity_and_sends_flow() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");

    let server = tokio::spawn(async move {
        let mut stream = accept_and_authenticate(listener, "sesame").await;
        // The client's send queue delivers frames in FIFO order.
        let (command, payload) = read_frame(&mut stream).await;
        assert_eq!(command, Command::MouseMove as u8);
        assert_eq!(
            decode_payload(command, &payload).expect("decode"),
            PadMessage::MouseMove { dx: 5, dy: 7 }
        );
        let (command, _) = read_frame(&mut stream).await;
        assert_eq!(command, Command::Ping as u8);
        // Push clipboard content at the client.
        write_msg(&mut stream, &PadMessage::ClipboardData("from server".to_string())).await;
        stream
    });

    let (session, mut events) = SessionManager::new();
    session.connect(&addr.ip().to_string(), addr.port(), "sesame");

    match next_event(&mut events).await {
        SessionEvent::Connected {
            server_name,
            server_version,
        } => {
            assert_eq!(server_name, "Desk-PC");
            assert_eq!(server_version, "1.4.2");
        }
        other => panic!("expected Connected, got {other:?}"),
    }
    assert_eq!(session.state(), SessionState::Authenticated);
    assert!(session.is_connected());

    session.send_message(&PadMessage::MouseMove { dx: 5, dy: 7 });
    session.send_message(&PadMessage::Ping);

    assert_eq!(
        next_event(&mut events).await,
        SessionEvent::ClipboardData("from server".to_string())
    );

    // Server closes: the client reports one disconnect with a hint.
    let stream = server.await.expect("server task");
    drop(stream);
    match next_event(&mut events).await {
        SessionEvent::Disconnected { reason } => assert!(reason.is_some()),
        other => panic!("expected Disconnected, got {other:?}"),
    }
    assert_eq!(session.state(), SessionState::Disconnected);
    assert!(!session.is_connected());
}

#[tokio::test]
async fn test_auth_fail_with_empty_password_means_password_required() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.expect("accept");
        let (command, payload) = read_frame(&mut stream).await;
        assert_eq!(command, Command::Auth as u8);
        assert!(payload.is_empty());
        write_msg(&mut stream, &PadMessage::AuthFail).await;
    });

    let (session, mut events) = SessionManager::new();
    session.connect(&addr.ip().to_string(), addr.port(), "");

    assert_eq!(
        next_event(&mut events).await,
        SessionEvent::AuthFailed(AuthError::PasswordRequired)
    );
    assert_eq!(session.state(), SessionState::Disconnected);
}

#[tokio::test]
async fn test_auth_fail_with_nonempty_password_means_wrong_password() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.expect("accept");
        let _ = read_frame(&mut stream).await;
        write_msg(&mut stream, &PadMessage::AuthFail).await;
    });

    let (session, mut events) = SessionManager::new();
    session.connect(&addr.ip().to_string(), addr.port(), "not-it");

    assert_eq!(
        next_event(&mut events).await,
        SessionEvent::AuthFailed(AuthError::WrongPassword)
    );
}

#[tokio::test]
async fn test_refused_connection_surfaces_one_disconnect_with_reason() {
    // Bind then drop to get a port nothing listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let (session, mut events) = SessionManager::new();
    session.connect(&addr.ip().to_string(), addr.port(), "pw");

    match next_event(&mut events).await {
        SessionEvent::Disconnected { reason } => {
            assert!(reason.is_some(), "a failed connect carries a hint");
        }
        other => panic!("expected Disconnected, got {other:?}"),
    }
    assert_eq!(session.state(), SessionState::Disconnected);
}

#[tokio::test]
async fn test_missing_server_info_yields_empty_identity() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.expect("accept");
        let _ = read_frame(&mut stream).await;
        write_msg(&mut stream, &PadMessage::AuthOk).await;
        // No ServerInfo follows; keep the socket open past the client's
        // secondary-read window.
        tokio::time::sleep(Duration::from_secs(4)).await;
    });

    let (session, mut events) = SessionManager::new();
    session.connect(&addr.ip().to_string(), addr.port(), "pw");

    match next_event(&mut events).await {
        SessionEvent::Connected {
            server_name,
            server_version,
        } => {
            assert!(server_name.is_empty());
            assert!(server_version.is_empty());
        }
        other => panic!("expected Connected, got {other:?}"),
    }
    assert!(session.is_connected());
    session.disconnect().await;
}

#[tokio::test]
async fn test_disconnect_is_idempotent_and_reports_once() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");

    tokio::spawn(async move {
        let mut stream = accept_and_authenticate(listener, "pw").await;
        // Hold the socket open until the client hangs up.
        let mut buf = [0u8; 64];
        loop {
            match stream.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
        }
    });

    let (session, mut events) = SessionManager::new();
    session.connect(&addr.ip().to_string(), addr.port(), "pw");
    assert!(matches!(
        next_event(&mut events).await,
        SessionEvent::Connected { .. }
    ));

    session.disconnect().await;
    session.disconnect().await;

    assert_eq!(
        next_event(&mut events).await,
        SessionEvent::Disconnected { reason: None }
    );
    // No second report arrives.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(events.try_recv().is_err());
    assert!(!session.is_connected());

    // Sends after disconnect are no-ops.
    session.send_message(&PadMessage::Ping);
}

#[tokio::test]
async fn test_reconnect_replaces_the_previous_attempt_silently() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");

    let server = tokio::spawn(async move {
        // First connection: accepted, never answered.
        let (_first, _) = listener.accept().await.expect("accept first");
        // Second connection: full handshake.
        let mut stream = accept_and_authenticate(listener, "pw").await;
        let mut buf = [0u8; 64];
        loop {
            match stream.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
        }
    });

    let (session, mut events) = SessionManager::new();
    session.connect(&addr.ip().to_string(), addr.port(), "pw");
    tokio::time::sleep(Duration::from_millis(100)).await;
    // The second attempt silently cancels the first: no Disconnected event
    // for the abandoned handshake, one Connected for the new session.
    session.connect(&addr.ip().to_string(), addr.port(), "pw");

    assert!(matches!(
        next_event(&mut events).await,
        SessionEvent::Connected { .. }
    ));
    session.disconnect().await;
    assert_eq!(
        next_event(&mut events).await,
        SessionEvent::Disconnected { reason: None }
    );
    server.abort();
}
