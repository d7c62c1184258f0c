//! Binary codec for encoding and decoding RemotePad protocol frames.
//!
//! Wire format:
//! ```text
//! ['R']['M']['1'][version:1][command:1][payload_len:2 BE][payload:N]
//! ```
//! Total header size: 7 bytes. All multi-byte integers are big-endian.
//!
//! The codec has no knowledge of sockets. Streaming callers use
//! [`decode_header`] on the first 7 bytes and are responsible for buffering
//! until `HEADER_SIZE + payload_len` bytes are available before decoding the
//! payload.

use thiserror::Error;

use crate::protocol::messages::{
    Command, PadMessage, PowerAction, VolumeAction, HEADER_SIZE, MAGIC, MAX_PAYLOAD,
    PROTOCOL_VERSION,
};

/// Errors that can occur during frame encoding or decoding.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The first three bytes are not the `RM1` magic.
    #[error("invalid magic: {0:02X?}")]
    InvalidMagic([u8; 3]),

    /// The payload exceeds the 16-bit length field.
    #[error("payload too large: {0} bytes exceeds the 65535-byte maximum")]
    PayloadTooLarge(usize),

    /// The byte slice is shorter than the minimum required length.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The command byte is not part of the catalogue.
    #[error("unknown command: 0x{0:02X}")]
    UnknownCommand(u8),

    /// The payload could not be parsed (too short, invalid UTF-8, etc.).
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

/// Header fields of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Version byte as sent by the peer. Any value is accepted so newer
    /// peers remain able to talk to older ones.
    pub version: u8,
    /// Raw command byte. May be a value outside the known catalogue.
    pub command: u8,
    /// Number of payload bytes following the header.
    pub payload_len: usize,
}

// ── Frame layer ───────────────────────────────────────────────────────────────

/// Encodes a raw frame: 7-byte header followed by `payload`.
///
/// # Errors
///
/// Returns [`ProtocolError::PayloadTooLarge`] when `payload` exceeds
/// [`MAX_PAYLOAD`] bytes.
pub fn encode_frame(command: u8, payload: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    if payload.len() > MAX_PAYLOAD {
        return Err(ProtocolError::PayloadTooLarge(payload.len()));
    }
    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    buf.extend_from_slice(&MAGIC);
    buf.push(PROTOCOL_VERSION);
    buf.push(command);
    buf.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    buf.extend_from_slice(payload);
    Ok(buf)
}

/// Decodes the 7-byte header at the start of `bytes`.
///
/// Only the magic is validated; the version byte is passed through untouched.
///
/// # Errors
///
/// Returns [`ProtocolError::InsufficientData`] when fewer than 7 bytes are
/// available and [`ProtocolError::InvalidMagic`] when the magic does not
/// match.
pub fn decode_header(bytes: &[u8]) -> Result<FrameHeader, ProtocolError> {
    if bytes.len() < HEADER_SIZE {
        return Err(ProtocolError::InsufficientData {
            needed: HEADER_SIZE,
            available: bytes.len(),
        });
    }
    if bytes[0..3] != MAGIC {
        return Err(ProtocolError::InvalidMagic([bytes[0], bytes[1], bytes[2]]));
    }
    Ok(FrameHeader {
        version: bytes[3],
        command: bytes[4],
        payload_len: u16::from_be_bytes([bytes[5], bytes[6]]) as usize,
    })
}

// ── Typed message layer ───────────────────────────────────────────────────────

/// Encodes a [`PadMessage`] into a complete frame.
///
/// # Errors
///
/// Returns [`ProtocolError::PayloadTooLarge`] when a string payload exceeds
/// the 16-bit length field.
///
/// # Examples
///
/// ```rust
/// use remotepad_core::protocol::codec::{decode_message, encode_message};
/// use remotepad_core::protocol::messages::PadMessage;
///
/// let msg = PadMessage::MouseMove { dx: 5, dy: -3 };
/// let bytes = encode_message(&msg).unwrap();
/// let (decoded, consumed) = decode_message(&bytes).unwrap();
/// assert_eq!(decoded, msg);
/// assert_eq!(consumed, bytes.len());
/// ```
pub fn encode_message(msg: &PadMessage) -> Result<Vec<u8>, ProtocolError> {
    let payload = encode_payload(msg);
    encode_frame(msg.command() as u8, &payload)
}

/// Decodes one [`PadMessage`] from the beginning of `bytes`.
///
/// Returns the decoded message and the total number of bytes consumed
/// (header + payload), so the caller can advance their read cursor.
///
/// # Errors
///
/// Returns [`ProtocolError`] if the bytes are malformed or the full payload
/// is not yet available.
pub fn decode_message(bytes: &[u8]) -> Result<(PadMessage, usize), ProtocolError> {
    let header = decode_header(bytes)?;
    let total = HEADER_SIZE + header.payload_len;
    if bytes.len() < total {
        return Err(ProtocolError::InsufficientData {
            needed: total,
            available: bytes.len(),
        });
    }
    let msg = decode_payload(header.command, &bytes[HEADER_SIZE..total])?;
    Ok((msg, total))
}

/// Decodes a payload whose command byte has already been read.
///
/// # Errors
///
/// Returns [`ProtocolError::UnknownCommand`] for command bytes outside the
/// catalogue and [`ProtocolError::MalformedPayload`] for short or invalid
/// payloads.
pub fn decode_payload(command: u8, payload: &[u8]) -> Result<PadMessage, ProtocolError> {
    let command = Command::try_from(command).map_err(|_| ProtocolError::UnknownCommand(command))?;
    match command {
        Command::MouseMove => {
            let (dx, dy) = read_i32_pair(payload, "MouseMove")?;
            Ok(PadMessage::MouseMove { dx, dy })
        }
        Command::MouseButton => {
            require_len(payload, 2, "MouseButton")?;
            Ok(PadMessage::MouseButton {
                button: payload[0],
                down: payload[1] != 0,
            })
        }
        Command::MouseScroll => {
            let (dx, dy) = read_i32_pair(payload, "MouseScroll")?;
            Ok(PadMessage::MouseScroll { dx, dy })
        }
        Command::KeyDown => read_u32(payload, "KeyDown").map(PadMessage::KeyDown),
        Command::KeyUp => read_u32(payload, "KeyUp").map(PadMessage::KeyUp),
        Command::KeyPress => read_u32(payload, "KeyPress").map(PadMessage::KeyPress),
        Command::Char => read_u32(payload, "Char").map(PadMessage::Char),
        Command::ClipboardGet => Ok(PadMessage::ClipboardGet),
        Command::ClipboardSet => read_utf8(payload).map(PadMessage::ClipboardSet),
        Command::ClipboardData => read_utf8(payload).map(PadMessage::ClipboardData),
        Command::PowerShutdown => Ok(PadMessage::Power(PowerAction::Shutdown)),
        Command::PowerReboot => Ok(PadMessage::Power(PowerAction::Reboot)),
        Command::PowerSleep => Ok(PadMessage::Power(PowerAction::Sleep)),
        Command::PowerLogout => Ok(PadMessage::Power(PowerAction::Logout)),
        Command::PowerLock => Ok(PadMessage::Power(PowerAction::Lock)),
        Command::VolumeUp => Ok(PadMessage::Volume(VolumeAction::Up)),
        Command::VolumeDown => Ok(PadMessage::Volume(VolumeAction::Down)),
        Command::VolumeMute => Ok(PadMessage::Volume(VolumeAction::Mute)),
        Command::Auth => read_utf8(payload).map(PadMessage::Auth),
        Command::AuthOk => Ok(PadMessage::AuthOk),
        Command::AuthFail => Ok(PadMessage::AuthFail),
        Command::ServerInfo => {
            let (name, after_name) = read_length_prefixed_string(payload, 0)?;
            let (version, _) = read_length_prefixed_string(payload, after_name)?;
            Ok(PadMessage::ServerInfo { name, version })
        }
        Command::Ping => Ok(PadMessage::Ping),
        Command::Pong => Ok(PadMessage::Pong),
    }
}

// ── Payload encoding ──────────────────────────────────────────────────────────

fn encode_payload(msg: &PadMessage) -> Vec<u8> {
    let mut buf = Vec::new();
    match msg {
        PadMessage::MouseMove { dx, dy } | PadMessage::MouseScroll { dx, dy } => {
            buf.extend_from_slice(&dx.to_be_bytes());
            buf.extend_from_slice(&dy.to_be_bytes());
        }
        PadMessage::MouseButton { button, down } => {
            buf.push(*button);
            buf.push(u8::from(*down));
        }
        PadMessage::KeyDown(code)
        | PadMessage::KeyUp(code)
        | PadMessage::KeyPress(code)
        | PadMessage::Char(code) => {
            buf.extend_from_slice(&code.to_be_bytes());
        }
        PadMessage::ClipboardSet(text)
        | PadMessage::ClipboardData(text)
        | PadMessage::Auth(text) => {
            buf.extend_from_slice(text.as_bytes());
        }
        PadMessage::ServerInfo { name, version } => {
            write_length_prefixed_string(&mut buf, name);
            write_length_prefixed_string(&mut buf, version);
        }
        PadMessage::ClipboardGet
        | PadMessage::Power(_)
        | PadMessage::Volume(_)
        | PadMessage::AuthOk
        | PadMessage::AuthFail
        | PadMessage::Ping
        | PadMessage::Pong => {}
    }
    buf
}

// ── Utility helpers ───────────────────────────────────────────────────────────

fn require_len(payload: &[u8], needed: usize, context: &str) -> Result<(), ProtocolError> {
    if payload.len() < needed {
        Err(ProtocolError::MalformedPayload(format!(
            "{context}: need {needed} bytes, got {}",
            payload.len()
        )))
    } else {
        Ok(())
    }
}

fn read_u32(payload: &[u8], context: &str) -> Result<u32, ProtocolError> {
    require_len(payload, 4, context)?;
    Ok(u32::from_be_bytes([
        payload[0], payload[1], payload[2], payload[3],
    ]))
}

fn read_i32_pair(payload: &[u8], context: &str) -> Result<(i32, i32), ProtocolError> {
    require_len(payload, 8, context)?;
    let a = i32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]);
    let b = i32::from_be_bytes([payload[4], payload[5], payload[6], payload[7]]);
    Ok((a, b))
}

fn read_utf8(payload: &[u8]) -> Result<String, ProtocolError> {
    String::from_utf8(payload.to_vec())
        .map_err(|e| ProtocolError::MalformedPayload(format!("invalid UTF-8: {e}")))
}

/// Writes a 2-byte length prefix followed by the UTF-8 string bytes.
fn write_length_prefixed_string(buf: &mut Vec<u8>, s: &str) {
    let bytes = s.as_bytes();
    let len = bytes.len().min(u16::MAX as usize);
    buf.extend_from_slice(&(len as u16).to_be_bytes());
    buf.extend_from_slice(&bytes[..len]);
}

/// Reads a 2-byte length prefix and then that many UTF-8 bytes.
/// Returns the string and the offset of the byte after the string.
fn read_length_prefixed_string(
    buf: &[u8],
    offset: usize,
) -> Result<(String, usize), ProtocolError> {
    if buf.len() < offset + 2 {
        return Err(ProtocolError::MalformedPayload(format!(
            "need 2 bytes for string length at offset {offset}"
        )));
    }
    let len = u16::from_be_bytes([buf[offset], buf[offset + 1]]) as usize;
    let start = offset + 2;
    if buf.len() < start + len {
        return Err(ProtocolError::MalformedPayload(format!(
            "string of length {len} at offset {start} exceeds buffer"
        )));
    }
    let s = std::str::from_utf8(&buf[start..start + len])
        .map_err(|e| ProtocolError::MalformedPayload(format!("invalid UTF-8: {e}")))?
        .to_string();
    Ok((s, start + len))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(msg: &PadMessage) -> PadMessage {
        let encoded = encode_message(msg).expect("encode failed");
        let (decoded, consumed) = decode_message(&encoded).expect("decode failed");
        assert_eq!(consumed, encoded.len());
        decoded
    }

    // ── Header layout ─────────────────────────────────────────────────────────

    #[test]
    fn test_header_starts_with_magic_and_version() {
        let bytes = encode_message(&PadMessage::Ping).unwrap();
        assert_eq!(&bytes[0..3], b"RM1");
        assert_eq!(bytes[3], PROTOCOL_VERSION);
        assert_eq!(bytes[4], Command::Ping as u8);
        assert_eq!(bytes.len(), HEADER_SIZE);
    }

    #[test]
    fn test_payload_length_is_big_endian_u16() {
        let bytes = encode_frame(Command::ClipboardSet as u8, &[0x61; 0x0203]).unwrap();
        assert_eq!(bytes[5], 0x02);
        assert_eq!(bytes[6], 0x03);
    }

    #[test]
    fn test_decode_header_rejects_bad_magic() {
        let mut bytes = encode_message(&PadMessage::Ping).unwrap();
        bytes[2] = b'2';
        assert_eq!(
            decode_header(&bytes),
            Err(ProtocolError::InvalidMagic([b'R', b'M', b'2']))
        );
    }

    #[test]
    fn test_decode_header_accepts_any_version_byte() {
        let mut bytes = encode_message(&PadMessage::Pong).unwrap();
        bytes[3] = 0x7E;
        let header = decode_header(&bytes).unwrap();
        assert_eq!(header.version, 0x7E);
        assert_eq!(header.command, Command::Pong as u8);
    }

    #[test]
    fn test_decode_header_needs_seven_bytes() {
        assert_eq!(
            decode_header(&[b'R', b'M']),
            Err(ProtocolError::InsufficientData {
                needed: HEADER_SIZE,
                available: 2
            })
        );
    }

    #[test]
    fn test_decode_message_waits_for_full_payload() {
        let bytes = encode_message(&PadMessage::Char(0x41)).unwrap();
        let result = decode_message(&bytes[..HEADER_SIZE + 2]);
        assert!(matches!(
            result,
            Err(ProtocolError::InsufficientData { needed: 11, .. })
        ));
    }

    // ── Payload size bounds ───────────────────────────────────────────────────

    #[test]
    fn test_encode_frame_accepts_empty_and_max_payload() {
        assert!(encode_frame(0x21, &[]).is_ok());
        assert!(encode_frame(0x21, &vec![0u8; MAX_PAYLOAD]).is_ok());
    }

    #[test]
    fn test_encode_frame_rejects_oversized_payload() {
        let result = encode_frame(0x21, &vec![0u8; MAX_PAYLOAD + 1]);
        assert_eq!(result, Err(ProtocolError::PayloadTooLarge(MAX_PAYLOAD + 1)));
    }

    // ── Round trips ───────────────────────────────────────────────────────────

    #[test]
    fn test_mouse_move_round_trip() {
        let msg = PadMessage::MouseMove { dx: -5, dy: 1080 };
        assert_eq!(round_trip(&msg), msg);
    }

    #[test]
    fn test_mouse_button_round_trip() {
        for button in [1u8, 2, 3] {
            for down in [true, false] {
                let msg = PadMessage::MouseButton { button, down };
                assert_eq!(round_trip(&msg), msg);
            }
        }
    }

    #[test]
    fn test_mouse_scroll_round_trip() {
        let msg = PadMessage::MouseScroll { dx: 0, dy: -42 };
        assert_eq!(round_trip(&msg), msg);
    }

    #[test]
    fn test_key_and_char_round_trips() {
        assert_eq!(round_trip(&PadMessage::KeyDown(0x5B)), PadMessage::KeyDown(0x5B));
        assert_eq!(round_trip(&PadMessage::KeyUp(0x0D)), PadMessage::KeyUp(0x0D));
        assert_eq!(round_trip(&PadMessage::KeyPress(0x08)), PadMessage::KeyPress(0x08));
        assert_eq!(
            round_trip(&PadMessage::Char(0x1F600)),
            PadMessage::Char(0x1F600)
        );
    }

    #[test]
    fn test_clipboard_round_trips() {
        assert_eq!(round_trip(&PadMessage::ClipboardGet), PadMessage::ClipboardGet);
        let set = PadMessage::ClipboardSet("привет, world".to_string());
        assert_eq!(round_trip(&set), set);
        let data = PadMessage::ClipboardData(String::new());
        assert_eq!(round_trip(&data), data);
    }

    #[test]
    fn test_auth_round_trips_including_empty_password() {
        let empty = PadMessage::Auth(String::new());
        assert_eq!(round_trip(&empty), empty);
        let secret = PadMessage::Auth("sesame".to_string());
        assert_eq!(round_trip(&secret), secret);
    }

    #[test]
    fn test_empty_payload_commands_round_trip() {
        for msg in [
            PadMessage::Power(PowerAction::Shutdown),
            PadMessage::Power(PowerAction::Lock),
            PadMessage::Volume(VolumeAction::Mute),
            PadMessage::AuthOk,
            PadMessage::AuthFail,
            PadMessage::Ping,
            PadMessage::Pong,
        ] {
            assert_eq!(round_trip(&msg), msg);
        }
    }

    #[test]
    fn test_server_info_round_trip() {
        let msg = PadMessage::ServerInfo {
            name: "Workstation".to_string(),
            version: "1.4.2".to_string(),
        };
        assert_eq!(round_trip(&msg), msg);
    }

    #[test]
    fn test_server_info_nested_length_prefix_layout() {
        let msg = PadMessage::ServerInfo {
            name: "PC".to_string(),
            version: "1.0".to_string(),
        };
        let bytes = encode_message(&msg).unwrap();
        let payload = &bytes[HEADER_SIZE..];
        assert_eq!(payload, &[0, 2, b'P', b'C', 0, 3, b'1', b'.', b'0']);
    }

    #[test]
    fn test_server_info_with_empty_strings() {
        let msg = PadMessage::ServerInfo {
            name: String::new(),
            version: String::new(),
        };
        assert_eq!(round_trip(&msg), msg);
    }

    // ── Error conditions ──────────────────────────────────────────────────────

    #[test]
    fn test_decode_payload_rejects_unknown_command() {
        assert_eq!(
            decode_payload(0x7A, &[]),
            Err(ProtocolError::UnknownCommand(0x7A))
        );
    }

    #[test]
    fn test_decode_payload_rejects_short_mouse_move() {
        let result = decode_payload(Command::MouseMove as u8, &[0, 0, 0]);
        assert!(matches!(result, Err(ProtocolError::MalformedPayload(_))));
    }

    #[test]
    fn test_decode_payload_rejects_invalid_utf8_clipboard() {
        let result = decode_payload(Command::ClipboardSet as u8, &[0xFF, 0xFE]);
        assert!(matches!(result, Err(ProtocolError::MalformedPayload(_))));
    }

    #[test]
    fn test_decode_payload_rejects_truncated_server_info() {
        let result = decode_payload(Command::ServerInfo as u8, &[0, 5, b'a']);
        assert!(matches!(result, Err(ProtocolError::MalformedPayload(_))));
    }
}
