//! Round-trip and boundary tests for the wire protocol, exercised through
//! the crate's public API the way the client and server use it.

use remotepad_core::protocol::codec::{
    decode_header, decode_message, encode_frame, encode_message, ProtocolError,
};
use remotepad_core::protocol::messages::{
    Command, PadMessage, PowerAction, VolumeAction, HEADER_SIZE, MAX_PAYLOAD,
};

fn all_messages() -> Vec<PadMessage> {
    vec![
        PadMessage::MouseMove { dx: 5, dy: 0 },
        PadMessage::MouseMove {
            dx: i32::MIN,
            dy: i32::MAX,
        },
        PadMessage::MouseButton { button: 1, down: true },
        PadMessage::MouseButton { button: 2, down: false },
        PadMessage::MouseScroll { dx: 0, dy: -17 },
        PadMessage::KeyDown(0x10),
        PadMessage::KeyUp(0x10),
        PadMessage::KeyPress(0x0D),
        PadMessage::Char(0x44F),    // я
        PadMessage::Char(0x1F600),  // astral plane
        PadMessage::ClipboardGet,
        PadMessage::ClipboardSet("copy this".to_string()),
        PadMessage::ClipboardData("pasted".to_string()),
        PadMessage::Power(PowerAction::Shutdown),
        PadMessage::Power(PowerAction::Reboot),
        PadMessage::Power(PowerAction::Sleep),
        PadMessage::Power(PowerAction::Logout),
        PadMessage::Power(PowerAction::Lock),
        PadMessage::Volume(VolumeAction::Up),
        PadMessage::Volume(VolumeAction::Down),
        PadMessage::Volume(VolumeAction::Mute),
        PadMessage::Auth(String::new()),
        PadMessage::Auth("secret".to_string()),
        PadMessage::AuthOk,
        PadMessage::AuthFail,
        PadMessage::ServerInfo {
            name: "Desk-PC".to_string(),
            version: "2.1.0".to_string(),
        },
        PadMessage::Ping,
        PadMessage::Pong,
    ]
}

#[test]
fn test_every_catalogue_message_round_trips() {
    for msg in all_messages() {
        let bytes = encode_message(&msg).expect("encode");
        let (decoded, consumed) = decode_message(&bytes).expect("decode");
        assert_eq!(decoded, msg);
        assert_eq!(consumed, bytes.len());
    }
}

#[test]
fn test_every_frame_carries_magic_and_declared_length() {
    for msg in all_messages() {
        let bytes = encode_message(&msg).expect("encode");
        let header = decode_header(&bytes).expect("header");
        assert_eq!(&bytes[0..3], b"RM1");
        assert_eq!(header.command, msg.command() as u8);
        assert_eq!(bytes.len(), HEADER_SIZE + header.payload_len);
    }
}

#[test]
fn test_encode_succeeds_up_to_the_length_field_limit() {
    for len in [0usize, 1, 255, 65535] {
        let frame = encode_frame(Command::ClipboardSet as u8, &vec![b'x'; len])
            .expect("payload within the u16 bound must encode");
        assert_eq!(frame.len(), HEADER_SIZE + len);
    }
}

#[test]
fn test_encode_fails_past_the_length_field_limit() {
    let result = encode_frame(Command::ClipboardSet as u8, &vec![b'x'; MAX_PAYLOAD + 1]);
    assert_eq!(result, Err(ProtocolError::PayloadTooLarge(MAX_PAYLOAD + 1)));
}

#[test]
fn test_any_corrupted_magic_byte_is_rejected_before_interpretation() {
    let good = encode_message(&PadMessage::Power(PowerAction::Lock)).unwrap();
    for i in 0..3 {
        let mut bad = good.clone();
        bad[i] ^= 0x20;
        match decode_header(&bad) {
            Err(ProtocolError::InvalidMagic(_)) => {}
            other => panic!("corrupted magic must yield InvalidMagic, got {other:?}"),
        }
        assert!(decode_message(&bad).is_err());
    }
}

#[test]
fn test_foreign_version_bytes_still_decode() {
    let mut bytes = encode_message(&PadMessage::Ping).unwrap();
    bytes[3] = 42;
    let (decoded, _) = decode_message(&bytes).expect("version is forward-compatible");
    assert_eq!(decoded, PadMessage::Ping);
}

#[test]
fn test_frames_decode_back_to_back_from_one_buffer() {
    let mut stream = Vec::new();
    let sent = vec![
        PadMessage::Auth("pw".to_string()),
        PadMessage::MouseMove { dx: 1, dy: 2 },
        PadMessage::Ping,
    ];
    for msg in &sent {
        stream.extend(encode_message(msg).unwrap());
    }
    let mut cursor = 0;
    let mut received = Vec::new();
    while cursor < stream.len() {
        let (msg, consumed) = decode_message(&stream[cursor..]).expect("decode at cursor");
        received.push(msg);
        cursor += consumed;
    }
    assert_eq!(received, sent);
}
