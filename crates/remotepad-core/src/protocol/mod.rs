//! Protocol module containing message types, the binary codec, and the
//! discovery wire strings.

pub mod codec;
pub mod discovery;
pub mod messages;

pub use codec::{
    decode_header, decode_message, decode_payload, encode_frame, encode_message, FrameHeader,
    ProtocolError,
};
pub use messages::*;
