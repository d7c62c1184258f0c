//! # remotepad-core
//!
//! Shared library for RemotePad containing the wire-protocol codec, the
//! virtual-key translation table, and the touch/text input interpreters.
//!
//! This crate is used by both the server and client applications. It has
//! zero dependencies on OS APIs, UI frameworks, or network sockets: the
//! gesture recognizer and text-diff translator are pure state machines that
//! return protocol messages, and the codec works on byte slices.

pub mod input;
pub mod keymap;
pub mod protocol;

pub use input::gesture::{
    GestureConfig, GestureRecognizer, ScrollStrip, TouchEvent, TouchPhase, TouchPoint,
};
pub use input::text_diff::TextDiffTranslator;
pub use keymap::vkey_for_char;
pub use protocol::codec::{decode_header, decode_message, encode_message, ProtocolError};
pub use protocol::messages::{Command, PadMessage, PowerAction, VolumeAction};
