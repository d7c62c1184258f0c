//! All RemotePad protocol message types.
//!
//! Every frame on the wire is a 7-byte header followed by a payload whose
//! shape is fixed per command. Integers inside payloads are big-endian and
//! fixed-width; strings are UTF-8 with no terminator.

use serde::{Deserialize, Serialize};

// ── Protocol constants ────────────────────────────────────────────────────────

/// Three-byte magic prefix of every frame: `'R'`, `'M'`, `'1'`.
pub const MAGIC: [u8; 3] = *b"RM1";

/// Current protocol version byte. Receivers accept any version value so that
/// newer peers can talk to older ones.
pub const PROTOCOL_VERSION: u8 = 0x01;

/// Total size of the frame header in bytes.
pub const HEADER_SIZE: usize = 7;

/// Largest payload a frame can carry. The length field is a u16, so this is
/// also the bound a receiver enforces before allocating.
pub const MAX_PAYLOAD: usize = u16::MAX as usize;

/// Mouse button identifiers carried in the MouseButton payload.
pub mod button {
    pub const LEFT: u8 = 1;
    pub const RIGHT: u8 = 2;
    pub const MIDDLE: u8 = 3;
}

// ── Command bytes ─────────────────────────────────────────────────────────────

/// All command byte values defined by the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Command {
    // Pointer (0x01–0x0F)
    MouseMove = 0x01,
    MouseButton = 0x02,
    MouseScroll = 0x03,
    // Keyboard (0x10–0x1F)
    KeyDown = 0x10,
    KeyUp = 0x11,
    KeyPress = 0x12,
    Char = 0x13,
    // Clipboard (0x20–0x2F)
    ClipboardGet = 0x20,
    ClipboardSet = 0x21,
    ClipboardData = 0x22,
    // Power (0x30–0x3F)
    PowerShutdown = 0x30,
    PowerReboot = 0x31,
    PowerSleep = 0x32,
    PowerLogout = 0x33,
    PowerLock = 0x34,
    // Volume (0x40–0x4F)
    VolumeUp = 0x40,
    VolumeDown = 0x41,
    VolumeMute = 0x42,
    // Session (0xF0–0xFF)
    Auth = 0xF0,
    AuthOk = 0xF1,
    AuthFail = 0xF2,
    ServerInfo = 0xF3,
    Ping = 0xFE,
    Pong = 0xFF,
}

impl TryFrom<u8> for Command {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0x01 => Ok(Command::MouseMove),
            0x02 => Ok(Command::MouseButton),
            0x03 => Ok(Command::MouseScroll),
            0x10 => Ok(Command::KeyDown),
            0x11 => Ok(Command::KeyUp),
            0x12 => Ok(Command::KeyPress),
            0x13 => Ok(Command::Char),
            0x20 => Ok(Command::ClipboardGet),
            0x21 => Ok(Command::ClipboardSet),
            0x22 => Ok(Command::ClipboardData),
            0x30 => Ok(Command::PowerShutdown),
            0x31 => Ok(Command::PowerReboot),
            0x32 => Ok(Command::PowerSleep),
            0x33 => Ok(Command::PowerLogout),
            0x34 => Ok(Command::PowerLock),
            0x40 => Ok(Command::VolumeUp),
            0x41 => Ok(Command::VolumeDown),
            0x42 => Ok(Command::VolumeMute),
            0xF0 => Ok(Command::Auth),
            0xF1 => Ok(Command::AuthOk),
            0xF2 => Ok(Command::AuthFail),
            0xF3 => Ok(Command::ServerInfo),
            0xFE => Ok(Command::Ping),
            0xFF => Ok(Command::Pong),
            _ => Err(()),
        }
    }
}

// ── Grouped command arguments ─────────────────────────────────────────────────

/// Power-management actions, each with its own command byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerAction {
    Shutdown,
    Reboot,
    Sleep,
    Logout,
    Lock,
}

impl PowerAction {
    pub fn command(self) -> Command {
        match self {
            PowerAction::Shutdown => Command::PowerShutdown,
            PowerAction::Reboot => Command::PowerReboot,
            PowerAction::Sleep => Command::PowerSleep,
            PowerAction::Logout => Command::PowerLogout,
            PowerAction::Lock => Command::PowerLock,
        }
    }
}

/// Volume actions, each with its own command byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeAction {
    Up,
    Down,
    Mute,
}

impl VolumeAction {
    pub fn command(self) -> Command {
        match self {
            VolumeAction::Up => Command::VolumeUp,
            VolumeAction::Down => Command::VolumeDown,
            VolumeAction::Mute => Command::VolumeMute,
        }
    }
}

// ── Top-level message enum ────────────────────────────────────────────────────

/// All valid RemotePad messages, discriminated by command byte.
///
/// Payload shapes:
/// - `MouseMove`/`MouseScroll`: two i32 big-endian (dx, dy)
/// - `MouseButton`: `(u8 button, u8 down_flag)`
/// - `KeyDown`/`KeyUp`/`KeyPress`/`Char`: one u32 big-endian code
/// - `Auth`/`ClipboardSet`/`ClipboardData`: raw UTF-8 bytes
/// - `ServerInfo`: `[u16 name_len][name][u16 version_len][version]`
/// - everything else: empty payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PadMessage {
    MouseMove { dx: i32, dy: i32 },
    MouseButton { button: u8, down: bool },
    MouseScroll { dx: i32, dy: i32 },
    KeyDown(u32),
    KeyUp(u32),
    KeyPress(u32),
    Char(u32),
    ClipboardGet,
    ClipboardSet(String),
    ClipboardData(String),
    Power(PowerAction),
    Volume(VolumeAction),
    Auth(String),
    AuthOk,
    AuthFail,
    ServerInfo { name: String, version: String },
    Ping,
    Pong,
}

impl PadMessage {
    /// Returns the [`Command`] discriminant for this message.
    pub fn command(&self) -> Command {
        match self {
            PadMessage::MouseMove { .. } => Command::MouseMove,
            PadMessage::MouseButton { .. } => Command::MouseButton,
            PadMessage::MouseScroll { .. } => Command::MouseScroll,
            PadMessage::KeyDown(_) => Command::KeyDown,
            PadMessage::KeyUp(_) => Command::KeyUp,
            PadMessage::KeyPress(_) => Command::KeyPress,
            PadMessage::Char(_) => Command::Char,
            PadMessage::ClipboardGet => Command::ClipboardGet,
            PadMessage::ClipboardSet(_) => Command::ClipboardSet,
            PadMessage::ClipboardData(_) => Command::ClipboardData,
            PadMessage::Power(action) => action.command(),
            PadMessage::Volume(action) => action.command(),
            PadMessage::Auth(_) => Command::Auth,
            PadMessage::AuthOk => Command::AuthOk,
            PadMessage::AuthFail => Command::AuthFail,
            PadMessage::ServerInfo { .. } => Command::ServerInfo,
            PadMessage::Ping => Command::Ping,
            PadMessage::Pong => Command::Pong,
        }
    }
}
