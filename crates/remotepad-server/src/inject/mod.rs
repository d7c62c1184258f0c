//! Input-injection collaborator boundary.
//!
//! The dispatcher maps every authenticated command to exactly one call on
//! [`InputInjector`]. Real implementations wrap OS synthesis APIs
//! (`SendInput`, XTest, CoreGraphics); they are deliberately outside this
//! crate so the dispatcher stays testable. The [`MockInjector`] records
//! calls for tests and [`LoggingInjector`] stands in for headless runs.

use remotepad_core::protocol::messages::{PowerAction, VolumeAction};
use thiserror::Error;
use tracing::info;

pub mod mock;

pub use mock::MockInjector;

/// Error type for input-injection operations.
#[derive(Debug, Error)]
pub enum InjectError {
    #[error("platform error: {0}")]
    Platform(String),
    #[error("clipboard unavailable: {0}")]
    Clipboard(String),
}

/// Platform-agnostic input injection trait.
///
/// Key codes are the neutral virtual-key space of
/// [`remotepad_core::keymap::vk`]; characters are Unicode code points.
pub trait InputInjector: Send + Sync {
    /// Moves the pointer by a relative delta in pixels.
    fn pointer_move(&self, dx: i32, dy: i32) -> Result<(), InjectError>;

    /// Presses or releases a pointer button (1 = left, 2 = right, 3 = middle).
    fn pointer_button(&self, button: u8, down: bool) -> Result<(), InjectError>;

    /// Scrolls by a relative delta.
    fn scroll(&self, dx: i32, dy: i32) -> Result<(), InjectError>;

    /// Presses or releases a key.
    fn key(&self, code: u32, down: bool) -> Result<(), InjectError>;

    /// Taps a key: down immediately followed by up.
    fn key_press(&self, code: u32) -> Result<(), InjectError> {
        self.key(code, true)?;
        self.key(code, false)
    }

    /// Types one Unicode code point.
    fn unicode_char(&self, code_point: u32) -> Result<(), InjectError>;

    /// Reads the host clipboard as text.
    fn clipboard_text(&self) -> Result<String, InjectError>;

    /// Replaces the host clipboard text.
    fn set_clipboard_text(&self, text: &str) -> Result<(), InjectError>;

    /// Performs a power-management action.
    fn power(&self, action: PowerAction) -> Result<(), InjectError>;

    /// Performs a volume action.
    fn volume(&self, action: VolumeAction) -> Result<(), InjectError>;
}

/// Injector that only logs what it would do. Used by the headless binary,
/// where a platform implementation is wired in by the packaging layer.
pub struct LoggingInjector;

impl InputInjector for LoggingInjector {
    fn pointer_move(&self, dx: i32, dy: i32) -> Result<(), InjectError> {
        info!("pointer move ({dx}, {dy})");
        Ok(())
    }

    fn pointer_button(&self, button: u8, down: bool) -> Result<(), InjectError> {
        info!("pointer button {button} {}", if down { "down" } else { "up" });
        Ok(())
    }

    fn scroll(&self, dx: i32, dy: i32) -> Result<(), InjectError> {
        info!("scroll ({dx}, {dy})");
        Ok(())
    }

    fn key(&self, code: u32, down: bool) -> Result<(), InjectError> {
        info!("key 0x{code:02X} {}", if down { "down" } else { "up" });
        Ok(())
    }

    fn unicode_char(&self, code_point: u32) -> Result<(), InjectError> {
        info!("char U+{code_point:04X}");
        Ok(())
    }

    fn clipboard_text(&self) -> Result<String, InjectError> {
        Ok(String::new())
    }

    fn set_clipboard_text(&self, text: &str) -> Result<(), InjectError> {
        info!("clipboard set ({} bytes)", text.len());
        Ok(())
    }

    fn power(&self, action: PowerAction) -> Result<(), InjectError> {
        info!("power action {action:?}");
        Ok(())
    }

    fn volume(&self, action: VolumeAction) -> Result<(), InjectError> {
        info!("volume action {action:?}");
        Ok(())
    }
}
