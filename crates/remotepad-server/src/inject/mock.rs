//! Recording injector for unit and integration tests.
//!
//! The real injectors call OS synthesis APIs that require a desktop session
//! and actually move the cursor on the test machine. `MockInjector` records
//! every call into mutex-guarded vectors so assertions can inspect exactly
//! what was injected and in what order. Set `should_fail` to exercise the
//! dispatcher's error-handling path.

use std::sync::Mutex;

use remotepad_core::protocol::messages::{PowerAction, VolumeAction};

use crate::inject::{InjectError, InputInjector};

#[derive(Default)]
pub struct MockInjector {
    /// (dx, dy) pairs passed to `pointer_move`.
    pub pointer_moves: Mutex<Vec<(i32, i32)>>,
    /// (button, down) pairs passed to `pointer_button`.
    pub buttons: Mutex<Vec<(u8, bool)>>,
    /// (dx, dy) pairs passed to `scroll`.
    pub scrolls: Mutex<Vec<(i32, i32)>>,
    /// (code, down) pairs passed to `key`.
    pub keys: Mutex<Vec<(u32, bool)>>,
    /// Code points passed to `unicode_char`.
    pub chars: Mutex<Vec<u32>>,
    /// Current clipboard text; read by `clipboard_text`, replaced by
    /// `set_clipboard_text`.
    pub clipboard: Mutex<String>,
    /// Power actions in call order.
    pub power_actions: Mutex<Vec<PowerAction>>,
    /// Volume actions in call order.
    pub volume_actions: Mutex<Vec<VolumeAction>>,
    /// When `true`, every method returns `InjectError::Platform`.
    pub should_fail: bool,
}

impl MockInjector {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> Result<(), InjectError> {
        if self.should_fail {
            Err(InjectError::Platform("mock failure".into()))
        } else {
            Ok(())
        }
    }
}

impl InputInjector for MockInjector {
    fn pointer_move(&self, dx: i32, dy: i32) -> Result<(), InjectError> {
        self.guard()?;
        self.pointer_moves.lock().unwrap().push((dx, dy));
        Ok(())
    }

    fn pointer_button(&self, button: u8, down: bool) -> Result<(), InjectError> {
        self.guard()?;
        self.buttons.lock().unwrap().push((button, down));
        Ok(())
    }

    fn scroll(&self, dx: i32, dy: i32) -> Result<(), InjectError> {
        self.guard()?;
        self.scrolls.lock().unwrap().push((dx, dy));
        Ok(())
    }

    fn key(&self, code: u32, down: bool) -> Result<(), InjectError> {
        self.guard()?;
        self.keys.lock().unwrap().push((code, down));
        Ok(())
    }

    fn unicode_char(&self, code_point: u32) -> Result<(), InjectError> {
        self.guard()?;
        self.chars.lock().unwrap().push(code_point);
        Ok(())
    }

    fn clipboard_text(&self) -> Result<String, InjectError> {
        self.guard()?;
        Ok(self.clipboard.lock().unwrap().clone())
    }

    fn set_clipboard_text(&self, text: &str) -> Result<(), InjectError> {
        self.guard()?;
        *self.clipboard.lock().unwrap() = text.to_string();
        Ok(())
    }

    fn power(&self, action: PowerAction) -> Result<(), InjectError> {
        self.guard()?;
        self.power_actions.lock().unwrap().push(action);
        Ok(())
    }

    fn volume(&self, action: VolumeAction) -> Result<(), InjectError> {
        self.guard()?;
        self.volume_actions.lock().unwrap().push(action);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_records_calls_in_order() {
        let mock = MockInjector::new();
        mock.pointer_move(1, 2).unwrap();
        mock.pointer_move(3, 4).unwrap();
        mock.key_press(0x0D).unwrap();
        assert_eq!(*mock.pointer_moves.lock().unwrap(), vec![(1, 2), (3, 4)]);
        assert_eq!(*mock.keys.lock().unwrap(), vec![(0x0D, true), (0x0D, false)]);
    }

    #[test]
    fn test_mock_clipboard_round_trips() {
        let mock = MockInjector::new();
        mock.set_clipboard_text("copied").unwrap();
        assert_eq!(mock.clipboard_text().unwrap(), "copied");
    }

    #[test]
    fn test_should_fail_surfaces_platform_error() {
        let mock = MockInjector {
            should_fail: true,
            ..MockInjector::default()
        };
        assert!(mock.pointer_move(1, 1).is_err());
        assert!(mock.pointer_moves.lock().unwrap().is_empty());
    }
}
