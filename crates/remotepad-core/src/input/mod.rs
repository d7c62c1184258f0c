//! Interpreters that turn raw UI input into protocol messages.

pub mod gesture;
pub mod text_diff;

use crate::keymap::vk;
use crate::protocol::messages::PadMessage;

/// Builds a key tap: down immediately followed by up.
pub fn key_tap(code: u32) -> Vec<PadMessage> {
    vec![PadMessage::KeyDown(code), PadMessage::KeyUp(code)]
}

/// Builds a modifier chord: modifier down, key tap, modifier up.
pub fn chord(modifier: u32, key: u32) -> Vec<PadMessage> {
    vec![
        PadMessage::KeyDown(modifier),
        PadMessage::KeyDown(key),
        PadMessage::KeyUp(key),
        PadMessage::KeyUp(modifier),
    ]
}

/// Builds one transition of a sticky modifier key (Shift/Ctrl/Alt buttons on
/// the keyboard surface): down when engaged, up when released.
pub fn modifier(code: u32, down: bool) -> PadMessage {
    if down {
        PadMessage::KeyDown(code)
    } else {
        PadMessage::KeyUp(code)
    }
}

/// The Win+Space sequence that cycles the remote host's keyboard layout.
pub fn layout_switch_sequence() -> Vec<PadMessage> {
    chord(vk::LWIN, vk::SPACE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_tap_is_down_then_up() {
        assert_eq!(
            key_tap(vk::RETURN),
            vec![
                PadMessage::KeyDown(vk::RETURN),
                PadMessage::KeyUp(vk::RETURN)
            ]
        );
    }

    #[test]
    fn test_chord_releases_in_reverse_order() {
        assert_eq!(
            chord(vk::MENU, vk::TAB),
            vec![
                PadMessage::KeyDown(vk::MENU),
                PadMessage::KeyDown(vk::TAB),
                PadMessage::KeyUp(vk::TAB),
                PadMessage::KeyUp(vk::MENU),
            ]
        );
    }

    #[test]
    fn test_modifier_maps_engaged_to_down() {
        assert_eq!(modifier(vk::SHIFT, true), PadMessage::KeyDown(vk::SHIFT));
        assert_eq!(modifier(vk::CONTROL, false), PadMessage::KeyUp(vk::CONTROL));
    }

    #[test]
    fn test_layout_switch_uses_win_space() {
        assert_eq!(layout_switch_sequence(), chord(vk::LWIN, vk::SPACE));
    }
}
