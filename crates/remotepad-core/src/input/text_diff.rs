//! Text-field diff translation.
//!
//! The keyboard view reports whole-buffer snapshots after every edit. This
//! translator tracks the previous length (in UTF-16 code units, the unit the
//! text widget reports) and turns each delta into key events: backspaces for
//! deletions, `Char` messages for typed characters, Enter sequences for
//! newlines. Appended text is scanned by Unicode code point so astral
//! characters produce exactly one `Char` message.

use crate::input::key_tap;
use crate::keymap::vk;
use crate::protocol::messages::PadMessage;

/// Stateful translator for one editable text buffer.
#[derive(Debug, Default)]
pub struct TextDiffTranslator {
    /// Length of the buffer after the previous notification, in UTF-16 units.
    last_len: usize,
    /// Set by a shift+Enter hardware key; the next newline in the buffer is
    /// sent as a shifted Enter and the latch clears.
    next_newline_shifted: bool,
    /// One-shot flag armed around a programmatic clear; the next change
    /// notification only resynchronises the tracked length.
    suppress_pending: bool,
}

impl TextDiffTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Length of the buffer as last observed, in UTF-16 code units.
    pub fn tracked_len(&self) -> usize {
        self.last_len
    }

    /// Marks the next newline as shift+Enter.
    pub fn set_next_newline_shifted(&mut self) {
        self.next_newline_shifted = true;
    }

    /// Arms the one-shot suppression for a programmatic clear, so the
    /// following change notification does not emit a backspace storm.
    pub fn suppress_next_change(&mut self) {
        self.suppress_pending = true;
    }

    /// Clears all state, for when the owning view is torn down.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Handles one content-changed notification carrying the new buffer.
    pub fn on_text_changed(&mut self, text: &str) -> Vec<PadMessage> {
        let new_len = utf16_len(text);
        if self.suppress_pending {
            self.suppress_pending = false;
            self.last_len = new_len;
            return Vec::new();
        }

        let mut out = Vec::new();
        if new_len < self.last_len {
            for _ in 0..(self.last_len - new_len) {
                out.extend(key_tap(vk::BACK));
            }
            self.last_len = new_len;
            return out;
        }

        if new_len > self.last_len {
            for cp in chars_from_utf16_offset(text, self.last_len) {
                if cp == '\n' {
                    out.extend(self.newline_sequence());
                } else if !is_control(cp) {
                    out.push(PadMessage::Char(cp as u32));
                }
            }
            self.last_len = new_len;
        }
        out
    }

    /// Handles the IME "done" action or a physical Enter key.
    ///
    /// With shift held the shifted Enter sequence is sent and the buffer is
    /// left alone; otherwise a plain Enter is sent and the tracked length is
    /// reset through the suppressed-clear path (the caller clears the
    /// widget).
    pub fn on_submit(&mut self, shift_held: bool) -> Vec<PadMessage> {
        if shift_held {
            shifted_enter()
        } else {
            let out = key_tap(vk::RETURN);
            self.suppress_pending = true;
            self.last_len = 0;
            out
        }
    }

    /// Backspace passthrough for when the buffer is already empty and the
    /// widget reports no content change for the key.
    pub fn on_backspace_in_empty_buffer(&self) -> Vec<PadMessage> {
        key_tap(vk::BACK)
    }

    fn newline_sequence(&mut self) -> Vec<PadMessage> {
        if self.next_newline_shifted {
            self.next_newline_shifted = false;
            shifted_enter()
        } else {
            key_tap(vk::RETURN)
        }
    }
}

fn shifted_enter() -> Vec<PadMessage> {
    vec![
        PadMessage::KeyDown(vk::SHIFT),
        PadMessage::KeyDown(vk::RETURN),
        PadMessage::KeyUp(vk::RETURN),
        PadMessage::KeyUp(vk::SHIFT),
    ]
}

fn utf16_len(s: &str) -> usize {
    s.encode_utf16().count()
}

/// Iterates the characters of `s` starting at a UTF-16 unit offset. The
/// offset always falls on a character boundary because it is a previously
/// observed buffer length.
fn chars_from_utf16_offset(s: &str, offset: usize) -> impl Iterator<Item = char> + '_ {
    let mut skipped = 0;
    s.chars().skip_while(move |c| {
        if skipped >= offset {
            return false;
        }
        skipped += c.len_utf16();
        true
    })
}

fn is_control(c: char) -> bool {
    let cp = c as u32;
    cp < 0x20 || cp == 0x7F
}

// ── Tests ─────────────────────────────────────────────────────────────────────
