//! Touchpad gesture recognition.
//!
//! Interprets a raw multi-touch stream into pointer moves, scrolls, clicks,
//! and multi-finger system shortcuts. The recognizer is a pure state machine:
//! the caller supplies the current [`Instant`] with every event, so the
//! 100 ms multi-touch delay can be exercised deterministically in tests.
//!
//! One physical touch runs from the first finger down to the last finger up;
//! all touch-derived state resets when the last finger lifts.

use std::time::{Duration, Instant};

use tracing::trace;

use crate::input::{chord, key_tap};
use crate::keymap::vk;
use crate::protocol::messages::{button, PadMessage};

/// Time the extra finger(s) must rest on the pad before two-finger scroll or
/// a multi-finger swipe is considered deliberate.
pub const MULTI_TOUCH_DELAY: Duration = Duration::from_millis(100);

/// Phase of a touch-surface event.
///
/// `Down`/`Up` bracket the whole touch; `PointerDown`/`PointerUp` report a
/// secondary finger arriving or leaving. On `PointerUp` the pointer list
/// still includes the finger that is lifting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Down,
    PointerDown,
    Move,
    PointerUp,
    Up,
}

/// Position of one finger on the touch surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    pub x: f32,
    pub y: f32,
}

/// One event from the touch surface.
#[derive(Debug, Clone, PartialEq)]
pub struct TouchEvent {
    pub phase: TouchPhase,
    pub pointers: Vec<TouchPoint>,
}

impl TouchEvent {
    pub fn new(phase: TouchPhase, pointers: &[(f32, f32)]) -> Self {
        Self {
            phase,
            pointers: pointers
                .iter()
                .map(|&(x, y)| TouchPoint { x, y })
                .collect(),
        }
    }

    fn average_x(&self) -> f32 {
        if self.pointers.is_empty() {
            return 0.0;
        }
        self.pointers.iter().map(|p| p.x).sum::<f32>() / self.pointers.len() as f32
    }

    /// Midpoint of the first two pointers. Callers check the count first.
    fn midpoint(&self) -> (f32, f32) {
        let a = self.pointers[0];
        let b = self.pointers[1];
        ((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
    }
}

/// Tunable parameters of the recognizer.
#[derive(Debug, Clone)]
pub struct GestureConfig {
    /// Multiplier applied to single-finger pointer deltas.
    pub pointer_speed: f32,
    /// Horizontal distance the pointer average must travel before a
    /// multi-finger swipe fires.
    pub min_swipe_px: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            pointer_speed: 1.0,
            min_swipe_px: 240.0,
        }
    }
}

/// Stateful interpreter of one touch surface.
#[derive(Debug)]
pub struct GestureRecognizer {
    config: GestureConfig,
    last_x: f32,
    last_y: f32,
    max_pointer_count: usize,
    two_finger_down_at: Option<Instant>,
    multi_finger_at: Option<Instant>,
    multi_finger_latched: bool,
    shortcut_fired: bool,
    gesture_start_x: f32,
}

impl GestureRecognizer {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            last_x: 0.0,
            last_y: 0.0,
            max_pointer_count: 0,
            two_finger_down_at: None,
            multi_finger_at: None,
            multi_finger_latched: false,
            shortcut_fired: false,
            gesture_start_x: 0.0,
        }
    }

    pub fn set_pointer_speed(&mut self, speed: f32) {
        self.config.pointer_speed = speed;
    }

    /// Feeds one touch event through the state machine and returns the
    /// messages it produced, in emit order.
    pub fn on_touch(&mut self, event: &TouchEvent, now: Instant) -> Vec<PadMessage> {
        let mut out = Vec::new();
        let count = event.pointers.len();
        match event.phase {
            TouchPhase::Down => {
                self.reset();
                if let Some(p) = event.pointers.first() {
                    self.last_x = p.x;
                    self.last_y = p.y;
                }
                self.max_pointer_count = 1;
            }
            TouchPhase::PointerDown => {
                if count == 2 {
                    self.two_finger_down_at = Some(now);
                    let (mx, my) = event.midpoint();
                    self.last_x = mx;
                    self.last_y = my;
                }
                if count == 3 || count == 4 {
                    self.multi_finger_latched = true;
                    self.multi_finger_at = Some(now);
                    self.gesture_start_x = event.average_x();
                }
                if count > self.max_pointer_count {
                    self.max_pointer_count = count;
                }
            }
            TouchPhase::Move => {
                if count == 1 && self.max_pointer_count == 1 {
                    let p = event.pointers[0];
                    let dx = ((p.x - self.last_x) * self.config.pointer_speed) as i32;
                    let dy = ((p.y - self.last_y) * self.config.pointer_speed) as i32;
                    self.last_x = p.x;
                    self.last_y = p.y;
                    if dx != 0 || dy != 0 {
                        out.push(PadMessage::MouseMove { dx, dy });
                    }
                } else if count == 2 && delay_elapsed(self.two_finger_down_at, now) {
                    let (_, my) = event.midpoint();
                    let dy = (my - self.last_y) as i32;
                    self.last_y = my;
                    if dy != 0 {
                        out.push(PadMessage::MouseScroll { dx: 0, dy });
                    }
                } else if (count == 3 || count == 4)
                    && self.multi_finger_latched
                    && delay_elapsed(self.multi_finger_at, now)
                {
                    let delta = event.average_x() - self.gesture_start_x;
                    if delta.abs() > self.config.min_swipe_px {
                        out.extend(shortcut_sequence(count, delta > 0.0));
                        self.multi_finger_latched = false;
                        self.shortcut_fired = true;
                        trace!(fingers = count, swipe_right = delta > 0.0, "swipe shortcut fired");
                    }
                }
            }
            TouchPhase::PointerUp => {
                if count == 2
                    && delay_elapsed(self.two_finger_down_at, now)
                    && !self.multi_finger_latched
                    && !self.shortcut_fired
                {
                    out.push(PadMessage::MouseButton {
                        button: button::RIGHT,
                        down: true,
                    });
                    out.push(PadMessage::MouseButton {
                        button: button::RIGHT,
                        down: false,
                    });
                }
                if count <= 2 {
                    self.multi_finger_latched = false;
                }
            }
            TouchPhase::Up => self.reset(),
        }
        out
    }

    fn reset(&mut self) {
        self.last_x = 0.0;
        self.last_y = 0.0;
        self.max_pointer_count = 0;
        self.two_finger_down_at = None;
        self.multi_finger_at = None;
        self.multi_finger_latched = false;
        self.shortcut_fired = false;
        self.gesture_start_x = 0.0;
    }
}

impl Default for GestureRecognizer {
    fn default() -> Self {
        Self::new(GestureConfig::default())
    }
}

fn delay_elapsed(anchor: Option<Instant>, now: Instant) -> bool {
    anchor.is_some_and(|t| now.saturating_duration_since(t) >= MULTI_TOUCH_DELAY)
}

/// Key sequence for a multi-finger horizontal swipe.
fn shortcut_sequence(pointer_count: usize, swipe_right: bool) -> Vec<PadMessage> {
    match (pointer_count, swipe_right) {
        (3, true) => key_tap(vk::LWIN),
        (3, false) => chord(vk::MENU, vk::TAB),
        (4, true) => chord(vk::LWIN, vk::KEY_D),
        (4, false) => chord(vk::LWIN, vk::KEY_S),
        _ => Vec::new(),
    }
}

/// Drag-to-scroll strip next to the touchpad. Independent of the gesture
/// state machine: every vertical drag delta becomes one scroll message.
#[derive(Debug, Default)]
pub struct ScrollStrip {
    last_y: f32,
}

impl ScrollStrip {
    pub fn on_down(&mut self, y: f32) {
        self.last_y = y;
    }

    pub fn on_move(&mut self, y: f32) -> Option<PadMessage> {
        let dy = (y - self.last_y) as i32;
        self.last_y = y;
        (dy != 0).then_some(PadMessage::MouseScroll { dx: 0, dy })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
