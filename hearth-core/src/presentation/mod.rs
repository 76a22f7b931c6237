//! Presentation ports
//!
//! The scheduler never renders anything itself. It talks to a [`Presentation`]
//! implementation for dialogue lines and the player input surface, and the scene
//! runner talks to a [`SceneTransition`] for screen fades and scene loads.
//!
//! [`TextPanel`] is an in-memory implementation used by tests and the terminal
//! front end.

pub mod panel;
pub mod transition;

pub use panel::{PanelLine, TextPanel};
pub use transition::{SceneTransition, TimedTransition, fade_alpha};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::parsing::Emotion;

/// RGB name color, serialized as `#RRGGBB`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB` or `RRGGBB`
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }

        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&digits[range], 16).ok();
        Some(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Color::from_hex(&value).ok_or_else(|| format!("invalid color '{}', expected #RRGGBB", value))
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// Dialogue surface driven by the turn scheduler
///
/// All calls happen on the scheduler's logical thread, so implementations are
/// plain `&mut self` state machines.
pub trait Presentation: Send {
    /// A line is still being revealed
    fn is_typing(&self) -> bool;

    /// Lines are waiting behind the current one
    fn has_queued_lines(&self) -> bool;

    /// Consume one unit of presentation work: finish the line being typed,
    /// otherwise surface the next queued line
    fn show_next_line(&mut self);

    /// Queue a line attributed to `speaker`
    fn show_line(&mut self, speaker: &str, color: Color, text: &str);

    fn open_panel(&mut self, fade: Duration);

    fn close_panel(&mut self, fade: Duration);

    fn open_player_input(&mut self);

    fn close_player_input(&mut self);

    /// Emotion cue for a speaker (face rig, portrait, ...)
    fn show_emotion(&mut self, _speaker: &str, _emotion: Emotion) {}
}

impl<P: Presentation + ?Sized> Presentation for &mut P {
    fn is_typing(&self) -> bool {
        (**self).is_typing()
    }

    fn has_queued_lines(&self) -> bool {
        (**self).has_queued_lines()
    }

    fn show_next_line(&mut self) {
        (**self).show_next_line()
    }

    fn show_line(&mut self, speaker: &str, color: Color, text: &str) {
        (**self).show_line(speaker, color, text)
    }

    fn open_panel(&mut self, fade: Duration) {
        (**self).open_panel(fade)
    }

    fn close_panel(&mut self, fade: Duration) {
        (**self).close_panel(fade)
    }

    fn open_player_input(&mut self) {
        (**self).open_player_input()
    }

    fn close_player_input(&mut self) {
        (**self).close_player_input()
    }

    fn show_emotion(&mut self, speaker: &str, emotion: Emotion) {
        (**self).show_emotion(speaker, emotion)
    }
}
