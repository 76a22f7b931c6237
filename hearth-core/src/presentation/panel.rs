//! In-memory dialogue panel
//!
//! Mirrors a typewriter dialogue box: lines queue up behind the one being
//! shown, the first line surfaces as soon as the panel is idle, and
//! `show_next_line` either completes the line being typed or pulls the next one.

use std::collections::VecDeque;
use std::time::Duration;
use tracing::debug;

use super::{Color, Presentation};
use crate::parsing::Emotion;

/// A line that reached the panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelLine {
    pub speaker: String,
    pub color: Color,
    pub text: String,
}

/// Presentation state without rendering
#[derive(Debug, Default)]
pub struct TextPanel {
    typewriter: bool,
    typing: bool,
    queue: VecDeque<PanelLine>,
    current: Option<PanelLine>,
    surfaced: Vec<PanelLine>,
    emotions: Vec<(String, Emotion)>,
    panel_open: bool,
    input_open: bool,
    last_fade: Option<Duration>,
}

impl TextPanel {
    /// Panel whose lines appear fully formed
    pub fn new() -> Self {
        Self::default()
    }

    /// Panel that keeps each surfaced line "typing" until the next advance
    pub fn typewriter() -> Self {
        Self {
            typewriter: true,
            ..Self::default()
        }
    }

    /// Line currently on the panel
    pub fn current_line(&self) -> Option<&PanelLine> {
        self.current.as_ref()
    }

    /// Every line that has surfaced, in order
    pub fn surfaced(&self) -> &[PanelLine] {
        &self.surfaced
    }

    /// Drain lines surfaced since the last call
    pub fn take_surfaced(&mut self) -> Vec<PanelLine> {
        std::mem::take(&mut self.surfaced)
    }

    pub fn emotions(&self) -> &[(String, Emotion)] {
        &self.emotions
    }

    pub fn is_panel_open(&self) -> bool {
        self.panel_open
    }

    pub fn is_input_open(&self) -> bool {
        self.input_open
    }

    /// Fade duration of the most recent panel open/close
    pub fn last_fade(&self) -> Option<Duration> {
        self.last_fade
    }

    fn surface(&mut self, line: PanelLine) {
        debug!(speaker = %line.speaker, "Surfacing line");
        self.typing = self.typewriter;
        self.surfaced.push(line.clone());
        self.current = Some(line);
    }

    fn end_dialogue(&mut self) {
        self.queue.clear();
        self.current = None;
        self.typing = false;
        self.panel_open = false;
    }
}

impl Presentation for TextPanel {
    fn is_typing(&self) -> bool {
        self.typing
    }

    fn has_queued_lines(&self) -> bool {
        !self.queue.is_empty()
    }

    fn show_next_line(&mut self) {
        if self.typing {
            self.typing = false;
            return;
        }

        match self.queue.pop_front() {
            Some(line) => self.surface(line),
            None => self.end_dialogue(),
        }
    }

    fn show_line(&mut self, speaker: &str, color: Color, text: &str) {
        if text.is_empty() {
            return;
        }

        self.queue.push_back(PanelLine {
            speaker: speaker.to_string(),
            color,
            text: text.to_string(),
        });

        if !self.panel_open {
            self.panel_open = true;
        }

        if !self.typing && self.queue.len() == 1 {
            self.show_next_line();
        }
    }

    fn open_panel(&mut self, fade: Duration) {
        self.panel_open = true;
        self.last_fade = Some(fade);
    }

    fn close_panel(&mut self, fade: Duration) {
        self.end_dialogue();
        self.last_fade = Some(fade);
    }

    fn open_player_input(&mut self) {
        self.input_open = true;
    }

    fn close_player_input(&mut self) {
        self.input_open = false;
    }

    fn show_emotion(&mut self, speaker: &str, emotion: Emotion) {
        self.emotions.push((speaker.to_string(), emotion));
    }
}
