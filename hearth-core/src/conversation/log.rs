//! Scene-wide record of spoken lines

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One line as it was spoken in a scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub speaker: String,
    pub text: String,
    pub at: DateTime<Utc>,
}

/// Lines in the order they were spoken
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationLog {
    entries: Vec<LogEntry>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, speaker: impl Into<String>, text: impl Into<String>) {
        self.entries.push(LogEntry {
            speaker: speaker.into(),
            text: text.into(),
            at: Utc::now(),
        });
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Lines spoken by one speaker
    pub fn lines_by<'a>(&'a self, speaker: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.speaker == speaker)
            .map(|e| e.text.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
