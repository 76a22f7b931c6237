//! Conversation state shared by agents and scenes
//!
//! - [`Transcript`]: one speaker's private, role-tagged message list with
//!   size-bounded trimming
//! - [`ConversationLog`]: the scene-wide record of who said what

mod log;
mod transcript;

pub use log::{ConversationLog, LogEntry};
pub use transcript::Transcript;
