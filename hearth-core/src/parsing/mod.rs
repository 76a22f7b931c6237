//! Reply parsing
//!
//! Turns a speaker's raw reply into a [`TurnJudgment`]: the line to show, the
//! emotion to display, and a binary sentiment about the player's last line.
//!
//! # Example
//!
//! ```rust
//! use hearth_core::parsing::{Emotion, Sentiment, parse_reply};
//!
//! let judgment = parse_reply("```json\n{\"message\":\"Hi\",\"emotion\":\"happy\",\"affinity\":\"favorable\"}\n```");
//! assert_eq!(judgment.message, "Hi");
//! assert_eq!(judgment.emotion, Emotion::Happy);
//! assert_eq!(judgment.sentiment, Sentiment::Favorable);
//! ```

mod judgment;
mod parser;
mod reply;

pub use judgment::{Emotion, Sentiment, TurnJudgment};
pub use parser::{OutputParser, ParseError, ParseResult, ParserConfig};
pub use reply::{JudgmentParser, parse_reply};
