//! Judgment parser for speaker replies
//!
//! Replies are untrusted text: the JSON object may be wrapped in prose or code
//! fences, use a legacy `"affinity_change": +2` integer, or be missing entirely.
//! [`JudgmentParser::parse_reply`] always produces a judgment.

use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;
use tracing::{debug, warn};

use super::judgment::{Emotion, Sentiment, TurnJudgment};
use super::parser::{OutputParser, ParseError, ParseResult, ParserConfig};

/// `+N` is not valid JSON; strip the sign before decoding
static SIGNED_SENTIMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""(affinity_change|affinity)"\s*:\s*\+([0-9]+)"#).unwrap());

/// Loose wire shape: every field optional and of any JSON type
#[derive(Debug, Deserialize)]
struct WireJudgment {
    #[serde(default)]
    message: Option<serde_json::Value>,
    #[serde(default)]
    emotion: Option<serde_json::Value>,
    #[serde(default, alias = "sentiment")]
    affinity: Option<serde_json::Value>,
    #[serde(default)]
    affinity_change: Option<serde_json::Value>,
}

impl WireJudgment {
    fn into_judgment(self) -> TurnJudgment {
        let message = match self.message {
            Some(serde_json::Value::String(s)) => s,
            Some(serde_json::Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };

        let emotion = match self.emotion {
            Some(serde_json::Value::String(s)) => Emotion::normalize(&s),
            _ => Emotion::Neutral,
        };

        // the two-valued field wins over the legacy integer
        let sentiment = match (self.affinity, self.affinity_change) {
            (Some(value), _) if !value.is_null() => Sentiment::from_value(&value),
            (_, Some(change)) => Sentiment::from_value(&change),
            _ => Sentiment::Unfavorable,
        };

        TurnJudgment::new(message, emotion, sentiment)
    }
}

/// Parser from raw reply text to [`TurnJudgment`]
#[derive(Debug, Clone, Default)]
pub struct JudgmentParser {
    config: ParserConfig,
}

impl JudgmentParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Parser that rejects legacy `+N` integers instead of repairing them
    pub fn strict() -> Self {
        Self::with_config(ParserConfig::strict())
    }

    /// Parse a reply, falling back to the raw text when no judgment decodes
    pub fn parse_reply(&self, raw: &str) -> TurnJudgment {
        match OutputParser::parse(self, raw) {
            Ok(judgment) => judgment,
            Err(e) => {
                warn!(error = %e, "Reply is not a judgment object, using raw text");
                TurnJudgment::fallback(raw)
            }
        }
    }

    /// Slice from the first `{` to the last `}`
    fn object_span(input: &str) -> Option<&str> {
        let start = input.find('{')?;
        let end = input.rfind('}')?;
        (end > start).then(|| &input[start..=end])
    }
}

impl OutputParser for JudgmentParser {
    type Output = TurnJudgment;

    fn parse(&self, raw: &str) -> ParseResult<Self::Output> {
        let input = raw.trim();
        if input.is_empty() {
            return Err(ParseError::EmptyInput);
        }

        let span = Self::object_span(input).ok_or(ParseError::NoJsonObject)?;
        let span = if self.config.attempt_repair {
            SIGNED_SENTIMENT_RE.replace_all(span, r#""$1": $2"#)
        } else {
            span.into()
        };

        let wire: WireJudgment =
            serde_json::from_str(&span).map_err(|e| ParseError::InvalidFormat(e.to_string()))?;
        let judgment = wire.into_judgment();
        debug!(emotion = %judgment.emotion, sentiment = %judgment.sentiment, "Parsed judgment");
        Ok(judgment)
    }

    fn can_parse(&self, raw: &str) -> bool {
        Self::object_span(raw.trim()).is_some()
    }

    fn name(&self) -> &'static str {
        "judgment"
    }
}

/// Parse a reply with the default parser
pub fn parse_reply(raw: &str) -> TurnJudgment {
    JudgmentParser::new().parse_reply(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_json() {
        let raw = "```json\n{\"message\":\"Hi\",\"emotion\":\"happy\",\"affinity\":\"favorable\"}\n```";
        let judgment = parse_reply(raw);
        assert_eq!(judgment.message, "Hi");
        assert_eq!(judgment.emotion, Emotion::Happy);
        assert_eq!(judgment.sentiment, Sentiment::Favorable);
    }

    #[test]
    fn test_prose_wrapped_json() {
        let raw = "Sure! Here you go: {\"message\": \"Move along.\", \"emotion\": \"annoyed\", \"affinity\": \"불호\"} Hope that helps.";
        let judgment = parse_reply(raw);
        assert_eq!(judgment.message, "Move along.");
        assert_eq!(judgment.emotion, Emotion::Angry);
        assert_eq!(judgment.sentiment, Sentiment::Unfavorable);
    }

    #[test]
    fn test_legacy_signed_integer() {
        let judgment = parse_reply(r#"{"affinity_change": +2}"#);
        assert_eq!(judgment.sentiment, Sentiment::Favorable);
        assert_eq!(judgment.message, "");
        assert_eq!(judgment.emotion, Emotion::Neutral);

        let judgment = parse_reply(r#"{"message":"Hm.","affinity_change": 0}"#);
        assert_eq!(judgment.sentiment, Sentiment::Unfavorable);

        let judgment = parse_reply(r#"{"message":"Hm.","affinity_change": -1}"#);
        assert_eq!(judgment.sentiment, Sentiment::Unfavorable);
    }

    #[test]
    fn test_string_affinity_wins_over_integer() {
        let judgment =
            parse_reply(r#"{"message":"ok","affinity":"unfavorable","affinity_change": +1}"#);
        assert_eq!(judgment.sentiment, Sentiment::Unfavorable);

        let judgment = parse_reply(r#"{"message":"ok","affinity":null,"affinity_change": 1}"#);
        assert_eq!(judgment.sentiment, Sentiment::Favorable);
    }

    #[test]
    fn test_no_braces_falls_back_to_raw_text() {
        let judgment = parse_reply("  \"Welcome, traveler.\"  ");
        assert_eq!(judgment.message, "Welcome, traveler.");
        assert_eq!(judgment.emotion, Emotion::Neutral);
        assert_eq!(judgment.sentiment, Sentiment::Unfavorable);
    }

    #[test]
    fn test_undecodable_object_falls_back_to_whole_reply() {
        let raw = "I think {this is not json}";
        let judgment = parse_reply(raw);
        assert_eq!(judgment.message, raw);
        assert_eq!(judgment.sentiment, Sentiment::Unfavorable);
    }

    #[test]
    fn test_mixed_field_types_do_not_fail() {
        let judgment = parse_reply(r#"{"message": 42, "emotion": 7, "affinity": true}"#);
        assert_eq!(judgment.message, "42");
        assert_eq!(judgment.emotion, Emotion::Neutral);
        assert_eq!(judgment.sentiment, Sentiment::Favorable);
    }

    #[test]
    fn test_strict_config_rejects_signed_integer() {
        let parser = JudgmentParser::strict();
        let err = OutputParser::parse(&parser, r#"{"affinity_change": +2}"#).unwrap_err();
        assert!(matches!(err, ParseError::InvalidFormat(_)));

        let judgment = OutputParser::parse(&parser, r#" {"affinity_change": 2} "#).unwrap();
        assert_eq!(judgment.sentiment, Sentiment::Favorable);
    }

    #[test]
    fn test_try_parse_errors() {
        let parser = JudgmentParser::new();
        assert_eq!(OutputParser::parse(&parser, "   "), Err(ParseError::EmptyInput));
        assert_eq!(OutputParser::parse(&parser, "} backwards {"), Err(ParseError::NoJsonObject));
        assert!(parser.can_parse("x {\"a\":1} y"));
        assert!(!parser.can_parse("plain words"));
        assert_eq!(parser.name(), "judgment");
    }

    #[test]
    fn test_never_panics_on_awkward_input() {
        let inputs = [
            "",
            "{",
            "}",
            "{}",
            "[]",
            "{\"message\":",
            "\"",
            "\"\"",
            "}{",
            "{\"affinity\": +}",
            "{\"affinity_change\": +99999999999999999999999}",
            "한국어 {\"message\":\"안녕\",\"affinity\":\"호\"} 끝",
            "\u{0}{\u{0}}",
        ];
        for input in inputs {
            let judgment = parse_reply(input);
            assert!(matches!(
                judgment.sentiment,
                Sentiment::Favorable | Sentiment::Unfavorable
            ));
        }

        let korean = parse_reply("한국어 {\"message\":\"안녕\",\"affinity\":\"호\"} 끝");
        assert_eq!(korean.message, "안녕");
        assert_eq!(korean.sentiment, Sentiment::Favorable);
    }
}
