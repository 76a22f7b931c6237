//! Turn judgments and their normalized vocabularies

use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary judgment of the player's line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Favorable,
    Unfavorable,
}

/// Tokens that read as favorable; anything else is unfavorable
const FAVORABLE_TOKENS: &[&str] = &[
    "favorable",
    "favourable",
    "like",
    "likes",
    "liked",
    "positive",
    "good",
    "yes",
    "true",
    "호",
    "호감",
];

impl Sentiment {
    /// Collapse free text to one of the two values
    ///
    /// Total and idempotent: canonical names map to themselves, signed integers
    /// map by sign, and anything else (fractions, `inf`, missing input) is
    /// unfavorable.
    pub fn normalize(token: &str) -> Self {
        let token = token.trim().trim_matches('"').trim().to_lowercase();

        if FAVORABLE_TOKENS.contains(&token.as_str()) {
            return Sentiment::Favorable;
        }

        if is_positive_integer(&token) {
            Sentiment::Favorable
        } else {
            Sentiment::Unfavorable
        }
    }

    /// Positive scores are favorable
    pub fn from_score(score: i64) -> Self {
        if score > 0 {
            Sentiment::Favorable
        } else {
            Sentiment::Unfavorable
        }
    }

    /// Normalize an arbitrary JSON value
    pub fn from_value(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) => Self::normalize(s),
            serde_json::Value::Number(n) => {
                if let Some(score) = n.as_i64() {
                    Self::from_score(score)
                } else if n.is_u64() {
                    Sentiment::Favorable
                } else {
                    // integers too wide for i64 arrive as floats
                    let score = n.as_f64().unwrap_or(0.0);
                    if score.fract() == 0.0 && score > 0.0 {
                        Sentiment::Favorable
                    } else {
                        Sentiment::Unfavorable
                    }
                }
            }
            serde_json::Value::Bool(b) => {
                if *b {
                    Sentiment::Favorable
                } else {
                    Sentiment::Unfavorable
                }
            }
            _ => Sentiment::Unfavorable,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Favorable => "favorable",
            Sentiment::Unfavorable => "unfavorable",
        }
    }

    pub fn is_favorable(&self) -> bool {
        matches!(self, Sentiment::Favorable)
    }
}

/// `+12`, `7` and `0003` are positive; `0`, `-1`, `1.5` and `inf` are not
fn is_positive_integer(token: &str) -> bool {
    let digits = token.strip_prefix('+').unwrap_or(token);
    !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
        && digits.bytes().any(|b| b != b'0')
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of emotion tags a speaker can show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Happy,
    Angry,
    Sad,
    #[default]
    Neutral,
    Surprised,
}

impl Emotion {
    /// Map a tag or synonym onto the closed set, defaulting to neutral
    pub fn normalize(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "happy" | "joy" | "joyful" | "glad" | "smile" | "smiling" | "기쁨" => Emotion::Happy,
            "angry" | "anger" | "mad" | "furious" | "annoyed" | "분노" => Emotion::Angry,
            "sad" | "sadness" | "sorrow" | "upset" | "unhappy" | "슬픔" => Emotion::Sad,
            "surprised" | "surprise" | "shocked" | "astonished" | "놀람" => Emotion::Surprised,
            _ => Emotion::Neutral,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Happy => "happy",
            Emotion::Angry => "angry",
            Emotion::Sad => "sad",
            Emotion::Neutral => "neutral",
            Emotion::Surprised => "surprised",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a speaker said, how they looked saying it, and what they thought of the player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnJudgment {
    pub message: String,
    pub emotion: Emotion,
    #[serde(rename = "affinity")]
    pub sentiment: Sentiment,
}

impl TurnJudgment {
    pub fn new(message: impl Into<String>, emotion: Emotion, sentiment: Sentiment) -> Self {
        Self {
            message: message.into(),
            emotion,
            sentiment,
        }
    }

    /// Judgment for a reply that carried no structure: the text itself, neutral, unfavorable
    pub fn fallback(raw: &str) -> Self {
        let text = raw.trim();
        let text = text
            .strip_prefix('"')
            .and_then(|t| t.strip_suffix('"'))
            .unwrap_or(text);

        Self::new(text, Emotion::Neutral, Sentiment::Unfavorable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sentiment_canonical_and_synonyms() {
        assert_eq!(Sentiment::normalize("favorable"), Sentiment::Favorable);
        assert_eq!(Sentiment::normalize("  FAVORABLE "), Sentiment::Favorable);
        assert_eq!(Sentiment::normalize("\"favorable\""), Sentiment::Favorable);
        assert_eq!(Sentiment::normalize("unfavorable"), Sentiment::Unfavorable);
        assert_eq!(Sentiment::normalize("호"), Sentiment::Favorable);
        assert_eq!(Sentiment::normalize("불호"), Sentiment::Unfavorable);
        assert_eq!(Sentiment::normalize("Yes"), Sentiment::Favorable);
        assert_eq!(Sentiment::normalize("dislike"), Sentiment::Unfavorable);
    }

    #[test]
    fn test_sentiment_numeric_tokens() {
        assert_eq!(Sentiment::normalize("+2"), Sentiment::Favorable);
        assert_eq!(Sentiment::normalize("1"), Sentiment::Favorable);
        assert_eq!(Sentiment::normalize("0"), Sentiment::Unfavorable);
        assert_eq!(Sentiment::normalize("-3"), Sentiment::Unfavorable);
        assert_eq!(Sentiment::normalize("99999999999999999999999"), Sentiment::Favorable);
    }

    #[test]
    fn test_sentiment_non_integer_numbers_are_unfavorable() {
        for token in ["inf", "+inf", "Infinity", "1e400", "NaN", "0.5", "+1.0", "++1", "-0", "1_000"] {
            assert_eq!(Sentiment::normalize(token), Sentiment::Unfavorable, "{token:?}");
        }
        assert_eq!(Sentiment::from_value(&json!("Infinity")), Sentiment::Unfavorable);
        assert_eq!(Sentiment::from_value(&json!(0.5)), Sentiment::Unfavorable);
        assert_eq!(Sentiment::from_value(&json!(u64::MAX)), Sentiment::Favorable);
        assert_eq!(Sentiment::from_value(&json!(1e23)), Sentiment::Favorable);
    }

    #[test]
    fn test_sentiment_unknown_defaults_unfavorable() {
        for token in ["", "   ", "maybe", "null", "N/A", "🤷"] {
            assert_eq!(Sentiment::normalize(token), Sentiment::Unfavorable, "{token:?}");
        }
    }

    #[test]
    fn test_sentiment_idempotent() {
        let inputs = ["favorable", "호", "+1", "nope", "", "TRUE", "-0.5", "liked"];
        for input in inputs {
            let once = Sentiment::normalize(input);
            assert_eq!(Sentiment::normalize(once.as_str()), once, "{input:?}");
        }
    }

    #[test]
    fn test_sentiment_from_value() {
        assert_eq!(Sentiment::from_value(&json!(2)), Sentiment::Favorable);
        assert_eq!(Sentiment::from_value(&json!(-1)), Sentiment::Unfavorable);
        assert_eq!(Sentiment::from_value(&json!(true)), Sentiment::Favorable);
        assert_eq!(Sentiment::from_value(&json!(null)), Sentiment::Unfavorable);
        assert_eq!(Sentiment::from_value(&json!(["favorable"])), Sentiment::Unfavorable);
    }

    #[test]
    fn test_emotion_normalize() {
        assert_eq!(Emotion::normalize("Happy"), Emotion::Happy);
        assert_eq!(Emotion::normalize("joy"), Emotion::Happy);
        assert_eq!(Emotion::normalize("furious"), Emotion::Angry);
        assert_eq!(Emotion::normalize("슬픔"), Emotion::Sad);
        assert_eq!(Emotion::normalize("shocked"), Emotion::Surprised);
        assert_eq!(Emotion::normalize("pensive"), Emotion::Neutral);
        assert_eq!(Emotion::normalize(""), Emotion::Neutral);
    }

    #[test]
    fn test_fallback_strips_one_quote_layer() {
        let judgment = TurnJudgment::fallback("  \"\"Hello\"\"  ");
        assert_eq!(judgment.message, "\"Hello\"");
        assert_eq!(judgment.emotion, Emotion::Neutral);
        assert_eq!(judgment.sentiment, Sentiment::Unfavorable);

        assert_eq!(TurnJudgment::fallback("\"").message, "\"");
    }

    #[test]
    fn test_judgment_wire_shape() {
        let judgment = TurnJudgment::new("Hi", Emotion::Happy, Sentiment::Favorable);
        let value = serde_json::to_value(&judgment).unwrap();
        assert_eq!(value, json!({"message": "Hi", "emotion": "happy", "affinity": "favorable"}));
    }
}
