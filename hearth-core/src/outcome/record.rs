//! Per-scene outcome records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::parsing::Sentiment;

/// Three-way classification of a scene's two evaluations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SceneOutcome {
    /// Both evaluations favorable
    #[serde(rename = "Like2")]
    BothFavorable,
    /// One favorable, one unfavorable
    Mixed,
    /// Both unfavorable (also any incomplete scene)
    #[serde(rename = "Dislike2")]
    BothUnfavorable,
}

impl SceneOutcome {
    /// Tie-break order: earlier wins
    pub const PRIORITY: [SceneOutcome; 3] = [
        SceneOutcome::BothFavorable,
        SceneOutcome::Mixed,
        SceneOutcome::BothUnfavorable,
    ];

    /// Classify clamped like/dislike counts
    pub fn classify(like: u8, dislike: u8) -> Self {
        if like >= 2 {
            SceneOutcome::BothFavorable
        } else if like == 1 && dislike == 1 {
            SceneOutcome::Mixed
        } else {
            SceneOutcome::BothUnfavorable
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SceneOutcome::BothFavorable => "Like2",
            SceneOutcome::Mixed => "Mixed",
            SceneOutcome::BothUnfavorable => "Dislike2",
        }
    }
}

impl fmt::Display for SceneOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What one scene left behind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneOutcomeRecord {
    pub scene_id: String,
    /// 0..=2
    pub like_count: u8,
    /// 0..=2
    pub dislike_count: u8,
    pub first_evaluation: Option<Sentiment>,
    pub second_evaluation: Option<Sentiment>,
    pub outcome: SceneOutcome,
    pub saved_at: DateTime<Utc>,
}

impl SceneOutcomeRecord {
    /// Clamp counts to 0..=2 and classify
    pub fn new(
        scene_id: impl Into<String>,
        like: i32,
        dislike: i32,
        first_evaluation: Option<Sentiment>,
        second_evaluation: Option<Sentiment>,
    ) -> Self {
        let like = clamp_count(like);
        let dislike = clamp_count(dislike);

        Self {
            scene_id: scene_id.into(),
            like_count: like,
            dislike_count: dislike,
            first_evaluation,
            second_evaluation,
            outcome: SceneOutcome::classify(like, dislike),
            saved_at: Utc::now(),
        }
    }
}

fn clamp_count(count: i32) -> u8 {
    // lossless after the clamp
    count.clamp(0, 2) as u8
}

/// Scenes per classification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub both_favorable: usize,
    pub mixed: usize,
    pub both_unfavorable: usize,
}

impl OutcomeCounts {
    pub fn add(&mut self, outcome: SceneOutcome) {
        match outcome {
            SceneOutcome::BothFavorable => self.both_favorable += 1,
            SceneOutcome::Mixed => self.mixed += 1,
            SceneOutcome::BothUnfavorable => self.both_unfavorable += 1,
        }
    }

    pub fn get(&self, outcome: SceneOutcome) -> usize {
        match outcome {
            SceneOutcome::BothFavorable => self.both_favorable,
            SceneOutcome::Mixed => self.mixed,
            SceneOutcome::BothUnfavorable => self.both_unfavorable,
        }
    }

    pub fn total(&self) -> usize {
        self.both_favorable + self.mixed + self.both_unfavorable
    }

    /// Largest class, ties broken by [`SceneOutcome::PRIORITY`]
    pub fn majority(&self) -> SceneOutcome {
        let mut best = SceneOutcome::PRIORITY[0];
        for candidate in SceneOutcome::PRIORITY.into_iter().skip(1) {
            if self.get(candidate) > self.get(best) {
                best = candidate;
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(SceneOutcome::classify(2, 0), SceneOutcome::BothFavorable);
        assert_eq!(SceneOutcome::classify(1, 1), SceneOutcome::Mixed);
        assert_eq!(SceneOutcome::classify(0, 2), SceneOutcome::BothUnfavorable);
        // incomplete scenes fall to the bottom class
        assert_eq!(SceneOutcome::classify(1, 0), SceneOutcome::BothUnfavorable);
        assert_eq!(SceneOutcome::classify(0, 0), SceneOutcome::BothUnfavorable);
        assert_eq!(SceneOutcome::classify(2, 2), SceneOutcome::BothFavorable);
    }

    #[test]
    fn test_record_clamps_counts() {
        let record = SceneOutcomeRecord::new("Gate", 7, -3, None, None);
        assert_eq!(record.like_count, 2);
        assert_eq!(record.dislike_count, 0);
        assert_eq!(record.outcome, SceneOutcome::BothFavorable);
    }

    #[test]
    fn test_majority_tie_break() {
        let tie = OutcomeCounts {
            both_favorable: 2,
            mixed: 2,
            both_unfavorable: 2,
        };
        assert_eq!(tie.majority(), SceneOutcome::BothFavorable);

        let mixed_tie = OutcomeCounts {
            both_favorable: 1,
            mixed: 3,
            both_unfavorable: 3,
        };
        assert_eq!(mixed_tie.majority(), SceneOutcome::Mixed);

        let dislike = OutcomeCounts {
            both_favorable: 0,
            mixed: 1,
            both_unfavorable: 2,
        };
        assert_eq!(dislike.majority(), SceneOutcome::BothUnfavorable);
        assert_eq!(OutcomeCounts::default().majority(), SceneOutcome::BothFavorable);
    }

    #[test]
    fn test_outcome_wire_names() {
        assert_eq!(serde_json::to_string(&SceneOutcome::BothFavorable).unwrap(), "\"Like2\"");
        assert_eq!(serde_json::to_string(&SceneOutcome::Mixed).unwrap(), "\"Mixed\"");
        assert_eq!(SceneOutcome::BothUnfavorable.to_string(), "Dislike2");
    }
}
