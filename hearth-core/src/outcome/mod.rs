//! Cross-scene outcome aggregation
//!
//! Every scene that reaches its terminal step saves a [`SceneOutcomeRecord`].
//! The registry lives for the whole playthrough and only exposes a final
//! majority once the expected number of scenes has reported.

mod record;

pub use record::{OutcomeCounts, SceneOutcome, SceneOutcomeRecord};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{info, warn};

use crate::config::OutcomeConfig;
use crate::parsing::Sentiment;

/// Registry handle shared by every scene of a playthrough
pub type SharedOutcomeRegistry = Arc<RwLock<OutcomeRegistry>>;

/// Result of asking for the final majority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MajorityVerdict {
    /// Fewer scenes saved than expected
    NotReady { saved: usize, expected: usize },
    Ready {
        majority: SceneOutcome,
        counts: OutcomeCounts,
    },
}

impl MajorityVerdict {
    pub fn majority(&self) -> Option<SceneOutcome> {
        match self {
            MajorityVerdict::Ready { majority, .. } => Some(*majority),
            MajorityVerdict::NotReady { .. } => None,
        }
    }
}

/// Scene id to outcome record
#[derive(Debug, Clone)]
pub struct OutcomeRegistry {
    records: HashMap<String, SceneOutcomeRecord>,
    expected_scene_count: usize,
}

impl OutcomeRegistry {
    pub fn new() -> Self {
        Self::with_expected_scene_count(OutcomeConfig::default().expected_scene_count)
    }

    pub fn with_expected_scene_count(count: usize) -> Self {
        Self {
            records: HashMap::new(),
            expected_scene_count: count.max(1),
        }
    }

    pub fn from_config(config: &OutcomeConfig) -> Self {
        Self::with_expected_scene_count(config.expected_scene_count)
    }

    /// Wrap into a shareable handle
    pub fn into_shared(self) -> SharedOutcomeRegistry {
        Arc::new(RwLock::new(self))
    }

    /// Save (or overwrite) a scene's result
    ///
    /// Counts are clamped to 0..=2. Blank scene ids are rejected.
    pub fn save_scene_result(
        &mut self,
        scene_id: &str,
        like: i32,
        dislike: i32,
        first_evaluation: Option<Sentiment>,
        second_evaluation: Option<Sentiment>,
    ) -> Option<&SceneOutcomeRecord> {
        let scene_id = scene_id.trim();
        if scene_id.is_empty() {
            warn!("Refusing to save a scene result without a scene id");
            return None;
        }

        let record = SceneOutcomeRecord::new(
            scene_id,
            like,
            dislike,
            first_evaluation,
            second_evaluation,
        );
        info!(
            scene = scene_id,
            like = record.like_count,
            dislike = record.dislike_count,
            outcome = %record.outcome,
            "Saved scene result"
        );

        self.records.insert(scene_id.to_string(), record);
        self.records.get(scene_id)
    }

    pub fn scene_result(&self, scene_id: &str) -> Option<&SceneOutcomeRecord> {
        self.records.get(scene_id.trim())
    }

    /// All records, ordered by scene id
    pub fn records(&self) -> Vec<&SceneOutcomeRecord> {
        let mut records: Vec<_> = self.records.values().collect();
        records.sort_by(|a, b| a.scene_id.cmp(&b.scene_id));
        records
    }

    pub fn saved_scene_count(&self) -> usize {
        self.records.len()
    }

    pub fn expected_scene_count(&self) -> usize {
        self.expected_scene_count
    }

    /// Minimum 1
    pub fn set_expected_scene_count(&mut self, count: usize) {
        self.expected_scene_count = count.max(1);
    }

    pub fn has_all_scene_results(&self) -> bool {
        self.records.len() >= self.expected_scene_count
    }

    pub fn outcome_counts(&self) -> OutcomeCounts {
        let mut counts = OutcomeCounts::default();
        for record in self.records.values() {
            counts.add(record.outcome);
        }
        counts
    }

    /// Majority over whatever has been saved so far
    pub fn most_common_outcome(&self) -> SceneOutcome {
        self.outcome_counts().majority()
    }

    /// Majority, but only once every expected scene has reported
    pub fn try_final_majority(&self) -> MajorityVerdict {
        if !self.has_all_scene_results() {
            return MajorityVerdict::NotReady {
                saved: self.saved_scene_count(),
                expected: self.expected_scene_count,
            };
        }

        let counts = self.outcome_counts();
        MajorityVerdict::Ready {
            majority: counts.majority(),
            counts,
        }
    }

    pub fn total_like_count(&self) -> u32 {
        self.records.values().map(|r| u32::from(r.like_count)).sum()
    }

    pub fn total_dislike_count(&self) -> u32 {
        self.records.values().map(|r| u32::from(r.dislike_count)).sum()
    }

    /// `Like2=…, Mixed=…, Dislike2=…, Majority=…`
    pub fn summary(&self) -> String {
        let counts = self.outcome_counts();
        format!(
            "Like2={}, Mixed={}, Dislike2={}, Majority={}",
            counts.both_favorable,
            counts.mixed,
            counts.both_unfavorable,
            counts.majority()
        )
    }

    /// Forget every record (new game)
    pub fn reset_all(&mut self) {
        info!(cleared = self.records.len(), "Resetting outcome registry");
        self.records.clear();
    }
}

impl Default for OutcomeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Read access that survives a poisoned lock
pub fn read_registry(registry: &SharedOutcomeRegistry) -> RwLockReadGuard<'_, OutcomeRegistry> {
    registry.read().unwrap_or_else(PoisonError::into_inner)
}

/// Write access that survives a poisoned lock
pub fn write_registry(registry: &SharedOutcomeRegistry) -> RwLockWriteGuard<'_, OutcomeRegistry> {
    registry.write().unwrap_or_else(PoisonError::into_inner)
}
