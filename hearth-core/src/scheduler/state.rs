//! Per-scene conversation state

use serde::{Deserialize, Serialize};

use super::script::EvaluationSlot;
use crate::conversation::ConversationLog;
use crate::parsing::Sentiment;

/// Where the scheduler is in its script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "phase", content = "step", rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Step(usize),
    Done,
}

/// NPC turn scheduled by a player answer, started on the next advance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTurn {
    pub speaker: String,
    pub prompt: String,
    pub evaluation: Option<EvaluationSlot>,
}

/// Coarse status published to observers after every event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    #[default]
    Idle,
    WaitingForPlayer,
    Pending,
    InFlight,
    TurnComplete,
    Finished,
}

/// Mutable state of one running scene
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    pub phase: Phase,
    /// Speaker whose reply the current step expects; `None` accepts anyone
    pub expected_speaker: Option<String>,
    pub turn_complete: bool,
    pub npc_in_flight: bool,
    pub waiting_for_player: bool,
    pub last_player_text: Option<String>,
    pub pending: Option<PendingTurn>,
    /// Slot the in-flight turn will fill
    pub evaluation_target: Option<EvaluationSlot>,
    /// NPC the player is currently answering
    pub answer_target: Option<String>,
    pub evaluations: [Option<Sentiment>; 2],
    pub log: ConversationLog,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// At most one of waiting, pending and in flight holds
    pub fn invariant_holds(&self) -> bool {
        let active = [
            self.waiting_for_player,
            self.pending.is_some(),
            self.npc_in_flight,
        ];
        active.iter().filter(|flag| **flag).count() <= 1
    }

    /// Fill `slot` unless it already holds a value; returns whether it was filled
    pub fn capture(&mut self, slot: EvaluationSlot, sentiment: Sentiment) -> bool {
        let entry = &mut self.evaluations[slot.index()];
        if entry.is_some() {
            return false;
        }
        *entry = Some(sentiment);
        true
    }

    pub fn evaluation(&self, slot: EvaluationSlot) -> Option<Sentiment> {
        self.evaluations[slot.index()]
    }

    /// (like, dislike) over the filled slots
    pub fn tally(&self) -> (i32, i32) {
        self.evaluations
            .iter()
            .flatten()
            .fold((0, 0), |(like, dislike), sentiment| {
                if sentiment.is_favorable() {
                    (like + 1, dislike)
                } else {
                    (like, dislike + 1)
                }
            })
    }

    pub fn status(&self) -> TurnStatus {
        if self.phase == Phase::Done {
            TurnStatus::Finished
        } else if self.phase == Phase::Idle {
            TurnStatus::Idle
        } else if self.waiting_for_player {
            TurnStatus::WaitingForPlayer
        } else if self.pending.is_some() {
            TurnStatus::Pending
        } else if self.npc_in_flight {
            TurnStatus::InFlight
        } else {
            TurnStatus::TurnComplete
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_once_per_slot() {
        let mut state = ConversationState::new();
        assert!(state.capture(EvaluationSlot::First, Sentiment::Favorable));
        assert!(!state.capture(EvaluationSlot::First, Sentiment::Unfavorable));
        assert!(!state.capture(EvaluationSlot::First, Sentiment::Unfavorable));

        assert_eq!(state.evaluation(EvaluationSlot::First), Some(Sentiment::Favorable));
        assert_eq!(state.tally(), (1, 0));

        assert!(state.capture(EvaluationSlot::Second, Sentiment::Unfavorable));
        assert_eq!(state.tally(), (1, 1));
    }

    #[test]
    fn test_invariant() {
        let mut state = ConversationState::new();
        assert!(state.invariant_holds());

        state.waiting_for_player = true;
        assert!(state.invariant_holds());

        state.npc_in_flight = true;
        assert!(!state.invariant_holds());
    }

    #[test]
    fn test_status() {
        let mut state = ConversationState::new();
        assert_eq!(state.status(), TurnStatus::Idle);

        state.phase = Phase::Step(0);
        state.npc_in_flight = true;
        assert_eq!(state.status(), TurnStatus::InFlight);

        state.npc_in_flight = false;
        assert_eq!(state.status(), TurnStatus::TurnComplete);

        state.waiting_for_player = true;
        assert_eq!(state.status(), TurnStatus::WaitingForPlayer);

        state.phase = Phase::Done;
        assert_eq!(state.status(), TurnStatus::Finished);
    }
}
