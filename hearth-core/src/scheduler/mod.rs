//! Turn scheduling
//!
//! One [`TurnScheduler`] runs one scene. It walks the [`SceneScript`] step by
//! step, starting NPC turns, opening the player input, and capturing the
//! evaluation slots. Three inputs drive it, all on one logical thread:
//!
//! - [`TurnScheduler::handle_reply`] when an agent's request completes
//! - [`TurnScheduler::advance`] for the player's "continue" action
//! - [`TurnScheduler::submit_player_text`] for the player's answer
//!
//! `advance` arbitrates in a fixed order: unfinished presentation work first,
//! then a pending NPC turn, then the next script step. A player answer never
//! starts the responding NPC's request directly; it only schedules it, so the
//! answer is shown and heard before the next prompt goes out.
//!
//! [`SceneRunner`] wires a scheduler to a reply channel and a player action
//! stream and drives it to completion.

pub mod runner;
pub mod script;
pub mod state;

pub use runner::{PlayerAction, SceneRunner, action_channel};
pub use script::{EvaluationSlot, SceneScript, ScriptStep};
pub use state::{ConversationState, PendingTurn, Phase, TurnStatus};

use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::agent::prompts::render_turn_prompt;
use crate::agent::{AgentReply, Cast, ReplySender};
use crate::config::PresentationConfig;
use crate::conversation::ConversationLog;
use crate::outcome::{SceneOutcomeRecord, SharedOutcomeRegistry, write_registry};
use crate::parsing::TurnJudgment;
use crate::presentation::{Color, Presentation};

/// Player identity and panel timing used by the scheduler
#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    pub player_name: String,
    pub player_color: Color,
    pub panel_fade: Duration,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self::from(&PresentationConfig::default())
    }
}

impl From<&PresentationConfig> for SchedulerOptions {
    fn from(config: &PresentationConfig) -> Self {
        Self {
            player_name: config.player_name.clone(),
            player_color: config.player_color,
            panel_fade: config.panel_fade,
        }
    }
}

/// What finishing a scene produced
#[derive(Debug, Clone, Serialize)]
pub struct SceneReport {
    pub scene_id: String,
    pub next_scene: Option<String>,
    /// Saved outcome, if the scene records one
    pub record: Option<SceneOutcomeRecord>,
    pub log: ConversationLog,
}

/// Effect of one scheduler input
#[derive(Debug, Clone)]
pub enum AdvanceOutcome {
    /// One unit of presentation work was consumed
    PresentationStep,
    /// A pending NPC turn was started
    TurnStarted { speaker: String },
    /// An NPC turn was scheduled to start on the next advance
    TurnPending { speaker: String },
    /// The scheduler moved to this script step
    StepEntered(usize),
    /// The last step completed
    Finished(SceneReport),
    /// Nothing to do in the current state
    Ignored,
}

impl AdvanceOutcome {
    pub fn is_finished(&self) -> bool {
        matches!(self, AdvanceOutcome::Finished(_))
    }
}

/// Drives one scene's turns
pub struct TurnScheduler<P: Presentation> {
    script: SceneScript,
    cast: Cast,
    presentation: P,
    registry: SharedOutcomeRegistry,
    options: SchedulerOptions,
    state: ConversationState,
}

impl<P: Presentation> TurnScheduler<P> {
    pub fn new(
        script: SceneScript,
        cast: Cast,
        presentation: P,
        registry: SharedOutcomeRegistry,
    ) -> Self {
        for step in &script.steps {
            if !cast.contains(step.agent_id()) {
                warn!(
                    scene = script.log_tag(),
                    agent = step.agent_id(),
                    "Script references an agent missing from the cast"
                );
            }
        }

        Self {
            script,
            cast,
            presentation,
            registry,
            options: SchedulerOptions::default(),
            state: ConversationState::new(),
        }
    }

    pub fn with_options(mut self, options: SchedulerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn script(&self) -> &SceneScript {
        &self.script
    }

    pub fn cast(&self) -> &Cast {
        &self.cast
    }

    pub fn cast_mut(&mut self) -> &mut Cast {
        &mut self.cast
    }

    pub fn presentation(&self) -> &P {
        &self.presentation
    }

    pub fn presentation_mut(&mut self) -> &mut P {
        &mut self.presentation
    }

    pub fn registry(&self) -> &SharedOutcomeRegistry {
        &self.registry
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn turn_status(&self) -> TurnStatus {
        self.state.status()
    }

    /// Started and not yet finished
    pub fn is_active(&self) -> bool {
        matches!(self.state.phase, Phase::Step(_))
    }

    pub fn is_finished(&self) -> bool {
        self.state.phase == Phase::Done
    }

    /// Reset state, take over the cast, and enter the first step
    pub fn start(&mut self, replies: ReplySender) -> AdvanceOutcome {
        self.state = ConversationState::new();

        self.cast.subscribe_all(&replies);
        self.cast.set_direct_input_all(false);
        self.cast.reset_contexts(self.script.scene_prompt.as_deref());

        self.presentation.open_panel(self.options.panel_fade);

        info!(
            scene = self.script.log_tag(),
            steps = self.script.steps.len(),
            cast = self.cast.len(),
            "Scene started"
        );
        self.enter_step(0)
    }

    /// Route a completed request to its agent and apply the judgment
    ///
    /// The owning agent always gets the reply (its transcript must record
    /// it). The judgment only affects the scene while the scene is active and
    /// the reply comes from the expected speaker.
    pub fn handle_reply(&mut self, reply: &AgentReply) -> Option<TurnJudgment> {
        let Some(agent) = self.cast.get_mut(&reply.agent_id) else {
            debug!(agent = %reply.agent_id, "Reply from an agent outside this scene");
            return None;
        };
        let judgment = agent.receive(reply)?;
        let label = agent.display_name().to_string();
        let color = agent.color();

        if !self.is_active() {
            debug!(agent = %reply.agent_id, "Scene inactive, ignoring reply");
            return None;
        }
        if let Some(expected) = &self.state.expected_speaker {
            if expected != &reply.agent_id {
                debug!(
                    agent = %reply.agent_id,
                    expected = %expected,
                    "Reply from a speaker this step does not expect"
                );
                return None;
            }
        }

        info!(
            scene = self.script.log_tag(),
            speaker = %label,
            emotion = %judgment.emotion,
            affinity = %judgment.sentiment,
            "{}",
            judgment.message
        );

        self.state.log.record(label.as_str(), judgment.message.as_str());
        self.presentation.show_emotion(&label, judgment.emotion);
        self.presentation.show_line(&label, color, &judgment.message);

        if self.script.share_lines {
            self.cast
                .hear_except(&reply.agent_id, &label, &judgment.message);
        }

        if let Some(slot) = self.state.evaluation_target.take() {
            if self.state.capture(slot, judgment.sentiment) {
                info!(
                    scene = self.script.log_tag(),
                    slot = ?slot,
                    affinity = %judgment.sentiment,
                    "Captured evaluation"
                );
            } else {
                debug!(slot = ?slot, "Evaluation slot already filled, ignoring");
            }
        }

        self.state.npc_in_flight = false;
        self.state.turn_complete = true;
        Some(judgment)
    }

    /// The player's "continue" action
    pub fn advance(&mut self) -> AdvanceOutcome {
        if !self.is_active() {
            return AdvanceOutcome::Ignored;
        }

        if self.presentation.is_typing() || self.presentation.has_queued_lines() {
            self.presentation.show_next_line();
            return AdvanceOutcome::PresentationStep;
        }

        if self.state.waiting_for_player {
            return AdvanceOutcome::Ignored;
        }

        if let Some(turn) = self.state.pending.take() {
            let speaker = turn.speaker.clone();
            self.start_npc_turn(turn);
            return AdvanceOutcome::TurnStarted { speaker };
        }

        if self.state.turn_complete {
            self.state.turn_complete = false;
            return self.enter_step(self.current_step() + 1);
        }

        AdvanceOutcome::Ignored
    }

    /// The player's answer; only honored while waiting for one
    pub fn submit_player_text(&mut self, text: &str) -> AdvanceOutcome {
        if !self.is_active() || !self.state.waiting_for_player {
            debug!("Not waiting for the player, ignoring input");
            return AdvanceOutcome::Ignored;
        }

        let text = text.trim();
        if text.is_empty() {
            return AdvanceOutcome::Ignored;
        }

        let player = self.options.player_name.clone();
        info!(scene = self.script.log_tag(), speaker = %player, "{}", text);

        self.state.last_player_text = Some(text.to_string());
        self.state.log.record(player.as_str(), text);
        self.presentation
            .show_line(&player, self.options.player_color, text);

        if self.script.broadcast_player_lines {
            self.cast.hear_all(&player, text);
        } else if let Some(target) = &self.state.answer_target {
            self.cast.hear_one(target, &player, text);
        }

        self.presentation.close_player_input();
        self.state.waiting_for_player = false;

        self.schedule_after_player(text)
    }

    fn current_step(&self) -> usize {
        match self.state.phase {
            Phase::Step(index) => index,
            _ => 0,
        }
    }

    fn enter_step(&mut self, index: usize) -> AdvanceOutcome {
        let Some(step) = self.script.steps.get(index).cloned() else {
            return AdvanceOutcome::Finished(self.finish());
        };

        debug!(scene = self.script.log_tag(), step = index, "Entering step");
        self.state.phase = Phase::Step(index);
        self.state.turn_complete = false;

        match step {
            ScriptStep::Npc {
                speaker,
                prompt,
                evaluation,
            } => {
                let player_line = self.state.last_player_text.as_deref().unwrap_or("");
                let prompt = render_turn_prompt(&prompt, player_line, evaluation.is_some());
                self.start_npc_turn(PendingTurn {
                    speaker,
                    prompt,
                    evaluation,
                });
            }
            ScriptStep::Player { answer_target } => {
                self.state.expected_speaker = None;
                self.state.answer_target = Some(answer_target);
                self.state.waiting_for_player = true;
                self.presentation.open_player_input();
            }
        }

        AdvanceOutcome::StepEntered(index)
    }

    fn schedule_after_player(&mut self, player_line: &str) -> AdvanceOutcome {
        let next = self.current_step() + 1;
        match self.script.steps.get(next).cloned() {
            None => AdvanceOutcome::Finished(self.finish()),
            Some(ScriptStep::Npc {
                speaker,
                prompt,
                evaluation,
            }) => {
                self.state.phase = Phase::Step(next);
                self.state.turn_complete = false;
                self.state.pending = Some(PendingTurn {
                    speaker: speaker.clone(),
                    prompt: render_turn_prompt(&prompt, player_line, evaluation.is_some()),
                    evaluation,
                });
                AdvanceOutcome::TurnPending { speaker }
            }
            Some(ScriptStep::Player { .. }) => self.enter_step(next),
        }
    }

    fn start_npc_turn(&mut self, turn: PendingTurn) {
        self.state.expected_speaker = Some(turn.speaker.clone());
        self.state.evaluation_target = turn.evaluation;
        self.state.turn_complete = false;

        let asked = match self.cast.require_mut(&turn.speaker) {
            Ok(agent) => agent.ask(&turn.prompt),
            Err(e) => {
                warn!(scene = self.script.log_tag(), error = %e, "Skipping turn");
                false
            }
        };

        if asked {
            self.state.npc_in_flight = true;
        } else {
            warn!(
                scene = self.script.log_tag(),
                agent = %turn.speaker,
                "NPC turn could not start, marking it complete"
            );
            self.state.npc_in_flight = false;
            self.state.evaluation_target = None;
            self.state.turn_complete = true;
        }
    }

    fn finish(&mut self) -> SceneReport {
        self.state.phase = Phase::Done;
        self.state.waiting_for_player = false;
        self.state.pending = None;
        self.state.npc_in_flight = false;
        self.state.turn_complete = false;
        self.state.expected_speaker = None;
        self.state.evaluation_target = None;

        let record = if self.script.record_outcome {
            let (like, dislike) = self.state.tally();
            let [first, second] = self.state.evaluations;
            write_registry(&self.registry)
                .save_scene_result(&self.script.id, like, dislike, first, second)
                .cloned()
        } else {
            None
        };

        self.cast.unsubscribe_all();
        self.presentation.close_player_input();
        self.presentation.close_panel(self.options.panel_fade);

        info!(
            scene = self.script.log_tag(),
            outcome = record.as_ref().map(|r| r.outcome.as_str()).unwrap_or("none"),
            next = self.script.next_scene.as_deref().unwrap_or("none"),
            "Scene finished"
        );

        SceneReport {
            scene_id: self.script.id.clone(),
            next_scene: self.script.next_scene.clone(),
            record,
            log: self.state.log.clone(),
        }
    }
}

impl<P: Presentation> Drop for TurnScheduler<P> {
    fn drop(&mut self) {
        self.cast.unsubscribe_all();
    }
}
