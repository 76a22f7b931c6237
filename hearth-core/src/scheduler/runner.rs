//! Event loop driving one scene to completion

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use super::{AdvanceOutcome, SceneReport, TurnScheduler, TurnStatus};
use crate::agent::reply_channel;
use crate::config::PresentationConfig;
use crate::error::{HearthError, Result};
use crate::presentation::{Presentation, SceneTransition};

/// Discrete player input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerAction {
    /// The "continue" action
    Advance,
    /// A typed answer
    Submit(String),
}

/// Bounded channel for player actions
pub fn action_channel(
    capacity: usize,
) -> (mpsc::Sender<PlayerAction>, mpsc::Receiver<PlayerAction>) {
    mpsc::channel(capacity.max(1))
}

/// Runs a scheduler between a screen fade-in and a fade-out
pub struct SceneRunner {
    transition: Arc<dyn SceneTransition>,
    screen_fade: Duration,
    status: Option<watch::Sender<TurnStatus>>,
}

impl SceneRunner {
    pub fn new(transition: Arc<dyn SceneTransition>) -> Self {
        Self {
            transition,
            screen_fade: PresentationConfig::default().screen_fade,
            status: None,
        }
    }

    pub fn with_screen_fade(mut self, fade: Duration) -> Self {
        self.screen_fade = fade;
        self
    }

    pub fn from_config(transition: Arc<dyn SceneTransition>, config: &PresentationConfig) -> Self {
        Self::new(transition).with_screen_fade(config.screen_fade)
    }

    /// Receiver that sees the scheduler status after every event
    pub fn watch_status(&mut self) -> watch::Receiver<TurnStatus> {
        self.status
            .get_or_insert_with(|| watch::channel(TurnStatus::Idle).0)
            .subscribe()
    }

    /// Play the scene until its last step completes
    ///
    /// Replies are handled before player actions when both are ready. Once
    /// the scene finishes, the screen fades out and the next scene, if any,
    /// is loaded through the transition.
    ///
    /// # Errors
    ///
    /// Returns [`HearthError::InputClosed`] if the action channel closes
    /// before the scene finishes, or the transition's error if loading the
    /// next scene fails.
    pub async fn run<P: Presentation>(
        &self,
        scheduler: &mut TurnScheduler<P>,
        actions: &mut mpsc::Receiver<PlayerAction>,
    ) -> Result<SceneReport> {
        self.transition.fade_from_black(self.screen_fade).await;

        let (tx, mut replies) = reply_channel();
        let mut outcome = scheduler.start(tx);

        loop {
            self.publish(scheduler.turn_status());

            if let AdvanceOutcome::Finished(report) = outcome {
                return self.exit(report).await;
            }

            outcome = tokio::select! {
                biased;

                Some(reply) = replies.recv() => {
                    scheduler.handle_reply(&reply);
                    AdvanceOutcome::Ignored
                }
                action = actions.recv() => match action {
                    Some(PlayerAction::Advance) => scheduler.advance(),
                    Some(PlayerAction::Submit(text)) => scheduler.submit_player_text(&text),
                    None => {
                        debug!(scene = %scheduler.script().id, "Action channel closed");
                        return Err(HearthError::InputClosed);
                    }
                },
            };
        }
    }

    async fn exit(&self, report: SceneReport) -> Result<SceneReport> {
        self.transition.fade_to_black(self.screen_fade).await;

        if let Some(next) = &report.next_scene {
            info!(from = %report.scene_id, to = %next, "Scene transition");
            self.transition.load_scene(next).await?;
        }
        Ok(report)
    }

    fn publish(&self, status: TurnStatus) {
        if let Some(sender) = &self.status {
            sender.send_replace(status);
        }
    }
}
