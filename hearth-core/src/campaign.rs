//! Scene sequencing across a playthrough
//!
//! A [`Campaign`] is the set of scene scripts a game ships with. Starting a
//! new game resets the shared outcome registry and yields a [`Playthrough`]
//! that plays scenes one after another, following each script's
//! `next_scene`, until a scene has no successor.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::agent::Cast;
use crate::config::{CampaignConfig, HearthConfig};
use crate::error::{HearthError, Result};
use crate::llm::LLMProvider;
use crate::outcome::{MajorityVerdict, SharedOutcomeRegistry, read_registry, write_registry};
use crate::presentation::{Presentation, SceneTransition};
use crate::scheduler::{
    PlayerAction, SceneReport, SceneRunner, SceneScript, SchedulerOptions, TurnScheduler,
};

const SCRIPT_EXTENSIONS: [&str; 4] = ["toml", "yaml", "yml", "json"];

/// Validated scene scripts keyed by scene id
#[derive(Debug, Clone)]
pub struct Campaign {
    scripts: BTreeMap<String, SceneScript>,
    first_scene: String,
}

impl Campaign {
    /// Validate every script and check that `first_scene` exists
    pub fn new(scripts: Vec<SceneScript>, first_scene: impl Into<String>) -> Result<Self> {
        let first_scene = first_scene.into();
        let mut by_id = BTreeMap::new();

        for script in scripts {
            script.validate()?;
            if by_id.contains_key(&script.id) {
                return Err(HearthError::Script(format!(
                    "scene '{}' is defined twice",
                    script.id
                )));
            }
            by_id.insert(script.id.clone(), script);
        }

        if !by_id.contains_key(&first_scene) {
            return Err(HearthError::SceneNotFound(first_scene));
        }

        for script in by_id.values() {
            if let Some(next) = &script.next_scene {
                if !by_id.contains_key(next) {
                    debug!(scene = %script.id, next = %next, "Next scene is outside this campaign");
                }
            }
        }

        Ok(Self {
            scripts: by_id,
            first_scene,
        })
    }

    /// Load every script file in `dir`
    ///
    /// Files with other extensions are skipped.
    pub fn load_dir(dir: impl AsRef<Path>, first_scene: impl Into<String>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let is_script = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| SCRIPT_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                .unwrap_or(false);

            if path.is_file() && is_script {
                paths.push(path);
            } else {
                debug!(path = %path.display(), "Skipping non-script entry");
            }
        }
        paths.sort();

        let scripts = paths
            .iter()
            .map(SceneScript::from_file)
            .collect::<Result<Vec<_>>>()?;

        info!(dir = %dir.display(), scenes = scripts.len(), "Loaded scene scripts");
        Self::new(scripts, first_scene)
    }

    pub fn from_config(config: &CampaignConfig) -> Result<Self> {
        Self::load_dir(&config.scene_dir, config.first_scene.as_str())
    }

    pub fn scene(&self, id: &str) -> Option<&SceneScript> {
        self.scripts.get(id)
    }

    pub fn scene_ids(&self) -> impl Iterator<Item = &str> {
        self.scripts.keys().map(String::as_str)
    }

    pub fn first_scene(&self) -> &str {
        &self.first_scene
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }

    /// Reset the registry and prepare a playthrough
    pub fn new_game(
        &self,
        provider: Arc<dyn LLMProvider>,
        config: &HearthConfig,
        registry: SharedOutcomeRegistry,
        transition: Arc<dyn SceneTransition>,
    ) -> Playthrough<'_> {
        {
            let mut registry = write_registry(&registry);
            registry.reset_all();
            registry.set_expected_scene_count(config.outcomes.expected_scene_count);
        }

        Playthrough {
            campaign: self,
            provider,
            config: config.clone(),
            registry,
            runner: SceneRunner::from_config(transition, &config.presentation),
        }
    }
}

/// One game session over a campaign
pub struct Playthrough<'a> {
    campaign: &'a Campaign,
    provider: Arc<dyn LLMProvider>,
    config: HearthConfig,
    registry: SharedOutcomeRegistry,
    runner: SceneRunner,
}

impl Playthrough<'_> {
    pub fn registry(&self) -> &SharedOutcomeRegistry {
        &self.registry
    }

    pub fn runner_mut(&mut self) -> &mut SceneRunner {
        &mut self.runner
    }

    /// Final majority, once every expected scene has reported
    pub fn final_verdict(&self) -> MajorityVerdict {
        read_registry(&self.registry).try_final_majority()
    }

    /// Play from the campaign's first scene
    pub async fn play<P: Presentation>(
        &mut self,
        presentation: &mut P,
        actions: &mut tokio::sync::mpsc::Receiver<PlayerAction>,
    ) -> Result<Vec<SceneReport>> {
        let first = self.campaign.first_scene.clone();
        self.play_from(&first, presentation, actions).await
    }

    /// Play from `start`, following `next_scene` links
    ///
    /// Stops when a scene has no successor, the successor is not part of the
    /// campaign, or a scene would be played a second time.
    pub async fn play_from<P: Presentation>(
        &mut self,
        start: &str,
        presentation: &mut P,
        actions: &mut tokio::sync::mpsc::Receiver<PlayerAction>,
    ) -> Result<Vec<SceneReport>> {
        if self.campaign.scene(start).is_none() {
            return Err(HearthError::SceneNotFound(start.to_string()));
        }

        let mut reports = Vec::new();
        let mut played = HashSet::new();
        let mut current = Some(start.to_string());

        while let Some(scene_id) = current.take() {
            let Some(script) = self.campaign.scene(&scene_id) else {
                info!(scene = %scene_id, "Next scene is not part of this campaign, stopping");
                break;
            };
            if !played.insert(scene_id.clone()) {
                warn!(scene = %scene_id, "Scene already played in this session, stopping");
                break;
            }

            let cast = Cast::from_members(&script.cast, Arc::clone(&self.provider), &self.config)?;
            let mut scheduler = TurnScheduler::new(
                script.clone(),
                cast,
                &mut *presentation,
                Arc::clone(&self.registry),
            )
            .with_options(SchedulerOptions::from(&self.config.presentation));

            let report = self.runner.run(&mut scheduler, actions).await?;
            current = report.next_scene.clone();
            reports.push(report);
        }

        info!(
            scenes = reports.len(),
            summary = %read_registry(&self.registry).summary(),
            "Playthrough finished"
        );
        Ok(reports)
    }
}
