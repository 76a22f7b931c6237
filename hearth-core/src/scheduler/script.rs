//! Scene scripts
//!
//! A scene is data: a cast and an ordered list of steps. The scheduler walks
//! the steps in order; after the last one the scene is over.
//!
//! ```
//! use hearth_core::scheduler::{EvaluationSlot, SceneScript, ScriptStep};
//!
//! let script = SceneScript::from_toml_str(r##"
//! id = "Gate"
//! next_scene = "Square"
//!
//! [[cast]]
//! id = "brown"
//! display_name = "Brown"
//! color = "#C0392B"
//!
//! [[steps]]
//! kind = "npc"
//! speaker = "brown"
//! prompt = "A stranger walks up to the gate. Stop them."
//!
//! [[steps]]
//! kind = "player"
//! answer_target = "brown"
//!
//! [[steps]]
//! kind = "npc"
//! speaker = "brown"
//! prompt = "The stranger answered: \"{player}\". Judge them."
//! evaluation = "first"
//! "##)?;
//!
//! assert_eq!(script.next_scene.as_deref(), Some("Square"));
//! assert_eq!(script.steps.len(), 3);
//! assert_eq!(
//!     script.steps[2],
//!     ScriptStep::evaluation(
//!         "brown",
//!         "The stranger answered: \"{player}\". Judge them.",
//!         EvaluationSlot::First
//!     )
//! );
//! # Ok::<(), hearth_core::error::HearthError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::agent::CastMember;
use crate::error::{HearthError, Result};

/// One of the two outcome slots a scene fills
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationSlot {
    First,
    Second,
}

impl EvaluationSlot {
    pub fn index(&self) -> usize {
        match self {
            EvaluationSlot::First => 0,
            EvaluationSlot::Second => 1,
        }
    }
}

/// One entry of a scene script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScriptStep {
    /// A cast member speaks, prompted by `prompt` (`{player}` is replaced
    /// with the player's latest line)
    Npc {
        speaker: String,
        prompt: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        evaluation: Option<EvaluationSlot>,
    },
    /// The player answers; `answer_target` hears the answer directly
    Player { answer_target: String },
}

impl ScriptStep {
    pub fn npc(speaker: impl Into<String>, prompt: impl Into<String>) -> Self {
        ScriptStep::Npc {
            speaker: speaker.into(),
            prompt: prompt.into(),
            evaluation: None,
        }
    }

    pub fn evaluation(
        speaker: impl Into<String>,
        prompt: impl Into<String>,
        slot: EvaluationSlot,
    ) -> Self {
        ScriptStep::Npc {
            speaker: speaker.into(),
            prompt: prompt.into(),
            evaluation: Some(slot),
        }
    }

    pub fn player(answer_target: impl Into<String>) -> Self {
        ScriptStep::Player {
            answer_target: answer_target.into(),
        }
    }

    /// Cast member this step refers to
    pub fn agent_id(&self) -> &str {
        match self {
            ScriptStep::Npc { speaker, .. } => speaker,
            ScriptStep::Player { answer_target } => answer_target,
        }
    }

    pub fn is_player(&self) -> bool {
        matches!(self, ScriptStep::Player { .. })
    }
}

fn default_true() -> bool {
    true
}

/// Data table that parameterizes one scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneScript {
    /// Scene id, also the outcome registry key
    pub id: String,

    /// Prefix for log lines (defaults to the id)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_tag: Option<String>,

    /// Extra system instruction given to every cast member for this scene
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene_prompt: Option<String>,

    /// Scene loaded after this one finishes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_scene: Option<String>,

    /// Cast members hear each other's lines
    #[serde(default = "default_true")]
    pub share_lines: bool,

    /// Every cast member hears the player, not just the answer target
    #[serde(default = "default_true")]
    pub broadcast_player_lines: bool,

    /// Save the evaluation slots to the outcome registry at the end
    #[serde(default = "default_true")]
    pub record_outcome: bool,

    pub cast: Vec<CastMember>,

    pub steps: Vec<ScriptStep>,
}

impl SceneScript {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            log_tag: None,
            scene_prompt: None,
            next_scene: None,
            share_lines: true,
            broadcast_player_lines: true,
            record_outcome: true,
            cast: Vec::new(),
            steps: Vec::new(),
        }
    }

    pub fn with_cast_member(mut self, member: CastMember) -> Self {
        self.cast.push(member);
        self
    }

    pub fn with_step(mut self, step: ScriptStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn with_scene_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.scene_prompt = Some(prompt.into());
        self
    }

    pub fn with_next_scene(mut self, next: impl Into<String>) -> Self {
        self.next_scene = Some(next.into());
        self
    }

    pub fn log_tag(&self) -> &str {
        self.log_tag.as_deref().unwrap_or(&self.id)
    }

    pub fn cast_member(&self, id: &str) -> Option<&CastMember> {
        self.cast.iter().find(|m| m.id == id)
    }

    /// Load a script from a TOML, YAML or JSON file, chosen by extension
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        use figment::{
            Figment,
            providers::{Format, Json, Toml, Yaml},
        };

        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let figment = match extension.as_str() {
            "toml" => Figment::from(Toml::file(path)),
            "yaml" | "yml" => Figment::from(Yaml::file(path)),
            "json" => Figment::from(Json::file(path)),
            other => {
                return Err(HearthError::Script(format!(
                    "{}: unsupported scene script format '{}'",
                    path.display(),
                    other
                )));
            }
        };

        if !path.is_file() {
            return Err(HearthError::Script(format!(
                "{}: no such scene script",
                path.display()
            )));
        }

        let script: SceneScript = figment.extract().map_err(|e| {
            HearthError::Script(format!("{}: {}", path.display(), e))
        })?;
        script.validate()?;
        Ok(script)
    }

    /// Parse a TOML script from a string
    pub fn from_toml_str(source: &str) -> Result<Self> {
        use figment::{
            Figment,
            providers::{Format, Toml},
        };

        let script: SceneScript = Figment::from(Toml::string(source))
            .extract()
            .map_err(|e| HearthError::Script(e.to_string()))?;
        script.validate()?;
        Ok(script)
    }

    /// Check the script is playable
    pub fn validate(&self) -> Result<()> {
        let fail = |message: String| Err(HearthError::Script(format!("{}: {}", self.id, message)));

        if self.id.trim().is_empty() {
            return Err(HearthError::Script("scene id must not be blank".to_string()));
        }
        if self.steps.is_empty() {
            return fail("script has no steps".to_string());
        }

        let mut cast_ids = HashSet::new();
        for member in &self.cast {
            if member.id.trim().is_empty() {
                return fail("cast member with blank id".to_string());
            }
            if !cast_ids.insert(member.id.as_str()) {
                return fail(format!("duplicate cast member '{}'", member.id));
            }
        }

        let mut used_slots = HashSet::new();
        let mut previous_was_player = false;
        for (index, step) in self.steps.iter().enumerate() {
            if !cast_ids.contains(step.agent_id()) {
                return fail(format!(
                    "step {} references unknown cast member '{}'",
                    index,
                    step.agent_id()
                ));
            }

            match step {
                ScriptStep::Npc {
                    evaluation: Some(slot),
                    ..
                } => {
                    if !used_slots.insert(*slot) {
                        return fail(format!(
                            "step {} reuses evaluation slot {:?}",
                            index, slot
                        ));
                    }
                }
                ScriptStep::Player { .. } if previous_was_player => {
                    return fail(format!(
                        "step {} is a player step directly after another player step",
                        index
                    ));
                }
                _ => {}
            }
            previous_was_player = step.is_player();
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const GATE: &str = r##"
id = "Gate"
next_scene = "Square"
scene_prompt = "Dusk at the village gate."

[[cast]]
id = "brown"
display_name = "Brown"
color = "#C0392B"
persona = "Act as a rude gatekeeper."

[[cast]]
id = "toma"

[[steps]]
kind = "npc"
speaker = "brown"
prompt = "Stop the stranger."

[[steps]]
kind = "player"
answer_target = "brown"

[[steps]]
kind = "npc"
speaker = "brown"
prompt = "The stranger said: {player}"
evaluation = "first"
"##;

    #[test]
    fn test_parse_toml_script() {
        let script = SceneScript::from_toml_str(GATE).unwrap();
        assert_eq!(script.id, "Gate");
        assert_eq!(script.next_scene.as_deref(), Some("Square"));
        assert_eq!(script.log_tag(), "Gate");
        assert!(script.share_lines);
        assert!(script.broadcast_player_lines);
        assert!(script.record_outcome);
        assert_eq!(script.cast.len(), 2);
        assert_eq!(script.cast_member("brown").unwrap().label(), "Brown");
        assert_eq!(script.steps[1], ScriptStep::player("brown"));
        assert_eq!(
            script.steps[2],
            ScriptStep::evaluation("brown", "The stranger said: {player}", EvaluationSlot::First)
        );
    }

    #[test]
    fn test_from_file_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let toml_path = dir.path().join("gate.toml");
        std::fs::write(&toml_path, GATE).unwrap();
        assert_eq!(SceneScript::from_file(&toml_path).unwrap().id, "Gate");

        let script = SceneScript::from_toml_str(GATE).unwrap();
        let json_path = dir.path().join("gate.json");
        let mut file = std::fs::File::create(&json_path).unwrap();
        write!(file, "{}", serde_json::to_string_pretty(&script).unwrap()).unwrap();
        assert_eq!(SceneScript::from_file(&json_path).unwrap(), script);

        let yaml_path = dir.path().join("gate.yaml");
        std::fs::write(
            &yaml_path,
            "id: Gate\ncast:\n  - id: brown\nsteps:\n  - kind: npc\n    speaker: brown\n    prompt: Halt.\n",
        )
        .unwrap();
        assert_eq!(SceneScript::from_file(&yaml_path).unwrap().steps.len(), 1);
    }

    #[test]
    fn test_from_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let txt = dir.path().join("gate.txt");
        std::fs::write(&txt, GATE).unwrap();
        assert!(matches!(SceneScript::from_file(&txt), Err(HearthError::Script(_))));

        let missing = dir.path().join("missing.toml");
        assert!(matches!(SceneScript::from_file(&missing), Err(HearthError::Script(_))));
    }

    fn base() -> SceneScript {
        SceneScript::new("Test")
            .with_cast_member(CastMember::new("a"))
            .with_cast_member(CastMember::new("b"))
    }

    #[test]
    fn test_validate_rules() {
        assert!(base().validate().is_err(), "no steps");

        let ok = base()
            .with_step(ScriptStep::npc("a", "hi"))
            .with_step(ScriptStep::player("a"))
            .with_step(ScriptStep::evaluation("a", "{player}", EvaluationSlot::First))
            .with_step(ScriptStep::player("b"))
            .with_step(ScriptStep::evaluation("b", "{player}", EvaluationSlot::Second));
        assert!(ok.validate().is_ok());

        let unknown = base().with_step(ScriptStep::npc("zed", "hi"));
        assert!(unknown.validate().is_err());

        let reused = base()
            .with_step(ScriptStep::evaluation("a", "x", EvaluationSlot::First))
            .with_step(ScriptStep::evaluation("b", "y", EvaluationSlot::First));
        assert!(reused.validate().is_err());

        let double_player = base()
            .with_step(ScriptStep::player("a"))
            .with_step(ScriptStep::player("b"));
        assert!(double_player.validate().is_err());

        let starts_with_player = base()
            .with_step(ScriptStep::player("a"))
            .with_step(ScriptStep::npc("a", "{player}"));
        assert!(starts_with_player.validate().is_ok());

        let duplicate_cast = base()
            .with_cast_member(CastMember::new("a"))
            .with_step(ScriptStep::npc("a", "hi"));
        assert!(duplicate_cast.validate().is_err());

        let blank_id = SceneScript::new(" ")
            .with_cast_member(CastMember::new("a"))
            .with_step(ScriptStep::npc("a", "hi"));
        assert!(blank_id.validate().is_err());
    }
}
