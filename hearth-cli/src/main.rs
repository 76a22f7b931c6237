//! Hearth CLI - play and check scene scripts from a terminal

mod console;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use hearth_core::prelude::*;
use tracing::info;

use console::{ConsolePresentation, spawn_auto_advance, spawn_stdin_reader};

#[derive(Parser)]
#[command(name = "hearth")]
#[command(about = "Hearth dialogue scene player", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play the campaign in the terminal
    Play {
        /// Configuration file (defaults to hearth.toml plus HEARTH_ env vars)
        #[arg(short, long, env = "HEARTH_CONFIG_PATH")]
        config: Option<PathBuf>,

        /// Directory of scene scripts
        #[arg(long)]
        scene_dir: Option<PathBuf>,

        /// Scene to start from
        #[arg(short, long)]
        scene: Option<String>,

        /// Use canned replies instead of a language model
        #[arg(long)]
        offline: bool,

        /// Only stop for player answers
        #[arg(long)]
        auto: bool,

        /// Disable colored speaker names
        #[arg(long)]
        no_color: bool,
    },
    /// Parse a raw model reply and print the judgment
    Parse {
        /// Raw reply text
        raw: String,

        /// Fail instead of repairing or falling back to the raw text
        #[arg(long)]
        strict: bool,
    },
    /// Check scene script files
    Validate {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Version => {
            println!("hearth {}", env!("CARGO_PKG_VERSION"));
            println!("hearth-core {}", hearth_core::VERSION);
        }
        Commands::Parse { raw, strict } => println!("{}", parse_command(&raw, strict)?),
        Commands::Validate { files } => validate(&files)?,
        Commands::Play {
            config,
            scene_dir,
            scene,
            offline,
            auto,
            no_color,
        } => {
            let mut config = match config {
                Some(path) => HearthConfig::from_file(&path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => HearthConfig::load()?,
            };
            if let Some(dir) = scene_dir {
                config.campaign.scene_dir = dir;
            }
            if offline {
                config.llm.provider = LLMProviderType::Offline;
            }
            play(config, scene, auto, !no_color).await?;
        }
    }

    Ok(())
}

fn parse_command(raw: &str, strict: bool) -> Result<String> {
    let judgment = if strict {
        OutputParser::parse(&JudgmentParser::strict(), raw)
            .map_err(|e| anyhow::anyhow!("reply is not a well-formed judgment: {}", e))?
    } else {
        parse_reply(raw)
    };
    Ok(serde_json::to_string_pretty(&judgment)?)
}

fn validate(files: &[PathBuf]) -> Result<()> {
    let mut failed = 0;
    for file in files {
        match SceneScript::from_file(file) {
            Ok(script) => println!(
                "ok    {} ({}: {} steps, {} cast)",
                file.display(),
                script.id,
                script.steps.len(),
                script.cast.len()
            ),
            Err(e) => {
                failed += 1;
                println!("error {}: {}", file.display(), e);
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} scene scripts failed validation", failed, files.len());
    }
    Ok(())
}

async fn play(config: HearthConfig, start: Option<String>, auto: bool, color: bool) -> Result<()> {
    let campaign = Campaign::from_config(&config.campaign)
        .with_context(|| format!("loading scenes from {}", config.campaign.scene_dir.display()))?;
    let provider = LLMProviderFactory::create(&config.llm)?;
    info!(
        scenes = campaign.len(),
        model = %provider.model_info().model_name,
        "Starting new game"
    );

    let registry = OutcomeRegistry::from_config(&config.outcomes).into_shared();
    let transition = Arc::new(TimedTransition::new().with_time_scale(0.0));
    let mut playthrough = campaign.new_game(provider, &config, Arc::clone(&registry), transition);

    let (tx, mut rx) = action_channel(16);
    if auto {
        spawn_auto_advance(playthrough.runner_mut().watch_status(), tx.clone());
    } else {
        println!("(press Enter to continue, type to answer)");
    }
    spawn_stdin_reader(tx);

    let mut panel = ConsolePresentation::new(color);
    let start = start.unwrap_or_else(|| campaign.first_scene().to_string());
    let reports = playthrough.play_from(&start, &mut panel, &mut rx).await?;

    println!();
    for report in &reports {
        match &report.record {
            Some(record) => println!(
                "{:<12} {} (like {}, dislike {})",
                report.scene_id, record.outcome, record.like_count, record.dislike_count
            ),
            None => println!("{:<12} -", report.scene_id),
        }
    }

    let registry = hearth_core::outcome::read_registry(&registry);
    println!("{}", registry.summary());
    match registry.try_final_majority() {
        MajorityVerdict::Ready { majority, .. } => println!("Final outcome: {}", majority),
        MajorityVerdict::NotReady { saved, expected } => {
            println!("Final outcome not ready ({} of {} scenes)", saved, expected)
        }
    }

    Ok(())
}
