//! Civ Idle - Development Tools

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use civ_core::offline::OfflineReport;
use civ_core::save::{SaveData, SaveSlot};
use civ_core::simulation::{format_game_time, Colony};
use civ_tools::data_loader::{load_config, load_validated_directory, ToolResult};
use civ_tools::script::{run_script, Script};
use civ_tools::slot::FileSlot;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "civ-tools")]
#[command(about = "Development tools for Civ Idle")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate data files
    Validate {
        /// Path to data directory
        #[arg(default_value = "assets/data")]
        path: String,
    },
    /// Run a colony headlessly and print a JSON summary
    Simulate {
        /// Path to data directory
        #[arg(long, default_value = "assets/data")]
        data: PathBuf,
        /// Engine configuration (RON)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Seconds (ticks) to simulate
        #[arg(short, long, default_value = "600")]
        seconds: u64,
        /// Action script (RON)
        #[arg(long)]
        script: Option<PathBuf>,
        /// Load this save first and write the result back
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Describe a save file
    Inspect {
        /// Save file
        save: PathBuf,
        /// Path to data directory; when given, the save is loaded into a
        /// colony and derived state is shown
        #[arg(long)]
        data: Option<PathBuf>,
    },
    /// Preview tiered offline production for a gap
    Offline {
        /// Seconds away
        seconds: u64,
        /// Engine configuration (RON)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

fn simulate(
    data: &Path,
    config: Option<&Path>,
    seconds: u64,
    script: Option<&Path>,
    save: Option<&Path>,
) -> ToolResult<()> {
    let data = Arc::new(load_validated_directory(data)?);
    let config = load_config(config)?;
    let script = script.map(Script::load).transpose()?.unwrap_or_default();
    let now = now_ms();

    let mut colony = Colony::new(data, config, now);
    let mut slot = save.map(FileSlot::new);
    if let Some(slot) = slot.as_ref().filter(|s| s.exists()) {
        if colony.load(slot, now)?.is_some() {
            if let Some(gains) = colony.claim_offline_gains() {
                tracing::info!("Offline gains: {gains:?}");
            }
        }
    }

    let summary = run_script(&mut colony, &script, seconds);
    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{json}"),
        Err(e) => tracing::error!("Failed to encode summary: {e}"),
    }

    if let Some(slot) = slot.as_mut() {
        colony.save(slot, now_ms())?;
        tracing::info!("Saved to {}", slot.path().display());
    }
    Ok(())
}

fn inspect(save: &Path, data: Option<&Path>) -> ToolResult<()> {
    let slot = FileSlot::new(save);
    let Some(text) = slot.read()? else {
        return Err(civ_core::error::GameError::NoSave.into());
    };
    let parsed = SaveData::from_json(&text)?;

    println!("Save version:  {}", parsed.version);
    println!("Era:           {}", parsed.game.era);
    println!("Game time:     {}", format_game_time(parsed.game.game_time));
    println!(
        "Population:    {} / {}",
        parsed.game.population.current, parsed.game.population.max
    );
    println!("Buildings:     {}", parsed.buildings.len());
    println!("Technologies:  {}", parsed.technologies.len());
    println!("Achievements:  {}", parsed.achievements.len());
    for (id, amount) in &parsed.resources {
        println!("  {id:<16} {amount:>12.1}");
    }

    if let Some(dir) = data {
        let data = Arc::new(load_validated_directory(dir)?);
        let now = now_ms();
        let mut colony = Colony::new(data, load_config(None)?, now);
        let report = colony.load_str(&text, now)?;

        println!("Derived state:");
        for (id, state) in colony.ledger().iter() {
            println!(
                "  {id:<16} {:>10.1} / {:<10.1} {:+.2}/s",
                state.amount,
                state.capacity,
                state.net_rate()
            );
        }
        let summary = colony.achievement_summary();
        println!(
            "Achievements:  {}/{} ({:.1}%)",
            summary.unlocked, summary.total, summary.percentage
        );
        if let Some(report) = report {
            println!(
                "Offline:       {} away, worth {} of production",
                format_game_time(report.offline_secs),
                format_game_time(report.effective_secs)
            );
        }
    }
    Ok(())
}

fn offline(seconds: u64, config: Option<&Path>) -> ToolResult<()> {
    let config = load_config(config)?;
    match OfflineReport::detect(0, seconds.saturating_mul(1000), &config) {
        Some(report) => println!(
            "{} away (capped {}) = {} of production ({:.1}% efficiency)",
            format_game_time(report.offline_secs),
            format_game_time(report.capped_secs),
            format_game_time(report.effective_secs),
            report.efficiency() * 100.0
        ),
        None => println!(
            "Below the {}s offline threshold; nothing to catch up",
            config.offline_threshold_secs
        ),
    }
    Ok(())
}

fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { path } => {
            tracing::info!("Validating data files in: {path}");
            civ_tools::validate::validate_data_directory(Path::new(&path)).map(|report| {
                for problem in &report.problems {
                    tracing::error!("{problem}");
                }
                if report.is_valid() {
                    tracing::info!(
                        files = report.files,
                        resources = report.counts[0],
                        buildings = report.counts[1],
                        technologies = report.counts[2],
                        achievements = report.counts[3],
                        "Validation passed"
                    );
                } else {
                    tracing::error!("Validation failed: {} problem(s)", report.problems.len());
                    std::process::exit(1);
                }
            })
        }
        Commands::Simulate {
            data,
            config,
            seconds,
            script,
            save,
        } => simulate(
            &data,
            config.as_deref(),
            seconds,
            script.as_deref(),
            save.as_deref(),
        ),
        Commands::Inspect { save, data } => inspect(&save, data.as_deref()),
        Commands::Offline { seconds, config } => offline(seconds, config.as_deref()),
    };

    if let Err(e) = result {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}
