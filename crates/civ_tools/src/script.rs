//! Scripted headless runs.
//!
//! A script is a RON list of player actions keyed by the tick they fire on:
//!
//! ```ron
//! Script(
//!     steps: [
//!         (at: 0, action: Build("camp")),
//!         (at: 0, action: Research("fire")),
//!         (at: 30, action: Build("gathering_post")),
//!     ],
//! )
//! ```

use std::path::Path;

use civ_core::simulation::Colony;
use serde::{Deserialize, Serialize};

use crate::data_loader::{ToolError, ToolResult};

/// A player action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Action {
    /// Build or upgrade a building.
    Build(String),
    /// Start research.
    Research(String),
    /// Cancel the active research.
    CancelResearch(String),
    /// Advance to the next era.
    AdvanceEra,
    /// Pause gameplay.
    Pause,
    /// Resume gameplay.
    Resume,
    /// Set the game-time multiplier.
    Speed(f64),
}

/// An action and the tick it fires before.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptStep {
    /// Tick number (0 = before the first tick).
    pub at: u64,
    /// What to do.
    pub action: Action,
}

/// An ordered list of actions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    /// Steps; sorted by `at` before running.
    #[serde(default)]
    pub steps: Vec<ScriptStep>,
}

impl Script {
    /// Parse a RON script.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Script`] if the document is malformed.
    pub fn from_ron_str(label: &str, text: &str) -> ToolResult<Self> {
        ron::from_str(text).map_err(|e| ToolError::Script(label.to_string(), e.to_string()))
    }

    /// Load a RON script from disk.
    ///
    /// # Errors
    ///
    /// Returns an IO or parse error.
    pub fn load(path: &Path) -> ToolResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ToolError::Io(path.display().to_string(), e.to_string()))?;
        Self::from_ron_str(&path.display().to_string(), &text)
    }
}

/// Outcome of a headless run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    /// Ticks run.
    pub ticks: u64,
    /// Game time reached, as `H:MM:SS`.
    pub game_time: String,
    /// Era at the end.
    pub era: String,
    /// Construction events in order.
    pub construction: Vec<String>,
    /// Technologies completed in order.
    pub research: Vec<String>,
    /// Achievements unlocked in order.
    pub achievements: Vec<String>,
    /// Actions the colony rejected, with the reason.
    pub rejected: Vec<String>,
    /// Ticks on which the population starved.
    pub starving_ticks: u64,
    /// Final stockpiles.
    pub resources: Vec<(String, f64)>,
    /// Final population.
    pub population: f64,
}

fn apply(colony: &mut Colony, action: &Action) -> Result<(), String> {
    match action {
        Action::Build(id) => colony.build(id).map(drop).map_err(|e| e.to_string()),
        Action::Research(id) => colony.start_research(id).map_err(|e| e.to_string()),
        Action::CancelResearch(id) => colony.cancel_research(id).map(drop).map_err(|e| e.to_string()),
        Action::AdvanceEra => colony
            .advance_era()
            .map(drop)
            .ok_or_else(|| "Already in the final era".to_string()),
        Action::Pause => {
            colony.pause();
            Ok(())
        }
        Action::Resume => {
            colony.resume();
            Ok(())
        }
        Action::Speed(speed) => colony.set_game_speed(*speed).map_err(|e| e.to_string()),
    }
}

/// Run `ticks` ticks, firing script steps as their tick comes up.
pub fn run_script(colony: &mut Colony, script: &Script, ticks: u64) -> RunSummary {
    let mut steps = script.steps.clone();
    steps.sort_by_key(|s| s.at);
    let mut pending = steps.iter().peekable();
    let mut summary = RunSummary::default();

    for tick in 0..ticks {
        while let Some(step) = pending.next_if(|s| s.at <= tick) {
            if let Err(reason) = apply(colony, &step.action) {
                tracing::warn!(tick, action = ?step.action, "Action rejected: {reason}");
                summary.rejected.push(format!("{tick}: {:?}: {reason}", step.action));
            }
        }

        let events = colony.tick();
        summary
            .construction
            .extend(events.construction.iter().map(|e| format!("{}: {e:?}", events.tick)));
        summary.research.extend(events.research_completed);
        summary.achievements.extend(events.achievements_unlocked);
        if events.starving {
            summary.starving_ticks += 1;
        }
    }

    summary.ticks = ticks;
    summary.game_time = colony.formatted_game_time();
    summary.era = colony.era().to_string();
    summary.resources = colony
        .ledger()
        .iter()
        .map(|(id, state)| (id.to_string(), (state.amount * 10.0).floor() / 10.0))
        .collect();
    summary.population = colony.population().current;
    summary
}
