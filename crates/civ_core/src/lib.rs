//! # Civ Core
//!
//! Deterministic economy engine for an idle civilization builder.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No file IO
//! - No wall-clock reads (the host passes timestamps in)
//! - No randomness
//!
//! This separation enables:
//! - Headless simulation and balancing tools
//! - Save/load and offline catch-up tested without a UI
//! - Determinism testing via [`simulation::Colony::state_hash`]
//!
//! ## Crate Structure
//!
//! - [`data`] - Resource, building, technology and achievement definitions
//! - [`config`] - Engine tunables
//! - [`economy`] - Resource ledger
//! - [`buildings`] - Construction engine
//! - [`research`] - Research engine
//! - [`population`] - Population growth and starvation
//! - [`achievements`] - Achievement evaluator
//! - [`clock`] - Fixed-step accumulator
//! - [`save`] / [`offline`] - Persistence and offline catch-up
//! - [`simulation`] - The colony aggregate and its tick loop

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod achievements;
pub mod buildings;
pub mod clock;
pub mod config;
pub mod data;
pub mod economy;
pub mod error;
pub mod offline;
pub mod population;
pub mod research;
pub mod save;
pub mod simulation;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::achievements::{AchievementSummary, AchievementTracker};
    pub use crate::buildings::{
        BuildingStatus, ConstructionEngine, ConstructionError, ConstructionEvent,
    };
    pub use crate::clock::SimulationClock;
    pub use crate::config::{EngineConfig, GameSpeed};
    pub use crate::data::{Effect, Era, GameData, ResourceBundle};
    pub use crate::economy::ResourceLedger;
    pub use crate::error::{GameError, Result};
    pub use crate::offline::OfflineReport;
    pub use crate::population::PopulationModel;
    pub use crate::research::{ResearchEngine, ResearchError, TechStatus};
    pub use crate::save::{MemorySlot, SaveData, SaveSlot};
    pub use crate::simulation::{Colony, EraChanged, TickEvents};
}
