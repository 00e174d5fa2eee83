//! Engine tunables.
//!
//! Every field has a default, so a RON document only needs to list what it
//! overrides:
//!
//! ```ron
//! EngineConfig(
//!     game_speed: 2.0,
//!     enforce_all_requirements: true,
//! )
//! ```

use serde::{Deserialize, Serialize};

use crate::data::ResourceBundle;
use crate::error::{GameError, Result};

/// Simulated seconds covered by one tick.
///
/// Independent of `tick_interval_ms`, which only sets how much real time a
/// tick costs.
pub const TICK_SECONDS: f64 = 1.0;

/// One band of the offline efficiency table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OfflineTier {
    /// Upper bound of the band in offline seconds (`None` = unbounded).
    pub up_to_secs: Option<f64>,
    /// Fraction of normal production earned inside the band.
    pub efficiency: f64,
}

impl OfflineTier {
    /// Create a bounded tier.
    #[must_use]
    pub const fn until(up_to_secs: f64, efficiency: f64) -> Self {
        Self {
            up_to_secs: Some(up_to_secs),
            efficiency,
        }
    }

    /// Create the final, unbounded tier.
    #[must_use]
    pub const fn beyond(efficiency: f64) -> Self {
        Self {
            up_to_secs: None,
            efficiency,
        }
    }
}

/// Named game speed presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameSpeed {
    /// Half speed.
    Casual,
    /// Normal speed.
    Normal,
    /// Double speed.
    Fast,
    /// Quadruple speed.
    Turbo,
}

impl GameSpeed {
    /// Multiplier applied to game time.
    #[must_use]
    pub const fn multiplier(self) -> f64 {
        match self {
            Self::Casual => 0.5,
            Self::Normal => 1.0,
            Self::Fast => 2.0,
            Self::Turbo => 4.0,
        }
    }
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Real milliseconds per tick (frame pacing only).
    pub tick_interval_ms: u64,
    /// Accumulator cap, as a multiple of the tick interval.
    pub max_catch_up_ticks: u32,
    /// Simulated seconds between achievement scans.
    pub achievement_scan_interval: f64,
    /// Extra production per building level above 1.
    pub production_increase_per_level: f64,
    /// Growth factor of upgrade durations per level.
    pub upgrade_time_multiplier: f64,
    /// Resource eaten by the population.
    pub food_resource: String,
    /// Food eaten per inhabitant per second.
    pub food_per_capita: f64,
    /// Fraction of the growth rate lost per second while starving.
    pub starvation_factor: f64,
    /// Population at the start of a new game.
    pub initial_population: f64,
    /// Population limit at the start of a new game.
    pub initial_max_population: f64,
    /// Inhabitants gained per second when fed.
    pub base_growth_rate: f64,
    /// Stockpile at the start of a new game.
    pub starting_resources: ResourceBundle,
    /// Offline gaps at or below this many seconds are ignored.
    pub offline_threshold_secs: f64,
    /// Offline gaps are truncated to this many seconds.
    pub max_offline_secs: f64,
    /// Offline efficiency bands, in increasing order.
    pub offline_tiers: Vec<OfflineTier>,
    /// Enforce building, technology, resource and population requirements,
    /// not just the era requirement.
    pub enforce_all_requirements: bool,
    /// Game-time multiplier at the start of a new game.
    pub game_speed: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            max_catch_up_ticks: 3,
            achievement_scan_interval: 10.0,
            production_increase_per_level: 0.15,
            upgrade_time_multiplier: 1.8,
            food_resource: "food".to_string(),
            food_per_capita: 0.5,
            starvation_factor: 0.5,
            initial_population: 10.0,
            initial_max_population: 20.0,
            base_growth_rate: 1.0 / 60.0,
            starting_resources: ResourceBundle::from([
                ("food", 100.0),
                ("wood", 50.0),
                ("stone", 50.0),
            ]),
            offline_threshold_secs: 60.0,
            max_offline_secs: 86_400.0,
            offline_tiers: vec![
                OfflineTier::until(7_200.0, 1.0),
                OfflineTier::until(28_800.0, 0.75),
                OfflineTier::until(86_400.0, 0.5),
                OfflineTier::beyond(0.25),
            ],
            enforce_all_requirements: false,
            game_speed: GameSpeed::Normal.multiplier(),
        }
    }
}

impl EngineConfig {
    /// Parse a RON configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::DataParseError`] if the document is malformed.
    pub fn from_ron_str(label: &str, text: &str) -> Result<Self> {
        ron::from_str(text).map_err(|e| GameError::DataParseError {
            path: label.to_string(),
            message: e.to_string(),
        })
    }

    /// Upper bound for the clock accumulator in milliseconds.
    #[must_use]
    pub fn accumulator_cap_ms(&self) -> u64 {
        self.tick_interval_ms
            .saturating_mul(u64::from(self.max_catch_up_ticks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.accumulator_cap_ms(), 3000);
        assert_eq!(config.starting_resources.get("food"), 100.0);
        assert_eq!(config.offline_tiers.len(), 4);
    }

    #[test]
    fn test_cap_follows_interval() {
        let config = EngineConfig {
            tick_interval_ms: 250,
            ..EngineConfig::default()
        };
        assert_eq!(config.accumulator_cap_ms(), 750);
    }

    #[test]
    fn test_accumulator_cap_saturates() {
        let config = EngineConfig {
            tick_interval_ms: u64::MAX / 2,
            max_catch_up_ticks: 3,
            ..EngineConfig::default()
        };
        assert_eq!(config.accumulator_cap_ms(), u64::MAX);
    }

    #[test]
    fn test_partial_ron_override() {
        let config =
            EngineConfig::from_ron_str("test", "EngineConfig(game_speed: 2.0, max_catch_up_ticks: 5)")
                .unwrap();
        assert_eq!(config.game_speed, 2.0);
        assert_eq!(config.max_catch_up_ticks, 5);
        assert_eq!(config.tick_interval_ms, 1000);
        assert_eq!(config.food_resource, "food");
    }

    #[test]
    fn test_speed_presets() {
        assert_eq!(GameSpeed::Casual.multiplier(), 0.5);
        assert_eq!(GameSpeed::Turbo.multiplier(), 4.0);
    }
}
