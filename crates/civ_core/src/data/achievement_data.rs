//! Achievement definitions.

use serde::{Deserialize, Serialize};

use super::{BuildingKind, Effect, ResourceBundle};

/// Which buildings count toward a building-count condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BuildingFilter {
    /// Every building instance.
    #[default]
    Any,
    /// Only buildings of this kind.
    Kind(BuildingKind),
    /// Only buildings that reached their maximum level.
    MaxLevel,
}

/// The measurable goal behind an achievement.
///
/// Progress is always re-derived from current state as a percentage of the
/// target value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AchievementCondition {
    /// Reach the era with this ordinal.
    Era(u32),
    /// Hold at least this much of a resource.
    Resource(String, f64),
    /// Own at least `count` buildings matching `filter`.
    Building {
        /// Which buildings count.
        #[serde(default)]
        filter: BuildingFilter,
        /// Target count.
        count: u32,
    },
    /// Research at least this many technologies.
    Technology(u32),
    /// Reach this population.
    Population(f64),
    /// Accumulate this many seconds of game time.
    GameTime(f64),
}

/// Thematic grouping of an achievement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementCategory {
    /// Era and milestone progress.
    #[default]
    Progress,
    /// Stockpiles.
    Resource,
    /// Construction.
    Building,
    /// Research.
    Technology,
    /// Population.
    Population,
    /// Anything else.
    Special,
}

/// Data-driven achievement definition.
///
/// # Example RON
///
/// ```ron
/// AchievementData(
///     id: "first_step",
///     name: "First Step",
///     condition: Building(filter: Any, count: 1),
///     reward: {"knowledge": 10.0},
///     permanent_effect: Some(ResourceMultiplier(resource: "knowledge", factor: 1.05)),
/// )
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AchievementData {
    /// Unique string identifier.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Grouping for display.
    #[serde(default)]
    pub category: AchievementCategory,

    /// Unlock condition.
    pub condition: AchievementCondition,

    /// Resources granted once on unlock.
    #[serde(default)]
    pub reward: ResourceBundle,

    /// Permanent effect applied once on unlock.
    #[serde(default)]
    pub permanent_effect: Option<Effect>,
}
