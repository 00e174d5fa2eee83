//! Tech tree data structures for data-driven technology definitions.

use serde::{Deserialize, Serialize};

use super::{Era, ResourceBundle};

/// A permanent modifier granted by a technology or achievement.
///
/// Effects are applied exactly once, when the technology completes or the
/// achievement unlocks. Every factor composes multiplicatively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    /// Multiply the production of one resource.
    ResourceMultiplier {
        /// Resource ID the multiplier applies to.
        resource: String,
        /// Factor (e.g. 1.2 for +20%).
        factor: f64,
    },
    /// Divide construction and upgrade durations by this factor.
    BuildSpeedBonus(f64),
    /// Divide research durations by this factor.
    ResearchSpeedBonus(f64),
    /// Multiply the population growth rate.
    PopulationGrowth(f64),
}

impl Effect {
    /// The multiplicative factor carried by this effect.
    #[must_use]
    pub fn factor(&self) -> f64 {
        match self {
            Self::ResourceMultiplier { factor, .. } => *factor,
            Self::BuildSpeedBonus(f)
            | Self::ResearchSpeedBonus(f)
            | Self::PopulationGrowth(f) => *f,
        }
    }
}

/// Thematic grouping of a technology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TechCategory {
    /// Production improvements.
    #[default]
    Production,
    /// Military.
    Military,
    /// Culture.
    Culture,
    /// Economy.
    Economy,
}

/// Data-driven technology definition.
///
/// # Example RON
///
/// ```ron
/// TechData(
///     id: "pottery",
///     name: "Pottery",
///     era: stone,
///     research_cost: {"stone": 40.0, "wood": 20.0},
///     research_time: 18.0,
///     prerequisites: ["fire"],
///     effects: [],
///     unlocks: ["granary"],
/// )
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechData {
    /// Unique string identifier for this technology.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Era the technology belongs to.
    #[serde(default)]
    pub era: Era,

    /// Thematic grouping.
    #[serde(default)]
    pub category: TechCategory,

    /// Cost deducted when research starts.
    #[serde(default)]
    pub research_cost: ResourceBundle,

    /// Research time in seconds at speed multiplier 1.
    pub research_time: f64,

    /// Technology IDs that must be researched first.
    #[serde(default)]
    pub prerequisites: Vec<String>,

    /// Effects granted when this technology is completed.
    #[serde(default)]
    pub effects: Vec<Effect>,

    /// Building IDs this technology is associated with (informational).
    #[serde(default)]
    pub unlocks: Vec<String>,
}

impl TechData {
    /// Check if this technology has a specific prerequisite.
    #[must_use]
    pub fn requires(&self, tech_id: &str) -> bool {
        self.prerequisites.iter().any(|t| t == tech_id)
    }

    /// Whether the technology is a root of the tree.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.prerequisites.is_empty()
    }
}
