//! Resource type definitions.

use serde::{Deserialize, Serialize};

use super::Era;

/// Broad grouping of a resource, used for UI sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceCategory {
    /// Food, wood, stone.
    #[default]
    Basic,
    /// Copper, iron, coal, clay.
    Intermediate,
    /// Steel, oil, electricity and similar.
    Advanced,
    /// Space-era materials.
    Space,
    /// Interstellar materials.
    Interstellar,
    /// Hyperdimensional materials.
    Hyperdimensional,
    /// Gold, knowledge, culture, prestige.
    Special,
}

/// Data-driven resource definition.
///
/// # Example RON
///
/// ```ron
/// ResourceData(
///     id: "food",
///     name: "Food",
///     category: basic,
///     era: stone,
///     base_storage: 1000.0,
/// )
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceData {
    /// Unique string identifier for this resource.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Grouping for display.
    #[serde(default)]
    pub category: ResourceCategory,

    /// Era in which the resource first matters.
    #[serde(default)]
    pub era: Era,

    /// Storage capacity before any storage buildings.
    pub base_storage: f64,
}
