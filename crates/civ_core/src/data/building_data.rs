//! Building data structures for data-driven building definitions.

use serde::{Deserialize, Serialize};

use super::{Era, ResourceBundle};

/// Functional category of a building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingKind {
    /// Produces resources every second.
    Production,
    /// Raises resource capacity.
    Storage,
    /// Raises the population limit.
    Population,
    /// Research-related building.
    Technology,
    /// Utility building.
    Functional,
    /// Wonders and other one-offs.
    Special,
}

/// A condition that must hold before a building can be constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Requirement {
    /// Current era must equal this era exactly.
    Era(Era),
    /// Another building must exist (any level, any status).
    Building(String),
    /// A technology must be researched.
    Technology(String),
    /// A resource stockpile must hold at least this much.
    Resource(String, f64),
    /// Current population must be at least this large.
    Population(f64),
}

/// Data-driven building definition.
///
/// One definition backs at most one runtime instance: a colony either has
/// built a given building (at some level) or it has not.
///
/// # Example RON
///
/// ```ron
/// BuildingData(
///     id: "gathering_post",
///     name: "Gathering Post",
///     kind: production,
///     era: stone,
///     max_level: 5,
///     build_cost: {"wood": 20.0, "stone": 10.0},
///     upgrade_cost_multiplier: 2.0,
///     build_time: 10.0,
///     upgrade_time: 15.0,
///     production: {"food": 2.0},
/// )
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingData {
    /// Unique string identifier for this building type.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Functional category.
    pub kind: BuildingKind,

    /// Era the building belongs to.
    #[serde(default)]
    pub era: Era,

    /// Highest level an instance can reach.
    #[serde(default = "default_max_level")]
    pub max_level: u32,

    /// Cost to construct level 1.
    #[serde(default)]
    pub build_cost: ResourceBundle,

    /// Base of the exponential upgrade cost curve.
    #[serde(default = "default_upgrade_cost_multiplier")]
    pub upgrade_cost_multiplier: f64,

    /// Construction time in seconds.
    pub build_time: f64,

    /// Upgrade time in seconds for the level 1 to 2 upgrade.
    pub upgrade_time: f64,

    /// Resources produced per second at level 1.
    #[serde(default)]
    pub production: ResourceBundle,

    /// Resources consumed per second at level 1.
    #[serde(default)]
    pub consumption: ResourceBundle,

    /// Storage capacity added once construction completes.
    #[serde(default)]
    pub capacity: ResourceBundle,

    /// Population limit added once construction completes.
    #[serde(default)]
    pub population: f64,

    /// Unlock conditions.
    #[serde(default)]
    pub requirements: Vec<Requirement>,
}

const fn default_max_level() -> u32 {
    1
}

const fn default_upgrade_cost_multiplier() -> f64 {
    2.0
}

impl BuildingData {
    /// Check if this building requires a specific technology.
    #[must_use]
    pub fn requires_tech(&self, tech_id: &str) -> bool {
        self.requirements
            .iter()
            .any(|r| matches!(r, Requirement::Technology(t) if t == tech_id))
    }

    /// The exact era this building requires, if it declares one.
    #[must_use]
    pub fn required_era(&self) -> Option<Era> {
        self.requirements.iter().find_map(|r| match r {
            Requirement::Era(era) => Some(*era),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_building() -> BuildingData {
        BuildingData {
            id: "farm".to_string(),
            name: "Farm".to_string(),
            kind: BuildingKind::Production,
            era: Era::Bronze,
            max_level: 5,
            build_cost: ResourceBundle::from([("wood", 30.0)]),
            upgrade_cost_multiplier: 2.0,
            build_time: 15.0,
            upgrade_time: 20.0,
            production: ResourceBundle::from([("food", 5.0)]),
            consumption: ResourceBundle::new(),
            capacity: ResourceBundle::new(),
            population: 0.0,
            requirements: vec![
                Requirement::Era(Era::Bronze),
                Requirement::Technology("agriculture".to_string()),
            ],
        }
    }

    #[test]
    fn test_requires_tech() {
        let building = create_test_building();
        assert!(building.requires_tech("agriculture"));
        assert!(!building.requires_tech("mining"));
    }

    #[test]
    fn test_required_era() {
        let building = create_test_building();
        assert_eq!(building.required_era(), Some(Era::Bronze));
    }

    #[test]
    fn test_ron_defaults() {
        let building: BuildingData = ron::from_str(
            r#"BuildingData(
                id: "camp",
                name: "Camp",
                kind: population,
                build_time: 5.0,
                upgrade_time: 10.0,
                population: 5.0,
            )"#,
        )
        .unwrap();
        assert_eq!(building.max_level, 1);
        assert_eq!(building.upgrade_cost_multiplier, 2.0);
        assert_eq!(building.era, Era::Stone);
        assert!(building.requirements.is_empty());
        assert!(building.production.is_empty());
        assert!(building.consumption.is_empty());
    }
}
