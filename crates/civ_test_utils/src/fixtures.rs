//! Test fixtures and helpers.
//!
//! A small stone-age dataset and pre-built colonies for consistent testing.

use std::sync::Arc;

use civ_core::config::EngineConfig;
use civ_core::data::{GameData, ResourceBundle};
use civ_core::simulation::Colony;

/// Stone-age dataset: five resources, six buildings, five technologies and
/// eight achievements.
pub const STONE_AGE_RON: &str = r#"GameData(
    resources: [
        ResourceData(id: "food", name: "Food", base_storage: 1000.0),
        ResourceData(id: "wood", name: "Wood", base_storage: 800.0),
        ResourceData(id: "stone", name: "Stone", base_storage: 800.0),
        ResourceData(id: "knowledge", name: "Knowledge", category: special, base_storage: 500.0),
        ResourceData(id: "gold", name: "Gold", category: special, base_storage: 1000.0),
    ],
    buildings: [
        BuildingData(
            id: "camp",
            name: "Camp",
            kind: population,
            max_level: 5,
            build_cost: {"wood": 10.0},
            build_time: 5.0,
            upgrade_time: 10.0,
            population: 5.0,
        ),
        BuildingData(
            id: "gathering_post",
            name: "Gathering Post",
            kind: production,
            max_level: 5,
            build_cost: {"wood": 20.0, "stone": 10.0},
            build_time: 10.0,
            upgrade_time: 15.0,
            production: {"food": 2.0},
        ),
        BuildingData(
            id: "lumber_camp",
            name: "Lumber Camp",
            kind: production,
            max_level: 5,
            build_cost: {"stone": 15.0},
            build_time: 8.0,
            upgrade_time: 12.0,
            production: {"wood": 1.0},
        ),
        BuildingData(
            id: "quarry",
            name: "Quarry",
            kind: production,
            max_level: 5,
            build_cost: {"wood": 15.0},
            build_time: 8.0,
            upgrade_time: 12.0,
            production: {"stone": 0.8},
        ),
        BuildingData(
            id: "bonfire",
            name: "Bonfire",
            kind: functional,
            max_level: 3,
            build_cost: {"wood": 5.0, "stone": 5.0},
            upgrade_cost_multiplier: 1.5,
            build_time: 5.0,
            upgrade_time: 8.0,
            consumption: {"wood": 0.2},
            production: {"knowledge": 0.1},
        ),
        BuildingData(
            id: "storage_house",
            name: "Storage House",
            kind: storage,
            max_level: 5,
            build_cost: {"wood": 40.0, "stone": 20.0},
            upgrade_cost_multiplier: 1.8,
            build_time: 20.0,
            upgrade_time: 30.0,
            capacity: {"wood": 400.0, "stone": 400.0},
            requirements: [Technology("pottery")],
        ),
    ],
    technologies: [
        TechData(
            id: "fire",
            name: "Fire",
            research_cost: {"food": 50.0, "wood": 20.0},
            research_time: 10.0,
            effects: [ResourceMultiplier(resource: "food", factor: 1.2)],
            unlocks: ["bonfire"],
        ),
        TechData(
            id: "stone_tools",
            name: "Stone Tools",
            research_cost: {"stone": 30.0, "wood": 15.0},
            research_time: 15.0,
            effects: [
                ResourceMultiplier(resource: "wood", factor: 1.3),
                ResourceMultiplier(resource: "stone", factor: 1.3),
            ],
        ),
        TechData(
            id: "shelter",
            name: "Shelter",
            research_cost: {"wood": 50.0, "stone": 30.0},
            research_time: 20.0,
            effects: [PopulationGrowth(1.2)],
        ),
        TechData(
            id: "pottery",
            name: "Pottery",
            research_cost: {"stone": 40.0, "wood": 20.0},
            research_time: 18.0,
            prerequisites: ["fire"],
            unlocks: ["storage_house"],
        ),
        TechData(
            id: "agriculture",
            name: "Agriculture",
            era: bronze,
            research_cost: {"food": 150.0, "wood": 80.0},
            research_time: 25.0,
            prerequisites: ["shelter"],
            effects: [ResourceMultiplier(resource: "food", factor: 2.0), ResearchSpeedBonus(1.1)],
        ),
    ],
    achievements: [
        AchievementData(
            id: "first_step",
            name: "First Step",
            condition: Building(count: 1),
            reward: {"knowledge": 10.0},
            permanent_effect: Some(ResourceMultiplier(resource: "knowledge", factor: 1.05)),
        ),
        AchievementData(
            id: "bronze_age",
            name: "Bronze Age",
            condition: Era(1),
            reward: {"gold": 50.0, "knowledge": 50.0},
        ),
        AchievementData(
            id: "tech_novice",
            name: "Tech Novice",
            category: technology,
            condition: Technology(3),
            reward: {"knowledge": 25.0},
        ),
        AchievementData(
            id: "builder",
            name: "Builder",
            category: building,
            condition: Building(filter: Kind(production), count: 3),
            reward: {"wood": 50.0},
            permanent_effect: Some(BuildSpeedBonus(1.1)),
        ),
        AchievementData(
            id: "master_builder",
            name: "Master Builder",
            category: building,
            condition: Building(filter: MaxLevel, count: 1),
            reward: {"gold": 100.0},
        ),
        AchievementData(
            id: "growing_tribe",
            name: "Growing Tribe",
            category: population,
            condition: Population(15.0),
            reward: {"food": 100.0},
        ),
        AchievementData(
            id: "hoarder",
            name: "Hoarder",
            category: resource,
            condition: Resource("food", 900.0),
            reward: {"gold": 20.0},
        ),
        AchievementData(
            id: "veteran",
            name: "Veteran",
            category: special,
            condition: GameTime(3600.0),
            reward: {"gold": 200.0},
        ),
    ],
)"#;

/// Building IDs in [`STONE_AGE_RON`].
pub const BUILDING_IDS: [&str; 6] = [
    "camp",
    "gathering_post",
    "lumber_camp",
    "quarry",
    "bonfire",
    "storage_house",
];

/// Technology IDs in [`STONE_AGE_RON`].
pub const TECH_IDS: [&str; 5] = ["fire", "stone_tools", "shelter", "pottery", "agriculture"];

/// Parse and validate the stone-age dataset.
///
/// # Panics
///
/// Panics if the fixture document is invalid.
#[must_use]
pub fn stone_age_data() -> Arc<GameData> {
    match GameData::load_validated("stone_age", STONE_AGE_RON) {
        Ok(data) => Arc::new(data),
        Err(e) => panic!("stone-age fixture is invalid: {e}"),
    }
}

/// Config that starts with enough stock to afford anything early.
#[must_use]
pub fn rich_config() -> EngineConfig {
    EngineConfig {
        starting_resources: ResourceBundle::from([
            ("food", 900.0),
            ("wood", 700.0),
            ("stone", 700.0),
        ]),
        ..EngineConfig::default()
    }
}

/// A freshly founded colony with default config, founded at time 0.
#[must_use]
pub fn new_colony() -> Colony {
    Colony::new(stone_age_data(), EngineConfig::default(), 0)
}

/// A freshly founded colony with [`rich_config`].
#[must_use]
pub fn rich_colony() -> Colony {
    Colony::new(stone_age_data(), rich_config(), 0)
}

/// A rich colony with the four basic buildings finished and fire
/// researched.
///
/// # Panics
///
/// Panics if the fixture commands are rejected.
#[must_use]
pub fn established_colony() -> Colony {
    let mut colony = rich_colony();
    for id in ["camp", "gathering_post", "lumber_camp", "quarry"] {
        if let Err(e) = colony.build(id) {
            panic!("fixture build of {id} failed: {e}");
        }
    }
    if let Err(e) = colony.start_research("fire") {
        panic!("fixture research failed: {e}");
    }
    colony.run_ticks(20);
    colony
}
