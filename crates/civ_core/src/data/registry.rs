//! Read-only registry of every definition the engine consumes by ID.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::{
    AchievementCondition, AchievementData, BuildingData, Effect, Requirement, ResourceBundle,
    ResourceData, TechData,
};
use crate::error::{GameError, Result};

/// On-disk layout of a dataset document.
///
/// # Example RON
///
/// ```ron
/// GameData(
///     resources: [
///         ResourceData(id: "food", name: "Food", base_storage: 1000.0),
///     ],
///     buildings: [],
///     technologies: [],
///     achievements: [],
/// )
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename = "GameData")]
struct GameDataDocument {
    #[serde(default)]
    resources: Vec<ResourceData>,
    #[serde(default)]
    buildings: Vec<BuildingData>,
    #[serde(default)]
    technologies: Vec<TechData>,
    #[serde(default)]
    achievements: Vec<AchievementData>,
}

/// Registry containing all resource, building, technology and achievement
/// definitions.
///
/// Every table is a `BTreeMap` so iteration is ordered by ID. Lookups of
/// unknown IDs return `None`; callers treat that as a no-op.
#[derive(Debug, Clone, Default)]
pub struct GameData {
    resources: BTreeMap<String, ResourceData>,
    buildings: BTreeMap<String, BuildingData>,
    technologies: BTreeMap<String, TechData>,
    achievements: BTreeMap<String, AchievementData>,
}

impl GameData {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a RON dataset document.
    ///
    /// `label` names the document in error messages (usually its path).
    /// Duplicate IDs are resolved last-wins; use [`validate`](Self::validate)
    /// to check references.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::DataParseError`] if the document is malformed.
    pub fn from_ron_str(label: &str, text: &str) -> Result<Self> {
        let document: GameDataDocument =
            ron::from_str(text).map_err(|e| GameError::DataParseError {
                path: label.to_string(),
                message: e.to_string(),
            })?;

        let mut data = Self::new();
        document.resources.into_iter().for_each(|r| data.register_resource(r));
        document.buildings.into_iter().for_each(|b| data.register_building(b));
        document
            .technologies
            .into_iter()
            .for_each(|t| data.register_technology(t));
        document
            .achievements
            .into_iter()
            .for_each(|a| data.register_achievement(a));
        Ok(data)
    }

    /// Parse and validate a RON dataset document.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::DataParseError`] on malformed input and
    /// [`GameError::InvalidGameData`] if validation reports any problem.
    pub fn load_validated(label: &str, text: &str) -> Result<Self> {
        let data = Self::from_ron_str(label, text)?;
        let errors = data.validate();
        if errors.is_empty() {
            Ok(data)
        } else {
            Err(GameError::InvalidGameData(errors))
        }
    }

    /// Merge another registry into this one (entries in `other` win).
    pub fn extend(&mut self, other: Self) {
        self.resources.extend(other.resources);
        self.buildings.extend(other.buildings);
        self.technologies.extend(other.technologies);
        self.achievements.extend(other.achievements);
    }

    /// Register a resource definition.
    pub fn register_resource(&mut self, resource: ResourceData) {
        self.resources.insert(resource.id.clone(), resource);
    }

    /// Register a building definition.
    pub fn register_building(&mut self, building: BuildingData) {
        self.buildings.insert(building.id.clone(), building);
    }

    /// Register a technology definition.
    pub fn register_technology(&mut self, tech: TechData) {
        self.technologies.insert(tech.id.clone(), tech);
    }

    /// Register an achievement definition.
    pub fn register_achievement(&mut self, achievement: AchievementData) {
        self.achievements.insert(achievement.id.clone(), achievement);
    }

    /// Get a resource definition by ID.
    #[must_use]
    pub fn resource(&self, id: &str) -> Option<&ResourceData> {
        self.resources.get(id)
    }

    /// Get a building definition by ID.
    #[must_use]
    pub fn building(&self, id: &str) -> Option<&BuildingData> {
        self.buildings.get(id)
    }

    /// Get a technology definition by ID.
    #[must_use]
    pub fn technology(&self, id: &str) -> Option<&TechData> {
        self.technologies.get(id)
    }

    /// Get an achievement definition by ID.
    #[must_use]
    pub fn achievement(&self, id: &str) -> Option<&AchievementData> {
        self.achievements.get(id)
    }

    /// All resource definitions, ordered by ID.
    pub fn resources(&self) -> impl Iterator<Item = &ResourceData> {
        self.resources.values()
    }

    /// All building definitions, ordered by ID.
    pub fn buildings(&self) -> impl Iterator<Item = &BuildingData> {
        self.buildings.values()
    }

    /// All technology definitions, ordered by ID.
    pub fn technologies(&self) -> impl Iterator<Item = &TechData> {
        self.technologies.values()
    }

    /// All achievement definitions, ordered by ID.
    pub fn achievements(&self) -> impl Iterator<Item = &AchievementData> {
        self.achievements.values()
    }

    /// Number of technology definitions.
    #[must_use]
    pub fn technology_count(&self) -> usize {
        self.technologies.len()
    }

    /// Number of achievement definitions.
    #[must_use]
    pub fn achievement_count(&self) -> usize {
        self.achievements.len()
    }

    /// Check every cross-reference in the dataset.
    ///
    /// Returns a list of human-readable problems; an empty list means the
    /// dataset is consistent.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for resource in self.resources.values() {
            if resource.base_storage < 0.0 {
                errors.push(format!(
                    "Resource '{}' has negative base storage",
                    resource.id
                ));
            }
        }

        for building in self.buildings.values() {
            if building.max_level == 0 {
                errors.push(format!("Building '{}' has max_level 0", building.id));
            }
            if building.upgrade_cost_multiplier <= 0.0 {
                errors.push(format!(
                    "Building '{}' has non-positive upgrade_cost_multiplier",
                    building.id
                ));
            }
            let owner = format!("Building '{}'", building.id);
            for (label, bundle) in [
                ("build cost", &building.build_cost),
                ("production", &building.production),
                ("consumption", &building.consumption),
                ("capacity", &building.capacity),
            ] {
                self.check_bundle(&owner, label, bundle, &mut errors);
            }
            for requirement in &building.requirements {
                match requirement {
                    Requirement::Building(id) if self.building(id).is_none() => {
                        errors.push(format!(
                            "Building '{}' requires unknown building '{id}'",
                            building.id
                        ));
                    }
                    Requirement::Technology(id) if self.technology(id).is_none() => {
                        errors.push(format!(
                            "Building '{}' requires unknown technology '{id}'",
                            building.id
                        ));
                    }
                    Requirement::Resource(id, _) if self.resource(id).is_none() => {
                        errors.push(format!(
                            "Building '{}' requires unknown resource '{id}'",
                            building.id
                        ));
                    }
                    _ => {}
                }
            }
        }

        for tech in self.technologies.values() {
            self.check_bundle(
                &format!("Tech '{}'", tech.id),
                "research cost",
                &tech.research_cost,
                &mut errors,
            );
            for prereq_id in &tech.prerequisites {
                if self.technology(prereq_id).is_none() {
                    errors.push(format!(
                        "Tech '{}' has unknown prerequisite '{prereq_id}'",
                        tech.id
                    ));
                }
            }
            for building_id in &tech.unlocks {
                if self.building(building_id).is_none() {
                    errors.push(format!(
                        "Tech '{}' unlocks unknown building '{building_id}'",
                        tech.id
                    ));
                }
            }
            for effect in &tech.effects {
                self.check_effect(&format!("Tech '{}'", tech.id), effect, &mut errors);
            }
        }

        for achievement in self.achievements.values() {
            let owner = format!("Achievement '{}'", achievement.id);
            if let AchievementCondition::Resource(id, _) = &achievement.condition {
                if self.resource(id).is_none() {
                    errors.push(format!("{owner} tracks unknown resource '{id}'"));
                }
            }
            self.check_bundle(&owner, "reward", &achievement.reward, &mut errors);
            if let Some(effect) = &achievement.permanent_effect {
                self.check_effect(&owner, effect, &mut errors);
            }
        }

        errors.extend(self.prerequisite_cycles());
        errors
    }

    /// Every entry must name a known resource with a finite, non-negative
    /// amount.
    fn check_bundle(
        &self,
        owner: &str,
        label: &str,
        bundle: &ResourceBundle,
        errors: &mut Vec<String>,
    ) {
        for (resource, amount) in bundle.iter() {
            if self.resource(resource).is_none() {
                errors.push(format!(
                    "{owner} {label} references unknown resource '{resource}'"
                ));
            }
            if !amount.is_finite() || amount < 0.0 {
                errors.push(format!(
                    "{owner} {label} has invalid amount {amount} for '{resource}'"
                ));
            }
        }
    }

    fn check_effect(&self, owner: &str, effect: &Effect, errors: &mut Vec<String>) {
        if effect.factor() <= 0.0 {
            errors.push(format!("{owner} has a non-positive effect factor"));
        }
        if let Effect::ResourceMultiplier { resource, .. } = effect {
            if self.resource(resource).is_none() {
                errors.push(format!("{owner} multiplies unknown resource '{resource}'"));
            }
        }
    }

    /// Report every technology that participates in a prerequisite cycle.
    fn prerequisite_cycles(&self) -> Vec<String> {
        // Kahn's algorithm: whatever cannot be peeled off sits on a cycle.
        let mut remaining: BTreeMap<&str, BTreeSet<&str>> = self
            .technologies
            .values()
            .map(|t| {
                let prereqs = t
                    .prerequisites
                    .iter()
                    .map(String::as_str)
                    .filter(|p| self.technologies.contains_key(*p))
                    .collect();
                (t.id.as_str(), prereqs)
            })
            .collect();

        loop {
            let ready: Vec<&str> = remaining
                .iter()
                .filter(|(_, prereqs)| prereqs.is_empty())
                .map(|(id, _)| *id)
                .collect();
            if ready.is_empty() {
                break;
            }
            for id in &ready {
                remaining.remove(id);
            }
            for prereqs in remaining.values_mut() {
                for id in &ready {
                    prereqs.remove(id);
                }
            }
        }

        remaining
            .keys()
            .map(|id| format!("Tech '{id}' is part of a prerequisite cycle"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"GameData(
        resources: [
            ResourceData(id: "food", name: "Food", base_storage: 1000.0),
            ResourceData(id: "wood", name: "Wood", base_storage: 800.0),
        ],
        buildings: [
            BuildingData(
                id: "gathering_post",
                name: "Gathering Post",
                kind: production,
                max_level: 5,
                build_cost: {"wood": 20.0},
                build_time: 10.0,
                upgrade_time: 15.0,
                production: {"food": 2.0},
            ),
        ],
        technologies: [
            TechData(
                id: "fire",
                name: "Fire",
                research_cost: {"food": 50.0},
                research_time: 10.0,
                effects: [ResourceMultiplier(resource: "food", factor: 1.2)],
            ),
            TechData(
                id: "pottery",
                name: "Pottery",
                research_time: 18.0,
                prerequisites: ["fire"],
            ),
        ],
        achievements: [
            AchievementData(
                id: "first_step",
                name: "First Step",
                condition: Building(count: 1),
                reward: {"food": 10.0},
            ),
        ],
    )"#;

    #[test]
    fn test_parse_sample() {
        let data = GameData::from_ron_str("sample", SAMPLE).unwrap();
        assert_eq!(data.resources().count(), 2);
        assert!(data.building("gathering_post").is_some());
        assert!(data.technology("pottery").unwrap().requires("fire"));
        assert_eq!(data.achievement_count(), 1);
        assert!(data.validate().is_empty());
    }

    #[test]
    fn test_unknown_lookup_is_none() {
        let data = GameData::from_ron_str("sample", SAMPLE).unwrap();
        assert!(data.building("castle").is_none());
        assert!(data.technology("warp_drive").is_none());
    }

    #[test]
    fn test_parse_error_names_document() {
        let err = GameData::from_ron_str("broken.ron", "GameData(resources: [").unwrap_err();
        assert!(err.to_string().contains("broken.ron"));
    }

    #[test]
    fn test_validate_reports_dangling_references() {
        let mut data = GameData::from_ron_str("sample", SAMPLE).unwrap();
        let mut tech = data.technology("pottery").unwrap().clone();
        tech.prerequisites.push("writing".to_string());
        tech.research_cost.insert("gold", 5.0);
        data.register_technology(tech);

        let errors = data.validate();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.contains("unknown prerequisite 'writing'")));
        assert!(errors.iter().any(|e| e.contains("unknown resource 'gold'")));
    }

    #[test]
    fn test_validate_rejects_negative_amounts() {
        let mut data = GameData::from_ron_str("sample", SAMPLE).unwrap();
        let mut post = data.building("gathering_post").unwrap().clone();
        post.build_cost.insert("wood", -1000.0);
        post.consumption.insert("food", -1.0);
        data.register_building(post);
        let mut fire = data.technology("fire").unwrap().clone();
        fire.research_cost.insert("food", -50.0);
        data.register_technology(fire);

        let errors = data.validate();
        assert_eq!(errors.len(), 3);
        assert!(errors
            .iter()
            .any(|e| e.contains("'gathering_post' build cost has invalid amount -1000")));
        assert!(errors
            .iter()
            .any(|e| e.contains("'gathering_post' consumption has invalid amount -1")));
        assert!(errors
            .iter()
            .any(|e| e.contains("'fire' research cost has invalid amount -50")));

        let negative_reward = SAMPLE.replace(r#"reward: {"food": 10.0}"#, r#"reward: {"food": -10.0}"#);
        assert!(GameData::load_validated("sample", &negative_reward).is_err());
    }

    #[test]
    fn test_validate_detects_cycles() {
        let mut data = GameData::from_ron_str("sample", SAMPLE).unwrap();
        let mut fire = data.technology("fire").unwrap().clone();
        fire.prerequisites.push("pottery".to_string());
        data.register_technology(fire);

        let errors = data.validate();
        assert!(errors.iter().any(|e| e.contains("'fire' is part of a prerequisite cycle")));
        assert!(errors.iter().any(|e| e.contains("'pottery' is part of a prerequisite cycle")));
    }

    #[test]
    fn test_load_validated_rejects_bad_data() {
        let broken = SAMPLE.replace("max_level: 5", "max_level: 0");
        let err = GameData::load_validated("sample", &broken).unwrap_err();
        assert!(matches!(err, GameError::InvalidGameData(ref e) if e.len() == 1));
    }
}
