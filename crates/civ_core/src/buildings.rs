//! Building construction and upgrades.
//!
//! The colony holds at most one instance per building definition: the
//! instance records the level reached and whether work is in progress.
//!
//! # Lifecycle
//!
//! ```text
//! (none) --build--> Building --done--> Built --upgrade--> Upgrading --done--> Built
//! ```
//!
//! Costs are deducted when work starts. Durations are measured on the
//! colony's active simulation clock (`now`, seconds), so progress and
//! remaining time are pure functions of `now - started_at`.
//!
//! Production and consumption rates are never patched incrementally: any
//! completion triggers [`ConstructionEngine::recalculate_production`], which
//! rebuilds every rate from the set of `Built` instances.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::EngineConfig;
use crate::data::{BuildingData, BuildingFilter, Era, GameData, Requirement, ResourceBundle};
use crate::economy::ResourceLedger;
use crate::population::PopulationModel;
use crate::research::ResearchEngine;

/// Lifecycle state of a building instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingStatus {
    /// First construction in progress.
    Building,
    /// Operational.
    Built,
    /// Upgrade to the next level in progress.
    Upgrading,
}

impl BuildingStatus {
    /// Whether construction or an upgrade is running.
    #[must_use]
    pub const fn is_in_progress(self) -> bool {
        matches!(self, Self::Building | Self::Upgrading)
    }
}

/// Runtime state of one building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingInstance {
    /// Building definition ID.
    pub building_id: String,
    /// Current level (upgrades in progress have not incremented it yet).
    pub level: u32,
    /// Lifecycle state.
    pub status: BuildingStatus,
    /// Active-clock time the current work started (present while in
    /// progress).
    pub started_at: Option<f64>,
}

/// Why a building cannot be built or upgraded.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConstructionError {
    /// No definition with this ID.
    #[error("Building does not exist")]
    UnknownBuilding,
    /// Already at the highest level.
    #[error("Building is already at maximum level")]
    MaxLevel,
    /// Construction or an upgrade is already running.
    #[error("Building is already under construction")]
    InProgress,
    /// The current era does not match.
    #[error("Requires the {0} era")]
    WrongEra(Era),
    /// Another building must exist first.
    #[error("Requires building '{0}'")]
    MissingBuilding(String),
    /// A technology must be researched first.
    #[error("Requires technology '{0}'")]
    MissingTechnology(String),
    /// A stockpile threshold is not met.
    #[error("Requires {1} {0}")]
    ResourceThreshold(String, f64),
    /// The population is too small.
    #[error("Requires a population of {0}")]
    PopulationThreshold(f64),
    /// The stockpile cannot cover the cost.
    #[error("Insufficient resources")]
    InsufficientResources,
}

/// Colony state that building requirements are checked against.
#[derive(Debug, Clone, Copy)]
pub struct BuildContext<'a> {
    /// Current era.
    pub era: Era,
    /// Current population.
    pub population: f64,
    /// Research state, for technology requirements.
    pub research: &'a ResearchEngine,
    /// Check every requirement kind, not only the era.
    pub enforce_all_requirements: bool,
}

/// Events generated by the construction system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstructionEvent {
    /// Construction started or an upgrade began.
    Started {
        /// Building definition ID.
        building_id: String,
        /// Level being worked toward.
        target_level: u32,
    },
    /// First construction finished.
    Completed {
        /// Building definition ID.
        building_id: String,
    },
    /// An upgrade finished.
    Upgraded {
        /// Building definition ID.
        building_id: String,
        /// New level.
        level: u32,
    },
}

/// Owns every building instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructionEngine {
    instances: BTreeMap<String, BuildingInstance>,
    speed_multiplier: f64,
}

impl Default for ConstructionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstructionEngine {
    /// Create an engine with no buildings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            instances: BTreeMap::new(),
            speed_multiplier: 1.0,
        }
    }

    /// Get a building instance.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&BuildingInstance> {
        self.instances.get(id)
    }

    /// Iterate instances in ID order.
    pub fn instances(&self) -> impl Iterator<Item = &BuildingInstance> {
        self.instances.values()
    }

    /// Number of building instances (any status).
    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Whether nothing has been built.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Level of a building (0 if never built).
    #[must_use]
    pub fn level(&self, id: &str) -> u32 {
        self.get(id).map_or(0, |b| b.level)
    }

    /// Global construction speed multiplier.
    #[must_use]
    pub const fn speed_multiplier(&self) -> f64 {
        self.speed_multiplier
    }

    /// Compound a build speed bonus.
    pub fn apply_speed_bonus(&mut self, factor: f64) {
        if factor > 0.0 {
            self.speed_multiplier *= factor;
        }
    }

    /// Count instances matching an achievement filter.
    #[must_use]
    pub fn count_matching(&self, filter: BuildingFilter, data: &GameData) -> usize {
        self.instances
            .values()
            .filter(|instance| match filter {
                BuildingFilter::Any => true,
                BuildingFilter::Kind(kind) => data
                    .building(&instance.building_id)
                    .is_some_and(|b| b.kind == kind),
                BuildingFilter::MaxLevel => data
                    .building(&instance.building_id)
                    .is_some_and(|b| instance.level >= b.max_level),
            })
            .count()
    }

    /// Cost of the next step for a building: the build cost if it does not
    /// exist yet, otherwise `ceil(build_cost * multiplier^level)`.
    #[must_use]
    pub fn next_cost(&self, building: &BuildingData) -> ResourceBundle {
        match self.get(&building.id) {
            None => building.build_cost.clone(),
            Some(instance) => upgrade_cost(building, instance.level),
        }
    }

    /// Cost of upgrading an existing building (`None` if it does not exist
    /// or is at maximum level).
    #[must_use]
    pub fn upgrade_cost(&self, id: &str, data: &GameData) -> Option<ResourceBundle> {
        let building = data.building(id)?;
        let instance = self.get(id)?;
        (instance.level < building.max_level).then(|| upgrade_cost(building, instance.level))
    }

    /// Check whether the next build/upgrade step can start.
    ///
    /// On success returns the cost that [`build_building`](Self::build_building)
    /// will deduct.
    ///
    /// # Errors
    ///
    /// Returns the first failing reason in priority order: unknown building,
    /// max level, in progress, era mismatch, other requirements (only with
    /// `enforce_all_requirements`), insufficient resources.
    pub fn can_build(
        &self,
        id: &str,
        data: &GameData,
        ledger: &ResourceLedger,
        ctx: &BuildContext<'_>,
    ) -> Result<ResourceBundle, ConstructionError> {
        let building = data.building(id).ok_or(ConstructionError::UnknownBuilding)?;

        if let Some(instance) = self.get(id) {
            if instance.level >= building.max_level {
                return Err(ConstructionError::MaxLevel);
            }
            if instance.status.is_in_progress() {
                return Err(ConstructionError::InProgress);
            }
        }

        if let Some(required) = building.required_era() {
            if required != ctx.era {
                return Err(ConstructionError::WrongEra(required));
            }
        }

        if ctx.enforce_all_requirements {
            self.check_requirements(building, ledger, ctx)?;
        }

        let cost = self.next_cost(building);
        if !ledger.has_enough(&cost) {
            return Err(ConstructionError::InsufficientResources);
        }
        Ok(cost)
    }

    fn check_requirements(
        &self,
        building: &BuildingData,
        ledger: &ResourceLedger,
        ctx: &BuildContext<'_>,
    ) -> Result<(), ConstructionError> {
        for requirement in &building.requirements {
            match requirement {
                Requirement::Era(_) => {}
                Requirement::Building(id) => {
                    if !self.instances.contains_key(id) {
                        return Err(ConstructionError::MissingBuilding(id.clone()));
                    }
                }
                Requirement::Technology(id) => {
                    if !ctx.research.is_researched(id) {
                        return Err(ConstructionError::MissingTechnology(id.clone()));
                    }
                }
                Requirement::Resource(id, amount) => {
                    if ledger.amount(id) < *amount {
                        return Err(ConstructionError::ResourceThreshold(id.clone(), *amount));
                    }
                }
                Requirement::Population(amount) => {
                    if ctx.population < *amount {
                        return Err(ConstructionError::PopulationThreshold(*amount));
                    }
                }
            }
        }
        Ok(())
    }

    /// Start construction of a new building or the upgrade of an existing one.
    ///
    /// # Errors
    ///
    /// Returns the [`can_build`](Self::can_build) failure without side
    /// effects.
    pub fn build_building(
        &mut self,
        id: &str,
        data: &GameData,
        ledger: &mut ResourceLedger,
        ctx: &BuildContext<'_>,
        now: f64,
    ) -> Result<ConstructionEvent, ConstructionError> {
        let cost = self.can_build(id, data, ledger, ctx)?;
        if !ledger.consume_resources(&cost) {
            return Err(ConstructionError::InsufficientResources);
        }

        let instance = self
            .instances
            .entry(id.to_string())
            .and_modify(|instance| {
                instance.status = BuildingStatus::Upgrading;
                instance.started_at = Some(now);
            })
            .or_insert_with(|| BuildingInstance {
                building_id: id.to_string(),
                level: 1,
                status: BuildingStatus::Building,
                started_at: Some(now),
            });

        let target_level = match instance.status {
            BuildingStatus::Upgrading => instance.level + 1,
            _ => instance.level,
        };
        tracing::info!(building = id, target_level, "Construction started");
        Ok(ConstructionEvent::Started {
            building_id: id.to_string(),
            target_level,
        })
    }

    /// Seconds the current work on `instance` takes.
    ///
    /// Construction uses `build_time`; the upgrade from level `n` uses
    /// `upgrade_time * upgrade_time_multiplier^(n-1)`. Both are divided by
    /// the build speed multiplier.
    #[must_use]
    pub fn required_duration(
        &self,
        instance: &BuildingInstance,
        building: &BuildingData,
        config: &EngineConfig,
    ) -> f64 {
        let base = match instance.status {
            BuildingStatus::Upgrading => {
                let exponent = instance.level.saturating_sub(1);
                building.upgrade_time
                    * config
                        .upgrade_time_multiplier
                        .powi(i32::try_from(exponent).unwrap_or(i32::MAX))
            }
            _ => building.build_time,
        };
        // Level scaling applies to upgrades only; the accumulated build-speed
        // bonus divides both.
        base / self.speed_multiplier
    }

    /// Complete every in-progress instance whose duration has elapsed.
    ///
    /// Completed constructions add their capacity to the ledger and their
    /// population to the population limit. Any completion triggers a full
    /// rate recalculation. Does nothing when no work is in progress.
    pub fn update_building_progress(
        &mut self,
        data: &GameData,
        config: &EngineConfig,
        ledger: &mut ResourceLedger,
        population: &mut PopulationModel,
        now: f64,
    ) -> Vec<ConstructionEvent> {
        let finished: Vec<String> = self
            .instances
            .values()
            .filter(|instance| instance.status.is_in_progress())
            .filter(|instance| {
                data.building(&instance.building_id).is_some_and(|building| {
                    let elapsed = now - instance.started_at.unwrap_or(now);
                    elapsed >= self.required_duration(instance, building, config)
                })
            })
            .map(|instance| instance.building_id.clone())
            .collect();

        let mut events = Vec::with_capacity(finished.len());
        for id in finished {
            let (Some(instance), Some(building)) = (self.instances.get_mut(&id), data.building(&id))
            else {
                continue;
            };
            instance.started_at = None;

            match instance.status {
                BuildingStatus::Building => {
                    instance.status = BuildingStatus::Built;
                    for (resource, amount) in building.capacity.iter() {
                        ledger.increase_capacity(resource, amount);
                    }
                    population.increase_max(building.population);
                    tracing::info!(building = %id, "Construction completed");
                    events.push(ConstructionEvent::Completed { building_id: id });
                }
                BuildingStatus::Upgrading => {
                    instance.status = BuildingStatus::Built;
                    instance.level += 1;
                    let level = instance.level;
                    tracing::info!(building = %id, level, "Upgrade completed");
                    events.push(ConstructionEvent::Upgraded {
                        building_id: id,
                        level,
                    });
                }
                BuildingStatus::Built => {}
            }
        }

        if !events.is_empty() {
            self.recalculate_production(data, config, ledger);
        }
        events
    }

    /// Level bonus applied to production and consumption.
    #[must_use]
    pub fn level_factor(level: u32, config: &EngineConfig) -> f64 {
        1.0 + config.production_increase_per_level * f64::from(level.saturating_sub(1))
    }

    /// Rebuild every production and consumption rate from scratch.
    pub fn recalculate_production(
        &self,
        data: &GameData,
        config: &EngineConfig,
        ledger: &mut ResourceLedger,
    ) {
        ledger.reset_rates();
        for instance in self.instances.values() {
            if instance.status != BuildingStatus::Built {
                continue;
            }
            let Some(building) = data.building(&instance.building_id) else {
                continue;
            };
            let factor = Self::level_factor(instance.level, config);
            for (resource, rate) in building.production.iter() {
                ledger.add_production(resource, rate * factor);
            }
            for (resource, rate) in building.consumption.iter() {
                ledger.add_consumption(resource, rate * factor);
            }
        }
    }

    /// Add the capacity of every building that has finished construction.
    pub fn apply_capacity(&self, data: &GameData, ledger: &mut ResourceLedger) {
        for instance in self.instances.values() {
            if instance.status == BuildingStatus::Building {
                continue;
            }
            if let Some(building) = data.building(&instance.building_id) {
                for (resource, amount) in building.capacity.iter() {
                    ledger.increase_capacity(resource, amount);
                }
            }
        }
    }

    /// Production per second of one building at its current level,
    /// before resource multipliers.
    #[must_use]
    pub fn effective_production(
        &self,
        id: &str,
        data: &GameData,
        config: &EngineConfig,
    ) -> ResourceBundle {
        match (self.get(id), data.building(id)) {
            (Some(instance), Some(building)) => building
                .production
                .scaled(Self::level_factor(instance.level, config)),
            _ => ResourceBundle::new(),
        }
    }

    /// Progress percentage of the current work (100 when built, 0 when
    /// unknown).
    #[must_use]
    pub fn building_progress(
        &self,
        id: &str,
        data: &GameData,
        config: &EngineConfig,
        now: f64,
    ) -> f64 {
        let (Some(instance), Some(building)) = (self.get(id), data.building(id)) else {
            return 0.0;
        };
        match instance.started_at {
            Some(start) if instance.status.is_in_progress() => {
                let required = self.required_duration(instance, building, config);
                if required <= 0.0 {
                    100.0
                } else {
                    ((now - start) / required * 100.0).clamp(0.0, 100.0)
                }
            }
            _ => 100.0,
        }
    }

    /// Seconds until the current work completes (0 when idle or unknown).
    #[must_use]
    pub fn remaining_time(&self, id: &str, data: &GameData, config: &EngineConfig, now: f64) -> f64 {
        let (Some(instance), Some(building)) = (self.get(id), data.building(id)) else {
            return 0.0;
        };
        match instance.started_at {
            Some(start) if instance.status.is_in_progress() => {
                (self.required_duration(instance, building, config) - (now - start)).max(0.0)
            }
            _ => 0.0,
        }
    }

    /// Insert a building from persisted state.
    ///
    /// In-progress work restarts at `now`; the level is clamped to the
    /// definition's range. Unknown buildings are skipped.
    pub fn restore(&mut self, id: &str, level: u32, status: BuildingStatus, data: &GameData, now: f64) {
        let Some(building) = data.building(id) else {
            return;
        };
        self.instances.insert(
            id.to_string(),
            BuildingInstance {
                building_id: id.to_string(),
                level: level.clamp(1, building.max_level.max(1)),
                status,
                started_at: status.is_in_progress().then_some(now),
            },
        );
    }
}

/// `ceil(build_cost * multiplier^level)` for each resource.
fn upgrade_cost(building: &BuildingData, level: u32) -> ResourceBundle {
    let factor = building
        .upgrade_cost_multiplier
        .powi(i32::try_from(level).unwrap_or(i32::MAX));
    building.build_cost.scaled(factor).ceil()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{BuildingKind, ResourceData};

    fn data() -> GameData {
        let mut data = GameData::new();
        for id in ["food", "wood", "stone"] {
            data.register_resource(ResourceData {
                id: id.to_string(),
                name: id.to_string(),
                category: Default::default(),
                era: Default::default(),
                base_storage: 1000.0,
            });
        }
        data.register_building(BuildingData {
            id: "camp".to_string(),
            name: "Camp".to_string(),
            kind: BuildingKind::Population,
            era: Era::Stone,
            max_level: 3,
            build_cost: ResourceBundle::from([("wood", 10.0)]),
            upgrade_cost_multiplier: 2.0,
            build_time: 5.0,
            upgrade_time: 10.0,
            production: ResourceBundle::new(),
            consumption: ResourceBundle::new(),
            capacity: ResourceBundle::from([("wood", 100.0)]),
            population: 5.0,
            requirements: vec![Requirement::Era(Era::Stone)],
        });
        data.register_building(BuildingData {
            id: "gathering_post".to_string(),
            name: "Gathering Post".to_string(),
            kind: BuildingKind::Production,
            era: Era::Stone,
            max_level: 5,
            build_cost: ResourceBundle::from([("wood", 20.0), ("stone", 10.0)]),
            upgrade_cost_multiplier: 2.0,
            build_time: 10.0,
            upgrade_time: 15.0,
            production: ResourceBundle::from([("food", 2.0)]),
            consumption: ResourceBundle::from([("wood", 0.5)]),
            capacity: ResourceBundle::new(),
            population: 0.0,
            requirements: vec![Requirement::Technology("fire".to_string())],
        });
        data
    }

    struct Fixture {
        data: GameData,
        config: EngineConfig,
        engine: ConstructionEngine,
        ledger: ResourceLedger,
        population: PopulationModel,
        research: ResearchEngine,
    }

    fn fixture() -> Fixture {
        let data = data();
        let config = EngineConfig::default();
        let mut ledger = ResourceLedger::from_data(&data);
        ledger.add_resource("wood", 500.0);
        ledger.add_resource("stone", 500.0);
        Fixture {
            research: ResearchEngine::from_data(&data),
            population: PopulationModel::new(&config),
            engine: ConstructionEngine::new(),
            ledger,
            config,
            data,
        }
    }

    fn ctx(research: &ResearchEngine) -> BuildContext<'_> {
        BuildContext {
            era: Era::Stone,
            population: 10.0,
            research,
            enforce_all_requirements: false,
        }
    }

    #[test]
    fn test_upgrade_cost_scaling() {
        let mut f = fixture();
        let ctx = ctx(&f.research);
        f.engine
            .build_building("camp", &f.data, &mut f.ledger, &ctx, 0.0)
            .unwrap();
        f.engine
            .update_building_progress(&f.data, &f.config, &mut f.ledger, &mut f.population, 5.0);
        let cost = f.engine.upgrade_cost("camp", &f.data).unwrap();
        assert_eq!(cost.get("wood"), 20.0);
    }

    #[test]
    fn test_construction_completes_after_build_time() {
        let mut f = fixture();
        let ctx = ctx(&f.research);
        f.engine
            .build_building("camp", &f.data, &mut f.ledger, &ctx, 0.0)
            .unwrap();
        assert_eq!(f.ledger.amount("wood"), 490.0);

        let events = f
            .engine
            .update_building_progress(&f.data, &f.config, &mut f.ledger, &mut f.population, 4.0);
        assert!(events.is_empty());
        let progress = f.engine.building_progress("camp", &f.data, &f.config, 4.0);
        assert!((progress - 80.0).abs() < 1e-9);
        assert_eq!(f.engine.remaining_time("camp", &f.data, &f.config, 4.0), 1.0);

        let events = f
            .engine
            .update_building_progress(&f.data, &f.config, &mut f.ledger, &mut f.population, 5.0);
        assert_eq!(
            events,
            vec![ConstructionEvent::Completed {
                building_id: "camp".to_string()
            }]
        );
        assert_eq!(f.engine.get("camp").unwrap().status, BuildingStatus::Built);
        assert_eq!(f.population.max, 25.0);
        assert_eq!(f.ledger.capacity("wood"), 1100.0);
    }

    #[test]
    fn test_upgrade_duration_scales_with_level() {
        let mut f = fixture();
        f.engine.restore("camp", 2, BuildingStatus::Upgrading, &f.data, 0.0);
        let instance = f.engine.get("camp").unwrap().clone();
        let camp = f.data.building("camp").unwrap();
        let expected = 10.0 * 1.8;
        assert!((f.engine.required_duration(&instance, camp, &f.config) - expected).abs() < 1e-9);

        let events = f.engine.update_building_progress(
            &f.data,
            &f.config,
            &mut f.ledger,
            &mut f.population,
            expected,
        );
        assert_eq!(
            events,
            vec![ConstructionEvent::Upgraded {
                building_id: "camp".to_string(),
                level: 3
            }]
        );
    }

    #[test]
    fn test_reason_priority() {
        let mut f = fixture();
        let ctx = ctx(&f.research);
        assert_eq!(
            f.engine.can_build("castle", &f.data, &f.ledger, &ctx),
            Err(ConstructionError::UnknownBuilding)
        );

        f.engine
            .build_building("camp", &f.data, &mut f.ledger, &ctx, 0.0)
            .unwrap();
        assert_eq!(
            f.engine.can_build("camp", &f.data, &f.ledger, &ctx),
            Err(ConstructionError::InProgress)
        );

        let bronze = BuildContext {
            era: Era::Bronze,
            ..ctx
        };
        assert_eq!(
            f.engine.can_build("gathering_post", &f.data, &f.ledger, &bronze),
            Ok(ResourceBundle::from([("wood", 20.0), ("stone", 10.0)]))
        );

        f.engine.restore("camp", 3, BuildingStatus::Built, &f.data, 0.0);
        assert_eq!(
            f.engine.can_build("camp", &f.data, &f.ledger, &bronze),
            Err(ConstructionError::MaxLevel)
        );
    }

    #[test]
    fn test_era_must_match_exactly() {
        let f = fixture();
        let bronze = BuildContext {
            era: Era::Bronze,
            ..ctx(&f.research)
        };
        assert_eq!(
            f.engine.can_build("camp", &f.data, &f.ledger, &bronze),
            Err(ConstructionError::WrongEra(Era::Stone))
        );
    }

    #[test]
    fn test_insufficient_resources_has_no_side_effects() {
        let mut f = fixture();
        f.ledger.set_amount("stone", 5.0);
        let ctx = ctx(&f.research);
        assert_eq!(
            f.engine
                .build_building("gathering_post", &f.data, &mut f.ledger, &ctx, 0.0),
            Err(ConstructionError::InsufficientResources)
        );
        assert!(f.engine.is_empty());
        assert_eq!(f.ledger.amount("wood"), 500.0);
    }

    #[test]
    fn test_technology_requirement_only_when_enforced() {
        let f = fixture();
        let mut strict = ctx(&f.research);
        assert!(f.engine.can_build("gathering_post", &f.data, &f.ledger, &strict).is_ok());
        strict.enforce_all_requirements = true;
        assert_eq!(
            f.engine.can_build("gathering_post", &f.data, &f.ledger, &strict),
            Err(ConstructionError::MissingTechnology("fire".to_string()))
        );
    }

    #[test]
    fn test_recalculation_applies_level_bonus() {
        let mut f = fixture();
        f.engine
            .restore("gathering_post", 3, BuildingStatus::Built, &f.data, 0.0);
        f.engine.recalculate_production(&f.data, &f.config, &mut f.ledger);
        f.engine.recalculate_production(&f.data, &f.config, &mut f.ledger);
        let food = f.ledger.get("food").unwrap();
        assert!((food.production_rate - 2.0 * 1.3).abs() < 1e-9);
        let wood = f.ledger.get("wood").unwrap();
        assert!((wood.consumption_rate - 0.5 * 1.3).abs() < 1e-9);
    }

    #[test]
    fn test_idle_update_is_noop() {
        let mut f = fixture();
        f.engine.restore("camp", 1, BuildingStatus::Built, &f.data, 0.0);
        let before = (f.engine.clone(), f.ledger.clone(), f.population);
        let events = f
            .engine
            .update_building_progress(&f.data, &f.config, &mut f.ledger, &mut f.population, 1e6);
        assert!(events.is_empty());
        assert_eq!((f.engine, f.ledger, f.population), before);
    }

    #[test]
    fn test_build_speed_bonus() {
        let mut f = fixture();
        f.engine.apply_speed_bonus(2.0);
        let ctx = ctx(&f.research);
        f.engine
            .build_building("camp", &f.data, &mut f.ledger, &ctx, 0.0)
            .unwrap();
        let events = f
            .engine
            .update_building_progress(&f.data, &f.config, &mut f.ledger, &mut f.population, 2.5);
        assert_eq!(events.len(), 1);
    }
}
