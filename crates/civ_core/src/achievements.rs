//! Achievement evaluation.
//!
//! Scans every locked achievement against a read-only view of the colony,
//! recomputing its progress from scratch. An achievement that reaches 100%
//! unlocks exactly once; the caller then grants its reward and queues its
//! permanent effect.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::buildings::ConstructionEngine;
use crate::data::{AchievementCondition, Era, GameData};
use crate::economy::ResourceLedger;

/// How many recent unlocks are remembered for display.
pub const RECENT_UNLOCKS: usize = 5;

/// Runtime state of one achievement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementInstance {
    /// Achievement definition ID.
    pub achievement_id: String,
    /// Set once, never cleared.
    pub unlocked: bool,
    /// Progress percentage (0-100).
    pub progress: f64,
    /// Game time of the unlock.
    pub unlocked_at: Option<f64>,
}

/// Read-only view of the colony used for one scan.
#[derive(Debug, Clone, Copy)]
pub struct AchievementContext<'a> {
    /// Definitions.
    pub data: &'a GameData,
    /// Current era.
    pub era: Era,
    /// Stockpiles.
    pub ledger: &'a ResourceLedger,
    /// Buildings.
    pub construction: &'a ConstructionEngine,
    /// Number of researched technologies.
    pub researched: usize,
    /// Current population.
    pub population: f64,
    /// Accumulated game time in seconds.
    pub game_time: f64,
}

/// Completion summary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AchievementSummary {
    /// Unlocked achievements.
    pub unlocked: usize,
    /// All achievements.
    pub total: usize,
    /// `unlocked / total` as a percentage.
    pub percentage: f64,
}

/// Owns every achievement instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AchievementTracker {
    instances: BTreeMap<String, AchievementInstance>,
    recent: VecDeque<String>,
}

/// Percentage of `value` toward `target`, clamped to `[0, 100]`.
fn percent(value: f64, target: f64) -> f64 {
    if target <= 0.0 {
        return 100.0;
    }
    (value / target * 100.0).clamp(0.0, 100.0)
}

impl AchievementTracker {
    /// Create one locked instance per achievement definition.
    #[must_use]
    pub fn from_data(data: &GameData) -> Self {
        Self {
            instances: data
                .achievements()
                .map(|a| {
                    (
                        a.id.clone(),
                        AchievementInstance {
                            achievement_id: a.id.clone(),
                            unlocked: false,
                            progress: 0.0,
                            unlocked_at: None,
                        },
                    )
                })
                .collect(),
            recent: VecDeque::with_capacity(RECENT_UNLOCKS),
        }
    }

    /// Get an achievement instance.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&AchievementInstance> {
        self.instances.get(id)
    }

    /// Iterate instances in ID order.
    pub fn instances(&self) -> impl Iterator<Item = &AchievementInstance> {
        self.instances.values()
    }

    /// Whether an achievement is unlocked.
    #[must_use]
    pub fn is_unlocked(&self, id: &str) -> bool {
        self.get(id).is_some_and(|a| a.unlocked)
    }

    /// Most recent unlocks, newest first.
    pub fn recent_unlocks(&self) -> impl Iterator<Item = &str> {
        self.recent.iter().map(String::as_str)
    }

    /// Completion summary.
    #[must_use]
    pub fn summary(&self) -> AchievementSummary {
        let total = self.instances.len();
        let unlocked = self.instances.values().filter(|a| a.unlocked).count();
        AchievementSummary {
            unlocked,
            total,
            percentage: if total == 0 {
                0.0
            } else {
                unlocked as f64 / total as f64 * 100.0
            },
        }
    }

    /// Progress of one condition against the current colony state.
    #[must_use]
    pub fn condition_progress(condition: &AchievementCondition, ctx: &AchievementContext<'_>) -> f64 {
        match condition {
            AchievementCondition::Era(target) => {
                let reached = ctx.era.ordinal();
                if reached >= *target {
                    100.0
                } else {
                    percent(f64::from(reached), f64::from(*target))
                }
            }
            AchievementCondition::Resource(id, target) => percent(ctx.ledger.amount(id), *target),
            AchievementCondition::Building { filter, count } => percent(
                ctx.construction.count_matching(*filter, ctx.data) as f64,
                f64::from(*count),
            ),
            AchievementCondition::Technology(count) => {
                percent(ctx.researched as f64, f64::from(*count))
            }
            AchievementCondition::Population(target) => percent(ctx.population, *target),
            AchievementCondition::GameTime(target) => percent(ctx.game_time, *target),
        }
    }

    /// Re-evaluate every locked achievement.
    ///
    /// Returns the IDs unlocked by this scan. Already unlocked achievements
    /// are skipped, so repeated scans never unlock anything twice.
    pub fn check_achievements(&mut self, ctx: &AchievementContext<'_>) -> Vec<String> {
        let mut unlocked = Vec::new();

        for instance in self.instances.values_mut().filter(|a| !a.unlocked) {
            let Some(definition) = ctx.data.achievement(&instance.achievement_id) else {
                continue;
            };
            instance.progress = Self::condition_progress(&definition.condition, ctx);
            if instance.progress >= 100.0 {
                instance.unlocked = true;
                instance.unlocked_at = Some(ctx.game_time);
                tracing::info!(achievement = %instance.achievement_id, "Achievement unlocked");
                unlocked.push(instance.achievement_id.clone());
            }
        }

        for id in &unlocked {
            self.push_recent(id.clone());
        }
        unlocked
    }

    fn push_recent(&mut self, id: String) {
        self.recent.push_front(id);
        self.recent.truncate(RECENT_UNLOCKS);
    }

    /// Overwrite an achievement from persisted state.
    pub fn restore(&mut self, id: &str, unlocked: bool, progress: f64) {
        if let Some(instance) = self.instances.get_mut(id) {
            instance.unlocked = unlocked;
            instance.progress = if unlocked {
                100.0
            } else {
                progress.clamp(0.0, 100.0)
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buildings::BuildingStatus;
    use crate::data::{
        AchievementCategory, AchievementData, BuildingData, BuildingFilter, BuildingKind,
        ResourceBundle, ResourceData,
    };

    fn data() -> GameData {
        let mut data = GameData::new();
        data.register_resource(ResourceData {
            id: "food".to_string(),
            name: "Food".to_string(),
            category: Default::default(),
            era: Default::default(),
            base_storage: 1000.0,
        });
        data.register_building(BuildingData {
            id: "camp".to_string(),
            name: "Camp".to_string(),
            kind: BuildingKind::Population,
            era: Era::Stone,
            max_level: 2,
            build_cost: ResourceBundle::new(),
            upgrade_cost_multiplier: 2.0,
            build_time: 5.0,
            upgrade_time: 10.0,
            production: ResourceBundle::new(),
            consumption: ResourceBundle::new(),
            capacity: ResourceBundle::new(),
            population: 5.0,
            requirements: vec![],
        });
        for (id, condition) in [
            (
                "first_step",
                AchievementCondition::Building {
                    filter: BuildingFilter::Any,
                    count: 1,
                },
            ),
            ("hoarder", AchievementCondition::Resource("food".to_string(), 500.0)),
            ("iron_age", AchievementCondition::Era(2)),
            (
                "maxed",
                AchievementCondition::Building {
                    filter: BuildingFilter::MaxLevel,
                    count: 1,
                },
            ),
        ] {
            data.register_achievement(AchievementData {
                id: id.to_string(),
                name: id.to_string(),
                category: AchievementCategory::Progress,
                condition,
                reward: ResourceBundle::new(),
                permanent_effect: None,
            });
        }
        data
    }

    fn ctx<'a>(
        data: &'a GameData,
        ledger: &'a ResourceLedger,
        construction: &'a ConstructionEngine,
    ) -> AchievementContext<'a> {
        AchievementContext {
            data,
            era: Era::Bronze,
            ledger,
            construction,
            researched: 0,
            population: 10.0,
            game_time: 42.0,
        }
    }

    #[test]
    fn test_progress_is_derived() {
        let data = data();
        let mut ledger = ResourceLedger::from_data(&data);
        ledger.add_resource("food", 250.0);
        let construction = ConstructionEngine::new();
        let mut tracker = AchievementTracker::from_data(&data);

        assert!(tracker.check_achievements(&ctx(&data, &ledger, &construction)).is_empty());
        assert_eq!(tracker.get("hoarder").unwrap().progress, 50.0);
        assert_eq!(tracker.get("iron_age").unwrap().progress, 50.0);
        assert_eq!(tracker.get("first_step").unwrap().progress, 0.0);
    }

    #[test]
    fn test_unlocks_exactly_once() {
        let data = data();
        let ledger = ResourceLedger::from_data(&data);
        let mut construction = ConstructionEngine::new();
        construction.restore("camp", 1, BuildingStatus::Building, &data, 0.0);
        let mut tracker = AchievementTracker::from_data(&data);

        let first = tracker.check_achievements(&ctx(&data, &ledger, &construction));
        assert_eq!(first, vec!["first_step".to_string()]);
        let instance = tracker.get("first_step").unwrap();
        assert!(instance.unlocked);
        assert_eq!(instance.unlocked_at, Some(42.0));

        let second = tracker.check_achievements(&ctx(&data, &ledger, &construction));
        assert!(second.is_empty());
        assert_eq!(tracker.summary().unlocked, 1);
        assert_eq!(tracker.summary().percentage, 25.0);
    }

    #[test]
    fn test_max_level_filter() {
        let data = data();
        let ledger = ResourceLedger::from_data(&data);
        let mut construction = ConstructionEngine::new();
        construction.restore("camp", 2, BuildingStatus::Built, &data, 0.0);
        let mut tracker = AchievementTracker::from_data(&data);

        let unlocked = tracker.check_achievements(&ctx(&data, &ledger, &construction));
        assert!(unlocked.contains(&"maxed".to_string()));
    }

    #[test]
    fn test_recent_unlocks_capped() {
        let mut tracker = AchievementTracker::default();
        for i in 0..7 {
            tracker.push_recent(format!("a{i}"));
        }
        let recent: Vec<&str> = tracker.recent_unlocks().collect();
        assert_eq!(recent, vec!["a6", "a5", "a4", "a3", "a2"]);
    }
}
