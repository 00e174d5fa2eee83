//! Population growth and starvation.

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::economy::ResourceLedger;

/// Outcome of one population update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopulationOutcome {
    /// Everyone was fed.
    Fed,
    /// Not enough food; the population declined.
    Starving,
}

/// Population of the colony.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PopulationModel {
    /// Current inhabitants.
    pub current: f64,
    /// Population limit.
    pub max: f64,
    /// Growth per second before bonuses.
    pub base_growth_rate: f64,
    /// Compounded population-growth bonus.
    pub growth_multiplier: f64,
}

impl PopulationModel {
    /// Create the starting population from configuration.
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            current: config.initial_population,
            max: config.initial_max_population,
            base_growth_rate: config.base_growth_rate,
            growth_multiplier: 1.0,
        }
    }

    /// Effective growth per second.
    #[must_use]
    pub fn growth_rate(&self) -> f64 {
        self.base_growth_rate * self.growth_multiplier
    }

    /// Raise the population limit.
    pub fn increase_max(&mut self, amount: f64) {
        self.max = (self.max + amount).max(0.0);
    }

    /// Compound a growth bonus.
    pub fn apply_growth_bonus(&mut self, factor: f64) {
        if factor > 0.0 {
            self.growth_multiplier *= factor;
        }
    }

    /// Advance the population by `delta_seconds`.
    ///
    /// If the food stockpile covers `current * food_per_capita * dt`, the food
    /// is eaten and the population grows toward `max`. Otherwise nothing is
    /// eaten and the population shrinks by `growth * dt * starvation_factor`.
    pub fn update(
        &mut self,
        ledger: &mut ResourceLedger,
        config: &EngineConfig,
        delta_seconds: f64,
    ) -> PopulationOutcome {
        let required = self.current * config.food_per_capita * delta_seconds;
        let growth = self.growth_rate() * delta_seconds;

        if ledger.consume_resource(&config.food_resource, required) {
            self.current = (self.current + growth).min(self.max).max(0.0);
            PopulationOutcome::Fed
        } else {
            let decline = growth * config.starvation_factor;
            self.current = (self.current - decline).min(self.max).max(0.0);
            PopulationOutcome::Starving
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{GameData, ResourceData};

    fn setup(food: f64) -> (PopulationModel, ResourceLedger, EngineConfig) {
        let config = EngineConfig::default();
        let mut data = GameData::new();
        data.register_resource(ResourceData {
            id: "food".to_string(),
            name: "Food".to_string(),
            category: Default::default(),
            era: Default::default(),
            base_storage: 1000.0,
        });
        let mut ledger = ResourceLedger::from_data(&data);
        ledger.add_resource("food", food);
        (PopulationModel::new(&config), ledger, config)
    }

    #[test]
    fn test_fed_population_grows() {
        let (mut pop, mut ledger, config) = setup(1000.0);
        let outcome = pop.update(&mut ledger, &config, 60.0);
        assert_eq!(outcome, PopulationOutcome::Fed);
        assert!((pop.current - 11.0).abs() < 1e-9);
        assert!((ledger.amount("food") - 700.0).abs() < 1e-9);
    }

    #[test]
    fn test_growth_clamped_at_max() {
        let (mut pop, mut ledger, config) = setup(1000.0);
        pop.current = 19.99;
        pop.update(&mut ledger, &config, 1.0);
        assert_eq!(pop.current, 20.0);
    }

    #[test]
    fn test_starvation_declines_without_eating() {
        let (mut pop, mut ledger, config) = setup(4.0);
        let outcome = pop.update(&mut ledger, &config, 1.0);
        assert_eq!(outcome, PopulationOutcome::Starving);
        assert_eq!(ledger.amount("food"), 4.0);
        let expected = 10.0 - (1.0 / 60.0) * 0.5;
        assert!((pop.current - expected).abs() < 1e-9);
    }

    #[test]
    fn test_growth_bonus_compounds() {
        let (mut pop, _, _) = setup(0.0);
        pop.apply_growth_bonus(1.2);
        pop.apply_growth_bonus(1.5);
        assert!((pop.growth_rate() - (1.0 / 60.0) * 1.8).abs() < 1e-12);
    }
}
