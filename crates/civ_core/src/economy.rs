//! Resource ledger.
//!
//! Tracks the stockpile, storage capacity, per-second rates and permanent
//! multiplier of every resource type, and applies the net flow each tick.
//!
//! Every mutation keeps `0 <= amount <= capacity`. Discrete spending
//! (build costs, research costs) fails without side effects when the
//! stockpile is short; continuous drain from consumption always succeeds and
//! floors at zero.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::data::{GameData, ResourceBundle};

/// Runtime state of one resource type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    /// Current stockpile.
    pub amount: f64,
    /// Storage limit.
    pub capacity: f64,
    /// Raw production per second from completed buildings.
    pub production_rate: f64,
    /// Consumption per second from completed buildings.
    pub consumption_rate: f64,
    /// Permanent production multiplier from technologies and achievements.
    pub multiplier: f64,
}

impl ResourceState {
    /// Create an empty stockpile with the given capacity.
    #[must_use]
    pub const fn new(capacity: f64) -> Self {
        Self {
            amount: 0.0,
            capacity,
            production_rate: 0.0,
            consumption_rate: 0.0,
            multiplier: 1.0,
        }
    }

    /// Net change per second, with the multiplier applied to production.
    #[must_use]
    pub fn net_rate(&self) -> f64 {
        self.production_rate * self.multiplier - self.consumption_rate
    }
}

/// Stockpiles of every resource the dataset defines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceLedger {
    resources: BTreeMap<String, ResourceState>,
}

impl ResourceLedger {
    /// Create a ledger with one empty stockpile per resource definition,
    /// each at its base storage.
    #[must_use]
    pub fn from_data(data: &GameData) -> Self {
        Self {
            resources: data
                .resources()
                .map(|r| (r.id.clone(), ResourceState::new(r.base_storage)))
                .collect(),
        }
    }

    /// State of one resource.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ResourceState> {
        self.resources.get(id)
    }

    /// Iterate every resource in ID order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResourceState)> {
        self.resources.iter().map(|(id, state)| (id.as_str(), state))
    }

    /// Current stockpile (0 for unknown resources).
    #[must_use]
    pub fn amount(&self, id: &str) -> f64 {
        self.get(id).map_or(0.0, |s| s.amount)
    }

    /// Storage limit (0 for unknown resources).
    #[must_use]
    pub fn capacity(&self, id: &str) -> f64 {
        self.get(id).map_or(0.0, |s| s.capacity)
    }

    /// Net change per second (0 for unknown resources).
    #[must_use]
    pub fn net_production(&self, id: &str) -> f64 {
        self.get(id).map_or(0.0, ResourceState::net_rate)
    }

    /// Permanent multiplier (1 for unknown resources).
    #[must_use]
    pub fn multiplier(&self, id: &str) -> f64 {
        self.get(id).map_or(1.0, |s| s.multiplier)
    }

    /// Add to a stockpile, clamped to `[0, capacity]`.
    ///
    /// Anything above capacity is lost. Returns the amount actually applied.
    pub fn add_resource(&mut self, id: &str, amount: f64) -> f64 {
        let Some(state) = self.resources.get_mut(id) else {
            return 0.0;
        };
        let previous = state.amount;
        state.amount = (state.amount + amount).clamp(0.0, state.capacity.max(0.0));
        state.amount - previous
    }

    /// Add every entry of a bundle (rewards, refunds).
    pub fn add_resources(&mut self, bundle: &ResourceBundle) {
        for (id, amount) in bundle.iter() {
            self.add_resource(id, amount);
        }
    }

    /// Remove an exact amount from one stockpile.
    ///
    /// Returns false, without changing anything, if the stockpile is short,
    /// the resource is unknown, or the amount is negative.
    pub fn consume_resource(&mut self, id: &str, amount: f64) -> bool {
        if amount < 0.0 || amount.is_nan() {
            return false;
        }
        match self.resources.get_mut(id) {
            Some(state) if state.amount >= amount => {
                state.amount = (state.amount - amount).max(0.0);
                true
            }
            _ => false,
        }
    }

    /// Check whether every listed amount is available.
    #[must_use]
    pub fn has_enough(&self, cost: &ResourceBundle) -> bool {
        cost.iter().all(|(id, amount)| self.amount(id) >= amount)
    }

    /// Resources in `cost` that are not available, with the missing amount.
    #[must_use]
    pub fn shortfall(&self, cost: &ResourceBundle) -> ResourceBundle {
        cost.iter()
            .filter(|(id, amount)| self.amount(id) < *amount)
            .map(|(id, amount)| (id, amount - self.amount(id)))
            .collect()
    }

    /// Deduct a whole bundle, or nothing at all.
    ///
    /// A bundle with a negative entry is rejected outright.
    pub fn consume_resources(&mut self, cost: &ResourceBundle) -> bool {
        if cost.iter().any(|(_, amount)| amount < 0.0) || !self.has_enough(cost) {
            return false;
        }
        for (id, amount) in cost.iter() {
            self.consume_resource(id, amount);
        }
        true
    }

    /// Apply `delta_seconds` of net flow to every stockpile.
    ///
    /// Gains are capped at capacity; drains floor at zero.
    pub fn update_resources(&mut self, delta_seconds: f64) {
        for state in self.resources.values_mut() {
            let net = state.net_rate() * delta_seconds;
            if net > 0.0 {
                state.amount = (state.amount + net).min(state.capacity.max(0.0));
            } else if net < 0.0 {
                state.amount = (state.amount + net).max(0.0);
            }
        }
    }

    /// Zero all production and consumption rates before a recalculation.
    pub fn reset_rates(&mut self) {
        for state in self.resources.values_mut() {
            state.production_rate = 0.0;
            state.consumption_rate = 0.0;
        }
    }

    /// Add to the raw production rate of one resource.
    pub fn add_production(&mut self, id: &str, rate: f64) {
        if let Some(state) = self.resources.get_mut(id) {
            state.production_rate += rate;
        }
    }

    /// Add to the consumption rate of one resource.
    pub fn add_consumption(&mut self, id: &str, rate: f64) {
        if let Some(state) = self.resources.get_mut(id) {
            state.consumption_rate += rate;
        }
    }

    /// Compound a permanent multiplier onto one resource.
    ///
    /// Factors below 1 are ignored; multipliers never decrease.
    pub fn apply_multiplier(&mut self, id: &str, factor: f64) {
        if factor < 1.0 {
            tracing::warn!(resource = id, factor, "Ignoring decreasing multiplier");
            return;
        }
        if let Some(state) = self.resources.get_mut(id) {
            state.multiplier *= factor;
        }
    }

    /// Raise the storage limit of one resource.
    pub fn increase_capacity(&mut self, id: &str, amount: f64) {
        if let Some(state) = self.resources.get_mut(id) {
            state.capacity += amount;
        }
    }

    /// Reset every capacity to its base storage, clamping stockpiles.
    pub fn reset_capacity(&mut self, data: &GameData) {
        for (id, state) in &mut self.resources {
            state.capacity = data.resource(id).map_or(0.0, |r| r.base_storage);
            state.amount = state.amount.min(state.capacity);
        }
    }

    /// Overwrite a stockpile, clamped to `[0, capacity]`.
    pub fn set_amount(&mut self, id: &str, amount: f64) {
        if let Some(state) = self.resources.get_mut(id) {
            state.amount = amount.clamp(0.0, state.capacity.max(0.0));
        }
    }

    /// Current stockpiles as a bundle.
    #[must_use]
    pub fn amounts(&self) -> ResourceBundle {
        self.resources
            .iter()
            .map(|(id, state)| (id.as_str(), state.amount))
            .collect()
    }
}
