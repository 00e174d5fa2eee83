//! Resource bundles: costs, rewards and per-second rates keyed by resource ID.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A set of resource amounts keyed by resource ID.
///
/// Used for build/research costs, achievement rewards and the per-second
/// production, consumption and capacity declared by buildings. Iteration is
/// always in resource-ID order so every consumer is deterministic.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceBundle(BTreeMap<String, f64>);

impl ResourceBundle {
    /// Create an empty bundle.
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Set the amount for one resource, replacing any previous value.
    pub fn insert(&mut self, resource: impl Into<String>, amount: f64) {
        self.0.insert(resource.into(), amount);
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, resource: impl Into<String>, amount: f64) -> Self {
        self.insert(resource, amount);
        self
    }

    /// Add to the amount for one resource.
    pub fn add(&mut self, resource: &str, amount: f64) {
        *self.0.entry(resource.to_string()).or_insert(0.0) += amount;
    }

    /// Amount listed for a resource (0 if absent).
    #[must_use]
    pub fn get(&self, resource: &str) -> f64 {
        self.0.get(resource).copied().unwrap_or(0.0)
    }

    /// Whether the bundle lists a resource at all.
    #[must_use]
    pub fn contains(&self, resource: &str) -> bool {
        self.0.contains_key(resource)
    }

    /// Iterate `(resource, amount)` pairs in resource-ID order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(id, amount)| (id.as_str(), *amount))
    }

    /// Resource IDs listed in this bundle.
    pub fn resources(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of listed resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no resources are listed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Every amount multiplied by `factor`.
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        Self(
            self.0
                .iter()
                .map(|(id, amount)| (id.clone(), amount * factor))
                .collect(),
        )
    }

    /// Every amount rounded up to the next whole unit.
    #[must_use]
    pub fn ceil(&self) -> Self {
        Self(
            self.0
                .iter()
                .map(|(id, amount)| (id.clone(), amount.ceil()))
                .collect(),
        )
    }
}

impl<S: Into<String>, const N: usize> From<[(S, f64); N]> for ResourceBundle {
    fn from(entries: [(S, f64); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for ResourceBundle {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(id, amount)| (id.into(), amount)).collect())
    }
}
