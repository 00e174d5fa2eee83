//! Technology research.
//!
//! Each technology moves through `Locked -> Available -> Researching ->
//! Researched`. A single global research slot means at most one technology
//! is `Researching` at any time. Costs are paid up front when research
//! starts; cancelling refunds half.
//!
//! Timers are measured on the colony's active simulation clock, passed in
//! as `now` (seconds), so progress is a pure function of `now - started_at`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::{GameData, ResourceBundle, TechData};
use crate::economy::ResourceLedger;

/// Fraction of the research cost returned on cancel.
pub const CANCEL_REFUND_RATIO: f64 = 0.5;

/// Lifecycle state of a technology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TechStatus {
    /// Prerequisites not yet researched.
    Locked,
    /// Can be researched.
    Available,
    /// Occupies the research slot.
    Researching,
    /// Finished.
    Researched,
}

/// Runtime state of one technology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechInstance {
    /// Technology definition ID.
    pub technology_id: String,
    /// Lifecycle state.
    pub status: TechStatus,
    /// Progress percentage (0-100).
    pub progress: f64,
    /// Active-clock time research started (present while researching).
    pub started_at: Option<f64>,
}

/// Why a technology cannot be researched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResearchError {
    /// No definition with this ID.
    #[error("Technology does not exist")]
    UnknownTechnology,
    /// Already finished.
    #[error("Technology already researched")]
    AlreadyResearched,
    /// This technology holds the research slot.
    #[error("Technology is being researched")]
    AlreadyResearching,
    /// Prerequisites are missing.
    #[error("Prerequisites not met")]
    Locked,
    /// The research slot is held by another technology.
    #[error("Another technology is being researched")]
    SlotOccupied,
    /// The stockpile cannot cover the cost.
    #[error("Insufficient resources")]
    InsufficientResources,
    /// Cancel was requested for a technology that is not being researched.
    #[error("Technology is not being researched")]
    NotResearching,
}

/// Owns every technology instance and the research slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchEngine {
    instances: BTreeMap<String, TechInstance>,
    active: Option<String>,
    speed_multiplier: f64,
}

impl ResearchEngine {
    /// Create one instance per technology; roots start `Available`.
    #[must_use]
    pub fn from_data(data: &GameData) -> Self {
        let instances = data
            .technologies()
            .map(|tech| {
                let status = if tech.is_root() {
                    TechStatus::Available
                } else {
                    TechStatus::Locked
                };
                (
                    tech.id.clone(),
                    TechInstance {
                        technology_id: tech.id.clone(),
                        status,
                        progress: 0.0,
                        started_at: None,
                    },
                )
            })
            .collect();

        Self {
            instances,
            active: None,
            speed_multiplier: 1.0,
        }
    }

    /// Get a technology instance.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&TechInstance> {
        self.instances.get(id)
    }

    /// Iterate instances in ID order.
    pub fn instances(&self) -> impl Iterator<Item = &TechInstance> {
        self.instances.values()
    }

    /// Status of a technology (`None` if unknown).
    #[must_use]
    pub fn status(&self, id: &str) -> Option<TechStatus> {
        self.get(id).map(|t| t.status)
    }

    /// Whether a technology is researched.
    #[must_use]
    pub fn is_researched(&self, id: &str) -> bool {
        self.status(id) == Some(TechStatus::Researched)
    }

    /// Technology currently holding the research slot.
    #[must_use]
    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Global research speed multiplier.
    #[must_use]
    pub const fn speed_multiplier(&self) -> f64 {
        self.speed_multiplier
    }

    /// Number of researched technologies.
    #[must_use]
    pub fn researched_count(&self) -> usize {
        self.with_status(TechStatus::Researched).count()
    }

    /// IDs of technologies in the given status.
    pub fn with_status(&self, status: TechStatus) -> impl Iterator<Item = &str> {
        self.instances
            .values()
            .filter(move |t| t.status == status)
            .map(|t| t.technology_id.as_str())
    }

    /// True iff every prerequisite is researched.
    #[must_use]
    pub fn check_prerequisites(&self, id: &str, data: &GameData) -> bool {
        data.technology(id).is_some_and(|tech| {
            tech.prerequisites
                .iter()
                .all(|prereq| self.is_researched(prereq))
        })
    }

    /// Check whether research can start, reporting the first failing reason.
    ///
    /// # Errors
    ///
    /// Returns the reason in priority order: unknown, researched,
    /// researching, locked, slot occupied, insufficient resources.
    pub fn can_research(
        &self,
        id: &str,
        data: &GameData,
        ledger: &ResourceLedger,
    ) -> Result<(), ResearchError> {
        let tech = data.technology(id).ok_or(ResearchError::UnknownTechnology)?;
        let instance = self.get(id).ok_or(ResearchError::UnknownTechnology)?;

        match instance.status {
            TechStatus::Researched => return Err(ResearchError::AlreadyResearched),
            TechStatus::Researching => return Err(ResearchError::AlreadyResearching),
            TechStatus::Locked => return Err(ResearchError::Locked),
            TechStatus::Available => {}
        }
        if !self.check_prerequisites(id, data) {
            return Err(ResearchError::Locked);
        }
        if self.active.is_some() {
            return Err(ResearchError::SlotOccupied);
        }
        if !ledger.has_enough(&tech.research_cost) {
            return Err(ResearchError::InsufficientResources);
        }
        Ok(())
    }

    /// Pay the cost and take the research slot.
    ///
    /// # Errors
    ///
    /// Returns the [`can_research`](Self::can_research) failure without
    /// side effects.
    pub fn start_research(
        &mut self,
        id: &str,
        data: &GameData,
        ledger: &mut ResourceLedger,
        now: f64,
    ) -> Result<(), ResearchError> {
        self.can_research(id, data, ledger)?;
        let tech = data.technology(id).ok_or(ResearchError::UnknownTechnology)?;
        if !ledger.consume_resources(&tech.research_cost) {
            return Err(ResearchError::InsufficientResources);
        }

        if let Some(instance) = self.instances.get_mut(id) {
            instance.status = TechStatus::Researching;
            instance.progress = 0.0;
            instance.started_at = Some(now);
        }
        self.active = Some(id.to_string());
        tracing::info!(technology = id, "Research started");
        Ok(())
    }

    /// Abort research, refund half the cost and free the slot.
    ///
    /// Returns the refunded bundle.
    ///
    /// # Errors
    ///
    /// Returns [`ResearchError::NotResearching`] if `id` does not hold the
    /// slot.
    pub fn cancel_research(
        &mut self,
        id: &str,
        data: &GameData,
        ledger: &mut ResourceLedger,
    ) -> Result<ResourceBundle, ResearchError> {
        if self.active.as_deref() != Some(id) {
            return Err(ResearchError::NotResearching);
        }
        let refund = data
            .technology(id)
            .map(|tech| tech.research_cost.scaled(CANCEL_REFUND_RATIO))
            .unwrap_or_default();
        ledger.add_resources(&refund);

        if let Some(instance) = self.instances.get_mut(id) {
            instance.status = TechStatus::Available;
            instance.progress = 0.0;
            instance.started_at = None;
        }
        self.active = None;
        tracing::info!(technology = id, "Research cancelled");
        Ok(refund)
    }

    /// Research time in seconds after the speed multiplier.
    #[must_use]
    pub fn required_time(&self, tech: &TechData) -> f64 {
        tech.research_time / self.speed_multiplier
    }

    /// Advance the active research.
    ///
    /// Returns the IDs of technologies completed by this call (at most one).
    /// Newly unlocked technologies flip to `Available` before returning.
    /// Does nothing when the slot is empty.
    pub fn update_research_progress(&mut self, data: &GameData, now: f64) -> Vec<String> {
        let Some(active) = self.active.clone() else {
            return Vec::new();
        };
        let Some(tech) = data.technology(&active) else {
            self.active = None;
            return Vec::new();
        };
        let required = self.required_time(tech);
        let Some(instance) = self.instances.get_mut(&active) else {
            self.active = None;
            return Vec::new();
        };

        let elapsed = now - instance.started_at.unwrap_or(now);
        instance.progress = if required > 0.0 {
            (elapsed / required * 100.0).clamp(0.0, 100.0)
        } else {
            100.0
        };
        if instance.progress < 100.0 {
            return Vec::new();
        }

        instance.status = TechStatus::Researched;
        instance.started_at = None;
        self.active = None;
        tracing::info!(technology = %active, "Research completed");

        self.update_tech_status(data);
        vec![active]
    }

    /// Flip every locked technology whose prerequisites are met to
    /// `Available`.
    pub fn update_tech_status(&mut self, data: &GameData) {
        let unlocked: Vec<String> = self
            .instances
            .values()
            .filter(|t| t.status == TechStatus::Locked)
            .filter(|t| self.check_prerequisites(&t.technology_id, data))
            .map(|t| t.technology_id.clone())
            .collect();

        for id in unlocked {
            if let Some(instance) = self.instances.get_mut(&id) {
                instance.status = TechStatus::Available;
                tracing::debug!(technology = %id, "Technology unlocked");
            }
        }
    }

    /// Compound a research speed bonus.
    pub fn apply_speed_bonus(&mut self, factor: f64) {
        if factor > 0.0 {
            self.speed_multiplier *= factor;
        }
    }

    /// Progress percentage of a technology (0 if unknown).
    #[must_use]
    pub fn progress(&self, id: &str) -> f64 {
        match self.get(id) {
            Some(t) if t.status == TechStatus::Researched => 100.0,
            Some(t) => t.progress,
            None => 0.0,
        }
    }

    /// Seconds until the active research completes.
    #[must_use]
    pub fn remaining_time(&self, id: &str, data: &GameData, now: f64) -> f64 {
        let (Some(instance), Some(tech)) = (self.get(id), data.technology(id)) else {
            return 0.0;
        };
        match (instance.status, instance.started_at) {
            (TechStatus::Researching, Some(start)) => {
                (self.required_time(tech) - (now - start)).max(0.0)
            }
            _ => 0.0,
        }
    }

    /// Overwrite a technology from persisted state.
    ///
    /// Research in progress resumes from `progress` percent at `now`.
    pub fn restore(
        &mut self,
        id: &str,
        status: TechStatus,
        progress: f64,
        data: &GameData,
        now: f64,
    ) {
        let Some(tech) = data.technology(id) else {
            return;
        };
        let required = self.required_time(tech);
        let Some(instance) = self.instances.get_mut(id) else {
            return;
        };

        instance.status = status;
        instance.progress = progress.clamp(0.0, 100.0);
        instance.started_at = None;
        if status == TechStatus::Researching {
            if self.active.is_some() {
                // Only one slot; extra in-progress entries fall back.
                instance.status = TechStatus::Available;
                instance.progress = 0.0;
            } else {
                instance.started_at = Some(now - instance.progress / 100.0 * required);
                self.active = Some(id.to_string());
            }
        }
    }
}
