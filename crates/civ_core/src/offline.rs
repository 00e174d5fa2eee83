//! Offline catch-up.
//!
//! When a save is loaded after a gap, the time away is converted into
//! "effective seconds" of production through a tiered efficiency table:
//! full rate for the first hours, then progressively less.

use serde::{Deserialize, Serialize};

use crate::config::{EngineConfig, OfflineTier};

/// Offline gap detected at load time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OfflineReport {
    /// Wall-clock seconds since the colony was last played.
    pub offline_secs: f64,
    /// The gap truncated to the configured maximum.
    pub capped_secs: f64,
    /// Seconds of full-rate production the gap is worth.
    pub effective_secs: f64,
}

impl OfflineReport {
    /// Build a report for a gap between two wall-clock timestamps.
    ///
    /// Returns `None` when the gap does not exceed the threshold.
    #[must_use]
    pub fn detect(last_play_ms: u64, now_ms: u64, config: &EngineConfig) -> Option<Self> {
        let offline_secs = now_ms.saturating_sub(last_play_ms) as f64 / 1000.0;
        if offline_secs <= config.offline_threshold_secs {
            return None;
        }
        let capped_secs = offline_secs.min(config.max_offline_secs);
        Some(Self {
            offline_secs,
            capped_secs,
            effective_secs: effective_seconds(capped_secs, &config.offline_tiers),
        })
    }

    /// Overall efficiency of the gap.
    #[must_use]
    pub fn efficiency(&self) -> f64 {
        if self.capped_secs > 0.0 {
            self.effective_secs / self.capped_secs
        } else {
            0.0
        }
    }
}

/// Weight `secs` by the tier table.
///
/// Each tier covers the seconds between the previous tier's bound and its
/// own; seconds past the last bounded tier with no unbounded tier earn
/// nothing.
#[must_use]
pub fn effective_seconds(secs: f64, tiers: &[OfflineTier]) -> f64 {
    let mut effective = 0.0;
    let mut floor = 0.0;

    for tier in tiers {
        let ceiling = tier.up_to_secs.unwrap_or(f64::INFINITY);
        let span = secs.min(ceiling) - floor;
        if span > 0.0 {
            effective += span * tier.efficiency;
        }
        if secs <= ceiling {
            break;
        }
        floor = ceiling;
    }
    effective
}
