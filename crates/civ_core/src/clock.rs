//! Fixed-timestep accumulator.
//!
//! The host calls [`SimulationClock::frame`] from its timer callback with a
//! wall-clock timestamp. Real elapsed milliseconds accumulate and are
//! converted into whole ticks; the accumulator is capped so a long stall
//! (a suspended process, a backgrounded window) runs at most a few ticks
//! instead of replaying the whole gap.

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;

/// Converts real elapsed time into whole simulation ticks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationClock {
    tick_interval_ms: u64,
    cap_ms: u64,
    accumulator_ms: u64,
    last_update_ms: Option<u64>,
    running: bool,
}

impl SimulationClock {
    /// Create a stopped clock.
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            tick_interval_ms: config.tick_interval_ms.max(1),
            cap_ms: config.accumulator_cap_ms().max(1),
            accumulator_ms: 0,
            last_update_ms: None,
            running: false,
        }
    }

    /// Whether the clock is running.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Milliseconds accumulated toward the next tick.
    #[must_use]
    pub const fn accumulated_ms(&self) -> u64 {
        self.accumulator_ms
    }

    /// Start the clock. Starting a running clock does nothing.
    ///
    /// A fresh start resets the accumulator and the reference timestamp.
    pub fn start(&mut self, now_ms: u64) {
        if self.running {
            return;
        }
        self.running = true;
        self.accumulator_ms = 0;
        self.last_update_ms = Some(now_ms);
    }

    /// Stop the clock. Stopping a stopped clock does nothing.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Account for the time since the previous frame.
    ///
    /// Returns the number of ticks to run (0 while stopped).
    pub fn frame(&mut self, now_ms: u64) -> u32 {
        if !self.running {
            return 0;
        }
        let elapsed = self
            .last_update_ms
            .map_or(0, |last| now_ms.saturating_sub(last));
        self.last_update_ms = Some(now_ms);
        self.advance(elapsed)
    }

    /// Add `elapsed_ms` to the accumulator and drain whole ticks.
    ///
    /// The accumulator is capped before draining; time above the cap is
    /// discarded.
    pub fn advance(&mut self, elapsed_ms: u64) -> u32 {
        self.accumulator_ms = self.accumulator_ms.saturating_add(elapsed_ms);
        if self.accumulator_ms > self.cap_ms {
            tracing::warn!(
                accumulated_ms = self.accumulator_ms,
                cap_ms = self.cap_ms,
                "Frame skip: discarding accumulated time"
            );
            self.accumulator_ms = self.cap_ms;
        }

        let ticks = self.accumulator_ms / self.tick_interval_ms;
        self.accumulator_ms -= ticks * self.tick_interval_ms;
        u32::try_from(ticks).unwrap_or(u32::MAX)
    }
}
