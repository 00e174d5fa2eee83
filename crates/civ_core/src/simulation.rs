//! Colony simulation loop.
//!
//! A [`Colony`] owns every engine component and advances them together,
//! one fixed tick at a time. The host drives it through the
//! [`SimulationClock`]: pass wall-clock milliseconds to
//! [`Colony::frame`] and the colony runs however many ticks have
//! accumulated.
//!
//! # Determinism
//!
//! - No wall-clock reads: every timestamp is supplied by the caller
//! - Ordered iteration (every table is a `BTreeMap`)
//! - Construction and research timers run on the colony's active clock,
//!   which only advances on unpaused ticks
//!
//! Two colonies built from the same data and fed the same commands produce
//! the same [`state_hash`](Colony::state_hash).
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use civ_core::config::EngineConfig;
//! use civ_core::data::GameData;
//! use civ_core::simulation::Colony;
//!
//! let mut colony = Colony::new(Arc::new(GameData::new()), EngineConfig::default(), 0);
//! let events = colony.tick();
//! assert_eq!(events.tick, 1);
//! assert_eq!(colony.game_time(), 1.0);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::achievements::{AchievementContext, AchievementSummary, AchievementTracker};
use crate::buildings::{BuildContext, ConstructionEngine, ConstructionError, ConstructionEvent};
use crate::clock::SimulationClock;
use crate::config::{EngineConfig, GameSpeed, TICK_SECONDS};
use crate::data::{Effect, Era, GameData, ResourceBundle};
use crate::economy::ResourceLedger;
use crate::error::{GameError, Result};
use crate::offline::OfflineReport;
use crate::population::{PopulationModel, PopulationOutcome};
use crate::research::{ResearchEngine, ResearchError, TechStatus};
use crate::save::{
    compact_amount, compact_progress, SaveData, SaveSlot, SavedAchievement, SavedBuilding,
    SavedGame, SavedPopulation, SavedTechnology, SAVE_VERSION,
};

/// Events generated during a single tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickEvents {
    /// Tick number after this tick.
    pub tick: u64,
    /// The tick was skipped because the colony is paused.
    pub paused: bool,
    /// Constructions and upgrades that finished.
    pub construction: Vec<ConstructionEvent>,
    /// Technologies that finished research.
    pub research_completed: Vec<String>,
    /// Achievements unlocked by this tick's scan.
    pub achievements_unlocked: Vec<String>,
    /// The population could not be fed.
    pub starving: bool,
}

/// The colony advanced to a new era.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EraChanged {
    /// Previous era.
    pub from: Era,
    /// New era.
    pub to: Era,
}

/// Format seconds as `H:MM:SS`.
#[must_use]
pub fn format_game_time(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    format!("{hours}:{minutes:02}:{secs:02}")
}

/// A colony: every engine component plus the game clock.
///
/// # System Execution Order
///
/// Each unpaused tick runs, in this order:
/// 1. **Resources** - apply net flows, clamp to `[0, capacity]`
/// 2. **Population** - eat, then grow or starve
/// 3. **Construction** - complete finished builds and upgrades
/// 4. **Research** - complete the active technology
/// 5. **Effects** - apply queued bonuses
/// 6. **Achievements** - scan every `achievement_scan_interval` seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Colony {
    /// Definitions; not part of the snapshot.
    #[serde(skip)]
    data: Arc<GameData>,
    config: EngineConfig,
    clock: SimulationClock,
    ledger: ResourceLedger,
    population: PopulationModel,
    construction: ConstructionEngine,
    research: ResearchEngine,
    achievements: AchievementTracker,
    /// Bonuses waiting to be applied.
    effects: VecDeque<Effect>,
    era: Era,
    /// Scaled by the game speed.
    game_time: f64,
    /// Unscaled seconds of unpaused ticks; drives build and research timers.
    active_time: f64,
    game_speed: f64,
    paused: bool,
    tick: u64,
    since_achievement_scan: f64,
    created_at: u64,
    last_play_time: u64,
    last_save_time: Option<u64>,
    pending_offline: Option<OfflineReport>,
}

impl Colony {
    /// Found a new colony at wall-clock `now_ms`.
    #[must_use]
    pub fn new(data: Arc<GameData>, config: EngineConfig, now_ms: u64) -> Self {
        let mut ledger = ResourceLedger::from_data(&data);
        ledger.add_resources(&config.starting_resources);

        Self {
            clock: SimulationClock::new(&config),
            population: PopulationModel::new(&config),
            construction: ConstructionEngine::new(),
            research: ResearchEngine::from_data(&data),
            achievements: AchievementTracker::from_data(&data),
            effects: VecDeque::new(),
            era: Era::Stone,
            game_time: 0.0,
            active_time: 0.0,
            game_speed: config.game_speed,
            paused: false,
            tick: 0,
            since_achievement_scan: 0.0,
            created_at: now_ms,
            last_play_time: now_ms,
            last_save_time: None,
            pending_offline: None,
            ledger,
            config,
            data,
        }
    }

    // ------------------------------------------------------------------
    // Clock
    // ------------------------------------------------------------------

    /// Start the clock at wall-clock `now_ms`. Idempotent.
    pub fn start(&mut self, now_ms: u64) {
        self.clock.start(now_ms);
        self.last_play_time = now_ms;
    }

    /// Stop the clock. In-flight accumulated time is dropped.
    pub fn stop(&mut self) {
        self.clock.stop();
    }

    /// Whether the clock is running.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.clock.is_running()
    }

    /// Run every tick accumulated up to wall-clock `now_ms`.
    pub fn frame(&mut self, now_ms: u64) -> Vec<TickEvents> {
        let ticks = self.clock.frame(now_ms);
        if self.clock.is_running() {
            self.last_play_time = now_ms;
        }
        (0..ticks).map(|_| self.tick()).collect()
    }

    /// Feed `elapsed_ms` to the clock and run the resulting ticks.
    pub fn advance(&mut self, elapsed_ms: u64) -> Vec<TickEvents> {
        let ticks = self.clock.advance(elapsed_ms);
        (0..ticks).map(|_| self.tick()).collect()
    }

    /// Run `count` ticks directly, bypassing the clock.
    pub fn run_ticks(&mut self, count: u32) -> Vec<TickEvents> {
        (0..count).map(|_| self.tick()).collect()
    }

    /// Advance the colony by one tick.
    ///
    /// A paused tick only increments the tick counter.
    pub fn tick(&mut self) -> TickEvents {
        let mut events = TickEvents {
            paused: self.paused,
            ..TickEvents::default()
        };

        if !self.paused {
            let dt = TICK_SECONDS;
            self.game_time += dt * self.game_speed;
            self.active_time += dt;

            // 1. Resources
            self.ledger.update_resources(dt);

            // 2. Population
            events.starving = self.population.update(&mut self.ledger, &self.config, dt)
                == PopulationOutcome::Starving;

            // 3. Construction
            events.construction = self.construction.update_building_progress(
                &self.data,
                &self.config,
                &mut self.ledger,
                &mut self.population,
                self.active_time,
            );

            // 4. Research
            events.research_completed = self
                .research
                .update_research_progress(&self.data, self.active_time);
            for id in &events.research_completed {
                self.queue_technology_effects(id);
            }

            // 5. Effects
            self.drain_effects();

            // 6. Achievements
            self.since_achievement_scan += dt;
            if self.since_achievement_scan >= self.config.achievement_scan_interval {
                self.since_achievement_scan = 0.0;
                events.achievements_unlocked = self.check_achievements();
            }
        }

        self.tick += 1;
        events.tick = self.tick;

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(tick = self.tick, state_hash = hash, "Colony state hash");
        }

        events
    }

    /// Scan achievements now, granting rewards and effects of new unlocks.
    pub fn check_achievements(&mut self) -> Vec<String> {
        let ctx = AchievementContext {
            data: &self.data,
            era: self.era,
            ledger: &self.ledger,
            construction: &self.construction,
            researched: self.research.researched_count(),
            population: self.population.current,
            game_time: self.game_time,
        };
        let unlocked = self.achievements.check_achievements(&ctx);

        for id in &unlocked {
            if let Some(achievement) = self.data.achievement(id) {
                self.ledger.add_resources(&achievement.reward);
                if let Some(effect) = &achievement.permanent_effect {
                    self.effects.push_back(effect.clone());
                }
            }
        }
        self.drain_effects();
        unlocked
    }

    fn queue_technology_effects(&mut self, id: &str) {
        if let Some(tech) = self.data.technology(id) {
            self.effects.extend(tech.effects.iter().cloned());
        }
    }

    fn drain_effects(&mut self) {
        while let Some(effect) = self.effects.pop_front() {
            match effect {
                Effect::ResourceMultiplier { resource, factor } => {
                    self.ledger.apply_multiplier(&resource, factor);
                }
                Effect::BuildSpeedBonus(factor) => self.construction.apply_speed_bonus(factor),
                Effect::ResearchSpeedBonus(factor) => self.research.apply_speed_bonus(factor),
                Effect::PopulationGrowth(factor) => self.population.apply_growth_bonus(factor),
            }
        }
    }

    // ------------------------------------------------------------------
    // Controls
    // ------------------------------------------------------------------

    /// Skip gameplay on subsequent ticks.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume gameplay.
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Set the game-time multiplier.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidState`] for non-positive or non-finite
    /// multipliers.
    pub fn set_game_speed(&mut self, speed: f64) -> Result<()> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(GameError::InvalidState(format!(
                "Game speed must be positive, got {speed}"
            )));
        }
        self.game_speed = speed;
        Ok(())
    }

    /// Set the game-time multiplier from a preset.
    pub fn set_speed_preset(&mut self, preset: GameSpeed) {
        self.game_speed = preset.multiplier();
    }

    /// Whether another era exists.
    #[must_use]
    pub fn can_advance_era(&self) -> bool {
        !self.era.is_final()
    }

    /// Move to the next era. Returns `None` at the final era.
    pub fn advance_era(&mut self) -> Option<EraChanged> {
        let to = self.era.next()?;
        let change = EraChanged { from: self.era, to };
        self.era = to;
        tracing::info!(from = %change.from, to = %change.to, "Era changed");
        Some(change)
    }

    /// Check whether a building can be built or upgraded.
    ///
    /// # Errors
    ///
    /// Returns the first failing [`ConstructionError`].
    pub fn can_build(&self, id: &str) -> std::result::Result<ResourceBundle, ConstructionError> {
        self.construction
            .can_build(id, &self.data, &self.ledger, &self.build_context())
    }

    /// Build or upgrade a building.
    ///
    /// # Errors
    ///
    /// Returns the first failing [`ConstructionError`]; nothing is spent.
    pub fn build(&mut self, id: &str) -> std::result::Result<ConstructionEvent, ConstructionError> {
        let ctx = BuildContext {
            era: self.era,
            population: self.population.current,
            research: &self.research,
            enforce_all_requirements: self.config.enforce_all_requirements,
        };
        self.construction
            .build_building(id, &self.data, &mut self.ledger, &ctx, self.active_time)
    }

    fn build_context(&self) -> BuildContext<'_> {
        BuildContext {
            era: self.era,
            population: self.population.current,
            research: &self.research,
            enforce_all_requirements: self.config.enforce_all_requirements,
        }
    }

    /// Check whether a technology can be researched.
    ///
    /// # Errors
    ///
    /// Returns the first failing [`ResearchError`].
    pub fn can_research(&self, id: &str) -> std::result::Result<(), ResearchError> {
        self.research.can_research(id, &self.data, &self.ledger)
    }

    /// Start researching a technology.
    ///
    /// # Errors
    ///
    /// Returns the first failing [`ResearchError`]; nothing is spent.
    pub fn start_research(&mut self, id: &str) -> std::result::Result<(), ResearchError> {
        self.research
            .start_research(id, &self.data, &mut self.ledger, self.active_time)
    }

    /// Cancel the active research and refund half its cost.
    ///
    /// # Errors
    ///
    /// Returns [`ResearchError::NotResearching`] if `id` is not active.
    pub fn cancel_research(
        &mut self,
        id: &str,
    ) -> std::result::Result<ResourceBundle, ResearchError> {
        self.research.cancel_research(id, &self.data, &mut self.ledger)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Definitions.
    #[must_use]
    pub fn data(&self) -> &GameData {
        &self.data
    }

    /// Engine configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resource ledger.
    #[must_use]
    pub const fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    /// Population.
    #[must_use]
    pub const fn population(&self) -> &PopulationModel {
        &self.population
    }

    /// Construction engine.
    #[must_use]
    pub const fn construction(&self) -> &ConstructionEngine {
        &self.construction
    }

    /// Research engine.
    #[must_use]
    pub const fn research(&self) -> &ResearchEngine {
        &self.research
    }

    /// Achievement tracker.
    #[must_use]
    pub const fn achievements(&self) -> &AchievementTracker {
        &self.achievements
    }

    /// Current era.
    #[must_use]
    pub const fn era(&self) -> Era {
        self.era
    }

    /// Game time in seconds.
    #[must_use]
    pub const fn game_time(&self) -> f64 {
        self.game_time
    }

    /// Game time as `H:MM:SS`.
    #[must_use]
    pub fn formatted_game_time(&self) -> String {
        format_game_time(self.game_time)
    }

    /// Unscaled seconds of unpaused play since founding or load.
    #[must_use]
    pub const fn active_time(&self) -> f64 {
        self.active_time
    }

    /// Game-time multiplier.
    #[must_use]
    pub const fn game_speed(&self) -> f64 {
        self.game_speed
    }

    /// Whether gameplay is paused.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Ticks run so far.
    #[must_use]
    pub const fn get_tick(&self) -> u64 {
        self.tick
    }

    /// Wall-clock ms the colony was founded.
    #[must_use]
    pub const fn created_at(&self) -> u64 {
        self.created_at
    }

    /// Wall-clock ms of the last save, if any.
    #[must_use]
    pub const fn last_save_time(&self) -> Option<u64> {
        self.last_save_time
    }

    /// Stockpile of a resource.
    #[must_use]
    pub fn resource_amount(&self, id: &str) -> f64 {
        self.ledger.amount(id)
    }

    /// Storage limit of a resource.
    #[must_use]
    pub fn resource_limit(&self, id: &str) -> f64 {
        self.ledger.capacity(id)
    }

    /// Net change per second of a resource.
    #[must_use]
    pub fn net_production(&self, id: &str) -> f64 {
        self.ledger.net_production(id)
    }

    /// Progress percentage of a building's current work.
    #[must_use]
    pub fn building_progress(&self, id: &str) -> f64 {
        self.construction
            .building_progress(id, &self.data, &self.config, self.active_time)
    }

    /// Seconds until a building's current work completes.
    #[must_use]
    pub fn building_remaining_time(&self, id: &str) -> f64 {
        self.construction
            .remaining_time(id, &self.data, &self.config, self.active_time)
    }

    /// Cost of the next upgrade, `None` for unbuilt or maxed buildings.
    #[must_use]
    pub fn upgrade_cost(&self, id: &str) -> Option<ResourceBundle> {
        self.construction.upgrade_cost(id, &self.data)
    }

    /// Production per second of a building at its current level.
    #[must_use]
    pub fn effective_production(&self, id: &str) -> ResourceBundle {
        self.construction
            .effective_production(id, &self.data, &self.config)
    }

    /// Progress percentage of a technology.
    #[must_use]
    pub fn research_progress(&self, id: &str) -> f64 {
        self.research.progress(id)
    }

    /// Seconds until the technology completes (0 when not researching).
    #[must_use]
    pub fn research_remaining_time(&self, id: &str) -> f64 {
        self.research.remaining_time(id, &self.data, self.active_time)
    }

    /// Technologies in the given status, in ID order.
    #[must_use]
    pub fn technologies_with_status(&self, status: TechStatus) -> Vec<String> {
        self.research.with_status(status).map(str::to_string).collect()
    }

    /// Achievement completion summary.
    #[must_use]
    pub fn achievement_summary(&self) -> AchievementSummary {
        self.achievements.summary()
    }

    /// Most recent unlocks, newest first.
    #[must_use]
    pub fn recent_unlocks(&self) -> Vec<String> {
        self.achievements
            .recent_unlocks()
            .map(str::to_string)
            .collect()
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Compute a hash of the colony state.
    ///
    /// Two colonies with identical state produce identical hashes.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);
        self.era.hash(&mut hasher);
        self.paused.hash(&mut hasher);
        self.game_time.to_bits().hash(&mut hasher);
        self.active_time.to_bits().hash(&mut hasher);
        self.game_speed.to_bits().hash(&mut hasher);

        for (id, state) in self.ledger.iter() {
            id.hash(&mut hasher);
            state.amount.to_bits().hash(&mut hasher);
            state.capacity.to_bits().hash(&mut hasher);
            state.production_rate.to_bits().hash(&mut hasher);
            state.consumption_rate.to_bits().hash(&mut hasher);
            state.multiplier.to_bits().hash(&mut hasher);
        }

        self.population.current.to_bits().hash(&mut hasher);
        self.population.max.to_bits().hash(&mut hasher);
        self.population.growth_rate().to_bits().hash(&mut hasher);

        self.construction.speed_multiplier().to_bits().hash(&mut hasher);
        for instance in self.construction.instances() {
            instance.building_id.hash(&mut hasher);
            instance.level.hash(&mut hasher);
            instance.status.hash(&mut hasher);
            instance.started_at.map(f64::to_bits).hash(&mut hasher);
        }

        self.research.speed_multiplier().to_bits().hash(&mut hasher);
        self.research.active().hash(&mut hasher);
        for instance in self.research.instances() {
            instance.technology_id.hash(&mut hasher);
            instance.status.hash(&mut hasher);
            instance.progress.to_bits().hash(&mut hasher);
        }

        for instance in self.achievements.instances() {
            instance.achievement_id.hash(&mut hasher);
            instance.unlocked.hash(&mut hasher);
        }

        hasher.finish()
    }

    /// Serialize the full colony state, timers included.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn snapshot(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize colony: {e}")))
    }

    /// Rebuild a colony from [`snapshot`](Self::snapshot) bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn restore(bytes: &[u8], data: Arc<GameData>) -> Result<Self> {
        let mut colony: Self = bincode::deserialize(bytes)
            .map_err(|e| GameError::InvalidState(format!("Failed to deserialize colony: {e}")))?;
        colony.data = data;
        Ok(colony)
    }

    /// Build the compact player save.
    #[must_use]
    pub fn to_save_data(&self, now_ms: u64) -> SaveData {
        SaveData {
            version: SAVE_VERSION,
            created_at: self.created_at,
            last_saved: now_ms,
            game: SavedGame {
                era: self.era,
                game_time: self.game_time,
                population: SavedPopulation {
                    current: self.population.current.floor(),
                    max: self.population.max,
                    growth_rate: self.population.growth_rate(),
                },
                last_play_time: self.last_play_time,
            },
            resources: self
                .ledger
                .iter()
                .filter_map(|(id, state)| compact_amount(state.amount).map(|a| (id.to_string(), a)))
                .collect(),
            buildings: self
                .construction
                .instances()
                .map(|b| SavedBuilding {
                    id: b.building_id.clone(),
                    level: b.level,
                    status: b.status,
                })
                .collect(),
            technologies: self
                .research
                .instances()
                .map(|t| SavedTechnology {
                    id: t.technology_id.clone(),
                    status: t.status,
                    progress: compact_progress(self.research.progress(&t.technology_id)),
                })
                .collect(),
            achievements: self
                .achievements
                .instances()
                .filter(|a| a.unlocked || a.progress > 0.0)
                .map(|a| SavedAchievement {
                    id: a.achievement_id.clone(),
                    unlocked: a.unlocked,
                    progress: compact_progress(a.progress),
                })
                .collect(),
        }
    }

    /// Encode the player save as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::SaveEncode`] if encoding fails.
    pub fn export_save(&self, now_ms: u64) -> Result<String> {
        self.to_save_data(now_ms).to_json()
    }

    /// Write the player save to `slot`.
    ///
    /// # Errors
    ///
    /// Returns an encoding or slot error; the colony is unchanged.
    pub fn save(&mut self, slot: &mut dyn SaveSlot, now_ms: u64) -> Result<()> {
        let json = self.export_save(now_ms)?;
        slot.write(&json)?;
        self.last_save_time = Some(now_ms);
        tracing::info!(tick = self.tick, bytes = json.len(), "Colony saved");
        Ok(())
    }

    /// Load the save in `slot`.
    ///
    /// Returns the offline report when the save is old enough; the gains
    /// are applied by [`claim_offline_gains`](Self::claim_offline_gains).
    ///
    /// # Errors
    ///
    /// Returns [`GameError::NoSave`] for an empty slot, or a decode error.
    /// The colony is unchanged on error.
    pub fn load(&mut self, slot: &dyn SaveSlot, now_ms: u64) -> Result<Option<OfflineReport>> {
        let json = slot.read()?.ok_or(GameError::NoSave)?;
        self.load_str(&json, now_ms)
    }

    /// Load a save from JSON text.
    ///
    /// # Errors
    ///
    /// Returns a decode error; the colony is unchanged on error.
    pub fn load_str(&mut self, json: &str, now_ms: u64) -> Result<Option<OfflineReport>> {
        let save = SaveData::from_json(json)?;
        self.apply_save(&save, now_ms);
        Ok(self.pending_offline)
    }

    /// Validate `json`, write it to `slot`, then load it.
    ///
    /// # Errors
    ///
    /// Returns a decode error before anything is written, or a slot error.
    pub fn import_save(
        &mut self,
        slot: &mut dyn SaveSlot,
        json: &str,
        now_ms: u64,
    ) -> Result<Option<OfflineReport>> {
        let save = SaveData::from_json(json)?;
        slot.write(json)?;
        self.apply_save(&save, now_ms);
        Ok(self.pending_offline)
    }

    /// Remove the save in `slot`.
    ///
    /// # Errors
    ///
    /// Returns a slot error.
    pub fn delete_save(slot: &mut dyn SaveSlot) -> Result<()> {
        slot.delete()
    }

    /// Whether `slot` holds a save.
    #[must_use]
    pub fn has_save(slot: &dyn SaveSlot) -> bool {
        slot.exists()
    }

    /// Reset to a freshly founded colony, keeping data, config and the
    /// clock.
    pub fn new_game(&mut self, now_ms: u64) {
        let clock = self.clock.clone();
        *self = Self::new(Arc::clone(&self.data), self.config.clone(), now_ms);
        self.clock = clock;
        tracing::info!("New game started");
    }

    /// Offline gap detected by the last load, if not yet claimed.
    #[must_use]
    pub const fn pending_offline(&self) -> Option<&OfflineReport> {
        self.pending_offline.as_ref()
    }

    /// Apply the pending offline gap as one bulk resource-flow step.
    ///
    /// Returns the stockpile change, or `None` if nothing was pending.
    /// Population, construction and research do not advance offline.
    pub fn claim_offline_gains(&mut self) -> Option<ResourceBundle> {
        let report = self.pending_offline.take()?;
        let before = self.ledger.amounts();
        self.ledger.update_resources(report.effective_secs);
        let after = self.ledger.amounts();

        let gains: ResourceBundle = self
            .ledger
            .iter()
            .map(|(id, _)| (id, after.get(id) - before.get(id)))
            .filter(|(_, delta)| *delta != 0.0)
            .collect();
        tracing::info!(
            offline_secs = report.offline_secs,
            effective_secs = report.effective_secs,
            "Offline gains claimed"
        );
        Some(gains)
    }

    fn apply_save(&mut self, save: &SaveData, now_ms: u64) {
        let mut colony = Self::new(Arc::clone(&self.data), self.config.clone(), save.created_at);
        colony.clock = self.clock.clone();
        colony.game_speed = self.game_speed;

        colony.era = save.game.era;
        colony.game_time = save.game.game_time.max(0.0);
        colony.last_play_time = save.game.last_play_time;
        colony.last_save_time = Some(save.last_saved);
        colony.population.max = save.game.population.max.max(0.0);
        colony.population.current = save
            .game
            .population
            .current
            .clamp(0.0, colony.population.max);

        for building in &save.buildings {
            colony
                .construction
                .restore(&building.id, building.level, building.status, &colony.data, 0.0);
        }

        // Finished research first, so the research speed is known before
        // in-progress timers are rebuilt.
        for tech in save.technologies.iter().filter(|t| t.status != TechStatus::Researching) {
            colony.research.restore(
                &tech.id,
                tech.status,
                tech.progress.unwrap_or(0.0),
                &colony.data,
                0.0,
            );
        }
        for achievement in &save.achievements {
            colony.achievements.restore(
                &achievement.id,
                achievement.unlocked,
                achievement.progress.unwrap_or(0.0),
            );
        }
        colony.rederive_effects();
        for tech in save.technologies.iter().filter(|t| t.status == TechStatus::Researching) {
            colony.research.restore(
                &tech.id,
                tech.status,
                tech.progress.unwrap_or(0.0),
                &colony.data,
                0.0,
            );
        }
        colony.research.update_tech_status(&colony.data);

        colony.ledger.reset_capacity(&colony.data);
        colony.construction.apply_capacity(&colony.data, &mut colony.ledger);
        let ids: Vec<String> = colony.ledger.iter().map(|(id, _)| id.to_string()).collect();
        for id in ids {
            let amount = save.resources.get(&id).copied().unwrap_or(0.0);
            colony.ledger.set_amount(&id, amount);
        }
        colony
            .construction
            .recalculate_production(&colony.data, &colony.config, &mut colony.ledger);

        colony.pending_offline =
            OfflineReport::detect(save.game.last_play_time, now_ms, &colony.config);
        if colony.clock.is_running() {
            colony.last_play_time = now_ms;
        }

        tracing::info!(
            era = %colony.era,
            buildings = colony.construction.len(),
            researched = colony.research.researched_count(),
            "Colony loaded"
        );
        *self = colony;
    }

    /// Replay every permanent effect of researched technologies and
    /// unlocked achievements.
    fn rederive_effects(&mut self) {
        let researched: Vec<String> = self
            .research
            .with_status(TechStatus::Researched)
            .map(str::to_string)
            .collect();
        for id in &researched {
            self.queue_technology_effects(id);
        }
        let unlocked: Vec<Effect> = self
            .achievements
            .instances()
            .filter(|a| a.unlocked)
            .filter_map(|a| self.data.achievement(&a.achievement_id))
            .filter_map(|a| a.permanent_effect.clone())
            .collect();
        self.effects.extend(unlocked);
        self.drain_effects();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buildings::BuildingStatus;
    use crate::data::{
        AchievementCategory, AchievementCondition, AchievementData, BuildingData, BuildingFilter,
        BuildingKind, ResourceData, TechData,
    };
    use crate::save::MemorySlot;

    fn resource(id: &str, storage: f64) -> ResourceData {
        ResourceData {
            id: id.to_string(),
            name: id.to_string(),
            category: Default::default(),
            era: Era::Stone,
            base_storage: storage,
        }
    }

    fn data() -> Arc<GameData> {
        let mut data = GameData::new();
        data.register_resource(resource("food", 1000.0));
        data.register_resource(resource("wood", 500.0));
        data.register_resource(resource("knowledge", 100.0));
        data.register_building(BuildingData {
            id: "lumber_camp".to_string(),
            name: "Lumber Camp".to_string(),
            kind: BuildingKind::Production,
            era: Era::Stone,
            max_level: 3,
            build_cost: ResourceBundle::from([("wood", 10.0)]),
            upgrade_cost_multiplier: 2.0,
            build_time: 5.0,
            upgrade_time: 10.0,
            production: ResourceBundle::from([("wood", 1.0)]),
            consumption: ResourceBundle::new(),
            capacity: ResourceBundle::from([("wood", 100.0)]),
            population: 0.0,
            requirements: vec![],
        });
        data.register_technology(TechData {
            id: "fire".to_string(),
            name: "Fire".to_string(),
            era: Era::Stone,
            category: Default::default(),
            research_cost: ResourceBundle::from([("food", 10.0)]),
            research_time: 3.0,
            prerequisites: vec![],
            effects: vec![Effect::ResourceMultiplier {
                resource: "wood".to_string(),
                factor: 2.0,
            }],
            unlocks: vec![],
        });
        data.register_achievement(AchievementData {
            id: "first_step".to_string(),
            name: "First Step".to_string(),
            category: AchievementCategory::Progress,
            condition: AchievementCondition::Building {
                filter: BuildingFilter::Any,
                count: 1,
            },
            reward: ResourceBundle::from([("knowledge", 10.0)]),
            permanent_effect: Some(Effect::BuildSpeedBonus(2.0)),
        });
        Arc::new(data)
    }

    fn colony() -> Colony {
        Colony::new(data(), EngineConfig::default(), 0)
    }

    #[test]
    fn test_colony_new() {
        let colony = colony();
        assert_eq!(colony.get_tick(), 0);
        assert_eq!(colony.era(), Era::Stone);
        assert_eq!(colony.resource_amount("food"), 100.0);
        assert_eq!(colony.resource_amount("wood"), 50.0);
        assert_eq!(colony.population().current, 10.0);
    }

    #[test]
    fn test_tick_increments() {
        let mut colony = colony();
        let events = colony.tick();
        assert_eq!(events.tick, 1);
        assert_eq!(colony.get_tick(), 1);
        assert_eq!(colony.game_time(), 1.0);
    }

    #[test]
    fn test_paused_tick_skips_gameplay() {
        let mut colony = colony();
        colony.pause();
        let events = colony.tick();
        assert!(events.paused);
        assert_eq!(colony.game_time(), 0.0);
        assert_eq!(colony.resource_amount("food"), 100.0);
        colony.resume();
        colony.tick();
        assert_eq!(colony.game_time(), 1.0);
    }

    #[test]
    fn test_game_speed_scales_only_game_time() {
        let mut colony = colony();
        colony.set_game_speed(2.0).unwrap();
        colony.tick();
        assert_eq!(colony.game_time(), 2.0);
        assert_eq!(colony.active_time(), 1.0);
        assert!(colony.set_game_speed(0.0).is_err());
        assert!(colony.set_game_speed(f64::NAN).is_err());
    }

    #[test]
    fn test_build_completes_and_produces() {
        let mut colony = colony();
        colony.build("lumber_camp").unwrap();
        assert_eq!(colony.resource_amount("wood"), 40.0);

        let events = colony.run_ticks(5);
        assert!(events[4].construction.contains(&ConstructionEvent::Completed {
            building_id: "lumber_camp".to_string()
        }));
        assert_eq!(colony.net_production("wood"), 1.0);
        assert_eq!(colony.resource_limit("wood"), 600.0);
    }

    #[test]
    fn test_research_applies_effect() {
        let mut colony = colony();
        colony.start_research("fire").unwrap();
        let events = colony.run_ticks(3);
        assert_eq!(events[2].research_completed, vec!["fire".to_string()]);
        assert_eq!(colony.ledger().multiplier("wood"), 2.0);
    }

    #[test]
    fn test_achievement_scan_interval() {
        let mut colony = colony();
        colony.build("lumber_camp").unwrap();
        let events = colony.run_ticks(10);
        for event in &events[..9] {
            assert!(event.achievements_unlocked.is_empty());
        }
        assert_eq!(events[9].achievements_unlocked, vec!["first_step".to_string()]);
        assert_eq!(colony.resource_amount("knowledge"), 10.0);
        assert_eq!(colony.construction().speed_multiplier(), 2.0);
        assert_eq!(colony.recent_unlocks(), vec!["first_step".to_string()]);
    }

    #[test]
    fn test_advance_era_stops_at_final() {
        let mut colony = colony();
        let change = colony.advance_era().unwrap();
        assert_eq!(change.from, Era::Stone);
        assert_eq!(change.to, Era::Bronze);
        while colony.can_advance_era() {
            colony.advance_era();
        }
        assert_eq!(colony.era(), Era::Hyperdimensional);
        assert!(colony.advance_era().is_none());
    }

    #[test]
    fn test_clock_drives_ticks() {
        let mut colony = colony();
        colony.start(1_000);
        assert_eq!(colony.frame(3_500).len(), 2);
        colony.stop();
        assert!(colony.frame(10_000).is_empty());
    }

    #[test]
    fn test_format_game_time() {
        assert_eq!(format_game_time(0.0), "0:00:00");
        assert_eq!(format_game_time(3_725.9), "1:02:05");
    }

    #[test]
    fn test_deterministic_hash() {
        let mut a = colony();
        let mut b = colony();
        a.build("lumber_camp").unwrap();
        b.build("lumber_camp").unwrap();
        a.run_ticks(20);
        b.run_ticks(20);
        assert_eq!(a.state_hash(), b.state_hash());
        a.tick();
        assert_ne!(a.state_hash(), b.state_hash());
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let mut colony = colony();
        colony.build("lumber_camp").unwrap();
        colony.run_ticks(2);

        let bytes = colony.snapshot().unwrap();
        let mut restored = Colony::restore(&bytes, data()).unwrap();
        assert_eq!(colony.state_hash(), restored.state_hash());

        colony.run_ticks(5);
        restored.run_ticks(5);
        assert_eq!(colony.state_hash(), restored.state_hash());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let mut colony = colony();
        colony.build("lumber_camp").unwrap();
        colony.start_research("fire").unwrap();
        colony.run_ticks(10);

        let mut slot = MemorySlot::new();
        colony.save(&mut slot, 10_000).unwrap();
        assert!(Colony::has_save(&slot));

        let mut loaded = Colony::new(data(), EngineConfig::default(), 0);
        let report = loaded.load(&slot, 20_000).unwrap();
        assert!(report.is_none());
        assert_eq!(loaded.construction().level("lumber_camp"), 1);
        assert_eq!(
            loaded.construction().get("lumber_camp").unwrap().status,
            BuildingStatus::Built
        );
        assert!(loaded.research().is_researched("fire"));
        assert_eq!(loaded.ledger().multiplier("wood"), 2.0);
        assert_eq!(loaded.construction().speed_multiplier(), 2.0);
        assert_eq!(loaded.resource_limit("wood"), 600.0);
        assert_eq!(loaded.net_production("wood"), 2.0);
        assert!(loaded.achievements().is_unlocked("first_step"));
    }

    #[test]
    fn test_load_empty_slot_is_error() {
        let mut colony = colony();
        let slot = MemorySlot::new();
        assert!(matches!(colony.load(&slot, 0), Err(GameError::NoSave)));
    }

    #[test]
    fn test_failed_import_leaves_state() {
        let mut colony = colony();
        colony.run_ticks(3);
        let hash = colony.state_hash();
        let mut slot = MemorySlot::new();
        assert!(colony.import_save(&mut slot, "{broken", 0).is_err());
        assert!(!slot.exists());
        assert_eq!(colony.state_hash(), hash);
    }

    #[test]
    fn test_offline_gains_claimed_once() {
        let mut colony = colony();
        colony.build("lumber_camp").unwrap();
        colony.run_ticks(5);
        let json = colony.export_save(0).unwrap();

        let mut loaded = Colony::new(data(), EngineConfig::default(), 0);
        let report = loaded.load_str(&json, 300_000).unwrap().unwrap();
        assert_eq!(report.effective_secs, 300.0);

        let wood_before = loaded.resource_amount("wood");
        let gains = loaded.claim_offline_gains().unwrap();
        assert_eq!(gains.get("wood"), 300.0);
        assert_eq!(loaded.resource_amount("wood"), wood_before + 300.0);
        assert!(loaded.claim_offline_gains().is_none());
    }

    #[test]
    fn test_new_game_resets() {
        let mut colony = colony();
        colony.build("lumber_camp").unwrap();
        colony.advance_era();
        colony.run_ticks(5);
        colony.new_game(99);
        assert_eq!(colony.era(), Era::Stone);
        assert_eq!(colony.get_tick(), 0);
        assert!(colony.construction().is_empty());
        assert_eq!(colony.created_at(), 99);
    }
}
