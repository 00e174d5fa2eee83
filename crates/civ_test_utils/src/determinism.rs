//! Determinism testing utilities.
//!
//! Provides a harness for verifying that a colony produces identical
//! results given identical inputs.
//!
//! # Testing Strategy
//!
//! The engine has no wall-clock reads and no randomness, so the remaining
//! sources of non-determinism are:
//!
//! - **Map iteration order**: every engine table is a `BTreeMap`; nothing may
//!   iterate a `HashMap` while mutating state.
//!
//! - **Floating-point evaluation order**: stockpiles are `f64`, so the same
//!   operations must run in the same order every tick.
//!
//! - **Timestamps**: construction and research timers run on the colony's
//!   active clock, never on a host-supplied wall clock.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: individual engines (ledger, construction, research)
//! 2. **Property tests**: random command sequences still replay identically
//! 3. **Integration tests**: snapshot and save round-trips are reproducible
//! 4. **Parallel tests**: running N colonies on threads all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::thread;

use civ_core::data::GameData;
use civ_core::simulation::Colony;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic colony).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the runs were deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Colony is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `ticks` - Number of ticks to simulate per run
/// * `setup` - Function to create initial state
/// * `step` - Function to advance the state by one tick
/// * `hash` - Function to compute the state hash
///
/// # Example
///
/// ```
/// use civ_test_utils::determinism::verify_determinism;
/// use civ_test_utils::fixtures::established_colony;
///
/// let result = verify_determinism(
///     3,
///     100,
///     established_colony,
///     |colony| { colony.tick(); },
///     |colony| colony.state_hash(),
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Run a colony twice with identical setup and compare final hashes.
pub fn verify_colony_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> Colony,
{
    verify_determinism(
        2,
        num_ticks,
        &setup_fn,
        |colony| {
            colony.tick();
        },
        Colony::state_hash,
    )
    .is_deterministic
}

/// Result of parallel colony runs.
#[derive(Debug, Clone)]
pub struct ParallelRunResult {
    /// Final state hash from each colony.
    pub hashes: Vec<u64>,
    /// Number of ticks each colony ran.
    pub ticks: u64,
    /// Number of colonies run.
    pub num_runs: usize,
}

impl ParallelRunResult {
    /// Check if all colonies produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all colonies matched.
    ///
    /// # Panics
    ///
    /// Panics if colonies produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic() {
            let mut unique: Vec<u64> = self.hashes.clone();
            unique.sort_unstable();
            unique.dedup();
            panic!(
                "Parallel colonies diverged!\n\
                 Colonies: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {}\n\
                 All hashes: {:?}",
                self.num_runs,
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run N colonies on scoped threads and collect final hashes.
///
/// # Panics
///
/// Panics if a worker thread panics.
pub fn run_parallel_colonies<F>(setup_fn: F, num_runs: usize, num_ticks: u64) -> ParallelRunResult
where
    F: Fn() -> Colony + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_runs)
            .map(|_| {
                s.spawn(|| {
                    let mut colony = setup_fn();
                    for _ in 0..num_ticks {
                        colony.tick();
                    }
                    colony.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("colony thread panicked"))
            .collect()
    });

    ParallelRunResult {
        hashes,
        ticks: num_ticks,
        num_runs,
    }
}

/// Compare two colony runs tick-by-tick, finding first divergence.
///
/// # Returns
///
/// `None` if the runs are deterministic, `Some(tick)` if they diverge at
/// that tick.
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64) -> Option<u64>
where
    F: Fn() -> Colony,
{
    let mut a = setup_fn();
    let mut b = setup_fn();

    if a.state_hash() != b.state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        a.tick();
        b.tick();

        if a.state_hash() != b.state_hash() {
            return Some(tick);
        }
    }

    None
}

/// Verify that a snapshot round-trip preserves the colony exactly, both
/// immediately and after `ticks_after` further ticks.
pub fn verify_snapshot_determinism<F>(
    setup_fn: F,
    data: &Arc<GameData>,
    num_ticks: u64,
    ticks_after: u64,
) -> bool
where
    F: Fn() -> Colony,
{
    let mut colony = setup_fn();
    for _ in 0..num_ticks {
        colony.tick();
    }

    let Ok(bytes) = colony.snapshot() else {
        return false;
    };
    let Ok(mut restored) = Colony::restore(&bytes, Arc::clone(data)) else {
        return false;
    };
    if colony.state_hash() != restored.state_hash() {
        return false;
    }

    for _ in 0..ticks_after {
        colony.tick();
        restored.tick();
    }
    colony.state_hash() == restored.state_hash()
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for colony command sequences.
///
/// These strategies generate random but reproducible player input over the
/// stone-age fixture.
pub mod strategies {
    use civ_core::config::GameSpeed;
    use civ_core::simulation::Colony;
    use proptest::prelude::*;

    use crate::fixtures::{BUILDING_IDS, TECH_IDS};

    /// One player action or a pause in input.
    #[derive(Debug, Clone, PartialEq)]
    pub enum ColonyCommand {
        /// Build or upgrade a building.
        Build(&'static str),
        /// Start researching a technology.
        Research(&'static str),
        /// Cancel research of a technology.
        CancelResearch(&'static str),
        /// Advance to the next era.
        AdvanceEra,
        /// Pause gameplay.
        Pause,
        /// Resume gameplay.
        Resume,
        /// Change the game speed.
        SetSpeed(GameSpeed),
        /// Run this many ticks.
        Wait(u32),
    }

    impl ColonyCommand {
        /// Apply the command. Rejected commands are ignored.
        pub fn apply(&self, colony: &mut Colony) {
            match self {
                Self::Build(id) => {
                    let _ = colony.build(id);
                }
                Self::Research(id) => {
                    let _ = colony.start_research(id);
                }
                Self::CancelResearch(id) => {
                    let _ = colony.cancel_research(id);
                }
                Self::AdvanceEra => {
                    colony.advance_era();
                }
                Self::Pause => colony.pause(),
                Self::Resume => colony.resume(),
                Self::SetSpeed(speed) => colony.set_speed_preset(*speed),
                Self::Wait(ticks) => {
                    colony.run_ticks(*ticks);
                }
            }
        }
    }

    /// Apply a whole command sequence.
    pub fn apply_all(colony: &mut Colony, commands: &[ColonyCommand]) {
        for command in commands {
            command.apply(colony);
        }
    }

    /// Generate a building ID from the fixture.
    pub fn arb_building_id() -> impl Strategy<Value = &'static str> {
        prop::sample::select(BUILDING_IDS.to_vec())
    }

    /// Generate a technology ID from the fixture.
    pub fn arb_tech_id() -> impl Strategy<Value = &'static str> {
        prop::sample::select(TECH_IDS.to_vec())
    }

    /// Generate a speed preset.
    pub fn arb_game_speed() -> impl Strategy<Value = GameSpeed> {
        prop_oneof![
            Just(GameSpeed::Casual),
            Just(GameSpeed::Normal),
            Just(GameSpeed::Fast),
            Just(GameSpeed::Turbo),
        ]
    }

    /// Generate any command, weighted toward building and waiting.
    pub fn arb_command() -> impl Strategy<Value = ColonyCommand> {
        prop_oneof![
            4 => arb_building_id().prop_map(ColonyCommand::Build),
            2 => arb_tech_id().prop_map(ColonyCommand::Research),
            1 => arb_tech_id().prop_map(ColonyCommand::CancelResearch),
            1 => Just(ColonyCommand::AdvanceEra),
            1 => Just(ColonyCommand::Pause),
            1 => Just(ColonyCommand::Resume),
            1 => arb_game_speed().prop_map(ColonyCommand::SetSpeed),
            4 => (1u32..30).prop_map(ColonyCommand::Wait),
        ]
    }

    /// Generate a sequence of commands.
    pub fn arb_command_sequence(max_len: usize) -> impl Strategy<Value = Vec<ColonyCommand>> {
        proptest::collection::vec(arb_command(), 0..max_len)
    }
}

#[cfg(test)]
mod tests {
    use super::strategies::*;
    use super::*;
    use crate::fixtures::{established_colony, new_colony, rich_colony, stone_age_data};
    use proptest::prelude::*;

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(3, 100, || 0u64, |n| *n += 1, |n| *n);

        assert!(result.is_deterministic);
        assert_eq!(result.hashes, vec![100, 100, 100]);
    }

    #[test]
    fn test_new_colony_determinism() {
        assert!(verify_colony_determinism(new_colony, 100));
    }

    #[test]
    fn test_established_colony_determinism() {
        assert!(verify_colony_determinism(established_colony, 300));
    }

    #[test]
    fn test_find_divergence_on_deterministic_colony() {
        assert!(find_first_divergence(established_colony, 100).is_none());
    }

    #[test]
    fn test_snapshot_preserves_state() {
        let data = stone_age_data();
        assert!(verify_snapshot_determinism(established_colony, &data, 15, 50));
    }

    #[test]
    fn test_parallel_colonies() {
        run_parallel_colonies(established_colony, 4, 200).assert_deterministic();
    }

    #[test]
    fn test_compute_hash_stable() {
        assert_eq!(compute_hash(&"colony"), compute_hash(&"colony"));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_command_sequences_replay_identically(
            commands in arb_command_sequence(40)
        ) {
            let mut a = rich_colony();
            let mut b = rich_colony();
            apply_all(&mut a, &commands);
            apply_all(&mut b, &commands);
            prop_assert_eq!(a.state_hash(), b.state_hash());
        }

        #[test]
        fn prop_snapshot_mid_sequence(
            before in arb_command_sequence(20),
            after in arb_command_sequence(20),
        ) {
            let data = stone_age_data();
            let mut colony = rich_colony();
            apply_all(&mut colony, &before);

            let bytes = colony.snapshot().unwrap();
            let mut restored = Colony::restore(&bytes, data).unwrap();
            apply_all(&mut colony, &after);
            apply_all(&mut restored, &after);
            prop_assert_eq!(colony.state_hash(), restored.state_hash());
        }
    }
}
