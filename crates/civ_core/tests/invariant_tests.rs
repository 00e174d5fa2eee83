//! Property tests: random player input never breaks colony invariants.

use std::collections::BTreeSet;

use civ_core::research::TechStatus;
use civ_core::simulation::Colony;
use civ_test_utils::determinism::strategies::{apply_all, arb_command_sequence};
use civ_test_utils::determinism::{run_parallel_colonies, verify_snapshot_determinism};
use civ_test_utils::fixtures::{established_colony, new_colony, rich_colony, stone_age_data};
use proptest::prelude::*;

fn unlocked(colony: &Colony) -> BTreeSet<String> {
    colony
        .achievements()
        .instances()
        .filter(|a| a.unlocked)
        .map(|a| a.achievement_id.clone())
        .collect()
}

fn researched(colony: &Colony) -> BTreeSet<String> {
    colony
        .technologies_with_status(TechStatus::Researched)
        .into_iter()
        .collect()
}

fn assert_bounded(colony: &Colony) {
    for (id, state) in colony.ledger().iter() {
        assert!(state.amount >= 0.0, "{id} went negative: {}", state.amount);
        assert!(
            state.amount <= state.capacity,
            "{id} above capacity: {} > {}",
            state.amount,
            state.capacity
        );
        assert!(state.multiplier >= 1.0, "{id} multiplier fell below 1");
    }
    let population = colony.population();
    assert!(population.current >= 0.0);
    assert!(population.current <= population.max);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn test_stockpiles_stay_bounded(commands in arb_command_sequence(40)) {
        let mut colony = rich_colony();
        apply_all(&mut colony, &commands);
        assert_bounded(&colony);
    }

    #[test]
    fn test_progress_is_monotonic(
        first in arb_command_sequence(25),
        second in arb_command_sequence(25),
    ) {
        let mut colony = rich_colony();
        apply_all(&mut colony, &first);
        let achievements = unlocked(&colony);
        let techs = researched(&colony);
        let era = colony.era();
        let levels: Vec<(String, u32)> = colony
            .construction()
            .instances()
            .map(|b| (b.building_id.clone(), b.level))
            .collect();

        apply_all(&mut colony, &second);

        prop_assert!(unlocked(&colony).is_superset(&achievements));
        prop_assert!(researched(&colony).is_superset(&techs));
        prop_assert!(colony.era() >= era);
        for (id, level) in levels {
            prop_assert!(colony.construction().level(&id) >= level);
        }
    }

    #[test]
    fn test_at_most_one_active_research(commands in arb_command_sequence(40)) {
        let mut colony = rich_colony();
        apply_all(&mut colony, &commands);
        let researching = colony.technologies_with_status(TechStatus::Researching);
        prop_assert!(researching.len() <= 1);
        prop_assert_eq!(researching.first().map(String::as_str), colony.research().active());
    }

    #[test]
    fn test_same_input_same_state(commands in arb_command_sequence(30)) {
        let mut a = rich_colony();
        let mut b = rich_colony();
        apply_all(&mut a, &commands);
        apply_all(&mut b, &commands);
        prop_assert_eq!(a.state_hash(), b.state_hash());
    }

    #[test]
    fn test_save_round_trip_keeps_structure(commands in arb_command_sequence(30)) {
        let mut colony = rich_colony();
        apply_all(&mut colony, &commands);
        let json = colony.export_save(0).unwrap();

        let mut loaded = new_colony();
        loaded.load_str(&json, 0).unwrap();

        prop_assert_eq!(loaded.era(), colony.era());
        prop_assert_eq!(researched(&loaded), researched(&colony));
        prop_assert_eq!(unlocked(&loaded), unlocked(&colony));
        for building in colony.construction().instances() {
            prop_assert_eq!(loaded.construction().level(&building.building_id), building.level);
        }
        assert_bounded(&loaded);
    }
}

#[test]
fn test_parallel_colonies_agree() {
    run_parallel_colonies(established_colony, 4, 300).assert_deterministic();
}

#[test]
fn test_snapshot_resumes_identically() {
    assert!(verify_snapshot_determinism(
        established_colony,
        &stone_age_data(),
        50,
        200
    ));
}
