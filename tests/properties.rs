// Test code is allowed to panic on failure
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

//! Property-based tests for the assignment engine.

use std::collections::HashSet;

use proptest::prelude::*;

use randomatched_server::game::{
    exclude_heroes, Assignment, AssignmentError, HeroPool, Team, TeamAssignmentEngine,
    DEFAULT_PLAYER_COUNT,
};

/// Pools of 4 to 30 distinct hero names.
fn valid_pool() -> impl Strategy<Value = HeroPool> {
    prop::collection::hash_set("[A-Z][a-z]{2,8}", 4..=30)
        .prop_map(HeroPool::new)
}

fn small_pool() -> impl Strategy<Value = HeroPool> {
    prop::collection::hash_set("[A-Z][a-z]{2,8}", 0..4).prop_map(HeroPool::new)
}

fn assert_well_formed(a: &Assignment, pool: &HeroPool) {
    let numbers: HashSet<u8> = a.slots().iter().map(|s| s.player_number).collect();
    assert_eq!(numbers, (1..=DEFAULT_PLAYER_COUNT as u8).collect::<HashSet<u8>>());

    let heroes: HashSet<&str> = a.heroes().collect();
    assert_eq!(heroes.len(), a.len());
    assert!(heroes.iter().all(|h| pool.contains(h)));

    for slot in a.slots() {
        assert_eq!(slot.team() == Team::A, slot.player_number % 2 == 0);
    }
}

proptest! {
    #[test]
    fn generate_is_always_well_formed(pool in valid_pool(), seed in any::<u64>()) {
        let mut engine = TeamAssignmentEngine::seeded(seed, DEFAULT_PLAYER_COUNT).unwrap();
        let a = engine.generate(&pool).unwrap();
        prop_assert_eq!(a.len(), DEFAULT_PLAYER_COUNT);
        assert_well_formed(&a, &pool);
        prop_assert!(a.is_balanced());
    }

    #[test]
    fn generate_rejects_small_pools(pool in small_pool(), seed in any::<u64>()) {
        let mut engine = TeamAssignmentEngine::seeded(seed, DEFAULT_PLAYER_COUNT).unwrap();
        let err = engine.generate(&pool).unwrap_err();
        prop_assert_eq!(
            err,
            AssignmentError::InsufficientHeroes { required: DEFAULT_PLAYER_COUNT, available: pool.len() }
        );
    }

    #[test]
    fn reshuffle_teams_keeps_slot_hero_pairs(pool in valid_pool(), seed in any::<u64>()) {
        let mut engine = TeamAssignmentEngine::seeded(seed, DEFAULT_PLAYER_COUNT).unwrap();
        let before = engine.generate(&pool).unwrap();
        let after = engine.reshuffle_teams(&before);

        for (old, new) in before.slots().iter().zip(after.slots()) {
            prop_assert_eq!(old.slot_index, new.slot_index);
            prop_assert_eq!(&old.hero, &new.hero);
        }
        assert_well_formed(&after, &pool);
    }

    #[test]
    fn reshuffle_heroes_keeps_slot_number_pairs(pool in valid_pool(), seed in any::<u64>()) {
        let mut engine = TeamAssignmentEngine::seeded(seed, DEFAULT_PLAYER_COUNT).unwrap();
        let before = engine.generate(&pool).unwrap();
        let after = engine.reshuffle_heroes(&before, &pool).unwrap();

        for (old, new) in before.slots().iter().zip(after.slots()) {
            prop_assert_eq!(old.slot_index, new.slot_index);
            prop_assert_eq!(old.player_number, new.player_number);
        }
        assert_well_formed(&after, &pool);
    }

    #[test]
    fn reshuffle_one_touches_only_its_slot(
        pool in valid_pool(),
        seed in any::<u64>(),
        slot in 0..DEFAULT_PLAYER_COUNT,
    ) {
        let mut engine = TeamAssignmentEngine::seeded(seed, DEFAULT_PLAYER_COUNT).unwrap();
        let before = engine.generate(&pool).unwrap();

        match engine.reshuffle_one(slot, &before, &pool) {
            Ok(after) => {
                for i in (0..before.len()).filter(|&i| i != slot) {
                    prop_assert_eq!(&before.slots()[i], &after.slots()[i]);
                }
                prop_assert_eq!(before.slots()[slot].player_number, after.slots()[slot].player_number);
                prop_assert!(!before.heroes().any(|h| h == after.slots()[slot].hero));
                assert_well_formed(&after, &pool);
            }
            Err(e) => {
                prop_assert_eq!(e, AssignmentError::NoAvailableHeroes);
                prop_assert_eq!(pool.len(), DEFAULT_PLAYER_COUNT);
            }
        }
    }

    #[test]
    fn exclusion_never_keeps_excluded_heroes(
        pool in valid_pool(),
        picks in prop::collection::vec(any::<prop::sample::Index>(), 0..10),
    ) {
        let names = pool.as_slice();
        let excluded: Vec<&str> = picks.iter().map(|i| names[i.index(names.len())].as_str()).collect();
        let left = exclude_heroes(&pool, &excluded);

        prop_assert!(left.iter().all(|h| !excluded.contains(&h)));
        let expected: Vec<&str> = pool.iter().filter(|h| !excluded.contains(h)).collect();
        prop_assert_eq!(left.iter().collect::<Vec<_>>(), expected);
    }
}

#[test]
fn excluding_nothing_returns_the_pool() {
    let pool = HeroPool::new(["Anna", "Bob", "Cid", "Dee", "Eve"]);
    let nothing: Vec<String> = Vec::new();
    assert_eq!(exclude_heroes(&pool, &nothing), pool);
}
