use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::game::assignment::{Assignment, HeroPool, Slot};
use crate::game::error::AssignmentError;

pub const DEFAULT_PLAYER_COUNT: usize = 4;

/// Unbiased in-place Fisher-Yates: walk down from the last index, swapping
/// each element with a uniformly chosen one at or below it.
pub fn fisher_yates<T, R: Rng>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}

/// Order-preserving `pool - to_exclude`.
pub fn exclude_heroes<S: AsRef<str>>(pool: &HeroPool, to_exclude: &[S]) -> HeroPool {
    let excluded: HashSet<&str> = to_exclude.iter().map(AsRef::as_ref).collect();
    HeroPool::new(pool.iter().filter(|h| !excluded.contains(h)))
}

/// Heroes of `pool` not already assigned to a slot.
pub fn available_heroes(pool: &HeroPool, assignment: &Assignment) -> HeroPool {
    let used: Vec<&str> = assignment.heroes().collect();
    exclude_heroes(pool, &used)
}

/// Produces and transforms assignments. The only state is the random source,
/// so every call is independent of the previous ones.
pub struct TeamAssignmentEngine<R = StdRng> {
    rng: R,
    player_count: u8,
}

impl TeamAssignmentEngine<StdRng> {
    pub fn from_os_rng(player_count: usize) -> Result<Self, AssignmentError> {
        Self::new(StdRng::from_os_rng(), player_count)
    }

    pub fn seeded(seed: u64, player_count: usize) -> Result<Self, AssignmentError> {
        Self::new(StdRng::seed_from_u64(seed), player_count)
    }
}

impl<R: Rng> TeamAssignmentEngine<R> {
    /// Player numbers are `u8`, so `player_count` must be in `1..=255`.
    pub fn new(rng: R, player_count: usize) -> Result<Self, AssignmentError> {
        let player_count = u8::try_from(player_count)
            .ok()
            .filter(|&n| n > 0)
            .ok_or(AssignmentError::InvalidPlayerCount {
                count: player_count,
            })?;
        Ok(Self { rng, player_count })
    }

    pub fn player_count(&self) -> usize {
        usize::from(self.player_count)
    }

    pub fn generate(&mut self, pool: &HeroPool) -> Result<Assignment, AssignmentError> {
        let count = self.player_count();
        ensure_enough(pool, count)?;

        let mut numbers: Vec<u8> = (1..=self.player_count).collect();
        fisher_yates(&mut numbers, &mut self.rng);

        let heroes = self.draw_heroes(pool, count);

        let slots = numbers
            .into_iter()
            .zip(heroes)
            .enumerate()
            .map(|(i, (number, hero))| Slot::new(i, number, hero))
            .collect();
        Ok(Assignment::from_trusted(slots))
    }

    pub fn reshuffle_all(&mut self, pool: &HeroPool) -> Result<Assignment, AssignmentError> {
        self.generate(pool)
    }

    /// New player numbers (and so teams); heroes stay on their slots.
    pub fn reshuffle_teams(&mut self, assignment: &Assignment) -> Assignment {
        let mut numbers: Vec<u8> = assignment.slots().iter().map(|s| s.player_number).collect();
        fisher_yates(&mut numbers, &mut self.rng);

        let slots = assignment
            .slots()
            .iter()
            .zip(numbers)
            .map(|(slot, number)| Slot::new(slot.slot_index, number, slot.hero.clone()))
            .collect();
        Assignment::from_trusted(slots)
    }

    /// Fresh heroes drawn from the whole pool; player numbers stay on their slots.
    pub fn reshuffle_heroes(
        &mut self,
        assignment: &Assignment,
        pool: &HeroPool,
    ) -> Result<Assignment, AssignmentError> {
        ensure_enough(pool, assignment.len())?;

        let heroes = self.draw_heroes(pool, assignment.len());
        let slots = assignment
            .slots()
            .iter()
            .zip(heroes)
            .map(|(slot, hero)| Slot::new(slot.slot_index, slot.player_number, hero))
            .collect();
        Ok(Assignment::from_trusted(slots))
    }

    /// Swaps the hero of one slot for a random hero not used anywhere in the
    /// assignment.
    pub fn reshuffle_one(
        &mut self,
        slot_index: usize,
        assignment: &Assignment,
        pool: &HeroPool,
    ) -> Result<Assignment, AssignmentError> {
        if slot_index >= assignment.len() {
            return Err(AssignmentError::InvalidSlotIndex {
                index: slot_index,
                len: assignment.len(),
            });
        }

        let available = available_heroes(pool, assignment);
        if available.is_empty() {
            return Err(AssignmentError::NoAvailableHeroes);
        }
        let pick = self.rng.random_range(0..available.len());
        let hero = &available.as_slice()[pick];

        let mut slots = assignment.slots().to_vec();
        slots[slot_index].hero = hero.clone();
        Ok(Assignment::from_trusted(slots))
    }

    fn draw_heroes(&mut self, pool: &HeroPool, count: usize) -> Vec<String> {
        let mut heroes = pool.as_slice().to_vec();
        fisher_yates(&mut heroes, &mut self.rng);
        heroes.truncate(count);
        heroes
    }
}

fn ensure_enough(pool: &HeroPool, required: usize) -> Result<(), AssignmentError> {
    if pool.len() < required {
        return Err(AssignmentError::InsufficientHeroes {
            required,
            available: pool.len(),
        });
    }
    Ok(())
}
