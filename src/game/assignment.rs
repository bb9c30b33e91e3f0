use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::game::error::AssignmentError;

/// Ordered set of hero names a generation draws from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct HeroPool(Vec<String>);

impl HeroPool {
    /// Trims names, skips blanks and keeps only the first occurrence of each hero.
    pub fn new<I, S>(heroes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let heroes = heroes
            .into_iter()
            .map(|h| h.as_ref().trim().to_string())
            .filter(|h| !h.is_empty() && seen.insert(h.clone()))
            .collect();
        Self(heroes)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, hero: &str) -> bool {
        self.0.iter().any(|h| h == hero)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl From<Vec<String>> for HeroPool {
    fn from(heroes: Vec<String>) -> Self {
        Self::new(heroes)
    }
}

impl From<HeroPool> for Vec<String> {
    fn from(pool: HeroPool) -> Self {
        pool.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    A,
    B,
}

impl Team {
    /// Even player numbers play for A, odd ones for B.
    pub fn for_player(player_number: u8) -> Self {
        if player_number % 2 == 0 {
            Team::A
        } else {
            Team::B
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub slot_index: usize,
    pub player_number: u8,
    pub hero: String,
}

impl Slot {
    pub fn new(slot_index: usize, player_number: u8, hero: impl Into<String>) -> Self {
        Self {
            slot_index,
            player_number,
            hero: hero.into(),
        }
    }

    pub fn team(&self) -> Team {
        Team::for_player(self.player_number)
    }
}

/// One complete generation: every slot has a distinct player number and hero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Slot>", into = "Vec<Slot>")]
pub struct Assignment {
    slots: Vec<Slot>,
}

impl Assignment {
    /// Validates slot order, the player-number permutation and hero uniqueness.
    pub fn from_slots(slots: Vec<Slot>) -> Result<Self, AssignmentError> {
        let mut numbers = HashSet::new();
        let mut heroes = HashSet::new();

        for (position, slot) in slots.iter().enumerate() {
            if slot.slot_index != position {
                return Err(AssignmentError::Malformed(format!(
                    "slot {} found at position {position}",
                    slot.slot_index
                )));
            }
            if slot.player_number == 0 || usize::from(slot.player_number) > slots.len() {
                return Err(AssignmentError::Malformed(format!(
                    "player number {} outside 1..={}",
                    slot.player_number,
                    slots.len()
                )));
            }
            if !numbers.insert(slot.player_number) {
                return Err(AssignmentError::Malformed(format!(
                    "player number {} repeated",
                    slot.player_number
                )));
            }
            if !heroes.insert(slot.hero.as_str()) {
                return Err(AssignmentError::Malformed(format!(
                    "hero {:?} repeated",
                    slot.hero
                )));
            }
        }

        Ok(Self { slots })
    }

    /// Skips validation; only for slots built by the engine.
    pub(crate) fn from_trusted(slots: Vec<Slot>) -> Self {
        debug_assert!(Self::from_slots(slots.clone()).is_ok());
        Self { slots }
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn heroes(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|s| s.hero.as_str())
    }

    pub fn team_stats(&self) -> TeamStats {
        let mut stats = TeamStats::default();
        for slot in &self.slots {
            let side = match slot.team() {
                Team::A => &mut stats.team_a,
                Team::B => &mut stats.team_b,
            };
            side.players += 1;
            side.heroes.push(slot.hero.clone());
        }
        stats
    }

    pub fn is_balanced(&self) -> bool {
        let stats = self.team_stats();
        stats.team_a.players == stats.team_b.players
    }
}

impl TryFrom<Vec<Slot>> for Assignment {
    type Error = AssignmentError;

    fn try_from(slots: Vec<Slot>) -> Result<Self, Self::Error> {
        Self::from_slots(slots)
    }
}

impl From<Assignment> for Vec<Slot> {
    fn from(assignment: Assignment) -> Self {
        assignment.slots
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TeamSide {
    pub players: usize,
    pub heroes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamStats {
    pub team_a: TeamSide,
    pub team_b: TeamSide,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Assignment {
        Assignment::from_slots(vec![
            Slot::new(0, 1, "Anna"),
            Slot::new(1, 2, "Bob"),
            Slot::new(2, 3, "Cid"),
            Slot::new(3, 4, "Dee"),
        ])
        .unwrap()
    }

    #[test]
    fn pool_drops_blanks_and_duplicates_in_order() {
        let pool = HeroPool::new(["Anna", " Bob ", "", "Anna", "Cid", "  "]);
        assert_eq!(pool.as_slice(), ["Anna", "Bob", "Cid"]);
    }

    #[test]
    fn team_follows_parity() {
        assert_eq!(Team::for_player(2), Team::A);
        assert_eq!(Team::for_player(4), Team::A);
        assert_eq!(Team::for_player(1), Team::B);
        assert_eq!(Team::for_player(3), Team::B);
    }

    #[test]
    fn stats_split_heroes_by_team() {
        let stats = sample().team_stats();
        assert_eq!(stats.team_a.heroes, vec!["Bob", "Dee"]);
        assert_eq!(stats.team_b.heroes, vec!["Anna", "Cid"]);
        assert!(sample().is_balanced());
    }

    #[test]
    fn repeated_player_number_is_rejected() {
        let err = Assignment::from_slots(vec![
            Slot::new(0, 1, "Anna"),
            Slot::new(1, 1, "Bob"),
        ])
        .unwrap_err();
        assert!(matches!(err, AssignmentError::Malformed(_)));
    }

    #[test]
    fn repeated_hero_is_rejected() {
        let err = Assignment::from_slots(vec![
            Slot::new(0, 1, "Anna"),
            Slot::new(1, 2, "Anna"),
        ])
        .unwrap_err();
        assert!(matches!(err, AssignmentError::Malformed(_)));
    }

    #[test]
    fn deserializing_revalidates() {
        let json = r#"[{"slotIndex":0,"playerNumber":2,"hero":"Anna"},
                       {"slotIndex":1,"playerNumber":2,"hero":"Bob"}]"#;
        assert!(serde_json::from_str::<Assignment>(json).is_err());

        let stored = serde_json::to_string(&sample()).unwrap();
        let back: Assignment = serde_json::from_str(&stored).unwrap();
        assert_eq!(back, sample());
    }
}
