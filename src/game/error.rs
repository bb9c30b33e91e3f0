use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssignmentError {
    #[error("need at least {required} heroes, the list has {available}")]
    InsufficientHeroes { required: usize, available: usize },

    #[error("slot {index} does not exist (assignment has {len} slots)")]
    InvalidSlotIndex { index: usize, len: usize },

    #[error("no heroes left to swap in")]
    NoAvailableHeroes,

    #[error("player count must be between 1 and {max}, got {count}", max = u8::MAX)]
    InvalidPlayerCount { count: usize },

    #[error("malformed assignment: {0}")]
    Malformed(String),
}
