pub mod assignment;
pub mod engine;
pub mod error;

pub use assignment::{Assignment, HeroPool, Slot, Team, TeamStats};
pub use engine::{exclude_heroes, TeamAssignmentEngine, DEFAULT_PLAYER_COUNT};
pub use error::AssignmentError;
