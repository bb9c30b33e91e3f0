pub mod session;

pub use session::{Destructive, Session, SessionError, SharedStore};
