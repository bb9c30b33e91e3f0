use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use crate::game::{exclude_heroes, Assignment, AssignmentError, HeroPool, TeamAssignmentEngine};
use crate::store::{Store, StoreError, StoreStats};
use crate::surface::{ConfirmRequest, Confirmer, Notifier, Severity};
use crate::types::{Generation, HeroList, ListId, ListKind, Theme};

pub type SharedStore = Arc<Mutex<Store>>;

const SHORT: Duration = Duration::from_millis(2000);
const LONG: Duration = Duration::from_millis(3000);

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("select a hero list first")]
    NoActiveList,

    #[error("generate teams first")]
    NoGeneration,

    #[error(transparent)]
    Assignment(#[from] AssignmentError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Operations that need the user's go-ahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destructive {
    ExcludeOne { slot: usize },
    ExcludeAll,
    ResetSession,
}

/// One user's working state: which list is in play and the assignment on
/// screen. Storage and the user-facing surfaces come in from outside.
pub struct Session {
    store: SharedStore,
    engine: TeamAssignmentEngine,
    notifier: Box<dyn Notifier>,
    current: Option<Assignment>,
}

impl Session {
    pub fn new(store: SharedStore, engine: TeamAssignmentEngine, notifier: Box<dyn Notifier>) -> Self {
        Self {
            store,
            engine,
            notifier,
            current: None,
        }
    }

    pub fn current(&self) -> Option<&Assignment> {
        self.current.as_ref()
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, message: &str, severity: Severity, duration: Duration) {
        self.notifier.notify(message, severity, duration);
    }

    /// Runs `op` and tells the user about any failure.
    fn reported<T>(
        &mut self,
        op: impl FnOnce(&mut Self) -> Result<T, SessionError>,
    ) -> Result<T, SessionError> {
        let result = op(&mut *self);
        if let Err(e) = &result {
            let severity = match e {
                SessionError::Assignment(AssignmentError::NoAvailableHeroes) => Severity::Warning,
                _ => Severity::Error,
            };
            self.notify(&e.to_string(), severity, LONG);
        }
        result
    }

    fn active_list(&self) -> Result<HeroList, SessionError> {
        self.store().active_list().cloned().ok_or(SessionError::NoActiveList)
    }

    fn pool(&self) -> Result<HeroPool, SessionError> {
        Ok(HeroPool::new(self.active_list()?.heroes))
    }

    fn current_or_err(&self) -> Result<Assignment, SessionError> {
        self.current.clone().ok_or(SessionError::NoGeneration)
    }

    /// The assignment becomes current even when writing it out fails, so
    /// the screen and the stored generation never disagree.
    fn commit(&mut self, assignment: Assignment) -> Result<Assignment, SessionError> {
        debug!(?assignment, "new assignment");
        self.current = Some(assignment.clone());
        self.store().save_last_generation(&assignment)?;
        Ok(assignment)
    }

    pub fn lists(&self) -> (Vec<HeroList>, Option<ListId>) {
        let store = self.store();
        let lists = store.lists(None).into_iter().cloned().collect();
        (lists, store.data().active_list.clone())
    }

    pub fn create_list(&mut self, name: &str, heroes: Vec<String>) -> Result<HeroList, SessionError> {
        self.reported(|s| {
            let heroes = HeroPool::new(heroes).into_vec();
            let list = {
                let mut store = s.store();
                let list = store.create_local_list(name, heroes)?;
                store.set_active_list(&list.id)?;
                list
            };
            info!("created list {} with {} heroes", list.id, list.heroes.len());
            s.notify(&format!("List \"{}\" saved", list.name), Severity::Success, SHORT);
            Ok(list)
        })
    }

    pub fn select_list(&mut self, id: &str) -> Result<(), SessionError> {
        self.reported(|s| {
            s.store().set_active_list(id)?;
            Ok(())
        })
    }

    pub fn generate(&mut self) -> Result<Assignment, SessionError> {
        self.reported(|s| {
            let pool = s.pool()?;
            let assignment = s.engine.generate(&pool)?;
            let assignment = s.commit(assignment)?;
            s.notify("Teams generated", Severity::Success, SHORT);
            Ok(assignment)
        })
    }

    pub fn reshuffle_all(&mut self) -> Result<Assignment, SessionError> {
        self.reported(|s| {
            let pool = s.pool()?;
            let assignment = s.engine.reshuffle_all(&pool)?;
            let assignment = s.commit(assignment)?;
            s.notify("Everything reshuffled", Severity::Success, SHORT);
            Ok(assignment)
        })
    }

    pub fn reshuffle_teams(&mut self) -> Result<Assignment, SessionError> {
        self.reported(|s| {
            let current = s.current_or_err()?;
            let assignment = s.engine.reshuffle_teams(&current);
            let assignment = s.commit(assignment)?;
            s.notify("Teams shuffled", Severity::Success, SHORT);
            Ok(assignment)
        })
    }

    pub fn reshuffle_heroes(&mut self) -> Result<Assignment, SessionError> {
        self.reported(|s| {
            let current = s.current_or_err()?;
            let pool = s.pool()?;
            let assignment = s.engine.reshuffle_heroes(&current, &pool)?;
            let assignment = s.commit(assignment)?;
            s.notify("Heroes shuffled", Severity::Success, SHORT);
            Ok(assignment)
        })
    }

    pub fn reshuffle_one(&mut self, slot: usize) -> Result<Assignment, SessionError> {
        self.reported(|s| {
            let current = s.current_or_err()?;
            let pool = s.pool()?;
            let assignment = s.engine.reshuffle_one(slot, &current, &pool)?;
            let message = format!(
                "Hero changed: {} → {}",
                current.slots()[slot].hero,
                assignment.slots()[slot].hero
            );
            let assignment = s.commit(assignment)?;
            s.notify(&message, Severity::Success, SHORT);
            Ok(assignment)
        })
    }

    /// Checks that `action` can run on the current assignment, without asking
    /// anyone. Failures are reported like any other.
    pub fn check(&mut self, action: Destructive) -> Result<(), SessionError> {
        self.reported(|s| match action {
            Destructive::ExcludeOne { slot } => {
                let current = s.current_or_err()?;
                if slot >= current.len() {
                    return Err(AssignmentError::InvalidSlotIndex {
                        index: slot,
                        len: current.len(),
                    }
                    .into());
                }
                Ok(())
            }
            Destructive::ExcludeAll => s.current_or_err().map(|_| ()),
            Destructive::ResetSession => Ok(()),
        })
    }

    /// What to ask the user before running `action`.
    pub fn confirmation(&self, action: Destructive) -> ConfirmRequest {
        let (title, message, confirm_text) = match action {
            Destructive::ExcludeOne { slot } => {
                let hero = self
                    .current
                    .as_ref()
                    .and_then(|a| a.slots().get(slot))
                    .map_or("this hero", |s| s.hero.as_str());
                (
                    "Exclude hero",
                    format!("Exclude \"{hero}\" from future generations?"),
                    "Exclude",
                )
            }
            Destructive::ExcludeAll => (
                "Exclude heroes",
                "Exclude every hero of this generation? They will be added to the exclusion list."
                    .to_string(),
                "Exclude",
            ),
            Destructive::ResetSession => (
                "Reset session",
                "Reset the session? Exclusion lists and the last generation will be lost."
                    .to_string(),
                "Reset",
            ),
        };
        ConfirmRequest {
            title: title.to_string(),
            message,
            confirm_text: confirm_text.to_string(),
            cancel_text: "Cancel".to_string(),
            destructive: true,
        }
    }

    /// Narrows the active list to `heroes`. An exclusion list is updated in
    /// place; any other list gets a new exclusion list derived from it.
    fn write_exclusions(&self, base: &HeroList, heroes: HeroPool) -> Result<ListId, SessionError> {
        let mut store = self.store();
        let id = if base.kind == ListKind::Temp {
            let mut narrowed = base.clone();
            narrowed.heroes = heroes.into_vec();
            store.save_list(narrowed)?;
            base.id.clone()
        } else {
            let name = format!("{} (exclusions)", base.name);
            store.create_temp_list(&name, heroes.into_vec(), &base.id)?.id
        };
        store.set_active_list(&id)?;
        Ok(id)
    }

    /// Returns `Ok(false)` when the user declined.
    pub fn exclude_one(&mut self, slot: usize, confirmer: &dyn Confirmer) -> Result<bool, SessionError> {
        self.reported(|s| {
            let current = s.current_or_err()?;
            let Some(hero) = current.slots().get(slot).map(|sl| sl.hero.clone()) else {
                return Err(AssignmentError::InvalidSlotIndex {
                    index: slot,
                    len: current.len(),
                }
                .into());
            };
            if !confirmer.confirm(&s.confirmation(Destructive::ExcludeOne { slot })) {
                return Ok(false);
            }

            let base = s.active_list()?;
            let remaining = exclude_heroes(&HeroPool::new(&base.heroes), &[hero.as_str()]);
            s.write_exclusions(&base, remaining.clone())?;
            s.notify(&format!("Hero \"{hero}\" excluded"), Severity::Success, SHORT);

            match s.engine.reshuffle_one(slot, &current, &remaining) {
                Ok(assignment) => {
                    s.commit(assignment)?;
                }
                Err(AssignmentError::NoAvailableHeroes) => {
                    s.notify("No heroes left to swap in", Severity::Warning, LONG);
                }
                Err(e) => return Err(e.into()),
            }
            Ok(true)
        })
    }

    pub fn exclude_all(&mut self, confirmer: &dyn Confirmer) -> Result<bool, SessionError> {
        self.reported(|s| {
            let current = s.current_or_err()?;
            if !confirmer.confirm(&s.confirmation(Destructive::ExcludeAll)) {
                return Ok(false);
            }

            let base = s.active_list()?;
            let used: Vec<&str> = current.heroes().collect();
            let remaining = exclude_heroes(&HeroPool::new(&base.heroes), &used);
            let left = remaining.len();
            s.write_exclusions(&base, remaining)?;

            s.notify(&format!("Excluded {} heroes", used.len()), Severity::Success, LONG);
            if left < s.engine.player_count() {
                s.notify(
                    &format!("Only {left} heroes left, add more before generating again"),
                    Severity::Warning,
                    LONG,
                );
            }
            Ok(true)
        })
    }

    pub fn reset_session(&mut self, confirmer: &dyn Confirmer) -> Result<bool, SessionError> {
        self.reported(|s| {
            if !confirmer.confirm(&s.confirmation(Destructive::ResetSession)) {
                return Ok(false);
            }
            let removed = {
                let mut store = s.store();
                let removed = store.clear_session()?;
                store.clear_active_list()?;
                store.clear_last_generation()?;
                removed
            };
            s.current = None;
            info!("session reset, {removed} exclusion lists removed");
            s.notify("Session reset", Severity::Success, LONG);
            Ok(true)
        })
    }

    /// Makes the stored generation current again, if there is one.
    pub fn restore_last_generation(&mut self) -> Option<Generation> {
        let generation = self.store().last_generation().cloned()?;
        self.current = Some(generation.assignment.clone());
        Some(generation)
    }

    pub fn theme(&self) -> Theme {
        self.store().theme()
    }

    pub fn set_theme(&mut self, theme: Theme) -> Result<(), SessionError> {
        self.reported(|s| {
            s.store().set_theme(theme)?;
            Ok(())
        })
    }

    pub fn stats(&self) -> StoreStats {
        self.store().stats()
    }
}
