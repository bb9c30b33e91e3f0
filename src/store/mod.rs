//! Hero lists, the active list, the last generation and user preferences.
//!
//! `Store` keeps everything in memory and writes the whole document through
//! its [`Backend`] after every change, the same way the browser app kept one
//! JSON blob in local storage.

pub mod backend;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::game::Assignment;
use crate::types::{Generation, HeroList, ListId, ListKind, Theme};

pub use backend::{Backend, FileBackend, MemoryBackend};

pub const EXPORT_VERSION: &str = "1.0.0";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("invalid hero list: {0}")]
    InvalidList(String),

    #[error("unknown hero list {0}")]
    UnknownList(ListId),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage format error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoreData {
    pub lists: BTreeMap<ListId, HeroList>,
    pub active_list: Option<ListId>,
    pub last_generation: Option<Generation>,
    pub theme: Theme,
    pub settings: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedData {
    #[serde(flatten)]
    pub data: StoreData,
    pub export_date: DateTime<Utc>,
    pub version: &'static str,
}

/// Data accepted by [`Store::import_data`]. Theme and settings are optional so
/// an import without them keeps the current ones.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImportData {
    pub lists: BTreeMap<ListId, HeroList>,
    pub active_list: Option<ListId>,
    pub last_generation: Option<Generation>,
    pub theme: Option<Theme>,
    pub settings: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub total_lists: usize,
    pub local_lists: usize,
    pub temp_lists: usize,
    pub total_heroes: usize,
    pub last_generation: Option<DateTime<Utc>>,
}

pub struct Store {
    data: StoreData,
    backend: Box<dyn Backend>,
}

impl Store {
    pub fn open(backend: impl Backend + 'static) -> Self {
        let mut backend: Box<dyn Backend> = Box::new(backend);
        let data = match backend.load() {
            Ok(Some(data)) => data,
            Ok(None) => StoreData::default(),
            Err(e) => {
                error!("stored data unreadable, starting fresh: {e}");
                let data = StoreData::default();
                if let Err(e) = backend.save(&data) {
                    error!("could not reset storage: {e}");
                }
                data
            }
        };
        info!("store opened with {} hero lists", data.lists.len());
        Self { data, backend }
    }

    pub fn in_memory() -> Self {
        Self::open(MemoryBackend::new())
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        self.backend.save(&self.data).map_err(|e| {
            error!("saving store failed: {e}");
            e
        })
    }

    pub fn data(&self) -> &StoreData {
        &self.data
    }

    pub fn lists(&self, kind: Option<ListKind>) -> Vec<&HeroList> {
        self.data
            .lists
            .values()
            .filter(|l| kind.map_or(true, |k| l.kind == k))
            .collect()
    }

    pub fn get_list(&self, id: &str) -> Option<&HeroList> {
        self.data.lists.get(id)
    }

    pub fn save_list(&mut self, mut list: HeroList) -> Result<(), StoreError> {
        validate_list(&list)?;
        list.updated_at = Utc::now();
        self.data.lists.insert(list.id.clone(), list);
        self.persist()
    }

    /// Returns false when no list had that id.
    pub fn delete_list(&mut self, id: &str) -> Result<bool, StoreError> {
        if self.data.lists.remove(id).is_none() {
            return Ok(false);
        }
        if self.data.active_list.as_deref() == Some(id) {
            self.data.active_list = None;
        }
        self.persist()?;
        Ok(true)
    }

    pub fn active_list(&self) -> Option<&HeroList> {
        self.data
            .active_list
            .as_deref()
            .and_then(|id| self.data.lists.get(id))
    }

    pub fn set_active_list(&mut self, id: &str) -> Result<(), StoreError> {
        if !self.data.lists.contains_key(id) {
            warn!("cannot activate unknown list {id}");
            return Err(StoreError::UnknownList(id.to_string()));
        }
        self.data.active_list = Some(id.to_string());
        self.persist()
    }

    pub fn clear_active_list(&mut self) -> Result<(), StoreError> {
        self.data.active_list = None;
        self.persist()
    }

    pub fn last_generation(&self) -> Option<&Generation> {
        self.data.last_generation.as_ref()
    }

    pub fn save_last_generation(&mut self, assignment: &Assignment) -> Result<(), StoreError> {
        self.data.last_generation = Some(Generation {
            timestamp: Utc::now(),
            assignment: assignment.clone(),
            active_list_id: self.data.active_list.clone(),
        });
        self.persist()
    }

    pub fn clear_last_generation(&mut self) -> Result<(), StoreError> {
        self.data.last_generation = None;
        self.persist()
    }

    /// Drops every exclusion list, returning how many were removed.
    pub fn clear_session(&mut self) -> Result<usize, StoreError> {
        let temp: Vec<ListId> = self
            .lists(Some(ListKind::Temp))
            .into_iter()
            .map(|l| l.id.clone())
            .collect();
        let mut deleted = 0;
        for id in temp {
            if self.delete_list(&id)? {
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    pub fn create_local_list(
        &mut self,
        name: &str,
        heroes: Vec<String>,
    ) -> Result<HeroList, StoreError> {
        self.create_list(ListKind::Local, name, heroes, None)
    }

    pub fn create_temp_list(
        &mut self,
        name: &str,
        heroes: Vec<String>,
        base_list_id: &str,
    ) -> Result<HeroList, StoreError> {
        self.create_list(ListKind::Temp, name, heroes, Some(base_list_id.to_string()))
    }

    fn create_list(
        &mut self,
        kind: ListKind,
        name: &str,
        heroes: Vec<String>,
        base_list_id: Option<ListId>,
    ) -> Result<HeroList, StoreError> {
        let now = Utc::now();
        let list = HeroList {
            id: format!("{}_{}", kind.as_str(), Uuid::new_v4()),
            name: name.trim().to_string(),
            heroes,
            kind,
            base_list_id,
            created_at: now,
            updated_at: now,
        };
        self.save_list(list.clone())?;
        Ok(list)
    }

    pub fn export_data(&self) -> ExportedData {
        ExportedData {
            data: self.data.clone(),
            export_date: Utc::now(),
            version: EXPORT_VERSION,
        }
    }

    /// Replaces the store contents. Nothing changes unless every list is valid.
    pub fn import_data(&mut self, import: ImportData) -> Result<(), StoreError> {
        for (id, list) in &import.lists {
            if *id != list.id {
                return Err(StoreError::InvalidList(format!(
                    "list stored under {id} has id {}",
                    list.id
                )));
            }
            validate_list(list)?;
        }

        self.data = StoreData {
            lists: import.lists,
            active_list: import.active_list,
            last_generation: import.last_generation,
            theme: import.theme.unwrap_or(self.data.theme),
            settings: import
                .settings
                .unwrap_or_else(|| std::mem::take(&mut self.data.settings)),
        };
        info!("imported {} hero lists", self.data.lists.len());
        self.persist()
    }

    pub fn settings(&self) -> &Map<String, Value> {
        &self.data.settings
    }

    pub fn save_settings(&mut self, settings: Map<String, Value>) -> Result<(), StoreError> {
        self.data.settings.extend(settings);
        self.persist()
    }

    pub fn theme(&self) -> Theme {
        self.data.theme
    }

    pub fn set_theme(&mut self, theme: Theme) -> Result<(), StoreError> {
        self.data.theme = theme;
        self.persist()
    }

    pub fn stats(&self) -> StoreStats {
        let mut stats = StoreStats {
            total_lists: self.data.lists.len(),
            last_generation: self.data.last_generation.as_ref().map(|g| g.timestamp),
            ..StoreStats::default()
        };
        for list in self.data.lists.values() {
            match list.kind {
                ListKind::Local => stats.local_lists += 1,
                ListKind::Temp => stats.temp_lists += 1,
            }
            stats.total_heroes += list.heroes.len();
        }
        stats
    }

    pub fn clear_all(&mut self) -> Result<(), StoreError> {
        self.data = StoreData::default();
        self.persist()
    }
}

fn validate_list(list: &HeroList) -> Result<(), StoreError> {
    if list.id.trim().is_empty() {
        return Err(StoreError::InvalidList("missing id".into()));
    }
    if list.name.trim().is_empty() {
        return Err(StoreError::InvalidList(format!("list {} has no name", list.id)));
    }
    if list.kind == ListKind::Temp && list.base_list_id.is_none() {
        return Err(StoreError::InvalidList(format!(
            "exclusion list {} has no base list",
            list.id
        )));
    }
    Ok(())
}
