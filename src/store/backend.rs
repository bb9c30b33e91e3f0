use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::store::{StoreData, StoreError};

/// Where store data lives between runs.
pub trait Backend: Send {
    /// `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> Result<Option<StoreData>, StoreError>;
    fn save(&mut self, data: &StoreData) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    saved: Option<String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Backend for MemoryBackend {
    fn load(&self) -> Result<Option<StoreData>, StoreError> {
        match &self.saved {
            Some(raw) => Ok(Some(serde_json::from_str(raw)?)),
            None => Ok(None),
        }
    }

    fn save(&mut self, data: &StoreData) -> Result<(), StoreError> {
        self.saved = Some(serde_json::to_string(data)?);
        Ok(())
    }
}

/// Pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Backend for FileBackend {
    fn load(&self) -> Result<Option<StoreData>, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn save(&mut self, data: &StoreData) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(data)?)?;
        Ok(())
    }
}
