use super::{Record, RecordStore};
use crate::prelude::AppError;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

/// In-process backend: an unbounded map guarded by a single reader/writer
/// lock. Reads hand out an owned deep copy of the record, so callers can
/// never reach the map's contents through a returned value.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    data: RwLock<HashMap<String, Record>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> Result<usize, AppError> {
        Ok(self.data.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, AppError> {
        Ok(self.data.read()?.is_empty())
    }
}

impl RecordStore for MemoryStorage {
    fn create(&self, location: &str, record: Record) -> Result<(), AppError> {
        let mut data = self.data.write()?;

        if data.contains_key(location) {
            return Err(AppError::AlreadyExists("Location".to_string()));
        }

        data.insert(location.to_string(), record);
        debug!(location, "memory: record created");
        Ok(())
    }

    fn read(&self, location: &str) -> Result<Record, AppError> {
        let data = self.data.read()?;

        data.get(location)
            .cloned()
            .ok_or(AppError::NotFound("Location".to_string()))
    }

    fn update(&self, location: &str, record: Record) -> Result<(), AppError> {
        let mut data = self.data.write()?;

        match data.get_mut(location) {
            Some(stored) => {
                *stored = record;
                debug!(location, "memory: record replaced");
                Ok(())
            }
            None => Err(AppError::NotFound("Location".to_string())),
        }
    }

    fn delete(&self, location: &str) -> Result<(), AppError> {
        let mut data = self.data.write()?;

        match data.remove(location) {
            Some(_) => {
                debug!(location, "memory: record removed");
                Ok(())
            }
            None => Err(AppError::NotFound("Location".to_string())),
        }
    }

    fn get_medium(&self) -> &str {
        "memory"
    }
}
