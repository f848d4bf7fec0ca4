pub mod database;
pub mod file;
pub mod memory;
pub mod remote;

use crate::helper;
use crate::prelude::AppError;
use dotenv::dotenv;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use database::PostgresStorage;
pub use file::FileSystemStorage;
pub use memory::MemoryStorage;
pub use remote::RemoteStorage;

/// Untyped, backend-facing shape of a stored entry.
pub type Record = serde_json::Map<String, serde_json::Value>;

pub const DEFAULT_DATA_DIR: &str = "./.instance/data";

/// Create/Read/Update/Delete contract every storage backend satisfies.
///
/// Each operation is keyed by an opaque `location`. `create` fails with
/// [`AppError::AlreadyExists`] when the location is occupied; `read`,
/// `update` and `delete` fail with [`AppError::NotFound`] when it is not.
/// `update` replaces the stored record wholesale.
pub trait RecordStore: Send + Sync {
    fn create(&self, location: &str, record: Record) -> Result<(), AppError>;

    fn read(&self, location: &str) -> Result<Record, AppError>;

    fn update(&self, location: &str, record: Record) -> Result<(), AppError>;

    fn delete(&self, location: &str) -> Result<(), AppError>;

    fn get_medium(&self) -> &str;
}

/// A shared backend is still a backend, so one store can be handed to a
/// service while other threads keep using it.
impl<T: RecordStore + ?Sized> RecordStore for Arc<T> {
    fn create(&self, location: &str, record: Record) -> Result<(), AppError> {
        (**self).create(location, record)
    }

    fn read(&self, location: &str) -> Result<Record, AppError> {
        (**self).read(location)
    }

    fn update(&self, location: &str, record: Record) -> Result<(), AppError> {
        (**self).update(location, record)
    }

    fn delete(&self, location: &str) -> Result<(), AppError> {
        (**self).delete(location)
    }

    fn get_medium(&self) -> &str {
        (**self).get_medium()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMediums {
    Memory,
    FileSystem,
    Remote,
    Postgres,
}

impl StorageMediums {
    pub fn is_memory(&self) -> bool {
        matches!(self, StorageMediums::Memory)
    }

    pub fn is_file_system(&self) -> bool {
        matches!(self, StorageMediums::FileSystem)
    }

    pub fn is_which(&self) -> &str {
        match self {
            StorageMediums::Memory => "memory",
            StorageMediums::FileSystem => "fs",
            StorageMediums::Remote => "remote",
            StorageMediums::Postgres => "postgres",
        }
    }

    pub fn from(str: &str) -> Result<Self, AppError> {
        match str.trim().to_ascii_lowercase().as_str() {
            "mem" | "memory" => Ok(StorageMediums::Memory),
            "fs" | "file" | "filesystem" => Ok(StorageMediums::FileSystem),
            "remote" => Ok(StorageMediums::Remote),
            "pg" | "postgres" | "postgresql" => Ok(StorageMediums::Postgres),
            _ => Err(AppError::Validation(format!(
                "'{}' is not a recognized storage medium (memory, fs, remote, postgres)",
                str
            ))),
        }
    }
}

/// Everything needed to construct one backend.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub medium: StorageMediums,
    pub data_dir: PathBuf,
    pub remote_url: Option<String>,
    pub api_key: Option<String>,
    pub database_url: Option<String>,
}

impl StorageConfig {
    /// Resolves the configuration from the process environment, loading
    /// `.env` first when present.
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();

        Self::from_lookup(|key| helper::get_env_value_by_key(key).ok())
    }

    /// Resolves the configuration through `lookup`, treating blank values as
    /// unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let choice = get("STORAGE_CHOICE").unwrap_or("fs".to_string());

        Ok(Self {
            medium: StorageMediums::from(&choice)?,
            data_dir: get("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(PathBuf::from(DEFAULT_DATA_DIR)),
            remote_url: get("REMOTE_STORAGE_URL"),
            api_key: get("REMOTE_API_KEY"),
            database_url: get("DATABASE_URL"),
        })
    }

    pub fn build(&self) -> Result<Box<dyn RecordStore>, AppError> {
        match self.medium {
            StorageMediums::Memory => Ok(Box::new(MemoryStorage::new())),
            StorageMediums::FileSystem => Ok(Box::new(FileSystemStorage::new(&self.data_dir))),
            StorageMediums::Remote => {
                let url = self
                    .remote_url
                    .as_deref()
                    .ok_or(AppError::NotFound("REMOTE_STORAGE_URL setting".to_string()))?;
                Ok(Box::new(RemoteStorage::new(url, self.api_key.clone())?))
            }
            StorageMediums::Postgres => {
                let dsn = self
                    .database_url
                    .as_deref()
                    .ok_or(AppError::NotFound("DATABASE_URL setting".to_string()))?;
                Ok(Box::new(PostgresStorage::connect(dsn)?))
            }
        }
    }
}

pub fn create_file_parent(path: &Path) -> Result<(), AppError> {
    if let Some(parent) = path.parent()
        && !parent.exists()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}
