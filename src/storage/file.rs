use super::{Record, RecordStore, create_file_parent};
use crate::prelude::AppError;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// Stores every record as a pretty-printed JSON file at
/// `base_dir/<location>`.
///
/// Existence checks ride on the file system itself: `create` opens with
/// `create_new`, `update` opens for writing without `create`, and `delete`
/// maps a missing file to [`AppError::NotFound`]. `update` truncates before
/// writing, so a reader racing an update may see a partial file and get
/// [`AppError::CorruptRecord`].
#[derive(Debug, Clone)]
pub struct FileSystemStorage {
    pub base_dir: PathBuf,
}

impl FileSystemStorage {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    /// Joins `location` onto the base directory, refusing anything that
    /// could land outside of it.
    pub fn file_path(&self, location: &str) -> Result<PathBuf, AppError> {
        let relative = Path::new(location);

        if location.trim().is_empty() {
            return Err(AppError::Validation("Location must not be empty".to_string()));
        }

        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(AppError::Validation(format!(
                "Location '{}' must be a relative path inside the data directory",
                location
            )));
        }

        Ok(self.base_dir.join(relative))
    }
}

/// A directory, or a path running through a regular file, never holds a
/// record, so both read as a missing file.
fn not_found_or(err: io::Error) -> AppError {
    match err.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::IsADirectory | io::ErrorKind::NotADirectory => {
            AppError::NotFound("File".to_string())
        }
        _ => AppError::Io(err),
    }
}

impl RecordStore for FileSystemStorage {
    fn create(&self, location: &str, record: Record) -> Result<(), AppError> {
        let path = self.file_path(location)?;
        if path.is_dir() {
            return Err(AppError::Validation(format!(
                "Location '{}' names a directory, not a record",
                location
            )));
        }
        let data = serde_json::to_vec_pretty(&record)?;

        create_file_parent(&path)?;

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(AppError::AlreadyExists("File".to_string()));
            }
            Err(e) => return Err(AppError::Io(e)),
        };

        if let Err(e) = file.write_all(&data) {
            // Don't leave a half-written file occupying the location
            drop(file);
            let _ = fs::remove_file(&path);
            return Err(AppError::Io(e));
        }

        debug!(path = %path.display(), "fs: record created");
        Ok(())
    }

    fn read(&self, location: &str) -> Result<Record, AppError> {
        let path = self.file_path(location)?;
        let data = fs::read(&path).map_err(not_found_or)?;

        serde_json::from_slice::<Record>(&data).map_err(|e| {
            warn!(path = %path.display(), error = %e, "fs: stored file is not a json object");
            AppError::CorruptRecord(format!("{}: {}", location, e))
        })
    }

    fn update(&self, location: &str, record: Record) -> Result<(), AppError> {
        let path = self.file_path(location)?;
        let data = serde_json::to_vec_pretty(&record)?;

        let mut file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&path)
            .map_err(not_found_or)?;
        file.write_all(&data)?;

        debug!(path = %path.display(), "fs: record replaced");
        Ok(())
    }

    fn delete(&self, location: &str) -> Result<(), AppError> {
        let path = self.file_path(location)?;

        fs::remove_file(&path).map_err(not_found_or)?;

        debug!(path = %path.display(), "fs: record removed");
        Ok(())
    }

    fn get_medium(&self) -> &str {
        "fs"
    }
}
