pub use crate::cli::{command, run_app};
pub use crate::domain::{
    contact::{self, Contact},
    service::PhonebookService,
};
pub use crate::errors::{AppError, ErrorKind};
pub use crate::storage::{
    self, FileSystemStorage, MemoryStorage, PostgresStorage, Record, RecordStore, RemoteStorage,
    StorageConfig, StorageMediums,
};
pub use crate::validation::validate_contact;
pub use serde_json::{self, Value};
