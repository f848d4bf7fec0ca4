use super::{Record, RecordStore};
use crate::prelude::AppError;
use postgres::NoTls;
use postgres::types::Json;
use r2d2::{Pool, PooledConnection};
use r2d2_postgres::PostgresConnectionManager;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

type Manager = PostgresConnectionManager<NoTls>;

const MAX_CONNECTIONS: u32 = 8;
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS contacts (
    id TEXT PRIMARY KEY,
    location TEXT NOT NULL UNIQUE,
    data JSONB NOT NULL
)";

const INSERT: &str =
    "INSERT INTO contacts (id, location, data) VALUES ($1, $1, $2) ON CONFLICT DO NOTHING";
const SELECT: &str = "SELECT data FROM contacts WHERE location = $1";
const UPDATE: &str = "UPDATE contacts SET data = $2 WHERE location = $1";
const DELETE: &str = "DELETE FROM contacts WHERE location = $1";

/// Relational backend: one row per location in a `contacts` table, the
/// record held in a `jsonb` column.
///
/// Every operation is a single statement. The unique `location` column
/// settles concurrent creates, and the affected row count tells whether the
/// location was occupied.
pub struct PostgresStorage {
    pool: Pool<Manager>,
}

impl PostgresStorage {
    /// Opens a connection pool on `database_url` and makes sure the
    /// `contacts` table exists.
    pub fn connect(database_url: &str) -> Result<Self, AppError> {
        let config = database_url
            .parse::<postgres::Config>()
            .map_err(|e| AppError::Validation(format!("Invalid database url: {}", e)))?;

        let pool = Pool::builder()
            .max_size(MAX_CONNECTIONS)
            .connection_timeout(CONNECTION_TIMEOUT)
            .build(PostgresConnectionManager::new(config, NoTls))?;

        pool.get()?.batch_execute(CREATE_TABLE)?;
        debug!("postgres: contacts table ready");

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<Manager>, AppError> {
        Ok(self.pool.get()?)
    }
}

/// An insert that touched no row hit the unique location.
fn inserted(rows: u64) -> Result<(), AppError> {
    match rows {
        0 => Err(AppError::AlreadyExists("Location".to_string())),
        _ => Ok(()),
    }
}

/// An update or delete that touched no row found nothing at the location.
fn matched(rows: u64) -> Result<(), AppError> {
    match rows {
        0 => Err(AppError::NotFound("Location".to_string())),
        _ => Ok(()),
    }
}

fn into_record(location: &str, data: Value) -> Result<Record, AppError> {
    match data {
        Value::Object(map) => Ok(map),
        other => {
            warn!(location, "postgres: stored data is not a json object");
            Err(AppError::CorruptRecord(format!(
                "{}: expected a json object, found {}",
                location, other
            )))
        }
    }
}

impl RecordStore for PostgresStorage {
    fn create(&self, location: &str, record: Record) -> Result<(), AppError> {
        let rows = self.conn()?.execute(INSERT, &[&location, &Json(&record)])?;

        inserted(rows)?;
        debug!(location, "postgres: row inserted");
        Ok(())
    }

    fn read(&self, location: &str) -> Result<Record, AppError> {
        let row = self
            .conn()?
            .query_opt(SELECT, &[&location])?
            .ok_or(AppError::NotFound("Location".to_string()))?;

        let Json(data) = row.try_get::<_, Json<Value>>(0)?;
        into_record(location, data)
    }

    fn update(&self, location: &str, record: Record) -> Result<(), AppError> {
        let rows = self.conn()?.execute(UPDATE, &[&location, &Json(&record)])?;

        matched(rows)?;
        debug!(location, "postgres: row replaced");
        Ok(())
    }

    fn delete(&self, location: &str) -> Result<(), AppError> {
        let rows = self.conn()?.execute(DELETE, &[&location])?;

        matched(rows)?;
        debug!(location, "postgres: row removed");
        Ok(())
    }

    fn get_medium(&self) -> &str {
        "postgres"
    }
}
