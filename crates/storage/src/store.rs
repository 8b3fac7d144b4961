//! SQLite log store implementation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{Connection, OpenFlags, OptionalExtension, TransactionBehavior, params};

use crate::{Error, EventKind, EventRecord, LogStore, Result, SchemaStatus, StoredRecord, TagId};

/// Default time a connection waits on a locked database before giving up.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// SQLite-backed log store.
///
/// Holds only the location of the database; every [`open`](LogStore::open)
/// establishes a fresh connection.
#[derive(Debug, Clone)]
pub struct SqliteLogStore {
    path: PathBuf,
    busy_timeout: Duration,
}

impl SqliteLogStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self, flags: OpenFlags) -> Result<Connection> {
        let conn = Connection::open_with_flags(&self.path, flags)?;
        conn.busy_timeout(self.busy_timeout)?;
        Ok(conn)
    }
}

fn has_log_table(conn: &Connection) -> Result<bool> {
    let found: Option<String> = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'log'",
            [],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

impl LogStore for SqliteLogStore {
    type Connection = Connection;

    fn open(&self) -> Result<Connection> {
        // No CREATE flag: a missing database means the log was never initialized.
        let conn =
            self.connect(OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX)?;
        if !has_log_table(&conn)? {
            self.close(conn);
            return Err(Error::StorageUnavailable(format!(
                "{} has no log table; run init-db first",
                self.path.display()
            )));
        }
        tracing::debug!(path = %self.path.display(), "connection opened");
        Ok(conn)
    }

    fn close(&self, conn: Connection) {
        match conn.close() {
            Ok(()) => tracing::debug!(path = %self.path.display(), "connection closed"),
            Err((_conn, err)) => {
                tracing::warn!(path = %self.path.display(), error = %err, "failed to close connection")
            }
        }
    }

    fn append(&self, conn: &mut Connection, record: &EventRecord) -> Result<()> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO log (rfid, event, time) VALUES (?1, ?2, ?3)",
            params![
                record.tag.0,
                record.kind.code(),
                record.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn scan_all(&self, conn: &mut Connection) -> Result<Vec<StoredRecord>> {
        let mut stmt = conn.prepare("SELECT rowid, rfid, event, time FROM log ORDER BY rowid")?;

        let rows = stmt.query_map([], |row| {
            let seq: i64 = row.get(0)?;
            let tag: i64 = row.get(1)?;
            let code: i64 = row.get(2)?;
            let time: String = row.get(3)?;
            Ok((seq, tag, code, time))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (seq, tag, code, time) = row?;
            let timestamp = parse_timestamp(seq, &time)?;
            records.push(StoredRecord {
                seq,
                record: EventRecord::new(TagId(tag), EventKind::from_code(code), timestamp),
            });
        }
        Ok(records)
    }

    fn initialize_schema(&self) -> Result<SchemaStatus> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let mut conn = self.connect(flags)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let status = if has_log_table(&tx)? {
            SchemaStatus::AlreadyExists
        } else {
            tx.execute_batch(
                r#"
                CREATE TABLE log (
                    rfid INTEGER NOT NULL,
                    event INTEGER NOT NULL,
                    time TIMESTAMP NOT NULL
                );
                "#,
            )?;
            SchemaStatus::Created
        };
        tx.commit()?;
        self.close(conn);

        match status {
            SchemaStatus::Created => {
                tracing::info!(path = %self.path.display(), "log table created")
            }
            SchemaStatus::AlreadyExists => {
                tracing::info!(path = %self.path.display(), "log table already exists")
            }
        }
        Ok(status)
    }
}

/// Parse the `time` column. Rows written by other tools may carry fractional seconds.
fn parse_timestamp(row: i64, text: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| Error::CorruptRecord {
            row,
            reason: format!("bad timestamp '{text}': {e}"),
        })
}
