//! Log store contract and the request-scoped unit of work.

use crate::{EventRecord, Result, StoredRecord};

/// Outcome of schema initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaStatus {
    Created,
    /// The log already existed and was left untouched.
    AlreadyExists,
}

/// Durable append-only storage for event records.
///
/// Connections are handed out by [`LogStore::open`] and must be given back
/// through [`LogStore::close`]. Callers normally go through [`UnitOfWork`],
/// which does both.
pub trait LogStore: Send + Sync + 'static {
    type Connection: Send;

    /// Acquire a new connection to the storage medium.
    fn open(&self) -> Result<Self::Connection>;

    /// Release a connection. Never fails; problems are logged.
    fn close(&self, conn: Self::Connection);

    /// Write one record and commit it.
    fn append(&self, conn: &mut Self::Connection, record: &EventRecord) -> Result<()>;

    /// Every committed record, in insertion order.
    fn scan_all(&self, conn: &mut Self::Connection) -> Result<Vec<StoredRecord>>;

    /// Create the log if it does not exist yet. Safe to run repeatedly.
    fn initialize_schema(&self) -> Result<SchemaStatus>;
}

/// Storage context for a single request.
///
/// Opens at most one connection, lazily, and releases it on [`close`](Self::close)
/// or when dropped, whichever comes first.
pub struct UnitOfWork<'a, S: LogStore> {
    store: &'a S,
    conn: Option<S::Connection>,
}

impl<'a, S: LogStore> UnitOfWork<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store, conn: None }
    }

    /// The connection for this unit of work, opening it on first use.
    pub fn connection(&mut self) -> Result<&mut S::Connection> {
        let conn = match self.conn.take() {
            Some(conn) => conn,
            None => self.store.open()?,
        };
        Ok(self.conn.insert(conn))
    }

    pub fn append(&mut self, record: &EventRecord) -> Result<()> {
        let store = self.store;
        let conn = self.connection()?;
        store.append(conn, record)
    }

    pub fn scan_all(&mut self) -> Result<Vec<StoredRecord>> {
        let store = self.store;
        let conn = self.connection()?;
        store.scan_all(conn)
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Release the connection. A no-op when nothing is open.
    pub fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.store.close(conn);
        }
    }
}

impl<S: LogStore> Drop for UnitOfWork<'_, S> {
    fn drop(&mut self) {
        self.close();
    }
}
