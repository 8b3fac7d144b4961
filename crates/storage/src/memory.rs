//! In-process log store, used as a test double for [`SqliteLogStore`](crate::SqliteLogStore).

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::{Error, EventRecord, LogStore, Result, SchemaStatus, StoredRecord};

/// Handle returned by [`MemoryLogStore::open`].
#[derive(Debug)]
pub struct MemoryConnection {
    id: usize,
}

/// Log store backed by a vector, with connection counters and failure switches.
#[derive(Debug, Default)]
pub struct MemoryLogStore {
    records: Mutex<Vec<EventRecord>>,
    initialized: AtomicBool,
    opened: AtomicUsize,
    closed: AtomicUsize,
    unavailable: AtomicBool,
    failing_appends: AtomicBool,
}

impl MemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of connections handed out so far.
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Number of connections given back so far.
    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// Make `open` fail with [`Error::StorageUnavailable`] while `false`.
    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    /// Make `append` fail with [`Error::StorageUnavailable`] while `true`.
    pub fn fail_appends(&self, fail: bool) {
        self.failing_appends.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of the log without going through a connection.
    pub fn records(&self) -> Result<Vec<EventRecord>> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<EventRecord>>> {
        self.records
            .lock()
            .map_err(|_| Error::StorageUnavailable("memory log poisoned".into()))
    }
}

impl LogStore for MemoryLogStore {
    type Connection = MemoryConnection;

    fn open(&self) -> Result<MemoryConnection> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(Error::StorageUnavailable("memory log switched off".into()));
        }
        let id = self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(MemoryConnection { id })
    }

    fn close(&self, conn: MemoryConnection) {
        tracing::trace!(conn = conn.id, "memory connection closed");
        self.closed.fetch_add(1, Ordering::SeqCst);
    }

    fn append(&self, _conn: &mut MemoryConnection, record: &EventRecord) -> Result<()> {
        if self.failing_appends.load(Ordering::SeqCst) {
            return Err(Error::StorageUnavailable("memory log rejects writes".into()));
        }
        self.lock()?.push(record.clone());
        Ok(())
    }

    fn scan_all(&self, _conn: &mut MemoryConnection) -> Result<Vec<StoredRecord>> {
        let records = self.lock()?;
        Ok(records
            .iter()
            .zip(1..)
            .map(|(record, seq)| StoredRecord {
                seq,
                record: record.clone(),
            })
            .collect())
    }

    fn initialize_schema(&self) -> Result<SchemaStatus> {
        if self.initialized.swap(true, Ordering::SeqCst) {
            Ok(SchemaStatus::AlreadyExists)
        } else {
            Ok(SchemaStatus::Created)
        }
    }
}
