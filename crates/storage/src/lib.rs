//! Append-only access log for RFID tag events.
//!
//! This crate owns the durable record of every tag interaction the reader
//! reports: check-ins, check-outs, alarms, registrations and device boots.
//! Records are appended one at a time, committed immediately, and never
//! updated, reordered or deleted.
//!
//! # Core Concepts
//!
//! ## EventKind
//!
//! The [`EventKind`] enum is the event taxonomy. [`EventKind::classify`] maps
//! the reader's one-letter action codes (`i`, `o`, `a`, `r`, `b`) to kinds and
//! rejects anything else; [`EventKind::describe`] gives the display text and
//! [`Severity`] for any kind, including codes this build does not know.
//!
//! ## EventRecord
//!
//! An [`EventRecord`] is one log entry: a [`TagId`], a kind and a UTC timestamp
//! with second resolution. Scans return [`StoredRecord`]s, which add the
//! record's position in the log.
//!
//! ## LogStore and UnitOfWork
//!
//! [`LogStore`] is the storage contract: `open`, `append`, `scan_all`, `close`
//! and `initialize_schema`. [`SqliteLogStore`] is the durable implementation;
//! [`MemoryLogStore`] is an in-process double for tests.
//!
//! A [`UnitOfWork`] binds one connection to one request. It opens lazily, at
//! most once, and always releases the connection when it goes out of scope.
//!
//! # Example
//!
//! ```no_run
//! use chrono::Utc;
//! use storage::{EventKind, EventRecord, LogStore, SqliteLogStore, TagId, UnitOfWork};
//!
//! let store = SqliteLogStore::new("logs.db");
//! store.initialize_schema()?;
//!
//! let kind = EventKind::classify("i")?;
//! let record = EventRecord::new(TagId(4950384950), kind, Utc::now());
//!
//! let mut uow = UnitOfWork::new(&store);
//! uow.append(&record)?;
//! for stored in uow.scan_all()? {
//!     let (text, severity) = stored.record.kind.describe();
//!     println!("{} {} {} ({})", stored.record.timestamp, stored.record.tag, text, severity.as_str());
//! }
//! # Ok::<(), storage::Error>(())
//! ```

mod error;
mod event;
mod memory;
mod store;
mod unit;

pub use error::{Error, Result};
pub use event::{EventKind, EventRecord, Severity, StoredRecord, TagId};
pub use memory::{MemoryConnection, MemoryLogStore};
pub use store::{DEFAULT_BUSY_TIMEOUT, SqliteLogStore};
pub use unit::{LogStore, SchemaStatus, UnitOfWork};
