//! Event ingestion and log queries, independent of HTTP.

use chrono::{DateTime, TimeDelta, Utc};
use storage::{EventKind, EventRecord, LogStore, Result, StoredRecord, TagId, UnitOfWork};

/// Source of the current time.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock stuck at a single instant.
#[cfg(test)]
pub(crate) struct FixedClock(pub DateTime<Utc>);

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Timestamp to record for an event that arrived at `now`.
pub fn corrected_timestamp(now: DateTime<Utc>, offset: TimeDelta) -> DateTime<Utc> {
    now - offset
}

/// Validate an inbound event and append it to the log.
///
/// The tag and action code are checked before the store is touched; a
/// rejected event never opens a connection.
pub fn ingest<S: LogStore>(
    store: &S,
    clock: &dyn Clock,
    offset: TimeDelta,
    tag: &str,
    action: &str,
) -> Result<EventRecord> {
    let kind = EventKind::classify(action)?;
    let tag: TagId = tag.parse()?;
    let record = EventRecord::new(tag, kind, corrected_timestamp(clock.now(), offset));

    let mut uow = UnitOfWork::new(store);
    uow.append(&record)?;
    uow.close();

    tracing::info!(tag = %record.tag, kind = ?record.kind, at = %record.timestamp, "event logged");
    Ok(record)
}

/// Read the whole log in insertion order.
pub fn read_log<S: LogStore>(store: &S) -> Result<Vec<StoredRecord>> {
    let mut uow = UnitOfWork::new(store);
    let records = uow.scan_all()?;
    uow.close();
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use storage::{Error, MemoryLogStore};

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2016, 11, 12, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_clock_correction() {
        let store = MemoryLogStore::new();
        let clock = FixedClock(noon());

        let record = ingest(&store, &clock, TimeDelta::seconds(3), "4950384950", "i").unwrap();

        assert_eq!(record.tag, TagId(4950384950));
        assert_eq!(record.kind, EventKind::CheckIn);
        assert_eq!(record.timestamp, noon() - TimeDelta::seconds(3));
        assert_eq!(store.records().unwrap(), vec![record]);
    }

    #[test]
    fn test_zero_offset_keeps_arrival_time() {
        assert_eq!(corrected_timestamp(noon(), TimeDelta::zero()), noon());
    }

    #[test]
    fn test_invalid_action_never_touches_store() {
        let store = MemoryLogStore::new();
        let result = ingest(&store, &SystemClock, TimeDelta::seconds(3), "123", "z");
        assert!(matches!(result, Err(Error::InvalidAction(_))));
        assert_eq!(store.opened(), 0);
        assert!(store.records().unwrap().is_empty());
    }

    #[test]
    fn test_invalid_tag_never_touches_store() {
        let store = MemoryLogStore::new();
        let result = ingest(&store, &SystemClock, TimeDelta::seconds(3), "tag-1", "i");
        assert!(matches!(result, Err(Error::InvalidTag(_))));
        assert_eq!(store.opened(), 0);
    }

    #[test]
    fn test_storage_failure_releases_connection() {
        let store = MemoryLogStore::new();
        store.fail_appends(true);
        let result = ingest(&store, &SystemClock, TimeDelta::seconds(3), "123", "a");
        assert!(matches!(result, Err(Error::StorageUnavailable(_))));
        assert_eq!(store.opened(), 1);
        assert_eq!(store.closed(), 1);
    }

    #[test]
    fn test_read_log_in_order() {
        let store = MemoryLogStore::new();
        let clock = FixedClock(noon());
        for action in ["i", "o", "a"] {
            ingest(&store, &clock, TimeDelta::seconds(3), "42", action).unwrap();
        }

        let kinds: Vec<_> = read_log(&store)
            .unwrap()
            .into_iter()
            .map(|stored| stored.record.kind)
            .collect();
        assert_eq!(kinds, [EventKind::CheckIn, EventKind::CheckOut, EventKind::Alarm]);
        assert_eq!(store.opened(), store.closed());
    }
}
