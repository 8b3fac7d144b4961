//! Event types for the access log.

use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc};

use crate::{Error, Result};

/// Identifier of a physical RFID tag.
///
/// Tags are not checked against any registry; whatever the reader reports is logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TagId(pub i64);

impl FromStr for TagId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.parse()
            .map(TagId)
            .map_err(|_| Error::InvalidTag(s.to_string()))
    }
}

impl std::fmt::Display for TagId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

/// What happened to a tag.
///
/// `Unknown` holds codes written by a newer build; it is only ever produced
/// when reading, never by [`EventKind::classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    CheckIn,
    CheckOut,
    Alarm,
    Registered,
    Boot,
    Unknown(i64),
}

/// Display severity attached to an event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Warning,
    Danger,
    Info,
    Neutral,
}

impl Severity {
    /// CSS class used by the table view. Neutral has none.
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Danger => "danger",
            Severity::Info => "info",
            Severity::Neutral => "",
        }
    }
}

impl EventKind {
    /// Every kind the reader can report, in code order.
    pub const KNOWN: [EventKind; 5] = [
        EventKind::CheckIn,
        EventKind::CheckOut,
        EventKind::Alarm,
        EventKind::Registered,
        EventKind::Boot,
    ];

    /// Map a reader action code to an event kind.
    pub fn classify(code: &str) -> Result<Self> {
        match code {
            "i" => Ok(EventKind::CheckIn),
            "o" => Ok(EventKind::CheckOut),
            "a" => Ok(EventKind::Alarm),
            "r" => Ok(EventKind::Registered),
            "b" => Ok(EventKind::Boot),
            other => Err(Error::InvalidAction(other.to_string())),
        }
    }

    /// Human readable text and severity. Total over every kind, including unknown ones.
    pub fn describe(self) -> (&'static str, Severity) {
        match self {
            EventKind::CheckIn => ("checked in", Severity::Success),
            EventKind::CheckOut => ("checked out", Severity::Warning),
            EventKind::Alarm => ("alarm triggered", Severity::Danger),
            EventKind::Registered => ("registered", Severity::Info),
            EventKind::Boot => ("device booted", Severity::Info),
            EventKind::Unknown(_) => ("", Severity::Neutral),
        }
    }

    /// Integer code stored in the `event` column.
    pub fn code(self) -> i64 {
        match self {
            EventKind::CheckIn => 0,
            EventKind::CheckOut => 1,
            EventKind::Alarm => 2,
            EventKind::Registered => 3,
            EventKind::Boot => 4,
            EventKind::Unknown(code) => code,
        }
    }

    pub fn from_code(code: i64) -> Self {
        Self::KNOWN
            .into_iter()
            .find(|kind| kind.code() == code)
            .unwrap_or(EventKind::Unknown(code))
    }
}

/// A single entry of the access log. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub tag: TagId,
    pub kind: EventKind,
    pub timestamp: DateTime<Utc>,
}

impl EventRecord {
    /// Build a record; the timestamp is truncated to whole seconds.
    pub fn new(tag: TagId, kind: EventKind, timestamp: DateTime<Utc>) -> Self {
        Self {
            tag,
            kind,
            timestamp: timestamp.trunc_subsecs(0),
        }
    }
}

/// A record as read back from the log, with its position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub seq: i64,
    pub record: EventRecord,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_classify_known_codes() {
        assert_eq!(EventKind::classify("i").unwrap(), EventKind::CheckIn);
        assert_eq!(EventKind::classify("o").unwrap(), EventKind::CheckOut);
        assert_eq!(EventKind::classify("a").unwrap(), EventKind::Alarm);
        assert_eq!(EventKind::classify("r").unwrap(), EventKind::Registered);
        assert_eq!(EventKind::classify("b").unwrap(), EventKind::Boot);
    }

    #[test]
    fn test_classify_rejects_everything_else() {
        for code in ["", "z", "I", "in", " i", "0", "checkin"] {
            match EventKind::classify(code) {
                Err(Error::InvalidAction(got)) => assert_eq!(got, code),
                other => panic!("expected InvalidAction for {code:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_describe_is_total() {
        for kind in EventKind::KNOWN {
            let (text, _) = kind.describe();
            assert!(!text.is_empty(), "{kind:?} has no description");
        }
        assert_eq!(EventKind::Unknown(42).describe(), ("", Severity::Neutral));
    }

    #[test]
    fn test_describe_texts() {
        assert_eq!(EventKind::CheckIn.describe().0, "checked in");
        assert_eq!(EventKind::CheckOut.describe().0, "checked out");
        assert_eq!(EventKind::Alarm.describe(), ("alarm triggered", Severity::Danger));
    }

    #[test]
    fn test_codes_are_stable() {
        for kind in EventKind::KNOWN {
            assert_eq!(EventKind::from_code(kind.code()), kind);
        }
        assert_eq!(EventKind::from_code(99), EventKind::Unknown(99));
        assert_eq!(EventKind::Unknown(99).code(), 99);
    }

    #[test]
    fn test_tag_parse() {
        assert_eq!("4950384950".parse::<TagId>().unwrap(), TagId(4950384950));
        assert!(matches!("abc".parse::<TagId>(), Err(Error::InvalidTag(_))));
        assert!(matches!("".parse::<TagId>(), Err(Error::InvalidTag(_))));
        assert!(matches!(" 42".parse::<TagId>(), Err(Error::InvalidTag(_))));
        assert!(matches!("42\n".parse::<TagId>(), Err(Error::InvalidTag(_))));
    }

    #[test]
    fn test_record_truncates_to_seconds() {
        let ts = Utc.with_ymd_and_hms(2016, 11, 12, 5, 41, 41).unwrap()
            + chrono::TimeDelta::milliseconds(750);
        let record = EventRecord::new(TagId(1), EventKind::CheckIn, ts);
        assert_eq!(
            record.timestamp,
            Utc.with_ymd_and_hms(2016, 11, 12, 5, 41, 41).unwrap()
        );
    }
}
