use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The action code is not one of the known event codes.
    #[error(
        "invalid action '{0}': use i (check in), o (check out), a (alarm), r (registered) or b (boot)"
    )]
    InvalidAction(String),

    /// The tag identifier is not an integer.
    #[error("invalid tag id '{0}': expected an integer")]
    InvalidTag(String),

    /// The storage medium could not be reached, or stayed locked past the busy timeout.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("database error: {0}")]
    Database(rusqlite::Error),

    #[error("corrupt record at row {row}: {reason}")]
    CorruptRecord { row: i64, reason: String },
}

impl Error {
    /// Whether the error was caused by the caller's input rather than by storage.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::InvalidAction(_) | Error::InvalidTag(_))
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(
                ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::CannotOpen
                | ErrorCode::PermissionDenied
                | ErrorCode::NotADatabase,
            ) => Error::StorageUnavailable(err.to_string()),
            _ => Error::Database(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
