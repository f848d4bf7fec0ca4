use core::fmt;
use std::sync::PoisonError;

#[derive(Debug)]
pub enum AppError {
    Io(std::io::Error),
    Json(serde_json::Error),
    FailedRequest(reqwest::Error),
    Database(postgres::Error),
    Pool(r2d2::Error),
    ParseUrl(url::ParseError),
    NotFound(String),
    AlreadyExists(String),
    Validation(String),
    CorruptRecord(String),
    LockPoisoned(String),
}

/// Coarse classification of an [`AppError`] so callers can branch on the
/// condition instead of the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    AlreadyExists,
    Corrupt,
    Transient,
    Permanent,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation(_) | AppError::ParseUrl(_) => ErrorKind::Validation,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            AppError::CorruptRecord(_) => ErrorKind::Corrupt,
            AppError::Io(e) => match e.kind() {
                std::io::ErrorKind::Interrupted
                | std::io::ErrorKind::TimedOut
                | std::io::ErrorKind::WouldBlock => ErrorKind::Transient,
                _ => ErrorKind::Permanent,
            },
            AppError::FailedRequest(e) => {
                let retryable_status = e
                    .status()
                    .is_some_and(|s| s.is_server_error() || s.as_u16() == 429);

                if e.is_timeout() || e.is_connect() || retryable_status {
                    ErrorKind::Transient
                } else {
                    ErrorKind::Permanent
                }
            }
            AppError::Database(e) => {
                // SQLSTATE classes 08 (connection), 40 (rollback) and 57P (shutdown)
                let retryable_state = e.code().is_some_and(|state| {
                    let code = state.code();
                    code.starts_with("08") || code.starts_with("40") || code.starts_with("57P")
                });

                if e.is_closed() || retryable_state {
                    ErrorKind::Transient
                } else {
                    ErrorKind::Permanent
                }
            }
            // r2d2 only fails when no connection could be checked out in time
            AppError::Pool(_) => ErrorKind::Transient,
            AppError::Json(_) | AppError::LockPoisoned(_) => ErrorKind::Permanent,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Json(err)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::FailedRequest(err)
    }
}

impl From<postgres::Error> for AppError {
    fn from(err: postgres::Error) -> Self {
        AppError::Database(err)
    }
}

impl From<r2d2::Error> for AppError {
    fn from(err: r2d2::Error) -> Self {
        AppError::Pool(err)
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::ParseUrl(err)
    }
}

impl<T> From<PoisonError<T>> for AppError {
    fn from(err: PoisonError<T>) -> Self {
        AppError::LockPoisoned(err.to_string())
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Io(e) => {
                write!(f, "I/O error while accessing a file or resource: {}", e)
            }
            AppError::Json(e) => {
                write!(f, "Failed to serialize or parse record: {}", e)
            }
            AppError::FailedRequest(e) => {
                write!(f, "Request to remote storage failed: {}", e)
            }
            AppError::Database(e) => {
                write!(f, "Database request failed: {}", e)
            }
            AppError::Pool(e) => {
                write!(f, "No database connection available: {}", e)
            }
            AppError::ParseUrl(e) => {
                write!(f, "Invalid url: {}", e)
            }
            AppError::NotFound(item) => {
                write!(f, "{} does not exist", item)
            }
            AppError::AlreadyExists(item) => {
                write!(f, "{} already exists", item)
            }
            AppError::Validation(msg) => {
                write!(f, "{}", msg)
            }
            AppError::CorruptRecord(msg) => {
                write!(f, "Corrupt record: {}", msg)
            }
            AppError::LockPoisoned(msg) => {
                write!(f, "Storage lock poisoned: {}", msg)
            }
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Io(e) => Some(e),
            AppError::Json(e) => Some(e),
            AppError::FailedRequest(e) => Some(e),
            AppError::Database(e) => Some(e),
            AppError::Pool(e) => Some(e),
            AppError::ParseUrl(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn existence_errors_carry_their_class_in_the_message() {
        let err = AppError::NotFound("Location".to_string());
        assert_eq!(format!("{}", err), "Location does not exist");
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = AppError::AlreadyExists("File".to_string());
        assert_eq!(format!("{}", err), "File already exists");
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    }

    #[test]
    fn validation_message_is_surfaced_verbatim() {
        let err = AppError::Validation("Name is required".to_string());

        assert_eq!(format!("{}", err), "Name is required");
        assert!(!err.is_transient());
    }

    #[test]
    fn io_errors_are_classified_by_retryability() {
        let timed_out = AppError::from(std::io::Error::from(std::io::ErrorKind::TimedOut));
        let denied = AppError::from(std::io::Error::from(std::io::ErrorKind::PermissionDenied));

        assert!(timed_out.is_transient());
        assert_eq!(denied.kind(), ErrorKind::Permanent);
    }

    #[test]
    fn parse_errors_convert_into_json_variant() {
        let err: AppError = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();

        assert!(matches!(err, AppError::Json(_)));
        assert!(format!("{}", err).starts_with("Failed to serialize or parse record: "));
    }
}
