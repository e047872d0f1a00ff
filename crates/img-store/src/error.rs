//! Error types for the image store.
//!
//! [`ImgError`] is the only error that leaves the crate. Backend failures are
//! collected in [`StoreError`] and folded into an [`ImgError`] at the
//! [`ImgStore`](crate::ImgStore) boundary.

use std::fmt;

use serde::Serialize;

/// Closed set of error kinds callers can match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Group is empty after trimming or contains a NUL byte.
    BadGroup,
    /// Name is empty after trimming or contains a NUL byte or `/`.
    BadName,
    /// Type is not in the image type registry.
    BadType,
    /// Bytes are not a valid image of the canonical format.
    BadFormat,
    /// No stored record (or no source file) for the request.
    NotFound,
    /// An image is already stored under the requested identity.
    Exists,
    /// The conversion gateway could not produce the requested type.
    ConvertFail,
    /// The persistent store could not be reached on open.
    Connection,
    /// Anything the store or the environment raised that is not classified above.
    Internal,
}

impl ErrorKind {
    /// Stable wire code for this kind.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::BadGroup => "BAD_GROUP",
            ErrorKind::BadName => "BAD_NAME",
            ErrorKind::BadType => "BAD_TYPE",
            ErrorKind::BadFormat => "BAD_FORMAT",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Exists => "EXISTS",
            ErrorKind::ConvertFail => "CONVERT_FAIL",
            ErrorKind::Connection => "CONNECTION",
            ErrorKind::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// An error with a stable kind and a descriptive message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ImgError {
    #[serde(rename = "code")]
    kind: ErrorKind,
    message: String,
}

impl ImgError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub(crate) fn bad_format(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadFormat, message)
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

/// Result type alias for image store operations.
pub type Result<T> = std::result::Result<T, ImgError>;

/// Backend failures from the metadata database or the bytes collection.
#[derive(Debug, thiserror::Error)]
pub(crate) enum StoreError {
    /// Database error
    #[error("database error: {0}")]
    Database(sqlx::Error),

    /// Object storage error
    #[error("object storage error: {0}")]
    ObjectStore(object_store::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Migration error
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A record with this key is already present
    #[error("duplicate key: {0}")]
    AlreadyExists(String),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// S3 bucket not found - must be created before use
    #[error("S3 bucket '{0}' does not exist. Create it before opening the store.")]
    BucketNotFound(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                StoreError::AlreadyExists(db_err.message().to_string())
            }
            _ => StoreError::Database(err),
        }
    }
}

impl From<object_store::Error> for StoreError {
    fn from(err: object_store::Error) -> Self {
        match err {
            object_store::Error::AlreadyExists { path, .. } => StoreError::AlreadyExists(path),
            other => StoreError::ObjectStore(other),
        }
    }
}

impl From<StoreError> for ImgError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AlreadyExists(key) => {
                ImgError::new(ErrorKind::Exists, format!("record '{key}' already exists"))
            }
            other => ImgError::internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_code_and_message() {
        let err = ImgError::new(ErrorKind::BadGroup, "bad image group ''");
        assert_eq!(err.to_string(), "BAD_GROUP: bad image group ''");
    }

    #[test]
    fn test_serializes_as_code_and_message() {
        let err = ImgError::new(ErrorKind::ConvertFail, "cannot convert x.png");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "CONVERT_FAIL");
        assert_eq!(json["message"], "cannot convert x.png");
    }

    #[test]
    fn test_duplicate_maps_to_exists() {
        let err: ImgError = StoreError::AlreadyExists("g/n.ppm".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::Exists);
    }

    #[test]
    fn test_unclassified_maps_to_internal() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let err: ImgError = StoreError::from(io).into();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(err.message().contains("disk on fire"));
    }
}
