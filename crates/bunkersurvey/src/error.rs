//! Error types for bunkersurvey.
//!
//! This module defines all error types used throughout the bunkersurvey crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for bunkersurvey operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Calculator Errors ===
    /// A session operation referenced a tank that is not in the working list.
    #[error("unknown tank: {tank_id}")]
    UnknownTank {
        /// The id that was looked up.
        tank_id: String,
    },

    /// A measurement value could not be used.
    #[error("invalid value for {field} on tank {tank_id}: {value:?}")]
    InvalidMeasurement {
        /// The tank whose entry was being updated.
        tank_id: String,
        /// Name of the measurement field.
        field: &'static str,
        /// The rejected input, as typed.
        value: String,
    },

    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    /// A document path is malformed.
    #[error("invalid document path {path:?}: {reason}")]
    InvalidPath {
        /// The offending path.
        path: String,
        /// Why it was rejected.
        reason: String,
    },

    /// No document exists at the given path.
    #[error("document not found: {path}")]
    DocumentNotFound {
        /// The path that was read.
        path: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for bunkersurvey operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create an unknown tank error.
    #[must_use]
    pub fn unknown_tank(tank_id: impl Into<String>) -> Self {
        Self::UnknownTank {
            tank_id: tank_id.into(),
        }
    }

    /// Create an invalid measurement error.
    #[must_use]
    pub fn invalid_measurement(
        tank_id: impl Into<String>,
        field: &'static str,
        value: impl Into<String>,
    ) -> Self {
        Self::InvalidMeasurement {
            tank_id: tank_id.into(),
            field,
            value: value.into(),
        }
    }

    /// Create an invalid path error.
    #[must_use]
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a document not found error.
    #[must_use]
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::DocumentNotFound { path: path.into() }
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error is a rejected measurement input.
    #[must_use]
    pub fn is_invalid_measurement(&self) -> bool {
        matches!(self, Self::InvalidMeasurement { .. })
    }

    /// Check if this error indicates a missing document.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::DocumentNotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::unknown_tank("t-7");
        assert_eq!(err.to_string(), "unknown tank: t-7");

        let err = Error::internal("test error");
        assert_eq!(err.to_string(), "internal error: test error");
    }

    #[test]
    fn test_invalid_measurement_display() {
        let err = Error::invalid_measurement("t-1", "temperature", "abc");
        let msg = err.to_string();
        assert!(msg.contains("temperature"));
        assert!(msg.contains("t-1"));
        assert!(msg.contains("\"abc\""));
        assert!(err.is_invalid_measurement());
        assert!(!Error::unknown_tank("x").is_invalid_measurement());
    }

    #[test]
    fn test_not_found() {
        let err = Error::not_found("surveys/u1/s1");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "document not found: surveys/u1/s1");
        assert!(!Error::internal("x").is_not_found());
    }

    #[test]
    fn test_invalid_path_display() {
        let err = Error::invalid_path("surveys//x", "empty segment");
        let msg = err.to_string();
        assert!(msg.contains("surveys//x"));
        assert!(msg.contains("empty segment"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::DatabaseQuery(_)));
        }
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_database_migration_error_display() {
        let err = Error::DatabaseMigration {
            message: "version mismatch".to_string(),
        };
        assert!(err.to_string().contains("version mismatch"));
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "density too low".to_string(),
        };
        assert!(err.to_string().contains("density too low"));
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }
}
