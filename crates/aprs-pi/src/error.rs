//! Error types for aprs-pi.
//!
//! This module defines the error type shared by the API server, the project
//! check harness and the configuration layer.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for aprs-pi operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    /// A configuration file named explicitly does not exist.
    #[error("configuration file not found: {}", path.display())]
    ConfigNotFound {
        /// Path that was given.
        path: PathBuf,
    },

    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Server Errors ===
    /// The API server could not bind its listening socket.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address we tried to listen on.
        addr: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A restart command exited unsuccessfully.
    #[error("restart command '{command}' failed: {message}")]
    RestartFailed {
        /// The program that was run.
        command: String,
        /// Description of what went wrong.
        message: String,
    },

    // === Check Errors ===
    /// An external command could not be spawned.
    #[error("failed to run '{program}': {source}")]
    CommandSpawn {
        /// The program that was run.
        program: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// No check is registered under the given name.
    #[error("unknown check: {0}")]
    UnknownCheck(String),

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
    /// A blocking task panicked or was cancelled.
    #[error("background task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    /// An operation timed out.
    #[error("operation timed out: {operation}")]
    Timeout {
        /// Description of the operation that timed out.
        operation: String,
    },
}

/// A specialized Result type for aprs-pi operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new configuration validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }

    /// Create a restart failure error.
    #[must_use]
    pub fn restart_failed(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RestartFailed {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Check if this error was caused by invalid user-supplied values.
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Self::ConfigValidation { .. })
    }

    /// Check if this error means an external program is not installed.
    #[must_use]
    pub fn is_missing_program(&self) -> bool {
        matches!(
            self,
            Self::CommandSpawn { source, .. } if source.kind() == std::io::ErrorKind::NotFound
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::validation("latitude out of range");
        assert_eq!(
            err.to_string(),
            "invalid configuration: latitude out of range"
        );

        let err = Error::UnknownCheck("bogus".to_string());
        assert_eq!(err.to_string(), "unknown check: bogus");
    }

    #[test]
    fn test_is_validation_error() {
        assert!(Error::validation("bad").is_validation_error());
        assert!(!Error::UnknownCheck("bad".to_string()).is_validation_error());
    }

    #[test]
    fn test_is_missing_program() {
        let err = Error::CommandSpawn {
            program: "docker".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        assert!(err.is_missing_program());

        let err = Error::CommandSpawn {
            program: "docker".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(!err.is_missing_program());
        assert!(!Error::UnknownCheck("x".to_string()).is_missing_program());
    }

    #[test]
    fn test_restart_failed_display() {
        let err = Error::restart_failed("systemctl", "exit status 5");
        let msg = err.to_string();
        assert!(msg.contains("systemctl"));
        assert!(msg.contains("exit status 5"));
    }

    #[test]
    fn test_bind_error_display() {
        let err = Error::Bind {
            addr: "0.0.0.0:8000".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::AddrInUse, "in use"),
        };
        assert!(err.to_string().contains("0.0.0.0:8000"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
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
    fn test_timeout_error_display() {
        let err = Error::Timeout {
            operation: "bash -n scripts/setup.sh".to_string(),
        };
        assert!(err.to_string().contains("bash -n"));
    }

    #[test]
    fn test_config_not_found_display() {
        let err = Error::ConfigNotFound {
            path: PathBuf::from("/etc/aprs-pi/missing.toml"),
        };
        assert_eq!(
            err.to_string(),
            "configuration file not found: /etc/aprs-pi/missing.toml"
        );
        assert!(!err.is_validation_error());
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
