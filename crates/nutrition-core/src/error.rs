use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the nutrition dashboard.
#[derive(Error, Debug)]
pub enum DashboardError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// The exported days file does not exist yet.
    #[error("Data file not found: {0}")]
    DataFileNotFound(PathBuf),

    /// A date string did not match `YYYY-MM-DD`.
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// The app lock rejected a passcode or is misconfigured.
    #[error("{0}")]
    Lock(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the dashboard crates.
pub type Result<T> = std::result::Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_file_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = DashboardError::FileRead {
            path: PathBuf::from("/data/days.json"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read file"));
        assert!(msg.contains("/data/days.json"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_display_data_file_not_found() {
        let err = DashboardError::DataFileNotFound(PathBuf::from("/data/days.json"));
        assert_eq!(err.to_string(), "Data file not found: /data/days.json");
    }

    #[test]
    fn test_error_display_invalid_date() {
        let err = DashboardError::InvalidDate("2024-3-15".to_string());
        assert_eq!(err.to_string(), "Invalid date: 2024-3-15");
    }

    #[test]
    fn test_error_display_lock_is_verbatim() {
        let err = DashboardError::Lock("Invalid password".to_string());
        assert_eq!(err.to_string(), "Invalid password");
    }

    #[test]
    fn test_error_display_config() {
        let err = DashboardError::Config("unknown view".to_string());
        assert_eq!(err.to_string(), "Configuration error: unknown view");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: DashboardError = io_err.into();
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let err: DashboardError = json_err.into();
        assert!(err.to_string().contains("Failed to parse JSON"));
    }
}
