use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Feed(#[from] FeedError),
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error("telemetry initialization failed: {0}")]
    Telemetry(String),
    #[error("overlay engine is no longer running")]
    EngineClosed,
    #[error("invalid replay script at line {line}: {message}")]
    Script { line: usize, message: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {path}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(String),
    #[error("missing required configuration field: {field}")]
    MissingField { field: &'static str },
    #[error("invalid configuration for {field}: {message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },
    #[error("configuration error: {0}")]
    Other(String),
}

/// Failures reported by the notification feed when the engine calls back
/// into it. These never escape [`crate::notification::NotificationEntity`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FeedError {
    #[error("notification feed is unavailable")]
    Unavailable,
    #[error("notification feed rejected the request: {reason}")]
    Rejected { reason: String },
}

/// Failures of the background icon and brand-color jobs. Always contained
/// inside the loader; the entity keeps its default visuals.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssetError {
    #[error("package {package} not found")]
    PackageNotFound { package: String },
    #[error("icon could not be decoded: {0}")]
    Undecodable(String),
    #[error("no icon available")]
    Unavailable,
}

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("failed to attach overlay surface: {0}")]
    Attach(String),
}

impl Error {
    /// Whether the error means the control loop must stop.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_) | Self::EngineClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, Error, FeedError};

    #[test]
    fn configuration_errors_are_fatal() {
        let err = Error::from(ConfigError::InvalidField {
            field: "overlay.swipe_right_action",
            message: "unknown swipe action code 7".to_string(),
        });
        assert!(err.is_fatal());
        assert!(!Error::from(FeedError::Unavailable).is_fatal());
    }
}
