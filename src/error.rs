//! Error types for the monitoring core

use std::fmt;
use std::time::Duration;

/// Result type alias for monitor operations
pub type MonitorResult<T> = Result<T, MonitorError>;

/// Errors that can occur while driving the node monitor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorError {
    /// `start` was called while the monitor is running or stopping
    AlreadyRunning,

    /// `stop` was called while the monitor is idle
    NotRunning,

    /// The poll source could not produce a snapshot (transient)
    SnapshotFetch(String),

    /// The status channel was not drained within the publish timeout
    PublishBackpressure(Duration),

    /// The status consumer has gone away
    StatusChannelClosed,

    /// Invalid monitor configuration
    InvalidConfig(String),
}

impl fmt::Display for MonitorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorError::AlreadyRunning => write!(f, "monitor is already running"),
            MonitorError::NotRunning => write!(f, "monitor is not running"),
            MonitorError::SnapshotFetch(msg) => write!(f, "failed to fetch node snapshot: {}", msg),
            MonitorError::PublishBackpressure(timeout) => write!(
                f,
                "status channel not drained within {}ms, message dropped",
                timeout.as_millis()
            ),
            MonitorError::StatusChannelClosed => write!(f, "status channel closed"),
            MonitorError::InvalidConfig(msg) => write!(f, "invalid monitor configuration: {}", msg),
        }
    }
}

impl std::error::Error for MonitorError {}

impl MonitorError {
    /// Whether the poll loop should simply carry on after this error
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            MonitorError::SnapshotFetch(_)
                | MonitorError::PublishBackpressure(_)
                | MonitorError::StatusChannelClosed
        )
    }
}

impl From<reqwest::Error> for MonitorError {
    fn from(err: reqwest::Error) -> Self {
        MonitorError::SnapshotFetch(err.to_string())
    }
}

impl From<serde_json::Error> for MonitorError {
    fn from(err: serde_json::Error) -> Self {
        MonitorError::SnapshotFetch(format!("invalid snapshot JSON: {err}"))
    }
}
