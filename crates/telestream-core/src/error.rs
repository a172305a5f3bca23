//! Errors surfaced by the broadcast stream.

/// Errors returned by [`TelemetryStream`](crate::TelemetryStream) operations.
///
/// Per-subscriber delivery failures are not represented here: a subscriber
/// whose buffer is full or closed is dropped silently.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    /// The stream is stopped and does not accept subscribers until the next `start()`.
    #[error("telemetry stream is stopped")]
    Stopped,

    /// The stream configuration is invalid.
    #[error("invalid stream configuration: {0}")]
    Configuration(String),

    /// `start()` was called outside a Tokio runtime.
    #[error("telemetry stream must be started from within a Tokio runtime")]
    NoRuntime,
}

pub type Result<T> = std::result::Result<T, StreamError>;
