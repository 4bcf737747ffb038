//! # Error Types
//!
//! Defines error types shared by every transport adapter.

use thiserror::Error;

/// Errors that can occur while handing a message to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    /// No session with the broker (or the in-process bus was dropped).
    #[error("Transport disconnected")]
    Disconnected,

    /// The outgoing request queue is full.
    #[error("Outgoing queue full for topic {topic}")]
    QueueFull { topic: String },

    /// The topic is not publishable (empty or contains wildcards).
    #[error("Invalid publish topic: {0}")]
    InvalidTopic(String),

    /// Any other transport failure.
    #[error("Transport error: {0}")]
    Transport(String),
}
