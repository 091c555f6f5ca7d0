//! # Playback Error Types
//!
//! Every failure the playback core can produce, grouped by how the
//! dispatcher reacts to it.

use bridge_traits::BridgeError;
use thiserror::Error;

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Resource Errors (reported, never retried)
    // ========================================================================
    /// The decoder reported a failure. Codes are the host's raw values.
    #[error("Decoder failure (what: {what}, extra: {extra})")]
    Resource { what: i32, extra: i32 },

    /// A host bridge call failed.
    #[error("Host bridge call failed: {0}")]
    Bridge(#[from] BridgeError),

    // ========================================================================
    // Illegal-State Errors (logged, treated as no-op)
    // ========================================================================
    /// Operation invoked before its collaborators are ready, e.g. skipping
    /// through an empty queue or resuming with no source bound.
    #[error("Illegal state: {0}")]
    IllegalState(String),

    // ========================================================================
    // Persistence Errors
    // ========================================================================
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // ========================================================================
    // Runtime Errors
    // ========================================================================
    /// The dispatcher is gone; the handle outlived `shutdown()`.
    #[error("Playback runtime is not running")]
    RuntimeClosed,

    /// A worker task panicked or was cancelled.
    #[error("Worker task failed: {0}")]
    Worker(String),
}

impl PlaybackError {
    /// Returns `true` for errors the dispatcher drops after logging.
    pub fn is_illegal_state(&self) -> bool {
        matches!(self, PlaybackError::IllegalState(_))
    }

    /// Returns `true` when a host reported the operation as unsupported in
    /// its current state.
    pub fn is_unsupported_operation(&self) -> bool {
        matches!(self, PlaybackError::Bridge(err) if err.is_unsupported_operation())
    }

    /// Decoder code carried by the error, if any.
    pub fn code(&self) -> Option<i32> {
        match self {
            PlaybackError::Resource { what, .. } => Some(*what),
            _ => None,
        }
    }

    pub(crate) fn illegal_state(message: impl Into<String>) -> Self {
        PlaybackError::IllegalState(message.into())
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
