//! Error types for tonearm.

use thiserror::Error;

/// Result type alias using tonearm's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for tonearm.
#[derive(Error, Debug)]
pub enum Error {
    // Resolution errors
    #[error("failed to resolve '{identifier}': {reason}")]
    Resolution { identifier: String, reason: String },

    #[error("failed to open stream for track '{track_id}': {reason}")]
    Stream { track_id: String, reason: String },

    // Transport errors
    #[error("transport error: {0}")]
    Transport(String),

    // Connection errors
    #[error("connection did not reach {target} within {waited_secs}s")]
    ConnectionTimeout {
        target: &'static str,
        waited_secs: u64,
    },

    #[error("rejoin attempts exhausted after {attempts} tries")]
    RejoinExhausted { attempts: u32 },

    // Network errors
    #[error("network error: {0}")]
    Network(String),

    // Plugin errors
    #[error("cache error: {0}")]
    Cache(String),

    #[error("filter pipeline error: {0}")]
    Filter(String),

    // Session errors
    #[error("player has been destroyed")]
    Destroyed,

    // Generic errors
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Build a resolution error for a single identifier.
    pub fn resolution(identifier: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Resolution {
            identifier: identifier.into(),
            reason: reason.into(),
        }
    }

    /// Build a stream-open error for an already-resolved track.
    pub fn stream(track_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Stream {
            track_id: track_id.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if this error is retryable.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::ConnectionTimeout { .. })
    }

    /// Returns true if the error is local to a single queue entry and
    /// playback can continue past it.
    pub const fn is_skippable(&self) -> bool {
        matches!(self, Self::Resolution { .. } | Self::Stream { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_retryable() {
        assert!(Error::Network("test".into()).is_retryable());
        assert!(Error::ConnectionTimeout {
            target: "Ready",
            waited_secs: 20
        }
        .is_retryable());
        assert!(!Error::Destroyed.is_retryable());
    }

    #[test]
    fn test_error_skippable() {
        assert!(Error::resolution("abc", "not found").is_skippable());
        assert!(Error::stream("abc", "403").is_skippable());
        assert!(!Error::RejoinExhausted { attempts: 5 }.is_skippable());
    }

    #[test]
    fn test_error_display() {
        let err = Error::resolution("dQw4w9WgXcQ", "no metadata");
        assert_eq!(
            err.to_string(),
            "failed to resolve 'dQw4w9WgXcQ': no metadata"
        );
    }
}
