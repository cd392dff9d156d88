//! Error types for the name relay.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use name_relay::{Error, Result};
//!
//! fn send(channel: &Channel) -> Result<()> {
//!     channel.post_message("hello")?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::MissingParameter`], [`Error::InvalidChannel`], [`Error::InvalidUrl`] |
//! | Channel | [`Error::ChannelCollision`], [`Error::ChannelClosed`], [`Error::ReservedMessage`] |
//! | Frames | [`Error::FrameCreation`], [`Error::FrameNotFound`], [`Error::Navigation`] |
//! | Registry | [`Error::HandlerNotFound`] |
//! | Waiting | [`Error::ReadyTimeout`], [`Error::StalledDelivery`] |
//! | External | [`Error::Json`], [`Error::Decode`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;
use std::string::FromUtf8Error;

use thiserror::Error;
use url::ParseError;

use crate::identifiers::FrameId;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when channel configuration is incomplete or inconsistent.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Required query parameter missing from the guest bootstrap URL.
    #[error("Missing query parameter '{name}' in {url}")]
    MissingParameter {
        /// Parameter name (`xdm_c`, `xdm_e`).
        name: &'static str,
        /// Document URL that was inspected.
        url: String,
    },

    /// Channel identifier is not usable as a frame name or fragment.
    #[error("Invalid channel name: {channel:?}")]
    InvalidChannel {
        /// The rejected identifier.
        channel: String,
    },

    /// URL could not be parsed or resolved.
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
        /// Underlying parse failure.
        #[source]
        source: ParseError,
    },

    // ========================================================================
    // Channel Errors
    // ========================================================================
    /// A handler is already registered under this key.
    ///
    /// Channel identifiers must be unique among live channels of a document.
    #[error("Channel collision: '{key}' is already registered")]
    ChannelCollision {
        /// Registry key that was taken.
        key: String,
    },

    /// Operation attempted after the channel was destroyed.
    #[error("Channel closed")]
    ChannelClosed,

    /// The application tried to send a reserved control message.
    #[error("Reserved message: {message:?} is a control message")]
    ReservedMessage {
        /// The rejected payload.
        message: String,
    },

    // ========================================================================
    // Frame Errors
    // ========================================================================
    /// The frame host refused to create a frame.
    #[error("Frame creation failed for {url}: {message}")]
    FrameCreation {
        /// URL the frame was meant to load.
        url: String,
        /// Description of the failure.
        message: String,
    },

    /// Frame handle does not refer to a live frame.
    #[error("Frame not found: {frame_id}")]
    FrameNotFound {
        /// The missing frame.
        frame_id: FrameId,
    },

    /// The frame host could not start a navigation.
    #[error("Navigation of frame {frame_id} failed: {message}")]
    Navigation {
        /// Frame that was being navigated.
        frame_id: FrameId,
        /// Description of the failure.
        message: String,
    },

    // ========================================================================
    // Registry Errors
    // ========================================================================
    /// No handler registered under this key.
    #[error("No handler registered for '{key}'")]
    HandlerNotFound {
        /// Registry key that was invoked.
        key: String,
    },

    // ========================================================================
    // Waiting Errors
    // ========================================================================
    /// Channel did not become ready in time.
    #[error("Channel not ready after {timeout_ms}ms")]
    ReadyTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// Queued messages were not delivered in time.
    ///
    /// The relay itself never gives up on a navigation; this is only
    /// reported by bounded waits such as `Channel::flush`.
    #[error("Delivery stalled: {pending} message(s) outstanding after {timeout_ms}ms")]
    StalledDelivery {
        /// Messages queued or in flight when the wait expired.
        pending: usize,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Percent-decoded bytes were not UTF-8.
    #[error("Decode error: {0}")]
    Decode(#[from] FromUtf8Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a missing parameter error.
    #[inline]
    pub fn missing_parameter(name: &'static str, url: impl Into<String>) -> Self {
        Self::MissingParameter {
            name,
            url: url.into(),
        }
    }

    /// Creates an invalid channel error.
    #[inline]
    pub fn invalid_channel(channel: impl Into<String>) -> Self {
        Self::InvalidChannel {
            channel: channel.into(),
        }
    }

    /// Creates an invalid URL error.
    #[inline]
    pub fn invalid_url(url: impl Into<String>, source: ParseError) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            source,
        }
    }

    /// Creates a channel collision error.
    #[inline]
    pub fn channel_collision(key: impl Into<String>) -> Self {
        Self::ChannelCollision { key: key.into() }
    }

    /// Creates a reserved message error.
    #[inline]
    pub fn reserved_message(message: impl Into<String>) -> Self {
        Self::ReservedMessage {
            message: message.into(),
        }
    }

    /// Creates a frame creation error.
    #[inline]
    pub fn frame_creation(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FrameCreation {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates a frame not found error.
    #[inline]
    pub fn frame_not_found(frame_id: FrameId) -> Self {
        Self::FrameNotFound { frame_id }
    }

    /// Creates a navigation error.
    #[inline]
    pub fn navigation(frame_id: FrameId, message: impl Into<String>) -> Self {
        Self::Navigation {
            frame_id,
            message: message.into(),
        }
    }

    /// Creates a handler not found error.
    #[inline]
    pub fn handler_not_found(key: impl Into<String>) -> Self {
        Self::HandlerNotFound { key: key.into() }
    }

    /// Creates a ready timeout error.
    #[inline]
    pub fn ready_timeout(timeout_ms: u64) -> Self {
        Self::ReadyTimeout { timeout_ms }
    }

    /// Creates a stalled delivery error.
    #[inline]
    pub fn stalled_delivery(pending: usize, timeout_ms: u64) -> Self {
        Self::StalledDelivery {
            pending,
            timeout_ms,
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this error was caused by bad configuration.
    #[inline]
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::Config { .. }
                | Self::MissingParameter { .. }
                | Self::InvalidChannel { .. }
                | Self::InvalidUrl { .. }
        )
    }

    /// Returns `true` if the channel has been torn down.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::ChannelClosed)
    }

    /// Returns `true` if this is a frame host error.
    #[inline]
    #[must_use]
    pub fn is_frame_error(&self) -> bool {
        matches!(
            self,
            Self::FrameCreation { .. } | Self::FrameNotFound { .. } | Self::Navigation { .. }
        )
    }

    /// Returns `true` if this error came from a bounded wait expiring.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::ReadyTimeout { .. } | Self::StalledDelivery { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::missing_parameter("xdm_c", "https://b.example/app.html?xdm_p=2");
        assert_eq!(
            err.to_string(),
            "Missing query parameter 'xdm_c' in https://b.example/app.html?xdm_p=2"
        );
    }

    #[test]
    fn test_config_error() {
        let err = Error::config("remote_helper is required on the host");
        assert_eq!(
            err.to_string(),
            "Configuration error: remote_helper is required on the host"
        );
        assert!(err.is_config_error());
    }

    #[test]
    fn test_invalid_url_keeps_source() {
        let source = url::Url::parse("not a url").unwrap_err();
        let err = Error::invalid_url("not a url", source);
        assert!(err.is_config_error());
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_is_closed() {
        assert!(Error::ChannelClosed.is_closed());
        assert!(!Error::channel_collision("abc").is_closed());
    }

    #[test]
    fn test_is_frame_error() {
        let frame_err = Error::navigation(FrameId::new(3), "detached");
        let other_err = Error::handler_not_found("abc_load");

        assert!(frame_err.is_frame_error());
        assert!(!other_err.is_frame_error());
    }

    #[test]
    fn test_is_timeout() {
        assert!(Error::ready_timeout(500).is_timeout());
        assert!(Error::stalled_delivery(2, 500).is_timeout());
        assert!(!Error::ChannelClosed.is_timeout());
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_from_utf8_error() {
        let utf8_err = String::from_utf8(vec![0xff, 0xfe]).unwrap_err();
        let err: Error = utf8_err.into();
        assert!(matches!(err, Error::Decode(_)));
    }
}
