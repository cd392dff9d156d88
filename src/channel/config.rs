//! Channel configuration.
//!
//! [`ChannelSettings`] is the serializable input (what a config file or the
//! embedding page supplies). [`ChannelConfig`] is the resolved form after role
//! negotiation, with every URL final and the peer origin computed.
//!
//! # Example
//!
//! ```
//! use name_relay::ChannelSettings;
//!
//! let settings = ChannelSettings::from_json(
//!     r#"{
//!         "channel": "abc123",
//!         "local": "/relay.html",
//!         "remote": "https://b.example/app.html",
//!         "remoteHelper": "https://b.example/relay.html"
//!     }"#,
//! )?;
//! assert_eq!(settings.channel.as_deref(), Some("abc123"));
//! # Ok::<(), name_relay::Error>(())
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::identifiers::ChannelName;

// ============================================================================
// Types
// ============================================================================

/// Inbound message callback: `(message, origin_of_sender)`.
pub type MessageHandler = Arc<dyn Fn(&str, &str) + Send + Sync>;

/// One-shot readiness callback.
pub type ReadyCallback = Box<dyn FnOnce() + Send>;

// ============================================================================
// ChannelSettings
// ============================================================================

/// Data fields of a channel configuration.
///
/// All fields are optional here; which ones are required depends on the
/// negotiated role and is checked by [`ChannelBuilder::build`](super::ChannelBuilder::build).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChannelSettings {
    /// Channel name. Host only; generated when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,

    /// URL of this side's relay page, absolute or relative to the document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local: Option<String>,

    /// URL of the peer application document. Host only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,

    /// URL of the peer's relay page. Host only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_helper: Option<String>,

    /// Container element for the remote frame. Host only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
}

impl ChannelSettings {
    /// Parses settings from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) on malformed input.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes settings to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// ============================================================================
// ChannelConfig
// ============================================================================

/// Resolved configuration of a live channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Channel name (from `xdm_c` on the guest).
    pub channel: ChannelName,
    /// Absolute URL of this side's relay page.
    pub local: String,
    /// Peer document URL (decoded `xdm_e` on the guest).
    pub remote: String,
    /// Peer relay page URL (equals `remote` on the guest).
    pub remote_helper: String,
    /// Origin reported to the message callback.
    pub remote_origin: String,
    /// Container element for the remote frame.
    pub container: Option<String>,
}

// ============================================================================
// Tests
// ============================================================================
