//! Relay fragment encoding and parsing.
//!
//! | Prefix | Direction | Body |
//! |--------|-----------|------|
//! | `_4` | Caller frame bootstrap | channel |
//! | `_2` | Guest → host | channel |
//! | `_3` | Host → guest | encoded `remoteUrl#channel` |

// ============================================================================
// Imports
// ============================================================================

use crate::capability::UrlCodec;
use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

const PREFIX_TO_HOST: &str = "_2";
const PREFIX_TO_GUEST: &str = "_3";
const PREFIX_BOOTSTRAP: &str = "_4";

// ============================================================================
// RelayFragment
// ============================================================================

/// Routing instruction carried in a relay page URL fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayFragment {
    /// Initial load of a caller frame on its own origin.
    Bootstrap {
        /// Channel name.
        channel: String,
    },

    /// Payload travelling from guest to host.
    ToHost {
        /// Channel name.
        channel: String,
    },

    /// Payload travelling from host to guest.
    ///
    /// The relay page bounces it into the guest document at `remote_url`.
    ToGuest {
        /// Guest bootstrap URL (with its `xdm_*` query).
        remote_url: String,
        /// Channel name.
        channel: String,
    },
}

impl RelayFragment {
    /// Returns the channel this fragment targets.
    #[inline]
    #[must_use]
    pub fn channel(&self) -> &str {
        match self {
            Self::Bootstrap { channel }
            | Self::ToHost { channel }
            | Self::ToGuest { channel, .. } => channel,
        }
    }

    /// Encodes the fragment body (without the leading `#`).
    #[must_use]
    pub fn encode(&self, codec: &dyn UrlCodec) -> String {
        match self {
            Self::Bootstrap { channel } => format!("{PREFIX_BOOTSTRAP}{channel}"),
            Self::ToHost { channel } => format!("{PREFIX_TO_HOST}{channel}"),
            Self::ToGuest {
                remote_url,
                channel,
            } => format!(
                "{PREFIX_TO_GUEST}{}",
                codec.encode_component(&format!("{remote_url}#{channel}"))
            ),
        }
    }

    /// Parses a fragment body, with or without the leading `#`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an unknown prefix or a `_3` body without
    /// a channel, and [`Error::Decode`] if the body is not valid UTF-8 once
    /// decoded.
    pub fn parse(fragment: &str, codec: &dyn UrlCodec) -> Result<Self> {
        let fragment = fragment.strip_prefix('#').unwrap_or(fragment);

        if let Some(channel) = fragment.strip_prefix(PREFIX_BOOTSTRAP) {
            return Ok(Self::Bootstrap {
                channel: channel.to_string(),
            });
        }

        if let Some(channel) = fragment.strip_prefix(PREFIX_TO_HOST) {
            return Ok(Self::ToHost {
                channel: channel.to_string(),
            });
        }

        if let Some(body) = fragment.strip_prefix(PREFIX_TO_GUEST) {
            let decoded = codec.decode_component(body)?;
            let (remote_url, channel) = decoded.rsplit_once('#').ok_or_else(|| {
                Error::config(format!("Relay fragment without channel: {fragment}"))
            })?;
            return Ok(Self::ToGuest {
                remote_url: remote_url.to_string(),
                channel: channel.to_string(),
            });
        }

        Err(Error::config(format!("Unknown relay fragment: {fragment}")))
    }

    /// Extracts and parses the fragment of a full relay URL.
    pub fn from_url(url: &str, codec: &dyn UrlCodec) -> Result<Self> {
        let (_, fragment) = url
            .split_once('#')
            .ok_or_else(|| Error::config(format!("Relay URL without fragment: {url}")))?;
        Self::parse(fragment, codec)
    }
}

// ============================================================================
// Tests
// ============================================================================
