//! Role negotiation.
//!
//! The guest document is always loaded from a URL the host built, so the
//! presence of `xdm_p` in the document's own query is what tells the two
//! sides apart.

// ============================================================================
// Imports
// ============================================================================

use tracing::{debug, warn};

use crate::capability::UrlCodec;
use crate::error::{Error, Result};
use crate::protocol::{PARAM_CHANNEL, PARAM_ENDPOINT, PARAM_PROTOCOL, PROTOCOL_VERSION};

// ============================================================================
// Role
// ============================================================================

/// Which end of the relay this instance is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Originated the channel and created the guest's frame.
    Host,
    /// Loaded from a host-built bootstrap URL.
    Guest,
}

impl Role {
    /// Returns `true` for [`Role::Host`].
    #[inline]
    #[must_use]
    pub const fn is_host(self) -> bool {
        matches!(self, Self::Host)
    }
}

// ============================================================================
// Negotiation
// ============================================================================

/// Outcome of inspecting the document URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Negotiation {
    /// No protocol marker: caller-supplied configuration applies.
    Host,
    /// Protocol marker present: configuration comes from the URL.
    Guest {
        /// Decoded `xdm_c`.
        channel: String,
        /// Decoded `xdm_e`, the host's relay page.
        remote: String,
    },
}

impl Negotiation {
    /// Returns the negotiated role.
    #[inline]
    #[must_use]
    pub fn role(&self) -> Role {
        match self {
            Self::Host => Role::Host,
            Self::Guest { .. } => Role::Guest,
        }
    }
}

/// Decides the role of the document at `document_url`.
///
/// # Errors
///
/// - [`Error::MissingParameter`] if `xdm_p` is present but `xdm_c` or
///   `xdm_e` is not
/// - [`Error::Decode`] if a parameter is not valid percent-encoded UTF-8
pub fn negotiate(document_url: &str, codec: &dyn UrlCodec) -> Result<Negotiation> {
    let mut query = codec.query(document_url)?;

    let Some(protocol) = query.remove(PARAM_PROTOCOL) else {
        debug!(document_url, "No protocol marker, acting as host");
        return Ok(Negotiation::Host);
    };

    if protocol != PROTOCOL_VERSION {
        warn!(protocol = %protocol, expected = PROTOCOL_VERSION, "Unexpected protocol marker");
    }

    let channel = query
        .remove(PARAM_CHANNEL)
        .ok_or_else(|| Error::missing_parameter(PARAM_CHANNEL, document_url))?;
    let remote = query
        .remove(PARAM_ENDPOINT)
        .ok_or_else(|| Error::missing_parameter(PARAM_ENDPOINT, document_url))?;

    debug!(channel = %channel, remote = %remote, "Acting as guest");
    Ok(Negotiation::Guest { channel, remote })
}

// ============================================================================
// Tests
// ============================================================================
