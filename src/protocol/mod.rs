//! Wire protocol shared by both ends of a relay.
//!
//! Nothing here performs I/O; these are the names and URL shapes the two
//! documents and their relay pages agree on.
//!
//! # Bootstrap Query
//!
//! The host loads the guest document with three query parameters:
//!
//! | Parameter | Value |
//! |-----------|-------|
//! | `xdm_e` | Percent-encoded URL of the host's relay page |
//! | `xdm_c` | Channel name |
//! | `xdm_p` | Protocol marker, always `2` for this transport |
//!
//! # Relay Fragments
//!
//! Navigations to a relay page carry their routing in the fragment, see
//! [`RelayFragment`].
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `fragment` | Relay fragment encoding and parsing |

// ============================================================================
// Submodules
// ============================================================================

/// Relay fragment encoding and parsing.
pub mod fragment;

// ============================================================================
// Re-exports
// ============================================================================

pub use fragment::RelayFragment;

// ============================================================================
// Constants
// ============================================================================

/// Query parameter holding the host's relay page URL.
pub const PARAM_ENDPOINT: &str = "xdm_e";

/// Query parameter holding the channel name.
pub const PARAM_CHANNEL: &str = "xdm_c";

/// Query parameter marking a guest bootstrap.
pub const PARAM_PROTOCOL: &str = "xdm_p";

/// Value of [`PARAM_PROTOCOL`] identifying the name transport.
pub const PROTOCOL_VERSION: &str = "2";

/// Control message announcing that the guest can receive.
///
/// Reserved: never delivered to or accepted from the application.
pub const READY_MESSAGE: &str = "ready";

/// Suffix of the registry key signalling caller-frame load completion.
const LOAD_SUFFIX: &str = "_load";

// ============================================================================
// Helpers
// ============================================================================

/// Registry key the relay page calls when the caller frame has loaded
/// back after a navigation.
#[inline]
#[must_use]
pub fn load_key(channel: &str) -> String {
    format!("{channel}{LOAD_SUFFIX}")
}

/// Joins a relay page URL and an encoded fragment.
#[inline]
#[must_use]
pub fn relay_url(helper: &str, fragment: &str) -> String {
    format!("{helper}#{fragment}")
}

// ============================================================================
// Tests
// ============================================================================
