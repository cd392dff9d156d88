//! Type-safe identifiers for relay entities.
//!
//! | Type | Wraps | Meaning |
//! |------|-------|---------|
//! | [`FrameId`] | `u64` | Handle issued by a [`FrameHost`](crate::capability::FrameHost) |
//! | [`ChannelName`] | `String` | Channel identifier shared by both documents |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Prefix used for generated channel names.
const GENERATED_PREFIX: &str = "xdm_";

/// Allowed channel name syntax.
///
/// The name doubles as a frame `name`, a registry key and a URL fragment,
/// so it is restricted to characters that survive all three untouched.
static CHANNEL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid channel pattern")
});

// ============================================================================
// FrameId
// ============================================================================

/// Opaque handle to a frame created by a frame host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FrameId(u64);

impl FrameId {
    /// Creates a frame ID from a raw value.
    #[inline]
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// ChannelName
// ============================================================================

/// Validated channel identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChannelName(String);

impl ChannelName {
    /// Creates a channel name after validating its syntax.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidChannel`] if the name is empty or contains
    /// characters outside `[A-Za-z0-9_-]`.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if !CHANNEL_PATTERN.is_match(&name) {
            return Err(Error::invalid_channel(name));
        }
        Ok(Self(name))
    }

    /// Accepts a channel name chosen by the peer, as carried in `xdm_c`.
    ///
    /// The host may use any name its own rules allow, so only what breaks
    /// the relay itself is refused: an empty name, `#` (it ends the `_3`
    /// fragment's channel) and control characters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidChannel`] for those names.
    pub fn from_remote(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() || name.chars().any(|c| c == '#' || c.is_control()) {
            return Err(Error::invalid_channel(name));
        }
        Ok(Self(name))
    }

    /// Generates a fresh random channel name.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("{GENERATED_PREFIX}{}", Uuid::new_v4().simple()))
    }

    /// Returns the name as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ChannelName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ChannelName {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ChannelName> for String {
    fn from(value: ChannelName) -> Self {
        value.0
    }
}

// ============================================================================
// Tests
// ============================================================================
