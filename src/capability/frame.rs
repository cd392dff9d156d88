//! Hidden frame management.
//!
//! A [`FrameHost`] is whatever owns the rendering surface: a `web-sys`
//! binding in a browser, a remote automation session, or a simulator in
//! tests. The relay never touches the DOM directly.

// ============================================================================
// Imports
// ============================================================================

use crate::error::Result;
use crate::identifiers::FrameId;

// ============================================================================
// Types
// ============================================================================

/// One-shot callback fired when a frame finishes its first load.
pub type LoadHandler = Box<dyn FnOnce(FrameId) + Send>;

// ============================================================================
// FrameSpec
// ============================================================================

/// Description of a frame to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSpec {
    /// URL the frame initially loads.
    pub url: String,
    /// Frame `name` (window name) at creation time.
    pub name: Option<String>,
    /// Container element identifier; `None` means the document body.
    pub container: Option<String>,
    /// Whether the frame must be invisible to the user.
    pub hidden: bool,
}

impl FrameSpec {
    /// Creates a hidden frame spec for `url`.
    #[inline]
    #[must_use]
    pub fn hidden(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: None,
            container: None,
            hidden: true,
        }
    }

    /// Sets the frame name.
    #[inline]
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the container element.
    #[inline]
    #[must_use]
    pub fn with_container(mut self, container: Option<String>) -> Self {
        self.container = container;
        self
    }
}

// ============================================================================
// FrameHost
// ============================================================================

/// Creates, navigates and removes frames.
///
/// Implementations may invoke the load handler synchronously from inside
/// [`create_frame`](Self::create_frame); the relay copes with that.
pub trait FrameHost: Send + Sync {
    /// Creates a frame and subscribes `on_load` to its first load.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FrameCreation`](crate::Error::FrameCreation) if the
    /// frame cannot be created (e.g. the URL is disallowed).
    fn create_frame(&self, spec: FrameSpec, on_load: Option<LoadHandler>) -> Result<FrameId>;

    /// Writes `name` into the frame's window name and navigates it to `url`.
    ///
    /// The name survives the cross-origin navigation, which is what carries
    /// the payload.
    fn navigate(&self, frame: FrameId, url: &str, name: &str) -> Result<()>;

    /// Detaches the frame from the document.
    fn destroy_frame(&self, frame: FrameId) -> Result<()>;
}

// ============================================================================
// Tests
// ============================================================================
