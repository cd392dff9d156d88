//! Frame lifecycle for one channel.
//!
//! The channel owns at most two frames: the caller frame, which performs
//! every relay navigation, and on the host the remote frame, which loads
//! the guest document. Handles never leave this type.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::capability::{FrameHost, FrameSpec, LoadHandler};
use crate::error::{Error, Result};
use crate::identifiers::FrameId;

// ============================================================================
// FrameHandles
// ============================================================================

#[derive(Debug, Default)]
struct FrameHandles {
    caller: Option<FrameId>,
    remote: Option<FrameId>,
}

// ============================================================================
// FrameLifecycle
// ============================================================================

/// Creates, drives and removes the channel's frames.
///
/// The handle lock is never held across a [`FrameHost`] call, so the host
/// may fire load events synchronously.
pub(crate) struct FrameLifecycle {
    host: Arc<dyn FrameHost>,
    handles: Mutex<FrameHandles>,
}

impl fmt::Debug for FrameLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameLifecycle")
            .field("handles", &*self.handles.lock())
            .finish_non_exhaustive()
    }
}

impl FrameLifecycle {
    pub(crate) fn new(host: Arc<dyn FrameHost>) -> Self {
        Self {
            host,
            handles: Mutex::new(FrameHandles::default()),
        }
    }

    /// Creates the hidden caller frame at `url`.
    ///
    /// `on_load` fires once, on the frame's first load.
    pub(crate) fn create_caller_frame(&self, url: &str, on_load: LoadHandler) -> Result<FrameId> {
        let frame_id = self
            .host
            .create_frame(FrameSpec::hidden(url), Some(on_load))?;
        self.adopt_caller(frame_id);
        debug!(%frame_id, url, "Caller frame created");
        Ok(frame_id)
    }

    /// Creates the hidden remote frame that bootstraps the guest.
    pub(crate) fn create_remote_frame(
        &self,
        url: &str,
        channel: &str,
        container: Option<String>,
    ) -> Result<FrameId> {
        let spec = FrameSpec::hidden(url)
            .with_name(channel)
            .with_container(container);
        let frame_id = self.host.create_frame(spec, None)?;
        self.handles.lock().remote = Some(frame_id);
        debug!(%frame_id, url, "Remote frame created");
        Ok(frame_id)
    }

    /// Records the caller frame handle if it is not known yet.
    ///
    /// Hosts that fire the load handler from inside `create_frame` deliver
    /// the handle here before `create_caller_frame` returns.
    pub(crate) fn adopt_caller(&self, frame_id: FrameId) {
        self.handles.lock().caller.get_or_insert(frame_id);
    }

    #[inline]
    pub(crate) fn caller(&self) -> Option<FrameId> {
        self.handles.lock().caller
    }

    #[inline]
    pub(crate) fn remote(&self) -> Option<FrameId> {
        self.handles.lock().remote
    }

    /// Carries `payload` in the caller frame's name to `url`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] if the caller frame is gone.
    pub(crate) fn navigate_caller(&self, url: &str, payload: &str) -> Result<()> {
        let frame_id = self.caller().ok_or(Error::ChannelClosed)?;
        trace!(%frame_id, url, len = payload.len(), "Navigating caller frame");
        self.host.navigate(frame_id, url, payload)
    }

    /// Removes every owned frame. Calling it again is a no-op.
    ///
    /// Both frames are always attempted; the first failure is returned.
    pub(crate) fn destroy(&self) -> Result<()> {
        let (caller, remote) = {
            let mut handles = self.handles.lock();
            (handles.caller.take(), handles.remote.take())
        };

        let caller_result = self.destroy_frame(caller);
        let remote_result = self.destroy_frame(remote);
        caller_result.and(remote_result)
    }

    fn destroy_frame(&self, frame: Option<FrameId>) -> Result<()> {
        let Some(frame_id) = frame else {
            return Ok(());
        };
        match self.host.destroy_frame(frame_id) {
            Ok(()) => {
                debug!(%frame_id, "Frame removed");
                Ok(())
            }
            Err(e) => {
                warn!(%frame_id, error = %e, "Failed to remove frame");
                Err(e)
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
