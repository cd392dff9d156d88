//! Named callback registry.
//!
//! The relay document on the receiving side looks up a handler by name
//! and calls it with the payload recovered from the frame name. Each
//! document has one registry shared by all its channels.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::error::{Error, Result};

// ============================================================================
// Types
// ============================================================================

/// Handler invoked with a relayed payload.
pub type RelayHandler = Arc<dyn Fn(&str) + Send + Sync>;

// ============================================================================
// Registry
// ============================================================================

/// Keyed handler table used as the side channel between documents.
pub trait Registry: Send + Sync {
    /// Registers `handler` under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelCollision`] if `key` is already taken.
    fn register(&self, key: &str, handler: RelayHandler) -> Result<()>;

    /// Removes the handler under `key`. Returns whether one existed.
    fn unregister(&self, key: &str) -> bool;

    /// Calls the handler registered under `key` with `payload`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HandlerNotFound`] if nothing is registered.
    fn invoke(&self, key: &str, payload: &str) -> Result<()>;
}

// ============================================================================
// MemoryRegistry
// ============================================================================

/// In-process [`Registry`].
///
/// Handlers are called without the table lock held, so a handler may
/// register, unregister or invoke other keys.
#[derive(Default)]
pub struct MemoryRegistry {
    handlers: Mutex<FxHashMap<String, RelayHandler>>,
}

impl fmt::Debug for MemoryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryRegistry")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl MemoryRegistry {
    /// Creates an empty registry.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if a handler is registered under `key`.
    #[inline]
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.handlers.lock().contains_key(key)
    }

    /// Returns the number of registered handlers.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.lock().len()
    }

    /// Returns `true` if nothing is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.lock().is_empty()
    }
}

impl Registry for MemoryRegistry {
    fn register(&self, key: &str, handler: RelayHandler) -> Result<()> {
        let mut handlers = self.handlers.lock();
        if handlers.contains_key(key) {
            return Err(Error::channel_collision(key));
        }
        handlers.insert(key.to_string(), handler);
        debug!(key, "Handler registered");
        Ok(())
    }

    fn unregister(&self, key: &str) -> bool {
        let removed = self.handlers.lock().remove(key).is_some();
        if removed {
            debug!(key, "Handler unregistered");
        }
        removed
    }

    fn invoke(&self, key: &str, payload: &str) -> Result<()> {
        let handler = self
            .handlers
            .lock()
            .get(key)
            .cloned()
            .ok_or_else(|| Error::handler_not_found(key))?;

        trace!(key, len = payload.len(), "Invoking handler");
        handler(payload);
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
