//! Deferred task execution.
//!
//! Ready notifications are raised from inside load-event handlers. They are
//! pushed through a [`Scheduler`] so application code never runs inside the
//! relay's own call stack.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tracing::trace;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Delay before a deferred task runs on the tokio scheduler.
pub const DEFAULT_DEFER_DELAY: Duration = Duration::from_millis(10);

// ============================================================================
// Types
// ============================================================================

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce() + Send>;

// ============================================================================
// Scheduler
// ============================================================================

/// Runs tasks later, never on the caller's stack.
pub trait Scheduler: Send + Sync {
    /// Queues `task` for later execution.
    fn defer(&self, task: Task);
}

// ============================================================================
// TokioScheduler
// ============================================================================

/// [`Scheduler`] that spawns tasks onto a tokio runtime.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
    delay: Duration,
}

impl TokioScheduler {
    /// Creates a scheduler bound to the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when called outside a runtime.
    pub fn current() -> Result<Self> {
        let handle = Handle::try_current().map_err(|e| {
            Error::config(format!(
                "No tokio runtime available ({e}). Build the channel inside a runtime \
                 or supply a scheduler with .scheduler()"
            ))
        })?;
        Ok(Self::with_handle(handle))
    }

    /// Creates a scheduler bound to `handle`.
    #[inline]
    #[must_use]
    pub fn with_handle(handle: Handle) -> Self {
        Self {
            handle,
            delay: DEFAULT_DEFER_DELAY,
        }
    }

    /// Sets the delay applied before each task runs.
    #[inline]
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl Scheduler for TokioScheduler {
    fn defer(&self, task: Task) {
        let delay = self.delay;
        self.handle.spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            task();
        });
    }
}

// ============================================================================
// ManualScheduler
// ============================================================================

/// [`Scheduler`] that holds tasks until [`run_pending`](Self::run_pending).
///
/// For embedders that drive their own event loop.
#[derive(Default)]
pub struct ManualScheduler {
    tasks: Mutex<VecDeque<Task>>,
}

impl fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("pending", &self.pending())
            .finish()
    }
}

impl ManualScheduler {
    /// Creates an empty scheduler.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of queued tasks.
    #[inline]
    #[must_use]
    pub fn pending(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Runs queued tasks, including ones queued while running, and returns
    /// how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        // Pop one at a time so tasks can defer more work.
        loop {
            let Some(task) = self.tasks.lock().pop_front() else {
                break;
            };
            task();
            ran += 1;
        }
        if ran > 0 {
            trace!(ran, "Ran deferred tasks");
        }
        ran
    }
}

impl Scheduler for ManualScheduler {
    fn defer(&self, task: Task) {
        self.tasks.lock().push_back(task);
    }
}

// ============================================================================
// Tests
// ============================================================================
