//! Outbound message queue.
//!
//! Pure bookkeeping: the driver in `core` decides when to pull the next
//! message and performs the navigation.

use std::collections::VecDeque;

// ============================================================================
// SendQueue
// ============================================================================

/// FIFO of pending messages plus the in-flight flag.
///
/// `in_flight` is true exactly while a navigation started by
/// [`next`](Self::next) has not been followed by another call to `next`.
#[derive(Debug, Default)]
pub(crate) struct SendQueue {
    pending: VecDeque<String>,
    in_flight: bool,
}

impl SendQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Appends a message.
    pub(crate) fn push(&mut self, message: String) {
        self.pending.push_back(message);
    }

    /// Puts a message ahead of everything else.
    pub(crate) fn push_front(&mut self, message: String) {
        self.pending.push_front(message);
    }

    /// Takes the head message, marking a navigation in flight, or marks the
    /// queue idle if it is empty.
    pub(crate) fn next(&mut self) -> Option<String> {
        let message = self.pending.pop_front();
        self.in_flight = message.is_some();
        message
    }

    /// Returns a message whose navigation never started.
    pub(crate) fn restore(&mut self, message: String) {
        self.pending.push_front(message);
        self.in_flight = false;
    }

    /// Drops all pending messages and returns how many there were.
    pub(crate) fn clear(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        self.in_flight = false;
        dropped
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }

    #[inline]
    pub(crate) fn in_flight(&self) -> bool {
        self.in_flight
    }
}

// ============================================================================
// Tests
// ============================================================================
