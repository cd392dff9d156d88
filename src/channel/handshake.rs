//! Readiness handshake state machine.
//!
//! Host: ready once the caller frame has loaded **and** the guest's `"ready"`
//! has arrived, in either order. Guest: ready as soon as its caller frame
//! has loaded; it then announces itself with `"ready"`.
//!
//! Inbound payloads are routed by [`Inbound`]. The host starts in
//! [`Inbound::AwaitingReady`], which accepts only the control message, and
//! switches to [`Inbound::Delivering`] the moment it sees it.

// ============================================================================
// Imports
// ============================================================================

use crate::protocol::READY_MESSAGE;

use super::role::Role;

// ============================================================================
// Constants
// ============================================================================

/// Readiness signals the host needs: caller load plus the guest's `"ready"`.
const HOST_READY_SIGNALS: u8 = 2;

// ============================================================================
// ReadyState
// ============================================================================

/// Lifecycle of a channel as seen by the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadyState {
    /// Caller frame has not finished its first load.
    AwaitingCallerLoad,
    /// Host only: caller frame loaded, waiting for the guest's `"ready"`.
    AwaitingHandshake,
    /// Application messages may flow.
    Ready,
    /// Torn down.
    Destroyed,
}

// ============================================================================
// Inbound
// ============================================================================

/// Active receive handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Inbound {
    /// Only the `"ready"` control message is accepted.
    AwaitingReady,
    /// Payloads go to the application.
    Delivering,
    /// Channel destroyed; everything is dropped.
    Closed,
}

/// Effect of a readiness signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Signal {
    /// Counted, not ready yet (or a repeat that changes nothing).
    Pending,
    /// This signal made the channel ready.
    BecameReady,
}

/// What to do with an inbound payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Received {
    /// Hand it to the application.
    Deliver,
    /// It was the handshake control message.
    Handshake(Signal),
    /// Drop it.
    Ignored,
}

// ============================================================================
// Handshake
// ============================================================================

/// Readiness bookkeeping for one channel.
#[derive(Debug)]
pub(crate) struct Handshake {
    role: Role,
    state: ReadyState,
    inbound: Inbound,
    caller_loaded: bool,
    ready_count: u8,
}

impl Handshake {
    /// Creates the initial state for `role`.
    pub(crate) fn new(role: Role) -> Self {
        let inbound = match role {
            Role::Host => Inbound::AwaitingReady,
            Role::Guest => Inbound::Delivering,
        };
        Self {
            role,
            state: ReadyState::AwaitingCallerLoad,
            inbound,
            caller_loaded: false,
            ready_count: 0,
        }
    }

    #[inline]
    pub(crate) fn state(&self) -> ReadyState {
        self.state
    }

    #[inline]
    pub(crate) fn is_destroyed(&self) -> bool {
        self.state == ReadyState::Destroyed
    }

    /// Relay navigations may only start once ready.
    #[inline]
    pub(crate) fn can_send(&self) -> bool {
        self.state == ReadyState::Ready
    }

    /// Records the caller frame's first load.
    pub(crate) fn caller_loaded(&mut self) -> Signal {
        if self.caller_loaded || self.is_destroyed() {
            return Signal::Pending;
        }
        self.caller_loaded = true;

        match self.role {
            Role::Guest => {
                self.state = ReadyState::Ready;
                Signal::BecameReady
            }
            Role::Host => {
                let signal = self.count_signal();
                if signal == Signal::Pending {
                    self.state = ReadyState::AwaitingHandshake;
                }
                signal
            }
        }
    }

    /// Routes an inbound payload.
    pub(crate) fn receive(&mut self, payload: &str) -> Received {
        match self.inbound {
            Inbound::Delivering => Received::Deliver,
            Inbound::Closed => Received::Ignored,
            Inbound::AwaitingReady if payload == READY_MESSAGE => {
                self.inbound = Inbound::Delivering;
                Received::Handshake(self.count_signal())
            }
            Inbound::AwaitingReady => Received::Ignored,
        }
    }

    /// Moves to the terminal state.
    pub(crate) fn close(&mut self) {
        self.state = ReadyState::Destroyed;
        self.inbound = Inbound::Closed;
    }

    fn count_signal(&mut self) -> Signal {
        self.ready_count += 1;
        if self.ready_count == HOST_READY_SIGNALS {
            self.state = ReadyState::Ready;
            Signal::BecameReady
        } else {
            Signal::Pending
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
