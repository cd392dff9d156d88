//! Relay channel: one end of a host/guest pair.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Channel`] | Live channel: handshake, send queue, teardown |
//! | [`ChannelBuilder`] | Fluent configuration and role negotiation |
//! | [`ChannelSettings`] | Serializable data fields |
//! | [`ChannelConfig`] | Resolved configuration |
//! | [`Role`] | Host or guest |
//! | [`ReadyState`] | Handshake progress |
//!
//! # Lifecycle
//!
//! 1. `negotiate` - the document URL decides host or guest
//! 2. frames are created (host: remote frame, then caller frame)
//! 3. handshake - guest announces `"ready"`, host waits for it and its own
//!    caller frame
//! 4. `post_message` - one relay navigation per message, strictly FIFO
//! 5. `destroy` - frames removed, registry released, queue dropped

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder.
pub mod builder;

/// Configuration types.
pub mod config;

/// Channel controller.
pub mod core;

/// Frame ownership.
mod frames;

/// Readiness state machine.
pub mod handshake;

/// Outbound queue.
mod queue;

/// Role negotiation.
pub mod role;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::ChannelBuilder;
pub use config::{ChannelConfig, ChannelSettings, MessageHandler, ReadyCallback};
pub use core::{Channel, ChannelStatus};
pub use handshake::ReadyState;
pub use role::{Negotiation, Role, negotiate};
