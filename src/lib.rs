//! Name Relay - cross-origin messaging over hidden frame navigation.
//!
//! Two documents on different origins exchange string messages without any
//! native cross-origin messaging primitive. Each message is written into a
//! hidden frame's `name`, the frame is navigated to the peer's relay page,
//! and the relay page hands the name to a named callback in the peer.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐                          ┌──────────────────────┐
//! │  Host document       │   remote frame (xdm_*)   │  Guest document      │
//! │                      │─────────────────────────►│                      │
//! │  caller frame ───────┼──► guest relay page ─────┼──► registry[channel] │
//! │  registry[channel] ◄─┼─── host relay page ◄─────┼─── caller frame      │
//! └──────────────────────┘                          └──────────────────────┘
//! ```
//!
//! Key design principles:
//!
//! - The document URL decides the role: `xdm_p` present means guest
//! - Nothing is sent before the readiness handshake completes
//! - At most one relay navigation in flight per channel; strict FIFO
//! - Frames, registry and URL handling are injected capabilities
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use name_relay::{Channel, MemoryRegistry, Result};
//!
//! async fn open(frames: Arc<dyn name_relay::FrameHost>) -> Result<Channel> {
//!     let channel = Channel::builder()
//!         .document_url("https://a.example/app.html")
//!         .channel("abc123")
//!         .local("/relay.html")
//!         .remote("https://b.example/app.html")
//!         .remote_helper("https://b.example/relay.html")
//!         .on_message(|message, origin| println!("{origin}: {message}"))
//!         .frame_host(frames)
//!         .registry(Arc::new(MemoryRegistry::new()))
//!         .build()?;
//!
//!     channel.wait_ready(Duration::from_secs(10)).await?;
//!     channel.post_message("hello")?;
//!     Ok(channel)
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`capability`] | Injected frame host, registry, URL codec, scheduler |
//! | [`channel`] | [`Channel`], [`ChannelBuilder`], handshake and queue |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | [`FrameId`], [`ChannelName`] |
//! | [`protocol`] | Query parameters and relay fragments |
//!
//! # Limitations
//!
//! A relay navigation that never completes stalls its channel: there is no
//! timeout or retry. Recovery means destroying the channel and opening a
//! new one.

// ============================================================================
// Modules
// ============================================================================

/// Capabilities borrowed from the environment.
///
/// - [`FrameHost`] - create, navigate, remove frames
/// - [`Registry`] - named callbacks between documents
/// - [`UrlCodec`] - URL parsing and construction
/// - [`Scheduler`] - deferred callbacks
pub mod capability;

/// Relay channel.
///
/// Use [`Channel::builder()`] to open one.
pub mod channel;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// Wire protocol constants and fragment codec.
pub mod protocol;

// ============================================================================
// Re-exports
// ============================================================================

// Capability types
pub use capability::{
    FrameHost, FrameSpec, LoadHandler, ManualScheduler, MemoryRegistry, Registry, RelayHandler,
    Scheduler, StdUrlCodec, TokioScheduler, UrlCodec,
};

// Channel types
pub use channel::{
    Channel, ChannelBuilder, ChannelConfig, ChannelSettings, ChannelStatus, ReadyState, Role,
};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{ChannelName, FrameId};

// Protocol types
pub use protocol::RelayFragment;
