//! Capabilities the relay borrows from its environment.
//!
//! Everything that touches the document, the URL machinery or the event
//! loop is injected, so the protocol logic runs the same against a real
//! browser binding and against a simulator.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `codec` | [`UrlCodec`] and the default [`StdUrlCodec`] |
//! | `frame` | [`FrameHost`] and [`FrameSpec`] |
//! | `registry` | [`Registry`] and the in-process [`MemoryRegistry`] |
//! | `scheduler` | [`Scheduler`], [`TokioScheduler`], [`ManualScheduler`] |

// ============================================================================
// Submodules
// ============================================================================

/// URL parsing and construction.
pub mod codec;

/// Hidden frame management.
pub mod frame;

/// Named callback registry.
pub mod registry;

/// Deferred task execution.
pub mod scheduler;

// ============================================================================
// Re-exports
// ============================================================================

pub use codec::{QueryParams, StdUrlCodec, UrlCodec};
pub use frame::{FrameHost, FrameSpec, LoadHandler};
pub use registry::{MemoryRegistry, Registry, RelayHandler};
pub use scheduler::{ManualScheduler, Scheduler, Task, TokioScheduler};
