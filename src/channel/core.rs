//! The channel controller.
//!
//! [`Channel`] ties the pieces together: it registers the receive and
//! load-completion handlers, creates the frames, runs the handshake and
//! drives the send queue.
//!
//! # Event Sources
//!
//! Nothing happens on its own. The channel only reacts to:
//!
//! - the caller frame's first load (the frame host's load handler)
//! - `<channel>_load` registry calls, made by the relay page each time the
//!   caller frame returns from a relay navigation
//! - `<channel>` registry calls carrying a payload from the peer
//!
//! # Stalls
//!
//! A relay navigation that never completes leaves the queue stalled for
//! good: there is no timer and no retry. [`Channel::flush`] bounds the wait
//! on the caller's side without changing that.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, error, trace, warn};

use crate::capability::{FrameHost, Registry, RelayHandler, Scheduler, UrlCodec};
use crate::error::{Error, Result};
use crate::identifiers::{ChannelName, FrameId};
use crate::protocol::{
    self, PARAM_CHANNEL, PARAM_ENDPOINT, PARAM_PROTOCOL, PROTOCOL_VERSION, READY_MESSAGE,
    RelayFragment,
};

use super::builder::ChannelBuilder;
use super::config::{ChannelConfig, MessageHandler, ReadyCallback};
use super::frames::FrameLifecycle;
use super::handshake::{Handshake, ReadyState, Received, Signal};
use super::queue::SendQueue;
use super::role::Role;

// ============================================================================
// ChannelStatus
// ============================================================================

/// Snapshot of a channel's progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelStatus {
    /// Handshake state.
    pub ready: ReadyState,
    /// Messages waiting to be sent.
    pub pending: usize,
    /// Whether a relay navigation is outstanding.
    pub in_flight: bool,
}

impl ChannelStatus {
    fn initial() -> Self {
        Self {
            ready: ReadyState::AwaitingCallerLoad,
            pending: 0,
            in_flight: false,
        }
    }

    /// Returns `true` when nothing is queued or in flight.
    #[inline]
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.pending == 0 && !self.in_flight
    }
}

// ============================================================================
// ChannelParts
// ============================================================================

/// Everything the builder hands over to open a channel.
pub(crate) struct ChannelParts {
    pub config: ChannelConfig,
    pub role: Role,
    pub frame_host: Arc<dyn FrameHost>,
    pub registry: Arc<dyn Registry>,
    pub codec: Arc<dyn UrlCodec>,
    pub scheduler: Arc<dyn Scheduler>,
    pub on_message: MessageHandler,
    pub on_ready: Option<ReadyCallback>,
}

// ============================================================================
// Types
// ============================================================================

/// Mutable channel state, guarded by one lock.
struct ChannelState {
    handshake: Handshake,
    queue: SendQueue,
    on_ready: Option<ReadyCallback>,
    /// Registry keys this channel owns and must release.
    registered: Vec<String>,
}

impl ChannelState {
    fn status(&self) -> ChannelStatus {
        ChannelStatus {
            ready: self.handshake.state(),
            pending: self.queue.len(),
            in_flight: self.queue.in_flight(),
        }
    }
}

/// Shared inner state; event handlers hold a [`Weak`] to it.
pub(crate) struct ChannelInner {
    config: ChannelConfig,
    role: Role,
    /// Host only: guest bootstrap URL without fragment.
    remote_url: Option<String>,
    /// Relay page URL every outbound navigation targets.
    relay_url: String,
    /// Caller frame bootstrap URL.
    caller_url: String,
    frames: FrameLifecycle,
    registry: Arc<dyn Registry>,
    scheduler: Arc<dyn Scheduler>,
    on_message: MessageHandler,
    state: Mutex<ChannelState>,
    status: watch::Sender<ChannelStatus>,
}

// ============================================================================
// Channel
// ============================================================================

/// One end of a cross-origin relay.
///
/// The channel exclusively owns its frames and registry entries; dropping
/// it tears them down.
///
/// # Example
///
/// ```ignore
/// let channel = Channel::builder()
///     .document_url("https://a.example/app.html")
///     .channel("abc123")
///     .local("/relay.html")
///     .remote("https://b.example/app.html")
///     .remote_helper("https://b.example/relay.html")
///     .on_message(|message, origin| println!("{origin}: {message}"))
///     .frame_host(frames)
///     .registry(registry)
///     .build()?;
///
/// channel.wait_ready(Duration::from_secs(10)).await?;
/// channel.post_message("hello")?;
/// ```
pub struct Channel {
    inner: Arc<ChannelInner>,
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("channel", &self.inner.config.channel)
            .field("role", &self.inner.role)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Channel - Constructor
// ============================================================================

impl Channel {
    /// Creates a new channel builder.
    #[inline]
    #[must_use]
    pub fn builder() -> ChannelBuilder {
        ChannelBuilder::new()
    }

    /// Opens a channel: registers handlers and creates frames.
    ///
    /// On failure everything acquired so far is released.
    pub(crate) fn open(parts: ChannelParts) -> Result<Self> {
        let ChannelParts {
            config,
            role,
            frame_host,
            registry,
            codec,
            scheduler,
            on_message,
            on_ready,
        } = parts;

        let channel = config.channel.as_str();
        let codec = codec.as_ref();

        let remote_url = role.is_host().then(|| {
            codec.append_query(
                &config.remote,
                &[
                    (PARAM_ENDPOINT, config.local.as_str()),
                    (PARAM_CHANNEL, channel),
                    (PARAM_PROTOCOL, PROTOCOL_VERSION),
                ],
            )
        });

        let fragment = match &remote_url {
            Some(remote_url) => RelayFragment::ToGuest {
                remote_url: remote_url.clone(),
                channel: channel.to_string(),
            },
            None => RelayFragment::ToHost {
                channel: channel.to_string(),
            },
        };
        let relay_url = protocol::relay_url(&config.remote_helper, &fragment.encode(codec));

        let bootstrap = RelayFragment::Bootstrap {
            channel: channel.to_string(),
        };
        let caller_url = protocol::relay_url(&config.local, &bootstrap.encode(codec));

        let (status, _) = watch::channel(ChannelStatus::initial());

        let inner = Arc::new(ChannelInner {
            role,
            remote_url,
            relay_url,
            caller_url,
            frames: FrameLifecycle::new(frame_host),
            registry,
            scheduler,
            on_message,
            state: Mutex::new(ChannelState {
                handshake: Handshake::new(role),
                queue: SendQueue::new(),
                on_ready,
                registered: Vec::new(),
            }),
            status,
            config,
        });

        // From here on, Drop releases whatever was acquired.
        let channel = Self { inner };
        channel.inner.start()?;
        Ok(channel)
    }
}

// ============================================================================
// Channel - Public API
// ============================================================================

impl Channel {
    /// Queues a message for the peer.
    ///
    /// Messages are delivered in call order, one relay navigation each.
    /// Messages posted before the handshake completes are held until it does.
    ///
    /// # Errors
    ///
    /// - [`Error::ReservedMessage`] for the `"ready"` control message
    /// - [`Error::ChannelClosed`] after [`destroy`](Self::destroy)
    /// - [`Error::Navigation`] if the frame host refused to navigate
    ///
    /// A navigation error does not unqueue anything. The message is queued
    /// before sending starts, and the one that failed (possibly an earlier
    /// one) goes back to the head of the queue. Posting it again would
    /// deliver it twice; the next post or completed navigation retries.
    pub fn post_message(&self, message: impl Into<String>) -> Result<()> {
        let message = message.into();
        if message == READY_MESSAGE {
            return Err(Error::reserved_message(message));
        }
        self.inner.enqueue(message)
    }

    /// Tears the channel down.
    ///
    /// Removes owned frames, releases registry keys and drops queued
    /// messages. Calling it again does nothing.
    ///
    /// # Errors
    ///
    /// Returns the first frame host error; teardown still completes.
    pub fn destroy(&self) -> Result<()> {
        self.inner.teardown()
    }

    /// Waits until the handshake completes.
    ///
    /// # Errors
    ///
    /// - [`Error::ReadyTimeout`] if not ready within `wait`
    /// - [`Error::ChannelClosed`] if destroyed while waiting
    pub async fn wait_ready(&self, wait: Duration) -> Result<()> {
        let mut rx = self.inner.status.subscribe();
        let reached = timeout(
            wait,
            rx.wait_for(|s| matches!(s.ready, ReadyState::Ready | ReadyState::Destroyed)),
        )
        .await;

        match reached {
            Err(_) => Err(Error::ready_timeout(wait.as_millis() as u64)),
            Ok(Err(_)) => Err(Error::ChannelClosed),
            Ok(Ok(status)) if status.ready == ReadyState::Destroyed => Err(Error::ChannelClosed),
            Ok(Ok(_)) => Ok(()),
        }
    }

    /// Waits until every queued message has completed its navigation.
    ///
    /// Nothing is cancelled on expiry; the queue keeps waiting for the
    /// stalled navigation.
    ///
    /// # Errors
    ///
    /// - [`Error::StalledDelivery`] if messages remain after `wait`
    /// - [`Error::ChannelClosed`] if destroyed while waiting
    pub async fn flush(&self, wait: Duration) -> Result<()> {
        let mut rx = self.inner.status.subscribe();
        let reached = timeout(
            wait,
            rx.wait_for(|s| s.is_idle() || s.ready == ReadyState::Destroyed),
        )
        .await;

        match reached {
            Err(_) => {
                let status = self.status();
                let outstanding = status.pending + usize::from(status.in_flight);
                Err(Error::stalled_delivery(outstanding, wait.as_millis() as u64))
            }
            Ok(Err(_)) => Err(Error::ChannelClosed),
            Ok(Ok(status)) if status.ready == ReadyState::Destroyed => Err(Error::ChannelClosed),
            Ok(Ok(_)) => Ok(()),
        }
    }

    /// Returns a watch receiver tracking [`ChannelStatus`].
    #[inline]
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ChannelStatus> {
        self.inner.status.subscribe()
    }
}

// ============================================================================
// Channel - Accessors
// ============================================================================

impl Channel {
    /// Returns the negotiated role.
    #[inline]
    #[must_use]
    pub fn role(&self) -> Role {
        self.inner.role
    }

    /// Returns the channel name.
    #[inline]
    #[must_use]
    pub fn channel(&self) -> &ChannelName {
        &self.inner.config.channel
    }

    /// Returns the resolved configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ChannelConfig {
        &self.inner.config
    }

    /// Returns the origin reported with inbound messages.
    #[inline]
    #[must_use]
    pub fn remote_origin(&self) -> &str {
        &self.inner.config.remote_origin
    }

    /// Returns the guest bootstrap URL (host only, without fragment).
    #[inline]
    #[must_use]
    pub fn remote_bootstrap_url(&self) -> Option<&str> {
        self.inner.remote_url.as_deref()
    }

    /// Returns the relay page URL outbound navigations target.
    #[inline]
    #[must_use]
    pub fn relay_url(&self) -> &str {
        &self.inner.relay_url
    }

    /// Returns the caller frame, until teardown.
    #[inline]
    #[must_use]
    pub fn caller_frame(&self) -> Option<FrameId> {
        self.inner.frames.caller()
    }

    /// Returns the remote frame (host only), until teardown.
    #[inline]
    #[must_use]
    pub fn remote_frame(&self) -> Option<FrameId> {
        self.inner.frames.remote()
    }

    /// Returns the handshake state.
    #[inline]
    #[must_use]
    pub fn ready_state(&self) -> ReadyState {
        self.inner.state.lock().handshake.state()
    }

    /// Returns the number of queued, not yet sent, messages.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.state.lock().queue.len()
    }

    /// Returns `true` while a relay navigation is outstanding.
    #[inline]
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        self.inner.state.lock().queue.in_flight()
    }

    /// Returns a status snapshot.
    #[inline]
    #[must_use]
    pub fn status(&self) -> ChannelStatus {
        self.inner.state.lock().status()
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        if let Err(e) = self.inner.teardown() {
            debug!(channel = %self.inner.config.channel, error = %e, "Teardown on drop failed");
        }
    }
}

// ============================================================================
// ChannelInner - Setup
// ============================================================================

impl ChannelInner {
    /// Registers handlers and creates frames, in that order.
    fn start(self: &Arc<Self>) -> Result<()> {
        let channel = self.config.channel.as_str();
        debug!(channel, role = ?self.role, "Opening channel");

        let weak = Arc::downgrade(self);
        self.register(channel, receive_handler(weak.clone()))?;
        self.register(&protocol::load_key(channel), load_handler(weak.clone()))?;

        if let Some(remote_url) = &self.remote_url {
            self.frames.create_remote_frame(
                &format!("{remote_url}#{channel}"),
                channel,
                self.config.container.clone(),
            )?;
        }

        self.frames.create_caller_frame(
            &self.caller_url,
            Box::new(move |frame_id| {
                if let Some(inner) = weak.upgrade() {
                    inner.caller_loaded(frame_id);
                }
            }),
        )?;

        Ok(())
    }

    fn register(&self, key: &str, handler: RelayHandler) -> Result<()> {
        self.registry.register(key, handler)?;
        self.state.lock().registered.push(key.to_string());
        Ok(())
    }
}

/// Handler for payloads relayed from the peer.
fn receive_handler(weak: Weak<ChannelInner>) -> RelayHandler {
    Arc::new(move |payload: &str| {
        if let Some(inner) = weak.upgrade() {
            inner.receive(payload);
        }
    })
}

/// Handler for the caller frame returning from a relay navigation.
fn load_handler(weak: Weak<ChannelInner>) -> RelayHandler {
    Arc::new(move |_: &str| {
        if let Some(inner) = weak.upgrade() {
            inner.navigation_completed();
        }
    })
}

// ============================================================================
// ChannelInner - Events
// ============================================================================

impl ChannelInner {
    /// First load of the caller frame.
    fn caller_loaded(&self, frame_id: FrameId) {
        if self.state.lock().handshake.is_destroyed() {
            trace!(channel = %self.config.channel, %frame_id, "Caller frame loaded after teardown");
            return;
        }
        self.frames.adopt_caller(frame_id);

        let (signal, ready, on_ready) = {
            let mut state = self.state.lock();
            let signal = state.handshake.caller_loaded();
            if signal == Signal::BecameReady && self.role == Role::Guest {
                // Announce before anything the application queued early.
                state.queue.push_front(READY_MESSAGE.to_string());
            }
            let on_ready = match signal {
                Signal::BecameReady => state.on_ready.take(),
                Signal::Pending => None,
            };
            self.status.send_replace(state.status());
            (signal, state.handshake.state(), on_ready)
        };

        debug!(channel = %self.config.channel, %frame_id, ?ready, "Caller frame loaded");

        if signal == Signal::BecameReady {
            self.became_ready(on_ready);
        }
    }

    /// Payload delivered through the registry.
    fn receive(&self, payload: &str) {
        let (received, on_ready) = {
            let mut state = self.state.lock();
            let received = state.handshake.receive(payload);
            let on_ready = match received {
                Received::Handshake(Signal::BecameReady) => state.on_ready.take(),
                _ => None,
            };
            self.status.send_replace(state.status());
            (received, on_ready)
        };

        match received {
            Received::Deliver => {
                trace!(channel = %self.config.channel, len = payload.len(), "Delivering message");
                (self.on_message)(payload, &self.config.remote_origin);
            }
            Received::Handshake(Signal::BecameReady) => {
                debug!(channel = %self.config.channel, "Handshake received");
                self.became_ready(on_ready);
            }
            Received::Handshake(Signal::Pending) => {
                debug!(channel = %self.config.channel, "Handshake received, waiting for caller frame");
            }
            Received::Ignored => {
                warn!(channel = %self.config.channel, len = payload.len(), "Ignoring payload before handshake");
            }
        }
    }

    /// Caller frame is back from a relay navigation.
    fn navigation_completed(&self) {
        trace!(channel = %self.config.channel, "Relay navigation completed");
        if let Err(e) = self.advance(Advance::Completed) {
            error!(channel = %self.config.channel, error = %e, "Failed to send next message");
        }
    }

    /// Defers the application callback and starts sending.
    fn became_ready(&self, on_ready: Option<ReadyCallback>) {
        debug!(channel = %self.config.channel, role = ?self.role, "Channel ready");

        if let Err(e) = self.advance(Advance::IfIdle) {
            error!(channel = %self.config.channel, error = %e, "Failed to start sending");
        }

        if let Some(on_ready) = on_ready {
            self.scheduler.defer(on_ready);
        }
    }
}

// ============================================================================
// ChannelInner - Send Queue
// ============================================================================

/// Why the queue is asked for its next message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Advance {
    /// Start sending only if no navigation is outstanding.
    IfIdle,
    /// The outstanding navigation has completed.
    Completed,
}

impl ChannelInner {
    /// Queues a message and, if the channel is ready and idle, sends it.
    ///
    /// The in-flight check and taking the head happen under one lock, so
    /// concurrent posts never start two navigations.
    fn enqueue(&self, message: String) -> Result<()> {
        let next = {
            let mut state = self.state.lock();
            if state.handshake.is_destroyed() {
                return Err(Error::ChannelClosed);
            }
            trace!(channel = %self.config.channel, len = message.len(), "Queuing message");
            state.queue.push(message);
            let next = Self::take_next(&mut state, Advance::IfIdle);
            self.status.send_replace(state.status());
            next
        };

        match next {
            Some(message) => self.send(message),
            None => Ok(()),
        }
    }

    /// Sends the head of the queue, or marks the queue idle.
    fn advance(&self, advance: Advance) -> Result<()> {
        let next = {
            let mut state = self.state.lock();
            let next = Self::take_next(&mut state, advance);
            self.status.send_replace(state.status());
            next
        };

        match next {
            Some(message) => self.send(message),
            None => {
                trace!(channel = %self.config.channel, ?advance, "Nothing to send");
                Ok(())
            }
        }
    }

    /// Takes the next message to send, marking it in flight.
    fn take_next(state: &mut ChannelState, advance: Advance) -> Option<String> {
        if !state.handshake.can_send() {
            return None;
        }
        if advance == Advance::IfIdle && state.queue.in_flight() {
            return None;
        }
        state.queue.next()
    }

    /// Navigates the caller frame with `message`; restores it on failure.
    fn send(&self, message: String) -> Result<()> {
        trace!(channel = %self.config.channel, url = %self.relay_url, "Sending message");

        if let Err(e) = self.frames.navigate_caller(&self.relay_url, &message) {
            let mut state = self.state.lock();
            if !state.handshake.is_destroyed() {
                state.queue.restore(message);
                self.status.send_replace(state.status());
            }
            return Err(e);
        }
        Ok(())
    }
}

// ============================================================================
// ChannelInner - Teardown
// ============================================================================

impl ChannelInner {
    fn teardown(&self) -> Result<()> {
        let (dropped, keys) = {
            let mut state = self.state.lock();
            if state.handshake.is_destroyed() {
                trace!(channel = %self.config.channel, "Already destroyed");
                return Ok(());
            }
            state.handshake.close();
            state.on_ready = None;
            let dropped = state.queue.clear();
            let keys = std::mem::take(&mut state.registered);
            self.status.send_replace(state.status());
            (dropped, keys)
        };

        for key in &keys {
            self.registry.unregister(key);
        }

        let removed = self.frames.destroy();
        debug!(channel = %self.config.channel, dropped, "Channel destroyed");
        removed
    }
}
