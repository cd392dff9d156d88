//! Simulated document pair for integration tests.
//!
//! Each [`Document`] has its own frame host, registry and scheduler. The
//! frame host records navigations instead of performing them; [`Pair`]
//! plays the relay pages by decoding each pending navigation's fragment,
//! invoking the peer's registry with the carried name, and then signalling
//! load completion back to the sender.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use name_relay::protocol::load_key;
use name_relay::{
    Channel, ChannelBuilder, Error, FrameHost, FrameId, FrameSpec, LoadHandler, ManualScheduler,
    MemoryRegistry, Registry, RelayFragment, Result, StdUrlCodec,
};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

// ============================================================================
// Constants
// ============================================================================

pub const HOST_URL: &str = "https://a.example/app.html";
pub const HOST_RELAY: &str = "https://a.example/relay.html";
pub const GUEST_APP: &str = "https://b.example/app.html";
pub const GUEST_RELAY: &str = "https://b.example/relay.html";

// ============================================================================
// Tracing
// ============================================================================

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ============================================================================
// SimFrameHost
// ============================================================================

/// A navigation the relay asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub frame: FrameId,
    pub url: String,
    pub name: String,
}

struct SimFrame {
    spec: FrameSpec,
    on_load: Option<LoadHandler>,
    alive: bool,
}

#[derive(Default)]
struct SimState {
    next_id: u64,
    frames: FxHashMap<FrameId, SimFrame>,
    order: Vec<FrameId>,
    pending: VecDeque<Navigation>,
    log: Vec<Navigation>,
}

/// Recording frame host with deferred load completion.
#[derive(Default)]
pub struct SimFrameHost {
    state: Mutex<SimState>,
    overlap: AtomicBool,
    fail_navigation: AtomicBool,
}

impl SimFrameHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Frames in creation order.
    pub fn created(&self) -> Vec<(FrameId, FrameSpec)> {
        let state = self.state.lock();
        state
            .order
            .iter()
            .map(|id| (*id, state.frames[id].spec.clone()))
            .collect()
    }

    pub fn frame_named(&self, name: &str) -> Option<(FrameId, FrameSpec)> {
        self.created()
            .into_iter()
            .find(|(_, spec)| spec.name.as_deref() == Some(name))
    }

    /// The caller frame is the one bootstrapped with a `_4` fragment.
    pub fn caller_frame(&self) -> Option<FrameId> {
        self.created()
            .into_iter()
            .find(|(_, spec)| spec.url.contains("#_4"))
            .map(|(id, _)| id)
    }

    pub fn is_alive(&self, frame: FrameId) -> bool {
        self.state
            .lock()
            .frames
            .get(&frame)
            .is_some_and(|f| f.alive)
    }

    pub fn alive_count(&self) -> usize {
        self.state.lock().frames.values().filter(|f| f.alive).count()
    }

    /// Fires the frame's first-load handler, if it has one left.
    pub fn load(&self, frame: FrameId) -> bool {
        let handler = self
            .state
            .lock()
            .frames
            .get_mut(&frame)
            .and_then(|f| f.on_load.take());
        match handler {
            Some(handler) => {
                handler(frame);
                true
            }
            None => false,
        }
    }

    pub fn take_pending(&self) -> Option<Navigation> {
        self.state.lock().pending.pop_front()
    }

    pub fn pending_len(&self) -> usize {
        self.state.lock().pending.len()
    }

    pub fn log(&self) -> Vec<Navigation> {
        self.state.lock().log.clone()
    }

    /// `true` if a navigation ever started while another was outstanding
    /// on the same frame.
    pub fn saw_overlap(&self) -> bool {
        self.overlap.load(Ordering::SeqCst)
    }

    pub fn set_fail_navigation(&self, fail: bool) {
        self.fail_navigation.store(fail, Ordering::SeqCst);
    }
}

impl FrameHost for SimFrameHost {
    fn create_frame(&self, spec: FrameSpec, on_load: Option<LoadHandler>) -> Result<FrameId> {
        if spec.url.starts_with("javascript:") {
            return Err(Error::frame_creation(spec.url, "scheme not allowed"));
        }
        let mut state = self.state.lock();
        state.next_id += 1;
        let id = FrameId::new(state.next_id);
        state.frames.insert(
            id,
            SimFrame {
                spec,
                on_load,
                alive: true,
            },
        );
        state.order.push(id);
        Ok(id)
    }

    fn navigate(&self, frame: FrameId, url: &str, name: &str) -> Result<()> {
        if self.fail_navigation.load(Ordering::SeqCst) {
            return Err(Error::navigation(frame, "refused by test"));
        }
        let mut state = self.state.lock();
        if !state.frames.get(&frame).is_some_and(|f| f.alive) {
            return Err(Error::frame_not_found(frame));
        }
        if state.pending.iter().any(|n| n.frame == frame) {
            self.overlap.store(true, Ordering::SeqCst);
        }
        let navigation = Navigation {
            frame,
            url: url.to_string(),
            name: name.to_string(),
        };
        state.pending.push_back(navigation.clone());
        state.log.push(navigation);
        Ok(())
    }

    fn destroy_frame(&self, frame: FrameId) -> Result<()> {
        let mut state = self.state.lock();
        match state.frames.get_mut(&frame) {
            Some(f) if f.alive => {
                f.alive = false;
                Ok(())
            }
            _ => Err(Error::frame_not_found(frame)),
        }
    }
}

// ============================================================================
// Document
// ============================================================================

/// One browser document with its capabilities and an application inbox.
pub struct Document {
    pub url: String,
    pub frames: Arc<SimFrameHost>,
    pub registry: Arc<MemoryRegistry>,
    pub scheduler: Arc<ManualScheduler>,
    pub inbox: Arc<Mutex<Vec<(String, String)>>>,
    pub ready_hits: Arc<AtomicUsize>,
}

impl Document {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            frames: SimFrameHost::new(),
            registry: Arc::new(MemoryRegistry::new()),
            scheduler: Arc::new(ManualScheduler::new()),
            inbox: Arc::new(Mutex::new(Vec::new())),
            ready_hits: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Builder wired to this document's capabilities and recorders.
    pub fn builder(&self) -> ChannelBuilder {
        let inbox = Arc::clone(&self.inbox);
        let ready_hits = Arc::clone(&self.ready_hits);
        Channel::builder()
            .document_url(self.url.clone())
            .local("/relay.html")
            .on_message(move |message, origin| {
                inbox.lock().push((message.to_string(), origin.to_string()));
            })
            .on_ready(move || {
                ready_hits.fetch_add(1, Ordering::SeqCst);
            })
            .frame_host(Arc::clone(&self.frames) as Arc<dyn FrameHost>)
            .registry(Arc::clone(&self.registry) as Arc<dyn Registry>)
            .scheduler(Arc::clone(&self.scheduler) as Arc<dyn name_relay::Scheduler>)
    }

    pub fn messages(&self) -> Vec<String> {
        self.inbox.lock().iter().map(|(m, _)| m.clone()).collect()
    }

    pub fn ready_count(&self) -> usize {
        self.ready_hits.load(Ordering::SeqCst)
    }

    pub fn load_caller(&self) -> bool {
        let caller = self.frames.caller_frame().expect("caller frame exists");
        self.frames.load(caller)
    }
}

// ============================================================================
// Pair
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Host,
    Guest,
}

/// Host and guest documents connected through simulated relay pages.
pub struct Pair {
    pub host_doc: Document,
    pub guest_doc: Document,
    pub host: Channel,
    pub guest: Channel,
}

impl Pair {
    /// Opens both ends; no frame has loaded yet.
    pub fn open(channel: &str) -> Self {
        let host_doc = Document::new(HOST_URL);
        let host = host_doc
            .builder()
            .channel(channel)
            .remote(GUEST_APP)
            .remote_helper(GUEST_RELAY)
            .build()
            .expect("host opens");

        let (_, remote) = host_doc
            .frames
            .frame_named(channel)
            .expect("host created the remote frame");

        let guest_doc = Document::new(remote.url);
        let guest = guest_doc.builder().build().expect("guest opens");

        Self {
            host_doc,
            guest_doc,
            host,
            guest,
        }
    }

    /// Opens both ends and completes the handshake.
    pub fn ready(channel: &str) -> Self {
        let pair = Self::open(channel);
        pair.guest_doc.load_caller();
        pair.host_doc.load_caller();
        pair.settle();
        assert_eq!(pair.host_doc.ready_count(), 1);
        assert_eq!(pair.guest_doc.ready_count(), 1);
        pair
    }

    pub fn doc(&self, side: Side) -> &Document {
        match side {
            Side::Host => &self.host_doc,
            Side::Guest => &self.guest_doc,
        }
    }

    /// Completes the oldest pending navigation of `from`.
    pub fn relay_one(&self, from: Side) -> Option<Navigation> {
        let (sender, peer) = match from {
            Side::Host => (&self.host_doc, &self.guest_doc),
            Side::Guest => (&self.guest_doc, &self.host_doc),
        };
        let navigation = sender.frames.take_pending()?;
        relay_page(&navigation, &peer.registry, &sender.registry);
        Some(navigation)
    }

    /// Completes navigations until both sides are idle, then runs deferred
    /// callbacks.
    pub fn settle(&self) {
        loop {
            let host = self.relay_one(Side::Host).is_some();
            let guest = self.relay_one(Side::Guest).is_some();
            if !host && !guest {
                break;
            }
        }
        self.run_deferred();
    }

    pub fn run_deferred(&self) {
        self.host_doc.scheduler.run_pending();
        self.guest_doc.scheduler.run_pending();
    }
}

/// What a relay page does with an arriving navigation.
pub fn relay_page(navigation: &Navigation, peer: &MemoryRegistry, sender: &MemoryRegistry) {
    let fragment = RelayFragment::from_url(&navigation.url, &StdUrlCodec).expect("relay fragment");
    // A destroyed end has released its keys; the call simply goes nowhere.
    match &fragment {
        RelayFragment::ToHost { channel } | RelayFragment::ToGuest { channel, .. } => {
            let _ = peer.invoke(channel, &navigation.name);
        }
        RelayFragment::Bootstrap { .. } => {}
    }
    // The caller frame bounces back to its own origin and reports in.
    let _ = sender.invoke(&load_key(fragment.channel()), "");
}
