//! Builder pattern for channel configuration.
//!
//! Provides a fluent API for configuring and opening [`Channel`] instances.
//! Which fields are required depends on the role negotiated from the
//! document URL:
//!
//! | Field | Host | Guest |
//! |-------|------|-------|
//! | `document_url` | required | required |
//! | `local` | required | required |
//! | `channel` | optional (generated) | ignored, from `xdm_c` |
//! | `remote` | required | ignored, from `xdm_e` |
//! | `remote_helper` | required | ignored, equals `remote` |
//! | `container` | optional | ignored |
//! | `on_message` | required | required |
//! | `frame_host`, `registry` | required | required |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::capability::{FrameHost, Registry, Scheduler, StdUrlCodec, TokioScheduler, UrlCodec};
use crate::error::{Error, Result};
use crate::identifiers::ChannelName;

use super::config::{ChannelConfig, ChannelSettings, MessageHandler, ReadyCallback};
use super::core::{Channel, ChannelParts};
use super::role::{Negotiation, negotiate};

// ============================================================================
// ChannelBuilder
// ============================================================================

/// Builder for a [`Channel`].
///
/// Use [`Channel::builder()`] to create a new builder.
#[derive(Default)]
pub struct ChannelBuilder {
    /// URL of the document the channel lives in.
    document_url: Option<String>,
    /// Data fields.
    settings: ChannelSettings,
    /// Inbound message callback.
    on_message: Option<MessageHandler>,
    /// Readiness callback.
    on_ready: Option<ReadyCallback>,
    /// Frame capability.
    frame_host: Option<Arc<dyn FrameHost>>,
    /// Registry capability.
    registry: Option<Arc<dyn Registry>>,
    /// URL capability.
    codec: Option<Arc<dyn UrlCodec>>,
    /// Deferred execution capability.
    scheduler: Option<Arc<dyn Scheduler>>,
}

impl fmt::Debug for ChannelBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelBuilder")
            .field("document_url", &self.document_url)
            .field("settings", &self.settings)
            .field("on_message", &self.on_message.is_some())
            .field("on_ready", &self.on_ready.is_some())
            .field("frame_host", &self.frame_host.is_some())
            .field("registry", &self.registry.is_some())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// ChannelBuilder Implementation
// ============================================================================

impl ChannelBuilder {
    /// Creates a new builder with no configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the URL of the current document.
    ///
    /// Its query decides the role and, for a guest, the configuration.
    #[inline]
    #[must_use]
    pub fn document_url(mut self, url: impl Into<String>) -> Self {
        self.document_url = Some(url.into());
        self
    }

    /// Replaces all data fields with `settings`.
    #[inline]
    #[must_use]
    pub fn settings(mut self, settings: ChannelSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Sets the channel name (host).
    #[inline]
    #[must_use]
    pub fn channel(mut self, channel: impl Into<String>) -> Self {
        self.settings.channel = Some(channel.into());
        self
    }

    /// Sets the local relay page URL.
    #[inline]
    #[must_use]
    pub fn local(mut self, url: impl Into<String>) -> Self {
        self.settings.local = Some(url.into());
        self
    }

    /// Sets the peer document URL (host).
    #[inline]
    #[must_use]
    pub fn remote(mut self, url: impl Into<String>) -> Self {
        self.settings.remote = Some(url.into());
        self
    }

    /// Sets the peer relay page URL (host).
    #[inline]
    #[must_use]
    pub fn remote_helper(mut self, url: impl Into<String>) -> Self {
        self.settings.remote_helper = Some(url.into());
        self
    }

    /// Sets the container element for the remote frame (host).
    #[inline]
    #[must_use]
    pub fn container(mut self, container: impl Into<String>) -> Self {
        self.settings.container = Some(container.into());
        self
    }

    /// Sets the inbound message callback.
    ///
    /// Called with `(message, origin_of_sender)`.
    #[inline]
    #[must_use]
    pub fn on_message<F>(mut self, handler: F) -> Self
    where
        F: Fn(&str, &str) + Send + Sync + 'static,
    {
        self.on_message = Some(Arc::new(handler));
        self
    }

    /// Sets the callback fired once when the channel becomes ready.
    #[inline]
    #[must_use]
    pub fn on_ready<F>(mut self, callback: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_ready = Some(Box::new(callback));
        self
    }

    /// Sets the frame host.
    #[inline]
    #[must_use]
    pub fn frame_host(mut self, host: Arc<dyn FrameHost>) -> Self {
        self.frame_host = Some(host);
        self
    }

    /// Sets the named callback registry.
    #[inline]
    #[must_use]
    pub fn registry(mut self, registry: Arc<dyn Registry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Sets the URL codec. Defaults to [`StdUrlCodec`].
    #[inline]
    #[must_use]
    pub fn codec(mut self, codec: Arc<dyn UrlCodec>) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Sets the scheduler. Defaults to [`TokioScheduler::current`].
    #[inline]
    #[must_use]
    pub fn scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Negotiates the role, validates the configuration and opens the channel.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if a required field or capability is missing
    /// - [`Error::MissingParameter`] if a guest URL lacks `xdm_c` or `xdm_e`
    /// - [`Error::InvalidChannel`] / [`Error::InvalidUrl`] for malformed values
    /// - [`Error::ChannelCollision`] if the channel name is already registered
    /// - frame host errors from creating the frames
    pub fn build(self) -> Result<Channel> {
        let document_url = self.validate_document_url()?;
        let on_message = self.validate_on_message()?;
        let (frame_host, registry) = self.validate_capabilities()?;
        let codec = self
            .codec
            .clone()
            .unwrap_or_else(|| Arc::new(StdUrlCodec::new()));
        let scheduler = match self.scheduler.clone() {
            Some(scheduler) => scheduler,
            None => Arc::new(TokioScheduler::current()?),
        };

        let negotiation = negotiate(&document_url, codec.as_ref())?;
        let role = negotiation.role();
        let config = self.resolve_config(negotiation, &document_url, codec.as_ref())?;

        debug!(
            channel = %config.channel,
            ?role,
            local = %config.local,
            remote = %config.remote,
            "Channel configuration resolved"
        );

        Channel::open(ChannelParts {
            config,
            role,
            frame_host,
            registry,
            codec,
            scheduler,
            on_message,
            on_ready: self.on_ready,
        })
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ChannelBuilder {
    fn validate_document_url(&self) -> Result<String> {
        self.document_url.clone().ok_or_else(|| {
            Error::config(
                "Document URL is required. Use .document_url() to set it.\n\
                 Example: Channel::builder().document_url(\"https://a.example/app.html\")",
            )
        })
    }

    fn validate_on_message(&self) -> Result<MessageHandler> {
        self.on_message
            .clone()
            .ok_or_else(|| Error::config("Message handler is required. Use .on_message() to set it."))
    }

    fn validate_capabilities(&self) -> Result<(Arc<dyn FrameHost>, Arc<dyn Registry>)> {
        let frame_host = self
            .frame_host
            .clone()
            .ok_or_else(|| Error::config("Frame host is required. Use .frame_host() to set it."))?;
        let registry = self
            .registry
            .clone()
            .ok_or_else(|| Error::config("Registry is required. Use .registry() to set it."))?;
        Ok((frame_host, registry))
    }

    /// Applies the negotiated role to the settings.
    fn resolve_config(
        &self,
        negotiation: Negotiation,
        document_url: &str,
        codec: &dyn UrlCodec,
    ) -> Result<ChannelConfig> {
        let settings = &self.settings;
        let local = settings
            .local
            .as_deref()
            .ok_or_else(|| Error::config("Local relay page is required. Use .local() to set it."))?;
        let local = codec.resolve(document_url, local)?;

        let (channel, remote, remote_helper, container) = match negotiation {
            Negotiation::Host => {
                let channel = match settings.channel.clone() {
                    Some(channel) => ChannelName::new(channel)?,
                    None => ChannelName::generate(),
                };
                let remote = settings.remote.clone().ok_or_else(|| {
                    Error::config("Remote document is required on the host. Use .remote() to set it.")
                })?;
                let remote_helper = settings.remote_helper.clone().ok_or_else(|| {
                    Error::config(
                        "Remote relay page is required on the host. Use .remote_helper() to set it.",
                    )
                })?;
                (channel, remote, remote_helper, settings.container.clone())
            }
            Negotiation::Guest { channel, remote } => {
                if let Some(configured) = &settings.channel
                    && configured != &channel
                {
                    debug!(configured = %configured, channel = %channel, "Channel overridden by URL");
                }
                let channel = ChannelName::from_remote(channel)?;
                (channel, remote.clone(), remote, None)
            }
        };

        let remote_origin = codec.origin(&remote)?;

        Ok(ChannelConfig {
            channel,
            local,
            remote,
            remote_helper,
            remote_origin,
            container,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
