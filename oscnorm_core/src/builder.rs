//! Builders for `MessageRouter` and `OscServer`.
//!
//! The server builder is type-state: `build()` only exists once a message
//! source has been supplied.

use std::sync::Arc;

use oscnorm_traits::clock::{Clock, MonotonicClock};
use oscnorm_traits::{EventSink, MessageSource};

use crate::config::{ListenerCfg, RouterCfg};
use crate::error::{BuildError, Result};
use crate::registry::{ChannelConfig, ChannelRegistry, LoadReport, RowRef, RowSource};
use crate::router::MessageRouter;
use crate::server::OscServer;

// ── Router ──────────────────────────────────────────────────────────────────

type Datasets = (Vec<RowRef>, Box<dyn RowSource>);

/// Builder for `MessageRouter`.
#[derive(Default)]
pub struct RouterBuilder {
    cfg: Option<RouterCfg>,
    channels: Vec<ChannelConfig>,
    datasets: Option<Datasets>,
    sinks: Vec<Box<dyn EventSink + Send>>,
}

impl MessageRouter {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::default()
    }
}

impl RouterBuilder {
    pub fn with_cfg(mut self, cfg: RouterCfg) -> Self {
        self.cfg = Some(cfg);
        self
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.cfg = Some(RouterCfg { window });
        self
    }

    /// Register a channel directly, after any dataset references.
    pub fn with_channel(mut self, channel: ChannelConfig) -> Self {
        self.channels.push(channel);
        self
    }

    pub fn with_channels(mut self, channels: impl IntoIterator<Item = ChannelConfig>) -> Self {
        self.channels.extend(channels);
        self
    }

    /// Resolve `refs` against `rows` at build time; unresolvable entries are
    /// skipped and reported via `MessageRouter::load_report`.
    pub fn with_datasets(mut self, refs: Vec<RowRef>, rows: impl RowSource + 'static) -> Self {
        self.datasets = Some((refs, Box::new(rows)));
        self
    }

    pub fn with_sink(mut self, sink: impl EventSink + Send + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn try_build(self) -> Result<MessageRouter> {
        let cfg = self.cfg.unwrap_or_default();
        if cfg.window == 0 {
            return Err(BuildError::ZeroWindow.into());
        }

        let mut registry = ChannelRegistry::new(cfg.window);
        let mut report = LoadReport::default();
        if let Some((refs, rows)) = &self.datasets {
            report = registry.load(refs, rows.as_ref());
        }
        for ch in self.channels {
            let command = ch.command.clone();
            if registry.insert(ch) {
                report.replaced.push(command);
            }
            report.accepted += 1;
        }

        let mut router = MessageRouter::with_report(registry, report);
        for sink in self.sinks {
            router.subscribe_boxed(sink);
        }
        Ok(router)
    }

    pub fn build(self) -> Result<MessageRouter> {
        self.try_build()
    }
}

// ── Server ──────────────────────────────────────────────────────────────────

/// Marker for a builder that has no message source yet.
pub struct Missing;

pub struct ServerBuilder<S> {
    source: S,
    router: Option<MessageRouter>,
    listener: Option<ListenerCfg>,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
    name: Option<String>,
}

impl Default for ServerBuilder<Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder<Missing> {
    pub fn new() -> Self {
        ServerBuilder {
            source: Missing,
            router: None,
            listener: None,
            clock: None,
            name: None,
        }
    }
}

impl<S> ServerBuilder<S> {
    pub fn with_source<T: MessageSource + Send + 'static>(self, source: T) -> ServerBuilder<T> {
        ServerBuilder {
            source,
            router: self.router,
            listener: self.listener,
            clock: self.clock,
            name: self.name,
        }
    }

    pub fn with_router(mut self, router: MessageRouter) -> Self {
        self.router = Some(router);
        self
    }

    pub fn with_listener(mut self, cfg: ListenerCfg) -> Self {
        self.listener = Some(cfg);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl<T: MessageSource + Send + 'static> ServerBuilder<T> {
    /// Build the server; starts listening right away when `autoplay` is set.
    pub fn build(self) -> Result<OscServer<T>> {
        let listener = self.listener.unwrap_or_default();
        if listener.queue_depth == 0 {
            return Err(BuildError::ZeroQueue.into());
        }
        let router = match self.router {
            Some(r) => r,
            None => MessageRouter::builder().try_build()?,
        };
        let clock: Arc<dyn Clock + Send + Sync> = match self.clock {
            Some(c) => c,
            None => Arc::new(MonotonicClock::new()),
        };
        let name = self.name.unwrap_or_else(|| "Default Server".to_string());

        let autoplay = listener.autoplay;
        let mut server = OscServer::new(router, self.source, listener, clock, name);
        if autoplay {
            server.start_listening()?;
        }
        Ok(server)
    }
}
