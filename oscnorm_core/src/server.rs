//! Listening lifecycle around a `MessageRouter`.
//!
//! `OscServer` owns the router, the message source while idle, and the
//! listener thread while listening. Messages are routed on whichever thread
//! calls `pump`/`run_until`, one at a time.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use oscnorm_traits::clock::Clock;
use oscnorm_traits::{MessageSource, OscEvent};

use crate::config::ListenerCfg;
use crate::error::{OscNormError, Result};
use crate::listener::Listener;
use crate::router::MessageRouter;

pub struct OscServer<T> {
    router: MessageRouter,
    source: Option<T>,
    listener: Option<Listener<T>>,
    cfg: ListenerCfg,
    clock: Arc<dyn Clock + Send + Sync>,
    name: String,
}

impl<T> core::fmt::Debug for OscServer<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OscServer")
            .field("name", &self.name)
            .field("listening", &self.listener.is_some())
            .field("router", &self.router)
            .finish()
    }
}

impl<T: MessageSource + Send + 'static> OscServer<T> {
    pub(crate) fn new(
        router: MessageRouter,
        source: T,
        cfg: ListenerCfg,
        clock: Arc<dyn Clock + Send + Sync>,
        name: String,
    ) -> Self {
        Self {
            router,
            source: Some(source),
            listener: None,
            cfg,
            clock,
            name,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_listening(&self) -> bool {
        self.listener.is_some()
    }

    pub fn router(&self) -> &MessageRouter {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut MessageRouter {
        &mut self.router
    }

    /// Start the listener thread and publish `ServerStarted`. No-op if already listening.
    pub fn start_listening(&mut self) -> Result<()> {
        if self.listener.is_some() {
            tracing::debug!(server = %self.name, "already listening");
            return Ok(());
        }
        let source = self.source.take().ok_or_else(|| {
            OscNormError::State("message source lost after a listener failure".to_string())
        })?;
        self.listener = Some(Listener::spawn(source, &self.cfg, self.clock.clone()));
        self.router.emit(OscEvent::ServerStarted);
        tracing::info!(server = %self.name, "OSC server started listening");
        Ok(())
    }

    /// Stop the listener thread and publish `ServerStopped`. No-op if not listening.
    ///
    /// Messages still queued when the thread stops are routed first.
    pub fn stop_listening(&mut self) {
        let Some(listener) = self.listener.take() else {
            tracing::debug!(server = %self.name, "not listening");
            return;
        };
        let (source, queued) = listener.stop();
        self.source = source;
        for inbound in &queued {
            self.router.on_message(&inbound.message, Some(inbound.sender));
        }
        self.router.emit(OscEvent::ServerStopped);
        tracing::info!(server = %self.name, "OSC server stopped listening");
    }

    /// Route everything that arrives within `timeout`. Returns the number of
    /// messages processed.
    pub fn pump(&mut self, timeout: Duration) -> usize {
        let Some(listener) = &self.listener else {
            self.clock.sleep(timeout);
            return 0;
        };
        let Some(first) = listener.recv_timeout(timeout) else {
            return 0;
        };
        let mut batch = vec![first];
        batch.extend(listener.try_iter());

        for inbound in &batch {
            self.router
                .on_message(&inbound.message, Some(inbound.sender));
        }
        batch.len()
    }

    /// Pump until `shutdown` is set, then stop listening.
    pub fn run_until(&mut self, shutdown: &AtomicBool) -> usize {
        let tick = self.cfg.recv_timeout();
        let mut total = 0;
        while !shutdown.load(Ordering::Relaxed) {
            total += self.pump(tick);
        }
        self.stop_listening();
        total
    }

    /// Milliseconds since the last received message while listening.
    pub fn idle_for(&self) -> Option<u64> {
        self.listener.as_ref().and_then(Listener::idle_for)
    }

    /// Messages received by the current listener.
    pub fn received(&self) -> u64 {
        self.listener.as_ref().map_or(0, Listener::received)
    }
}
