//! Background receive loop.
//!
//! Spawns a thread that owns the `MessageSource`, forwards every decoded
//! message through a bounded channel, and records when the last one arrived.
//! All channel state stays on the consumer side: the thread only moves
//! messages, so routing remains single-threaded.
//!
//! Dropping a `Listener` (or calling `stop`) signals the thread and joins it;
//! `stop` also hands the source back so listening can be resumed later.
use crossbeam_channel as xch;
use oscnorm_traits::clock::Clock;
use oscnorm_traits::{Inbound, MessageSource};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::config::ListenerCfg;

const NEVER: u64 = u64::MAX;

pub struct Listener<T> {
    rx: xch::Receiver<Inbound>,
    last_rx_ms: Arc<AtomicU64>,
    received: Arc<AtomicU64>,
    epoch: Instant,
    clock: Arc<dyn Clock + Send + Sync>,
    shutdown: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<T>>,
}

impl<T: MessageSource + Send + 'static> Listener<T> {
    pub fn spawn(mut source: T, cfg: &ListenerCfg, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        let (tx, rx) = xch::bounded(cfg.queue_depth.max(1));
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_bg = shutdown.clone();
        let last_rx_ms = Arc::new(AtomicU64::new(NEVER));
        let last_rx_bg = last_rx_ms.clone();
        let received = Arc::new(AtomicU64::new(0));
        let received_bg = received.clone();
        let timeout = cfg.recv_timeout();
        let epoch = clock.now();
        let clock_bg = clock.clone();

        let join_handle = std::thread::spawn(move || {
            'poll: loop {
                if shutdown_bg.load(Ordering::Relaxed) {
                    tracing::debug!("listener thread received shutdown signal");
                    break;
                }

                let inbound = match source.recv(timeout) {
                    Ok(Some(m)) => m,
                    Ok(None) => continue,
                    Err(e) => {
                        // Malformed packet or transient socket error; keep polling.
                        tracing::warn!(error = %e, "dropping undecodable packet");
                        continue;
                    }
                };
                last_rx_bg.store(clock_bg.ms_since(epoch), Ordering::Relaxed);
                received_bg.fetch_add(1, Ordering::Relaxed);

                let mut pending = inbound;
                loop {
                    match tx.send_timeout(pending, timeout) {
                        Ok(()) => break,
                        Err(xch::SendTimeoutError::Timeout(back)) => {
                            if shutdown_bg.load(Ordering::Relaxed) {
                                break 'poll;
                            }
                            tracing::debug!("inbound queue full; consumer is behind");
                            pending = back;
                        }
                        Err(xch::SendTimeoutError::Disconnected(_)) => {
                            tracing::debug!("listener consumer disconnected, exiting thread");
                            break 'poll;
                        }
                    }
                }
            }
            tracing::trace!("listener thread exiting cleanly");
            source
        });

        Self {
            rx,
            last_rx_ms,
            received,
            epoch,
            clock,
            shutdown,
            join_handle: Some(join_handle),
        }
    }
}

impl<T> Listener<T> {
    /// Wait up to `timeout` for the next message.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Inbound> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Messages already queued, without blocking.
    pub fn try_iter(&self) -> impl Iterator<Item = Inbound> + '_ {
        self.rx.try_iter()
    }

    /// Number of messages the transport has delivered so far.
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    /// Milliseconds since the last message, or `None` if nothing arrived yet.
    pub fn idle_for(&self) -> Option<u64> {
        let last = self.last_rx_ms.load(Ordering::Relaxed);
        if last == NEVER {
            return None;
        }
        Some(self.clock.ms_since(self.epoch).saturating_sub(last))
    }

    /// Signal the thread, join it and return the source together with any
    /// messages still queued.
    ///
    /// The source is `None` if the thread panicked.
    pub fn stop(mut self) -> (Option<T>, Vec<Inbound>) {
        let source = self.shutdown_and_join();
        let queued = self.rx.try_iter().collect();
        (source, queued)
    }

    fn shutdown_and_join(&mut self) -> Option<T> {
        self.shutdown.store(true, Ordering::Relaxed);
        // The thread notices within one receive timeout.
        let handle = self.join_handle.take()?;
        match handle.join() {
            Ok(source) => {
                tracing::trace!("listener thread joined successfully");
                Some(source)
            }
            Err(e) => {
                tracing::warn!(?e, "listener thread panicked during shutdown");
                None
            }
        }
    }
}

impl<T> Drop for Listener<T> {
    fn drop(&mut self) {
        let _ = self.shutdown_and_join();
    }
}
