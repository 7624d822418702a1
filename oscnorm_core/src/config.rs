//! Runtime configuration for the router and the listener thread.
//!
//! These are separate from the TOML-deserialized config in `oscnorm_config`;
//! see `conversions` for the mapping.

use std::time::Duration;

use crate::window::DEFAULT_WINDOW;

/// Router configuration.
#[derive(Debug, Clone)]
pub struct RouterCfg {
    /// Capacity of every channel's sample window.
    pub window: usize,
}

impl Default for RouterCfg {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
        }
    }
}

/// Listener thread configuration.
#[derive(Debug, Clone)]
pub struct ListenerCfg {
    /// Per-poll transport timeout; bounds how quickly a stop request is honored.
    pub recv_timeout_ms: u64,
    /// Capacity of the inbound queue. When full, the listener blocks.
    pub queue_depth: usize,
    /// Start listening as soon as the server is built.
    pub autoplay: bool,
}

impl Default for ListenerCfg {
    fn default() -> Self {
        Self {
            recv_timeout_ms: 100,
            queue_depth: 256,
            autoplay: true,
        }
    }
}

impl ListenerCfg {
    pub fn recv_timeout(&self) -> Duration {
        Duration::from_millis(self.recv_timeout_ms.max(1))
    }
}
