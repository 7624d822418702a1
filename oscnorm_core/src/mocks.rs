//! Test and helper mocks for oscnorm_core

use std::collections::VecDeque;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use oscnorm_traits::{EventSink, Inbound, MessageSource, OscEvent, OscMessage};

/// Observer that records every event; clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<OscEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<OscEvent> {
        self.events.lock().map(|g| g.clone()).unwrap_or_default()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.events().iter().map(OscEvent::kind).collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &OscEvent) {
        if let Ok(mut g) = self.events.lock() {
            g.push(event.clone());
        }
    }
}

/// Source that replays a fixed list of messages and then stays silent.
///
/// When empty, `recv` sleeps for the (capped) timeout so a listener thread
/// does not spin.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    queue: VecDeque<OscMessage>,
    sender: SocketAddr,
}

impl ScriptedSource {
    pub fn new(messages: impl IntoIterator<Item = OscMessage>) -> Self {
        Self {
            queue: messages.into_iter().collect(),
            sender: SocketAddr::from((Ipv4Addr::LOCALHOST, 9000)),
        }
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl MessageSource for ScriptedSource {
    fn recv(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<Inbound>, Box<dyn std::error::Error + Send + Sync>> {
        match self.queue.pop_front() {
            Some(message) => Ok(Some(Inbound {
                message,
                sender: self.sender,
            })),
            None => {
                std::thread::sleep(timeout.min(Duration::from_millis(5)));
                Ok(None)
            }
        }
    }
}

/// A source whose every poll fails; exercises the listener's error path.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingSource;

impl MessageSource for FailingSource {
    fn recv(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<Inbound>, Box<dyn std::error::Error + Send + Sync>> {
        std::thread::sleep(timeout.min(Duration::from_millis(5)));
        Err(Box::new(std::io::Error::other("malformed packet")))
    }
}
