//! Seams shared by the normalizer core, the transports and the CLI.
//!
//! Nothing in here knows about sockets or configuration files: a transport
//! produces [`OscMessage`]s through [`MessageSource`], the core reports what it
//! did through [`EventSink`].
pub mod clock;

pub use clock::{Clock, MonotonicClock};

use std::net::SocketAddr;
use std::time::Duration;

/// A single decoded OSC argument.
#[derive(Debug, Clone, PartialEq)]
pub enum OscArg {
    Int(i32),
    Float(f32),
    Str(String),
}

/// An OSC message as delivered by a transport: address plus typed arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct OscMessage {
    pub address: String,
    pub args: Vec<OscArg>,
}

impl OscMessage {
    pub fn new(address: impl Into<String>, args: Vec<OscArg>) -> Self {
        Self {
            address: address.into(),
            args,
        }
    }

    /// Convenience constructor for the common single-integer message.
    pub fn with_int(address: impl Into<String>, value: i32) -> Self {
        Self::new(address, vec![OscArg::Int(value)])
    }

    /// Integer view of argument `idx`.
    ///
    /// Floats are rounded to the nearest integer when finite and in range.
    /// Strings and missing arguments yield `None`.
    pub fn int_arg(&self, idx: usize) -> Option<i32> {
        match self.args.get(idx)? {
            OscArg::Int(v) => Some(*v),
            OscArg::Float(f) => {
                let r = f.round();
                if r.is_finite() && r >= i32::MIN as f32 && r <= i32::MAX as f32 {
                    Some(r as i32)
                } else {
                    None
                }
            }
            OscArg::Str(_) => None,
        }
    }
}

/// A message together with the peer that sent it.
#[derive(Debug, Clone, PartialEq)]
pub struct Inbound {
    pub message: OscMessage,
    pub sender: SocketAddr,
}

/// Events published to observers.
#[derive(Debug, Clone, PartialEq)]
pub enum OscEvent {
    ServerStarted,
    ServerStopped,
    /// A data sample was accepted; `value` is the channel's normalized output.
    DataUpdate { command: String, value: f32 },
    MinValueSet { command: String, value: f32 },
    MaxValueSet { command: String, value: f32 },
}

impl OscEvent {
    /// Stable name used in logs and JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            OscEvent::ServerStarted => "ServerStarted",
            OscEvent::ServerStopped => "ServerStopped",
            OscEvent::DataUpdate { .. } => "DataUpdate",
            OscEvent::MinValueSet { .. } => "MinValueSet",
            OscEvent::MaxValueSet { .. } => "MaxValueSet",
        }
    }

    /// Channel command the event refers to, if any.
    pub fn command(&self) -> Option<&str> {
        match self {
            OscEvent::DataUpdate { command, .. }
            | OscEvent::MinValueSet { command, .. }
            | OscEvent::MaxValueSet { command, .. } => Some(command),
            OscEvent::ServerStarted | OscEvent::ServerStopped => None,
        }
    }

    pub fn value(&self) -> Option<f32> {
        match self {
            OscEvent::DataUpdate { value, .. }
            | OscEvent::MinValueSet { value, .. }
            | OscEvent::MaxValueSet { value, .. } => Some(*value),
            OscEvent::ServerStarted | OscEvent::ServerStopped => None,
        }
    }
}

/// Receiver of boundary events.
pub trait EventSink {
    fn emit(&mut self, event: &OscEvent);
}

impl<F> EventSink for F
where
    F: FnMut(&OscEvent),
{
    fn emit(&mut self, event: &OscEvent) {
        self(event)
    }
}

/// Producer of parsed OSC messages (UDP socket, scripted replay, ...).
pub trait MessageSource {
    /// Wait up to `timeout` for the next message.
    ///
    /// `Ok(None)` means nothing arrived in time; errors are per-packet and the
    /// caller is expected to keep polling.
    fn recv(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<Inbound>, Box<dyn std::error::Error + Send + Sync>>;
}

impl<T: MessageSource + ?Sized> MessageSource for Box<T> {
    fn recv(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<Inbound>, Box<dyn std::error::Error + Send + Sync>> {
        (**self).recv(timeout)
    }
}
