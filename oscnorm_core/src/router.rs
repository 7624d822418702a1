//! Address matching and dispatch.
//!
//! Every incoming message is compared against the three addresses of every
//! channel. A channel reacts to at most one of them, checked in the order
//! min, max, data; several channels may react to the same message.

use std::net::SocketAddr;

use oscnorm_traits::{EventSink, OscEvent, OscMessage};

use crate::registry::{Channel, ChannelRegistry, LoadReport};

/// What a single channel does with a matched message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAction {
    SetMin,
    SetMax,
    Data,
}

impl RouteAction {
    /// Which branch, if any, `address` selects on `channel`.
    pub fn classify(channel: &Channel, address: &str) -> Option<Self> {
        let cfg = channel.config();
        if address.eq_ignore_ascii_case(&cfg.min_address) {
            Some(RouteAction::SetMin)
        } else if address.eq_ignore_ascii_case(&cfg.max_address) {
            Some(RouteAction::SetMax)
        } else if address.eq_ignore_ascii_case(&cfg.data_address) {
            Some(RouteAction::Data)
        } else {
            None
        }
    }
}

/// Owns the channel state and the registered observers.
pub struct MessageRouter {
    registry: ChannelRegistry,
    sinks: Vec<Box<dyn EventSink + Send>>,
    load_report: LoadReport,
}

impl core::fmt::Debug for MessageRouter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MessageRouter")
            .field("channels", &self.registry.len())
            .field("window", &self.registry.window_capacity())
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl MessageRouter {
    pub fn new(registry: ChannelRegistry) -> Self {
        Self::with_report(registry, LoadReport::default())
    }

    pub(crate) fn with_report(registry: ChannelRegistry, load_report: LoadReport) -> Self {
        Self {
            registry,
            sinks: Vec::new(),
            load_report,
        }
    }

    /// Register an observer; events are delivered in registration order.
    pub fn subscribe(&mut self, sink: impl EventSink + Send + 'static) {
        self.sinks.push(Box::new(sink));
    }

    pub(crate) fn subscribe_boxed(&mut self, sink: Box<dyn EventSink + Send>) {
        self.sinks.push(sink);
    }

    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }

    /// What happened to the configuration entries this router was built from.
    pub fn load_report(&self) -> &LoadReport {
        &self.load_report
    }

    /// Publish `event` to every observer.
    pub fn emit(&mut self, event: OscEvent) {
        tracing::trace!(kind = event.kind(), "emit");
        for sink in &mut self.sinks {
            sink.emit(&event);
        }
    }

    /// Route an address carrying an integer value. Returns how many channels reacted.
    pub fn route(&mut self, address: &str, value: i32) -> usize {
        self.dispatch(address, Some(value))
    }

    /// Route a transport message; the data branch uses its first integer argument.
    pub fn on_message(&mut self, message: &OscMessage, sender: Option<SocketAddr>) -> usize {
        tracing::trace!(address = %message.address, ?sender, "message received");
        self.dispatch(&message.address, message.int_arg(0))
    }

    fn dispatch(&mut self, address: &str, value: Option<i32>) -> usize {
        let matches: Vec<(String, RouteAction)> = self
            .registry
            .iter()
            .filter_map(|ch| {
                RouteAction::classify(ch, address).map(|a| (ch.command().to_string(), a))
            })
            .collect();

        if matches.is_empty() {
            tracing::trace!(address, "no channel matches address");
            return 0;
        }

        let mut handled = 0;
        for (command, action) in matches {
            let event = match action {
                RouteAction::SetMin => self
                    .registry
                    .set_min(&command)
                    .map(|value| OscEvent::MinValueSet { command, value }),
                RouteAction::SetMax => self
                    .registry
                    .set_max(&command)
                    .map(|value| OscEvent::MaxValueSet { command, value }),
                RouteAction::Data => match value {
                    Some(v) => {
                        self.registry.push_sample(&command, v);
                        Some(OscEvent::DataUpdate {
                            value: self.registry.normalized_computed_data(&command),
                            command,
                        })
                    }
                    None => {
                        tracing::warn!(
                            command = %command,
                            address,
                            "data message without an integer argument; dropped"
                        );
                        None
                    }
                },
            };
            if let Some(event) = event {
                self.emit(event);
                handled += 1;
            }
        }
        handled
    }

    /// Raw window mean (`GetComputedData`).
    pub fn get_computed_data(&self, command: &str) -> f32 {
        self.registry.computed_data(command)
    }

    /// Normalized output (`GetNormalizedComputedData`).
    pub fn get_normalized_computed_data(&self, command: &str) -> f32 {
        self.registry.normalized_computed_data(command)
    }

    pub fn get_min_value(&self, command: &str) -> f32 {
        self.registry.min_value(command)
    }

    pub fn get_max_value(&self, command: &str) -> f32 {
        self.registry.max_value(command)
    }
}
