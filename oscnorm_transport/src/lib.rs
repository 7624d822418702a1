#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Transports feeding the normalizer: a UDP socket, the OSC codec it uses,
//! and a simulated source for tests and offline replay.
pub mod codec;
pub mod error;
pub mod udp;

pub use codec::{decode_message, decode_packet, encode_bundle, encode_message};
pub use error::TransportError;
pub use udp::{UdpSource, local_ip_address, send_message};

use oscnorm_traits::{Inbound, MessageSource, OscMessage};
use std::collections::VecDeque;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Simulated source: messages are encoded on `push` and decoded again on
/// `recv`, so they take the same path as datagrams from a socket.
pub struct SimulatedSource {
    packets: VecDeque<Vec<u8>>,
    sender: SocketAddr,
}

impl Default for SimulatedSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedSource {
    pub fn new() -> Self {
        SimulatedSource {
            packets: VecDeque::new(),
            sender: SocketAddr::from((Ipv4Addr::LOCALHOST, 0)),
        }
    }

    pub fn push(&mut self, msg: &OscMessage) -> error::Result<()> {
        self.packets.push_back(encode_message(msg)?);
        Ok(())
    }

    /// Queue a raw datagram, e.g. a bundle or a deliberately broken packet.
    pub fn push_raw(&mut self, packet: Vec<u8>) {
        self.packets.push_back(packet);
    }

    pub fn pending(&self) -> usize {
        self.packets.len()
    }
}

impl MessageSource for SimulatedSource {
    fn recv(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<Inbound>, Box<dyn std::error::Error + Send + Sync>> {
        let Some(packet) = self.packets.pop_front() else {
            std::thread::sleep(timeout.min(Duration::from_millis(5)));
            return Ok(None);
        };
        let mut messages = decode_packet(&packet)?.into_iter();
        let first = messages.next();
        // Remaining bundle members go back to the front as single messages.
        let rest: Vec<OscMessage> = messages.collect();
        for extra in rest.iter().rev() {
            self.packets.push_front(encode_message(extra)?);
        }
        Ok(first.map(|message| Inbound {
            message,
            sender: self.sender,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_source_replays_in_order() {
        let mut src = SimulatedSource::new();
        src.push(&OscMessage::with_int("/a", 1)).unwrap();
        src.push(&OscMessage::with_int("/b", 2)).unwrap();
        let t = Duration::from_millis(1);
        assert_eq!(src.recv(t).unwrap().unwrap().message.address, "/a");
        assert_eq!(src.recv(t).unwrap().unwrap().message.address, "/b");
        assert!(src.recv(t).unwrap().is_none());
    }

    #[test]
    fn simulated_source_splits_bundles() {
        let mut src = SimulatedSource::new();
        let a = encode_message(&OscMessage::with_int("/a", 1)).unwrap();
        let b = encode_message(&OscMessage::with_int("/b", 2)).unwrap();
        src.push_raw(encode_bundle(&[a, b]).unwrap());
        let t = Duration::from_millis(1);
        assert_eq!(src.recv(t).unwrap().unwrap().message.address, "/a");
        assert_eq!(src.pending(), 1);
        assert_eq!(src.recv(t).unwrap().unwrap().message.address, "/b");
    }

    #[test]
    fn simulated_source_reports_broken_packets() {
        let mut src = SimulatedSource::new();
        src.push_raw(b"not osc".to_vec());
        assert!(src.recv(Duration::from_millis(1)).is_err());
        assert_eq!(src.pending(), 0);
    }
}
