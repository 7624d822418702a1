use std::collections::VecDeque;
use std::io::ErrorKind;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Duration;

use oscnorm_traits::{Inbound, MessageSource, OscMessage};

use crate::codec::{decode_packet, encode_message};
use crate::error::Result;

/// Largest datagram accepted; anything longer is truncated by the OS and
/// then fails to decode.
const MAX_DATAGRAM: usize = 65_507;

/// `MessageSource` over a bound UDP socket.
///
/// Messages from one bundle are handed out one per `recv` call.
pub struct UdpSource {
    socket: UdpSocket,
    buf: Vec<u8>,
    pending: VecDeque<Inbound>,
    timeout: Option<Duration>,
}

impl UdpSource {
    pub fn bind(addr: impl ToSocketAddrs) -> Result<Self> {
        let socket = UdpSocket::bind(addr)?;
        tracing::info!(addr = ?socket.local_addr().ok(), "UDP socket bound");
        Ok(Self {
            socket,
            buf: vec![0; MAX_DATAGRAM],
            pending: VecDeque::new(),
            timeout: None,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<()> {
        // A zero read timeout is rejected by the OS API.
        let t = timeout.max(Duration::from_millis(1));
        if self.timeout != Some(t) {
            self.socket.set_read_timeout(Some(t))?;
            self.timeout = Some(t);
        }
        Ok(())
    }
}

impl MessageSource for UdpSource {
    fn recv(
        &mut self,
        timeout: Duration,
    ) -> std::result::Result<Option<Inbound>, Box<dyn std::error::Error + Send + Sync>> {
        if let Some(next) = self.pending.pop_front() {
            return Ok(Some(next));
        }
        self.set_timeout(timeout)?;
        let (n, sender) = match self.socket.recv_from(&mut self.buf) {
            Ok(r) => r,
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                return Ok(None);
            }
            Err(e) => return Err(Box::new(e)),
        };
        let messages = decode_packet(&self.buf[..n])
            .inspect_err(|_| tracing::debug!(%sender, bytes = n, "undecodable datagram"))?;
        tracing::trace!(%sender, count = messages.len(), "datagram decoded");
        self.pending
            .extend(messages.into_iter().map(|message| Inbound { message, sender }));
        Ok(self.pending.pop_front())
    }
}

/// Encode `msg` and send it to `target` from an ephemeral socket.
pub fn send_message(target: impl ToSocketAddrs, msg: &OscMessage) -> Result<usize> {
    let bytes = encode_message(msg)?;
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
    let sent = socket.send_to(&bytes, target)?;
    tracing::debug!(address = %msg.address, bytes = sent, "sent OSC message");
    Ok(sent)
}

/// The host's outbound IPv4 address, if it can be determined.
///
/// Connecting a UDP socket sends nothing; it only makes the OS pick the
/// interface it would route through.
pub fn local_ip_address() -> Option<IpAddr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).ok()?;
    socket.connect((Ipv4Addr::new(8, 8, 8, 8), 80)).ok()?;
    let ip = socket.local_addr().ok()?.ip();
    if ip.is_unspecified() {
        tracing::warn!("could not determine local IP address");
        None
    } else {
        Some(ip)
    }
}
