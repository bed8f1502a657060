mod error;
mod udp;

use std::net::SocketAddr;

pub use error::TransportError;
pub use udp::UdpSocket;

/// Sends datagrams. Sending never blocks.
pub trait PacketSender {
    fn send(&self, address: &SocketAddr, payload: &[u8]) -> Result<(), TransportError>;
}

/// Receives datagrams without blocking
pub trait PacketReceiver {
    /// Returns the next queued datagram, or `None` when nothing is waiting
    fn receive(&mut self) -> Result<Option<(SocketAddr, &[u8])>, TransportError>;
}

/// A datagram socket that can be split into its sending & receiving halves
pub trait Socket {
    fn split(self: Box<Self>) -> Result<(Box<dyn PacketSender>, Box<dyn PacketReceiver>), TransportError>;
}
