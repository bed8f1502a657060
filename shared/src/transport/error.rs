use std::net::SocketAddr;

use thiserror::Error;

/// Errors raised by datagram transports
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Could not bind or configure the local socket
    #[error("Failed to set up socket: {reason}")]
    Setup { reason: String },

    /// A datagram could not be handed to the network
    #[error("Failed to send {length} bytes to {address}: {reason}")]
    Send {
        address: SocketAddr,
        length: usize,
        reason: String,
    },

    /// Reading from the socket failed for a reason other than it being empty
    #[error("Failed to receive datagram: {reason}")]
    Receive { reason: String },
}
