use std::{
    io::ErrorKind,
    net::{self, SocketAddr, ToSocketAddrs},
};

use log::warn;

use super::{PacketReceiver, PacketSender, Socket, TransportError};
use crate::constants::MAX_DATAGRAM_SIZE;

/// A non-blocking UDP socket
pub struct UdpSocket {
    socket: net::UdpSocket,
}

impl UdpSocket {
    pub fn bind<A: ToSocketAddrs>(address: A) -> Result<Self, TransportError> {
        let socket = net::UdpSocket::bind(address).map_err(|error| TransportError::Setup {
            reason: error.to_string(),
        })?;
        socket
            .set_nonblocking(true)
            .map_err(|error| TransportError::Setup {
                reason: error.to_string(),
            })?;
        Ok(Self { socket })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        self.socket.local_addr().map_err(|error| TransportError::Setup {
            reason: error.to_string(),
        })
    }
}

impl Socket for UdpSocket {
    fn split(self: Box<Self>) -> Result<(Box<dyn PacketSender>, Box<dyn PacketReceiver>), TransportError> {
        let sender_socket = self.socket.try_clone().map_err(|error| TransportError::Setup {
            reason: error.to_string(),
        })?;
        let sender = UdpPacketSender {
            socket: sender_socket,
        };
        let receiver = UdpPacketReceiver {
            socket: self.socket,
            buffer: vec![0u8; MAX_DATAGRAM_SIZE].into_boxed_slice(),
        };
        Ok((Box::new(sender), Box::new(receiver)))
    }
}

struct UdpPacketSender {
    socket: net::UdpSocket,
}

impl PacketSender for UdpPacketSender {
    fn send(&self, address: &SocketAddr, payload: &[u8]) -> Result<(), TransportError> {
        self.socket
            .send_to(payload, address)
            .map(|_| ())
            .map_err(|error| TransportError::Send {
                address: *address,
                length: payload.len(),
                reason: error.to_string(),
            })
    }
}

struct UdpPacketReceiver {
    socket: net::UdpSocket,
    buffer: Box<[u8]>,
}

impl PacketReceiver for UdpPacketReceiver {
    fn receive(&mut self) -> Result<Option<(SocketAddr, &[u8])>, TransportError> {
        match self.socket.recv_from(&mut self.buffer) {
            Ok((length, address)) => Ok(Some((address, &self.buffer[..length]))),
            Err(error) if error.kind() == ErrorKind::WouldBlock => Ok(None),
            // ICMP port unreachable from a previous send surfaces here on some
            // platforms, it says nothing about the datagrams still queued
            Err(error) if error.kind() == ErrorKind::ConnectionReset => {
                warn!("UDP receive reported connection reset: {}", error);
                Ok(None)
            }
            Err(error) => Err(TransportError::Receive {
                reason: error.to_string(),
            }),
        }
    }
}
