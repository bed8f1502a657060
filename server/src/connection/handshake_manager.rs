use std::{collections::HashMap, net::SocketAddr};

use log::{debug, info, warn};

use snapwire_shared::{
    ApplicationId, ConnectHeader, ConnectionConfig, ConnectionId, Header, PacketKind,
    StandardHeader, Timer,
};

use crate::peer::PeerKey;

pub enum HandshakeAction {
    None,
    SendPacket(Vec<u8>),
    FinalizeConnection(PeerKey),
}

/// A client that was given a connection id but has not confirmed it yet
struct PendingPeer {
    address: SocketAddr,
    resend_timer: Timer,
    timeout_timer: Timer,
}

/// Assigns connection ids and runs the handshake of clients until they are
/// promoted to connected peers
pub struct HandshakeManager {
    application_id: ApplicationId,
    config: ConnectionConfig,
    last_connection_id: ConnectionId,
    pending: HashMap<PeerKey, PendingPeer>,
    pending_addresses: HashMap<SocketAddr, PeerKey>,
}

impl HandshakeManager {
    pub fn new(application_id: ApplicationId, config: &ConnectionConfig) -> Self {
        Self {
            application_id,
            config: config.clone(),
            last_connection_id: fastrand::u32(..),
            pending: HashMap::new(),
            pending_addresses: HashMap::new(),
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn connect_reply(&self, connection_id: ConnectionId) -> Vec<u8> {
        ConnectHeader::new(self.application_id, connection_id).to_bytes()
    }

    pub fn disconnect_packet(&self, connection_id: ConnectionId) -> Vec<u8> {
        StandardHeader::new(self.application_id, connection_id, PacketKind::Disconnect).to_bytes()
    }

    /// Handles a datagram that does not belong to a connected peer.
    /// `is_connected` tells whether a connection id is already in use by one.
    pub fn maintain_handshake(
        &mut self,
        address: &SocketAddr,
        header: &Header,
        is_connected: impl Fn(&PeerKey) -> bool,
        now: f64,
    ) -> HandshakeAction {
        match header {
            Header::Connect(ConnectHeader {
                connection_id: 0, ..
            }) => {
                if let Some(key) = self.pending_addresses.get(address) {
                    debug!("repeated connection request from {}", address);
                    return HandshakeAction::SendPacket(self.connect_reply(key.connection_id()));
                }

                let key = self.next_peer_key(is_connected);
                info!("{} requested a connection, assigned id {}", address, key.connection_id());
                self.pending.insert(
                    key,
                    PendingPeer {
                        address: *address,
                        resend_timer: Timer::new(self.config.handshake_resend_interval, now),
                        timeout_timer: Timer::new(self.config.handshake_timeout, now),
                    },
                );
                self.pending_addresses.insert(*address, key);
                HandshakeAction::SendPacket(self.connect_reply(key.connection_id()))
            }
            Header::Connect(header) => {
                warn!(
                    "Server Error: {} sent a connection reply for id {}",
                    address, header.connection_id
                );
                HandshakeAction::None
            }
            Header::Standard(header) => {
                let key = PeerKey::new(header.connection_id);
                let Some(pending) = self.pending.get(&key) else {
                    debug!("unknown connection {} from {}", header.connection_id, address);
                    return HandshakeAction::SendPacket(
                        self.disconnect_packet(header.connection_id),
                    );
                };
                if pending.address != *address {
                    warn!(
                        "Server Error: connection {} used from {}, expected {}",
                        header.connection_id, address, pending.address
                    );
                    return HandshakeAction::None;
                }

                self.remove(&key);
                match header.kind {
                    PacketKind::Disconnect => {
                        info!("{} gave up connecting", address);
                        HandshakeAction::None
                    }
                    PacketKind::Handshake | PacketKind::Update => {
                        HandshakeAction::FinalizeConnection(key)
                    }
                }
            }
        }
    }

    /// Resends the reply to pending clients and drops those that stayed
    /// silent too long. Returns the datagrams to send.
    pub fn sweep(&mut self, now: f64) -> Vec<(SocketAddr, Vec<u8>)> {
        let mut outgoing = Vec::new();
        let mut expired = Vec::new();

        for (key, pending) in self.pending.iter_mut() {
            if pending.timeout_timer.ringing(now) {
                expired.push(*key);
            } else if pending.resend_timer.ringing(now) {
                pending.resend_timer.reset(now);
                outgoing.push((
                    pending.address,
                    ConnectHeader::new(self.application_id, key.connection_id()).to_bytes(),
                ));
            }
        }

        for key in expired {
            if let Some(pending) = self.remove(&key) {
                info!("handshake with {} timed out", pending.address);
                outgoing.push((pending.address, self.disconnect_packet(key.connection_id())));
            }
        }

        outgoing
    }

    /// Forgets every pending client, returning the disconnects to send them
    pub fn clear(&mut self) -> Vec<(SocketAddr, Vec<u8>)> {
        let outgoing = self
            .pending
            .iter()
            .map(|(key, pending)| (pending.address, self.disconnect_packet(key.connection_id())))
            .collect();
        self.pending.clear();
        self.pending_addresses.clear();
        outgoing
    }

    fn remove(&mut self, key: &PeerKey) -> Option<PendingPeer> {
        let pending = self.pending.remove(key)?;
        self.pending_addresses.remove(&pending.address);
        Some(pending)
    }

    fn next_peer_key(&mut self, is_connected: impl Fn(&PeerKey) -> bool) -> PeerKey {
        loop {
            self.last_connection_id = self.last_connection_id.wrapping_add(1);
            let key = PeerKey::new(self.last_connection_id);
            if self.last_connection_id != 0 && !self.pending.contains_key(&key) && !is_connected(&key)
            {
                return key;
            }
        }
    }
}
