use std::{collections::HashMap, mem, net::SocketAddr};

use log::{debug, info, warn};

use snapwire_shared::{
    AttributeId, AttributeValue, ByteReader, ByteWriter, ClassId, ClassRegistry,
    DisconnectReason, Header, LibraryError, ObjectClass, ObjectId, OutgoingMessage, PacketKind,
    ReplicationError, SequenceNumber, SlotIndex, Socket, StandardHeader, UsageError,
};

use super::server_config::ServerConfig;
use crate::{
    connection::{
        connection::Connection,
        handshake_manager::{HandshakeAction, HandshakeManager},
        io::Io,
    },
    events::ServerEvents,
    history_buffer::ServerHistoryBuffer,
    object_store::ServerObjectStore,
    peer::PeerKey,
    scope::ScopeMut,
    update_writer::write_update,
};

/// A server that owns authoritative objects and replicates them to every
/// connected client, one tick at a time.
///
/// Each tick starts with [`update`](Self::update), after which objects may be
/// created, modified and destroyed, and ends with [`flush`](Self::flush)
/// sending the tick to every peer.
pub struct Server {
    config: ServerConfig,
    registry: ClassRegistry,
    io: Option<Io>,
    handshake_manager: HandshakeManager,
    connections: HashMap<PeerKey, Connection>,
    peer_addresses: HashMap<SocketAddr, PeerKey>,
    history: ServerHistoryBuffer,
    store: ServerObjectStore,
    incoming_events: ServerEvents,
    last_update_time: Option<f64>,
    flushed: bool,
}

impl Server {
    /// Create a new Server
    pub fn new(config: ServerConfig, registry: ClassRegistry) -> Self {
        let handshake_manager = HandshakeManager::new(config.application_id, &config.connection);
        let history = ServerHistoryBuffer::new(config.history_size);
        let store = ServerObjectStore::new(history.size());

        Self {
            config,
            registry,
            io: None,
            handshake_manager,
            connections: HashMap::new(),
            peer_addresses: HashMap::new(),
            history,
            store,
            incoming_events: ServerEvents::default(),
            last_update_time: None,
            flushed: false,
        }
    }

    /// Registers an object class. Not allowed once the server listens.
    pub fn register_class(&mut self, class: ObjectClass) -> Result<(), UsageError> {
        self.registry.register(class)
    }

    /// Listen at the given socket
    pub fn listen<S: Socket + 'static>(&mut self, socket: S) -> Result<(), ReplicationError> {
        if self.io.is_some() {
            return Err(UsageError::AlreadyOpen.into());
        }
        self.io = Some(Io::new(socket, &self.config.compression)?);
        self.registry.lock();
        info!("server listening");
        Ok(())
    }

    /// Returns whether or not the Server has initialized correctly and is
    /// listening for Clients
    pub fn is_listening(&self) -> bool {
        self.io.is_some()
    }

    /// Must be called once per tick before touching objects. Receives every
    /// pending packet, drops silent peers and starts a new tick at server
    /// time `now` (seconds).
    pub fn update(&mut self, now: f64) -> Result<(), ReplicationError> {
        if self.io.is_none() {
            return Err(UsageError::NotConnected.into());
        }
        if let Some(previous) = self.last_update_time {
            if now < previous {
                return Err(UsageError::TimeWentBackwards {
                    previous,
                    time: now,
                }
                .into());
            }
        }

        self.maintain_socket(now);
        self.sweep_timeouts(now);

        let advance = self.history.add_seq(now);
        self.store.clear_slot(advance);
        for connection in self.connections.values_mut() {
            connection.clear_index(advance.current);
        }

        self.flushed = false;
        self.last_update_time = Some(now);
        Ok(())
    }

    /// Takes every event raised since the previous call
    pub fn receive(&mut self) -> ServerEvents {
        mem::take(&mut self.incoming_events)
    }

    /// Sequence number of the running tick
    pub fn current_tick(&self) -> Option<SequenceNumber> {
        self.history.current_index().map(|_| self.history.current_seq())
    }

    // Objects

    pub fn create_object(&mut self, class_id: ClassId) -> Result<ObjectId, UsageError> {
        let class = self
            .registry
            .get(class_id)
            .ok_or(UsageError::UnknownClass { class_id })?;
        self.store.create(class, self.history.current_index(), None)
    }

    /// Creates an object whose `metadata` is delivered to clients along with
    /// it, at most 255 bytes
    pub fn create_object_with_metadata(
        &mut self,
        class_id: ClassId,
        metadata: &[u8],
    ) -> Result<ObjectId, UsageError> {
        let class = self
            .registry
            .get(class_id)
            .ok_or(UsageError::UnknownClass { class_id })?;
        self.store
            .create(class, self.history.current_index(), Some(metadata))
    }

    /// Destroys an object at the end of the running tick
    pub fn destroy(&mut self, object_id: ObjectId) -> Result<(), UsageError> {
        self.store.destroy(object_id, self.history.current_index())
    }

    pub fn object_class(&self, object_id: ObjectId) -> Result<ClassId, UsageError> {
        self.store
            .get(&object_id)
            .map(|object| object.class_id())
            .ok_or(UsageError::ObjectNotFound { object_id })
    }

    /// Ids of every object not destroyed
    pub fn object_ids(&self) -> Vec<ObjectId> {
        self.store.live_ids().collect()
    }

    /// Writes an attribute of an object in the running tick
    pub fn set<T: AttributeValue>(
        &mut self,
        object_id: ObjectId,
        attribute: AttributeId,
        value: T,
    ) -> Result<(), UsageError> {
        let current = self.current_index()?;
        let object = self.store.live_object_mut(object_id)?;
        let class_id = object.class_id();
        let class = self
            .registry
            .get(class_id)
            .ok_or(UsageError::UnknownClass { class_id })?;
        let snapshot = object
            .snapshot_mut(current)
            .ok_or(UsageError::ObjectNotFound { object_id })?;
        class.write_attribute(snapshot, attribute, value)
    }

    /// Reads an attribute of an object in the running tick
    pub fn get<T: AttributeValue>(
        &self,
        object_id: ObjectId,
        attribute: AttributeId,
    ) -> Result<T, UsageError> {
        let current = self.current_index()?;
        let object = self.store.live_object(object_id)?;
        let class_id = object.class_id();
        let class = self
            .registry
            .get(class_id)
            .ok_or(UsageError::UnknownClass { class_id })?;
        let snapshot = object
            .snapshot(current)
            .ok_or(UsageError::ObjectNotFound { object_id })?;
        class.read_attribute(snapshot, attribute)
    }

    fn current_index(&self) -> Result<SlotIndex, UsageError> {
        self.history.current_index().ok_or(UsageError::NoActiveTick)
    }

    // Messages

    /// Queues a message for the peer's next update
    pub fn send_message(
        &mut self,
        peer_key: &PeerKey,
        payload: &[u8],
        reliable: bool,
    ) -> Result<(), UsageError> {
        let message = OutgoingMessage::new(payload, reliable)?;
        let connection = self
            .connections
            .get_mut(peer_key)
            .ok_or(UsageError::UnknownPeer {
                connection_id: peer_key.connection_id(),
            })?;
        connection.queue_message(message);
        Ok(())
    }

    // Sending

    /// Sends the running tick to every peer, each seeing every object that
    /// is not destroyed
    pub fn flush(&mut self) -> Result<(), ReplicationError> {
        self.flush_with_scope(|_, _| false)
    }

    /// Sends the running tick to every peer. `scope` fills in the objects a
    /// peer should see and returns true, or returns false to send it every
    /// object that is not destroyed.
    ///
    /// A peer that cannot be sent an update is disconnected, the others are
    /// still served.
    pub fn flush_with_scope<F>(&mut self, mut scope: F) -> Result<(), ReplicationError>
    where
        F: FnMut(PeerKey, &mut ScopeMut<'_>) -> bool,
    {
        if self.io.is_none() {
            return Err(UsageError::NotConnected.into());
        }
        let current = self.current_index()?;
        if self.flushed {
            debug!("tick {} was already flushed", self.history.current_seq());
            return Ok(());
        }
        self.flushed = true;

        let mut peer_keys: Vec<PeerKey> = self.connections.keys().copied().collect();
        peer_keys.sort();
        for peer_key in peer_keys {
            if let Err(error) = self.flush_peer(peer_key, current, &mut scope) {
                warn!(
                    "Server Error: dropping peer {}: {}",
                    peer_key.connection_id(),
                    error
                );
                self.incoming_events.push_error(error);
                self.drop_peer(&peer_key);
            }
        }
        Ok(())
    }

    fn flush_peer<F>(
        &mut self,
        peer_key: PeerKey,
        current: SlotIndex,
        scope_fn: &mut F,
    ) -> Result<(), ReplicationError>
    where
        F: FnMut(PeerKey, &mut ScopeMut<'_>) -> bool,
    {
        let Some(connection) = self.connections.get_mut(&peer_key) else {
            return Ok(());
        };
        if connection.is_stalled() {
            return Err(DisconnectReason::MessageBufferOverflow.into());
        }
        let ack_index = match connection.ack() {
            Some(ack) => {
                if !self.history.is_seq_in_bounds(ack) {
                    return Err(DisconnectReason::AckOutOfHistory { ack }.into());
                }
                Some(self.history.seq_to_index(ack))
            }
            None => {
                if connection.first_update_index().is_none() {
                    connection.set_first_update_index(current);
                }
                None
            }
        };

        let mut scope = ScopeMut::new(&self.store, peer_key);
        if !scope_fn(peer_key, &mut scope) {
            scope.clear();
            scope.include_all();
        }

        let mut writer = ByteWriter::new();
        write_update(
            &mut writer,
            &self.history,
            &self.store,
            connection,
            scope.into_objects(),
            ack_index,
        )?;

        let address = connection.address;
        let header = StandardHeader::new(
            self.config.application_id,
            peer_key.connection_id(),
            PacketKind::Update,
        );
        if let Some(io) = self.io.as_mut() {
            io.send_packet(&address, &header.to_bytes(), writer.as_slice())?;
        }
        Ok(())
    }

    // Peers

    /// Keys of every connected peer
    pub fn peer_keys(&self) -> Vec<PeerKey> {
        let mut peer_keys: Vec<PeerKey> = self.connections.keys().copied().collect();
        peer_keys.sort();
        peer_keys
    }

    pub fn peers_count(&self) -> usize {
        self.connections.len()
    }

    pub fn peer_address(&self, peer_key: &PeerKey) -> Option<SocketAddr> {
        self.connections
            .get(peer_key)
            .map(|connection| connection.address)
    }

    /// Disconnects a peer, telling it so. Also used to turn away a peer
    /// right after its `ConnectEvent`.
    pub fn disconnect_peer(&mut self, peer_key: &PeerKey) -> Result<(), UsageError> {
        if !self.connections.contains_key(peer_key) {
            return Err(UsageError::UnknownPeer {
                connection_id: peer_key.connection_id(),
            });
        }
        info!("disconnecting peer {}", peer_key.connection_id());
        self.drop_peer(peer_key);
        Ok(())
    }

    /// Disconnects every client and stops listening
    pub fn close(&mut self) {
        if self.io.is_none() {
            return;
        }
        for (address, packet) in self.handshake_manager.clear() {
            self.send_raw(&address, &packet);
        }
        for peer_key in self.peer_keys() {
            self.drop_peer(&peer_key);
        }
        self.io = None;
        info!("server closed");
    }

    // Private methods

    /// Reads every datagram waiting on the socket
    fn maintain_socket(&mut self, now: f64) {
        while let Some((address, datagram)) = self.io.as_mut().and_then(|io| io.receive()) {
            self.process_datagram(&address, &datagram, now);
        }
    }

    fn process_datagram(&mut self, address: &SocketAddr, datagram: &[u8], now: f64) {
        let mut reader = ByteReader::new(datagram);
        let header = match Header::read(&mut reader) {
            Ok(header) => header,
            Err(error) => {
                warn!("Server Error: cannot read packet from {}: {}", address, error);
                return;
            }
        };
        if header.application_id() != self.config.application_id {
            warn!(
                "Server Error: {} sent a packet for application {}",
                address,
                header.application_id()
            );
            return;
        }

        match header {
            Header::Standard(standard) => {
                let peer_key = PeerKey::new(standard.connection_id);
                if self.connections.contains_key(&peer_key) {
                    self.process_connected(address, peer_key, standard.kind, reader.rest(), now);
                    return;
                }
            }
            Header::Connect(_) => {
                if self.peer_addresses.contains_key(address) {
                    debug!("ignoring connection request from connected {}", address);
                    return;
                }
            }
        }

        let connections = &self.connections;
        let action = self.handshake_manager.maintain_handshake(
            address,
            &header,
            |peer_key| connections.contains_key(peer_key),
            now,
        );
        match action {
            HandshakeAction::None => {}
            HandshakeAction::SendPacket(packet) => self.send_raw(address, &packet),
            HandshakeAction::FinalizeConnection(peer_key) => {
                self.finalize_connection(peer_key, *address, now)
            }
        }
    }

    fn finalize_connection(&mut self, peer_key: PeerKey, address: SocketAddr, now: f64) {
        info!("peer {} connected from {}", peer_key.connection_id(), address);
        let connection = Connection::new(
            address,
            peer_key,
            self.history.size(),
            &self.config.connection,
            now,
        );
        self.connections.insert(peer_key, connection);
        self.peer_addresses.insert(address, peer_key);
        self.incoming_events.push_connection(&peer_key);
    }

    fn process_connected(
        &mut self,
        address: &SocketAddr,
        peer_key: PeerKey,
        kind: PacketKind,
        payload: &[u8],
        now: f64,
    ) {
        let Some(connection) = self.connections.get_mut(&peer_key) else {
            return;
        };
        if connection.address != *address {
            warn!(
                "Server Error: connection {} used from {}, expected {}",
                peer_key.connection_id(),
                address,
                connection.address
            );
            return;
        }
        connection.mark_heard(now);

        match kind {
            PacketKind::Handshake => {}
            PacketKind::Disconnect => {
                info!("peer {} disconnected", peer_key.connection_id());
                self.remove_peer(&peer_key);
            }
            PacketKind::Update => {
                if let Err(error) = self.read_update(peer_key, payload) {
                    warn!(
                        "Server Error: malformed update from peer {}: {}",
                        peer_key.connection_id(),
                        error
                    );
                    self.incoming_events.push_error(error.into());
                    self.drop_peer(&peer_key);
                }
            }
        }
    }

    fn read_update(&mut self, peer_key: PeerKey, payload: &[u8]) -> Result<(), LibraryError> {
        let (Some(io), Some(connection)) =
            (self.io.as_mut(), self.connections.get_mut(&peer_key))
        else {
            return Ok(());
        };
        let decoded = io.decode(payload)?;
        for message in connection.read_update(&decoded)? {
            self.incoming_events.push_message(&peer_key, message);
        }
        Ok(())
    }

    fn sweep_timeouts(&mut self, now: f64) {
        for (address, packet) in self.handshake_manager.sweep(now) {
            self.send_raw(&address, &packet);
        }

        let mut timed_out: Vec<PeerKey> = self
            .connections
            .values()
            .filter(|connection| connection.is_timed_out(now))
            .map(|connection| connection.peer_key)
            .collect();
        timed_out.sort();
        for peer_key in timed_out {
            if let Some(connection) = self.connections.get(&peer_key) {
                warn!(
                    "peer {} timed out after {:.1}s",
                    peer_key.connection_id(),
                    connection.silence(now)
                );
            }
            self.drop_peer(&peer_key);
        }
    }

    /// Tells the peer it is disconnected, then forgets it
    fn drop_peer(&mut self, peer_key: &PeerKey) {
        let Some(address) = self.peer_address(peer_key) else {
            return;
        };
        let packet = self
            .handshake_manager
            .disconnect_packet(peer_key.connection_id());
        self.send_raw(&address, &packet);
        self.remove_peer(peer_key);
    }

    fn remove_peer(&mut self, peer_key: &PeerKey) {
        if let Some(connection) = self.connections.remove(peer_key) {
            self.peer_addresses.remove(&connection.address);
            self.incoming_events
                .push_disconnection(peer_key, connection.address);
        }
    }

    fn send_raw(&mut self, address: &SocketAddr, packet: &[u8]) {
        if let Some(io) = self.io.as_mut() {
            io.send_raw(address, packet);
        }
    }
}
