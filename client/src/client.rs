use std::{mem, net::SocketAddr};

use log::{info, trace};

use snapwire_shared::{
    read_message_groups, write_message_group, AttributeId, AttributeValue, ByteReader,
    ByteWriter, ClassId, ClassRegistry, InterpolationPoint, LibraryError, MessageReceiver,
    ObjectClass, ObjectId, OutgoingMessage, ReliableMessageBuffer, ReplicationError, SlotIndex,
    Socket, UsageError, INTERPOLATION_CUSHION,
};

use crate::{
    client_config::ClientConfig,
    connection::{
        connection::{Connection, ConnectionState},
        io::Io,
    },
    events::{ClientEvents, DestroyEvent},
    history_buffer::{ClientHistoryBuffer, PushResult},
    object_store::{ClientObject, ClientObjectStore},
    playback::{ClientStatus, PlaybackScheduler},
    update_reader::{read_objects, UpdateHeader},
};

/// Client can send/receive messages to/from a server, and reconstructs a
/// smooth timeline of the objects the server replicates to it
pub struct Client {
    config: ClientConfig,
    registry: ClassRegistry,
    connection: Connection,
    // Replication
    history: ClientHistoryBuffer,
    store: ClientObjectStore,
    playback: PlaybackScheduler,
    // Messages
    message_buffer: ReliableMessageBuffer,
    message_receiver: MessageReceiver,
    outgoing_messages: Vec<OutgoingMessage>,
    // Events
    incoming_events: ClientEvents,
    last_update_time: Option<f64>,
}

impl Client {
    /// Create a new Client
    pub fn new(config: ClientConfig, registry: ClassRegistry) -> Self {
        let connection = Connection::new(config.application_id, &config.connection);
        let history = ClientHistoryBuffer::new(config.history_size);
        let store = ClientObjectStore::new(history.size());
        let playback = PlaybackScheduler::new(&config);

        Self {
            config,
            registry,
            connection,
            history,
            store,
            playback,
            message_buffer: ReliableMessageBuffer::new(),
            message_receiver: MessageReceiver::new(),
            outgoing_messages: Vec::new(),
            incoming_events: ClientEvents::new(),
            last_update_time: None,
        }
    }

    /// Registers an object class. Not allowed once the client has been opened.
    pub fn register_class(&mut self, class: ObjectClass) -> Result<(), UsageError> {
        self.registry.register(class)
    }

    /// Connect to the given server address
    pub fn open<S: Socket + 'static>(
        &mut self,
        socket: S,
        server_addr: SocketAddr,
        now: f64,
    ) -> Result<(), ReplicationError> {
        if self.connection.state() != ConnectionState::Closed {
            return Err(UsageError::AlreadyOpen.into());
        }

        let io = Io::new(socket, &self.config.compression)?;
        self.reset_session();
        self.registry.lock();
        self.last_update_time = Some(now);
        self.connection.open(io, server_addr, now)?;
        Ok(())
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.state() == ConnectionState::Connected
    }

    /// Must be called regularly. Maintains the connection, processes every
    /// update received from the server and advances playback to local time
    /// `now` (seconds).
    pub fn update(&mut self, now: f64) -> Result<ClientStatus, ReplicationError> {
        let elapsed = match self.last_update_time {
            Some(previous) if now < previous => {
                return Err(UsageError::TimeWentBackwards {
                    previous,
                    time: now,
                }
                .into());
            }
            Some(previous) => now - previous,
            None => 0.0,
        };

        let result = self.update_connected(now, elapsed);
        if let Err(error) = &result {
            if error.is_fatal() {
                info!("client closing: {}", error);
                self.connection.close();
            }
        }
        self.last_update_time = Some(now);
        result
    }

    fn update_connected(&mut self, now: f64, elapsed: f64) -> Result<ClientStatus, ReplicationError> {
        self.connection.update(now)?;

        match self.connection.state() {
            ConnectionState::Closed => return Err(UsageError::NotConnected.into()),
            ConnectionState::Connecting => return Ok(ClientStatus::Connecting),
            ConnectionState::Handshaking => return Ok(ClientStatus::Handshaking),
            ConnectionState::Connected => {}
        }

        while let Some(payload) = self.connection.receive_update() {
            self.process_update(&payload)?;
        }

        let status = self.playback.advance(
            now,
            elapsed,
            &mut self.history,
            &mut self.store,
            &mut self.incoming_events,
        )?;

        for object in self.store.retire_unused(&self.history) {
            self.incoming_events.push_destroy(DestroyEvent {
                object,
                death: false,
            });
        }

        Ok(status)
    }

    fn process_update(&mut self, payload: &[u8]) -> Result<(), LibraryError> {
        let mut reader = ByteReader::new(payload);
        let header = UpdateHeader::read(&mut reader)?;

        match self.history.push_seq(header.seq, header.ack, header.time) {
            PushResult::Rejected => {
                trace!("rejected update {} (ack {})", header.seq, header.ack);
                return Ok(());
            }
            PushResult::Accepted { cleared } => {
                for index in cleared.iter().flat_map(|range| range.iter()) {
                    self.store.clear_slot(index);
                }
            }
        }

        self.message_buffer.update_ack(header.message_ack);

        let seq_index = self.history.seq_to_index(header.seq);
        let ack_index = self.history.seq_to_index(header.ack);
        read_objects(
            &mut reader,
            &self.registry,
            &mut self.store,
            seq_index,
            ack_index,
        )?;

        for group in read_message_groups(&mut reader)? {
            if !self.message_receiver.is_new(group.sequence) {
                continue;
            }
            for message in group.messages {
                self.incoming_events.push_message(message);
            }
        }
        self.message_receiver.mark_delivered(header.seq);

        Ok(())
    }

    /// Sends an update to the server carrying the newest received sequence and
    /// every reliable message not yet acknowledged. Does nothing until the
    /// first server update has arrived.
    pub fn flush(&mut self) -> Result<(), ReplicationError> {
        if self.connection.state() != ConnectionState::Connected {
            return Ok(());
        }
        let Some(last_seq) = self.history.last_seq() else {
            return Ok(());
        };

        if let Err(reason) = self.message_buffer.add_seq() {
            self.connection.close();
            return Err(reason.into());
        }

        let mut writer = ByteWriter::new();
        writer.write(&last_seq);
        writer.write(&self.message_buffer.current_seq());

        for index in self.message_buffer.unacked_indexes() {
            write_message_group(
                &mut writer,
                self.message_buffer.index_to_seq(index),
                self.message_buffer.messages_at(index).iter().map(|message| &message[..]),
            );
        }

        let outgoing = mem::take(&mut self.outgoing_messages);
        write_message_group(
            &mut writer,
            self.message_buffer.current_seq(),
            outgoing.iter().map(|message| &message.payload[..]),
        );
        for message in outgoing {
            if message.reliable {
                self.message_buffer.buffer_message(message.payload);
            }
        }

        self.connection.send_update(writer.as_slice())
    }

    /// Queues a message for the next [`flush`](Self::flush)
    pub fn send_message(&mut self, payload: &[u8], reliable: bool) -> Result<(), UsageError> {
        self.outgoing_messages.push(OutgoingMessage::new(payload, reliable)?);
        Ok(())
    }

    /// Takes every event raised since the previous call
    pub fn receive(&mut self) -> ClientEvents {
        mem::take(&mut self.incoming_events)
    }

    /// Closes the connection, notifying the server
    pub fn close(&mut self) {
        self.connection.close();
    }

    // Objects

    /// Server time the application currently observes, once playback started
    pub fn application_time(&self) -> Option<f64> {
        self.playback.application_time()
    }

    fn visible_object(&self, object_id: ObjectId) -> Result<&ClientObject, UsageError> {
        let object = self
            .store
            .get(&object_id)
            .ok_or(UsageError::ObjectNotFound { object_id })?;
        if !object.is_alive() {
            return Err(UsageError::ObjectNotVisible { object_id });
        }
        Ok(object)
    }

    pub fn object_class(&self, object_id: ObjectId) -> Result<ClassId, UsageError> {
        Ok(self.visible_object(object_id)?.class_id())
    }

    /// Metadata the server attached when creating the object
    pub fn metadata(&self, object_id: ObjectId) -> Result<Option<&[u8]>, UsageError> {
        Ok(self.visible_object(object_id)?.metadata())
    }

    /// Reads an attribute at the current application time. Interpolated
    /// attributes are computed from the snapshots around that time, others
    /// read the newest snapshot not after it.
    pub fn get<T: AttributeValue>(
        &self,
        object_id: ObjectId,
        attribute: AttributeId,
    ) -> Result<T, UsageError> {
        let object = self.visible_object(object_id)?;
        let class_id = object.class_id();
        let class = self
            .registry
            .get(class_id)
            .ok_or(UsageError::UnknownClass { class_id })?;
        let definition = class.typed_attribute::<T>(attribute)?;

        let (Some(index), Some(time)) = (
            self.history.application_index(),
            self.playback.application_time(),
        ) else {
            return Err(UsageError::ObjectNotVisible { object_id });
        };
        let snapshot = object
            .snapshot(index)
            .ok_or(UsageError::ObjectNotVisible { object_id })?;
        let range = definition.range();

        let Some(interpolation) = definition.interpolation else {
            return Ok(T::read_from(&snapshot[range]));
        };

        let points: Vec<InterpolationPoint<'_>> = self
            .interpolation_window(object, index)
            .into_iter()
            .filter_map(|slot| {
                object.snapshot(slot).map(|data| InterpolationPoint {
                    time: self.history.time(slot),
                    data: &data[range.clone()],
                })
            })
            .collect();
        let mut output = vec![0u8; definition.size];
        interpolation(&points, time, &mut output);
        Ok(T::read_from(&output))
    }

    /// Valid slots around `index` holding data for `object`, oldest first.
    /// The walk stops at the first slot without data in either direction.
    fn interpolation_window(&self, object: &ClientObject, index: SlotIndex) -> Vec<SlotIndex> {
        let mut before = Vec::new();
        let mut slot = self.history.previous_valid_index(index);
        while let Some(previous) = slot {
            if before.len() >= INTERPOLATION_CUSHION || object.snapshot(previous).is_none() {
                break;
            }
            before.push(previous);
            slot = self.history.previous_valid_index(previous);
        }

        let mut window: Vec<SlotIndex> = before.into_iter().rev().collect();
        window.push(index);

        let mut after = 0;
        let mut slot = self.history.next_valid_index(index);
        while let Some(next) = slot {
            if after >= INTERPOLATION_CUSHION || object.snapshot(next).is_none() {
                break;
            }
            window.push(next);
            after += 1;
            slot = self.history.next_valid_index(next);
        }

        window
    }

    fn reset_session(&mut self) {
        self.history = ClientHistoryBuffer::new(self.config.history_size);
        self.store = ClientObjectStore::new(self.history.size());
        self.playback = PlaybackScheduler::new(&self.config);
        self.message_buffer = ReliableMessageBuffer::new();
        self.message_receiver = MessageReceiver::new();
        self.outgoing_messages.clear();
        self.incoming_events = ClientEvents::new();
    }
}
