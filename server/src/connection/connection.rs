use std::{mem, net::SocketAddr};

use log::trace;

use snapwire_shared::{
    read_message_groups, sequence_greater_than, ByteReader, ConnectionConfig, LibraryError,
    MessageReceiver, ObjectId, OutgoingMessage, SequenceNumber, Serde, SlotIndex, Timer,
};

use crate::peer::PeerKey;

/// A connected client, with everything the server remembers about what it
/// was sent and what it acknowledged
pub struct Connection {
    pub address: SocketAddr,
    pub peer_key: PeerKey,
    timeout_timer: Timer,
    ack: Option<SequenceNumber>,
    first_update_index: Option<SlotIndex>,
    stalled: bool,
    scopes: Vec<Vec<ObjectId>>,
    buffered_messages: Vec<Vec<Box<[u8]>>>,
    outgoing_messages: Vec<OutgoingMessage>,
    message_receiver: MessageReceiver,
}

impl Connection {
    pub fn new(
        address: SocketAddr,
        peer_key: PeerKey,
        history_size: usize,
        config: &ConnectionConfig,
        now: f64,
    ) -> Self {
        Self {
            address,
            peer_key,
            timeout_timer: Timer::new(config.disconnection_timeout, now),
            ack: None,
            first_update_index: None,
            stalled: false,
            scopes: vec![Vec::new(); history_size],
            buffered_messages: vec![Vec::new(); history_size],
            outgoing_messages: Vec::new(),
            message_receiver: MessageReceiver::new(),
        }
    }

    // Liveness

    pub fn mark_heard(&mut self, now: f64) {
        self.timeout_timer.reset(now);
    }

    pub fn is_timed_out(&self, now: f64) -> bool {
        self.timeout_timer.ringing(now)
    }

    pub fn silence(&self, now: f64) -> f64 {
        self.timeout_timer.elapsed(now)
    }

    // Incoming

    /// Newest server tick the client reported receiving
    pub fn ack(&self) -> Option<SequenceNumber> {
        self.ack
    }

    /// Reads a client update, returning the messages delivered for the first
    /// time. Updates older than the newest one read are ignored.
    pub fn read_update(&mut self, payload: &[u8]) -> Result<Vec<Box<[u8]>>, LibraryError> {
        let mut reader = ByteReader::new(payload);
        let ack = SequenceNumber::de(&mut reader)?;
        let message_seq = SequenceNumber::de(&mut reader)?;

        match self.ack {
            Some(previous) if sequence_greater_than(previous, ack) => {
                trace!("stale update from {} (ack {})", self.address, ack);
                return Ok(Vec::new());
            }
            Some(previous) if previous == ack => {}
            _ => self.ack = Some(ack),
        }

        let mut delivered = Vec::new();
        for group in read_message_groups(&mut reader)? {
            if self.message_receiver.is_new(group.sequence) {
                delivered.extend(group.messages);
            }
        }
        self.message_receiver.mark_delivered(message_seq);

        Ok(delivered)
    }

    /// Newest client message sequence delivered, 0 before any
    pub fn message_ack(&self) -> SequenceNumber {
        self.message_receiver.last_delivered().unwrap_or(0)
    }

    // Outgoing

    pub fn first_update_index(&self) -> Option<SlotIndex> {
        self.first_update_index
    }

    pub fn set_first_update_index(&mut self, index: SlotIndex) {
        self.first_update_index = Some(index);
    }

    /// Whether the client never acknowledged anything while its first update
    /// left the history
    pub fn is_stalled(&self) -> bool {
        self.stalled
    }

    pub fn scope(&self, index: SlotIndex) -> &[ObjectId] {
        &self.scopes[index]
    }

    pub fn set_scope(&mut self, index: SlotIndex, scope: Vec<ObjectId>) {
        self.scopes[index] = scope;
    }

    pub fn queue_message(&mut self, message: OutgoingMessage) {
        self.outgoing_messages.push(message);
    }

    pub fn take_outgoing_messages(&mut self) -> Vec<OutgoingMessage> {
        mem::take(&mut self.outgoing_messages)
    }

    pub fn buffered_messages(&self, index: SlotIndex) -> &[Box<[u8]>] {
        &self.buffered_messages[index]
    }

    pub fn buffer_message(&mut self, index: SlotIndex, payload: Box<[u8]>) {
        self.buffered_messages[index].push(payload);
    }

    /// Forgets what was sent in a slot about to hold a new tick
    pub fn clear_index(&mut self, index: SlotIndex) {
        if self.first_update_index == Some(index) {
            self.first_update_index = None;
            if self.ack.is_none() {
                self.stalled = true;
            }
        }
        self.scopes[index].clear();
        self.buffered_messages[index].clear();
    }
}
