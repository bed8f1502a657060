use crate::{
    constants::MESSAGE_BUFFER_SIZE, error::DisconnectReason, types::SequenceNumber,
    wrapping_number::sequence_greater_than,
};

/// Ring of reliable messages awaiting acknowledgement.
///
/// Every outgoing packet opens a new slot with [`add_seq`](Self::add_seq).
/// Slots after the acknowledged one are retransmitted until the remote host
/// acknowledges their sequence.
pub struct ReliableMessageBuffer {
    slots: Vec<Vec<Box<[u8]>>>,
    current: Option<usize>,
    current_seq: SequenceNumber,
    ack_index: usize,
}

impl ReliableMessageBuffer {
    pub fn new() -> Self {
        Self::with_capacity(MESSAGE_BUFFER_SIZE)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![Vec::new(); capacity.max(2)],
            current: None,
            current_seq: 0,
            ack_index: 0,
        }
    }

    fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Opens the slot for the next outgoing packet. Fails once the ring would
    /// overwrite the last acknowledged slot.
    pub fn add_seq(&mut self) -> Result<(), DisconnectReason> {
        let Some(current) = self.current else {
            self.current = Some(1);
            self.current_seq = 1;
            self.ack_index = 0;
            return Ok(());
        };

        let target = (current + 1) % self.capacity();
        if target == self.ack_index {
            return Err(DisconnectReason::MessageBufferOverflow);
        }

        self.current = Some(target);
        self.current_seq = self.current_seq.wrapping_add(1);
        self.slots[target].clear();
        Ok(())
    }

    /// Moves the acknowledged cursor forward to `ack`. Older, duplicate or
    /// not-yet-sent sequences are ignored.
    pub fn update_ack(&mut self, ack: SequenceNumber) {
        if self.current.is_none() {
            return;
        }
        let distance_back = usize::from(self.current_seq.wrapping_sub(ack));
        if distance_back >= self.capacity() {
            return;
        }
        if sequence_greater_than(ack, self.index_to_seq(self.ack_index)) {
            self.ack_index = self.seq_to_index(ack);
        }
    }

    pub fn current_seq(&self) -> SequenceNumber {
        self.current_seq
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn first_unacked_index(&self) -> usize {
        (self.ack_index + 1) % self.capacity()
    }

    /// Slots that must be retransmitted, oldest first (excludes the current
    /// slot)
    pub fn unacked_indexes(&self) -> Vec<usize> {
        let Some(current) = self.current else {
            return Vec::new();
        };
        let mut indexes = Vec::new();
        let mut index = self.first_unacked_index();
        while index != current {
            indexes.push(index);
            index = (index + 1) % self.capacity();
        }
        indexes
    }

    /// Stores a reliable message under the current slot
    pub fn buffer_message(&mut self, payload: Box<[u8]>) {
        if let Some(current) = self.current {
            self.slots[current].push(payload);
        }
    }

    pub fn messages_at(&self, index: usize) -> &[Box<[u8]>] {
        &self.slots[index]
    }

    pub fn seq_to_index(&self, seq: SequenceNumber) -> usize {
        let current = self.current.unwrap_or(0);
        let distance_back = usize::from(self.current_seq.wrapping_sub(seq)) % self.capacity();
        (current + self.capacity() - distance_back) % self.capacity()
    }

    pub fn index_to_seq(&self, index: usize) -> SequenceNumber {
        let current = self.current.unwrap_or(0);
        let distance_back = (current + self.capacity() - index) % self.capacity();
        self.current_seq.wrapping_sub(distance_back as u16)
    }
}

impl Default for ReliableMessageBuffer {
    fn default() -> Self {
        Self::new()
    }
}
