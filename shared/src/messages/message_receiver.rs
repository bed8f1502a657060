use crate::{types::SequenceNumber, wrapping_number::sequence_greater_than};

/// Filters retransmitted message groups so each is delivered exactly once
#[derive(Default)]
pub struct MessageReceiver {
    last_delivered: Option<SequenceNumber>,
}

impl MessageReceiver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a group sent under `sequence` has not been delivered yet
    pub fn is_new(&self, sequence: SequenceNumber) -> bool {
        match self.last_delivered {
            None => true,
            Some(last) => sequence_greater_than(sequence, last),
        }
    }

    /// Marks every group up to and including `sequence` as delivered. Never
    /// moves backwards.
    pub fn mark_delivered(&mut self, sequence: SequenceNumber) {
        if self.is_new(sequence) {
            self.last_delivered = Some(sequence);
        }
    }

    pub fn last_delivered(&self) -> Option<SequenceNumber> {
        self.last_delivered
    }
}
