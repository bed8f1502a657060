use snapwire_shared::{
    sequence_greater_than, SequenceNumber, SlotIndex, INTERPOLATION_CUSHION,
};

/// Contiguous run of slots, walking forward and wrapping at the ring size
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SlotRange {
    start: SlotIndex,
    len: usize,
    size: usize,
}

impl SlotRange {
    pub fn start(&self) -> SlotIndex {
        self.start
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = SlotIndex> {
        let Self { start, len, size } = *self;
        (0..len).map(move |offset| (start + offset) % size)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PushResult {
    Rejected,
    /// `cleared` holds the slots that were invalidated to make room for the
    /// new sequence, the reused slot included
    Accepted { cleared: Option<SlotRange> },
}

impl PushResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self, PushResult::Accepted { .. })
    }
}

/// Maps the sequence numbers of received server updates onto a ring of slots.
///
/// The window `[head - necessary_count, head]` holds data the client still
/// needs (the server's ack baseline and the interpolation window around the
/// playback slot). A new sequence is only admitted ahead of the head if doing
/// so would not overwrite that window.
pub struct ClientHistoryBuffer {
    valid: Vec<bool>,
    times: Vec<f64>,
    last_seq: SequenceNumber,
    head: Option<SlotIndex>,
    ack_index: Option<SlotIndex>,
    first_data_index: Option<SlotIndex>,
    application_index: Option<SlotIndex>,
    necessary_count: usize,
    valid_updates: u64,
}

impl ClientHistoryBuffer {
    pub fn new(size: usize) -> Self {
        let size = size.max(2);
        Self {
            valid: vec![false; size],
            times: vec![0.0; size],
            last_seq: 0,
            head: None,
            ack_index: None,
            first_data_index: None,
            application_index: None,
            necessary_count: 0,
            valid_updates: 0,
        }
    }

    pub fn size(&self) -> usize {
        self.valid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.valid_updates == 0
    }

    /// Slot of the newest accepted sequence
    pub fn last_index(&self) -> Option<SlotIndex> {
        self.head
    }

    pub fn last_seq(&self) -> Option<SequenceNumber> {
        self.head.map(|_| self.last_seq)
    }

    pub fn ack_index(&self) -> Option<SlotIndex> {
        self.ack_index
    }

    /// Slot of the very first accepted sequence, until it is overwritten
    pub fn first_data_index(&self) -> Option<SlotIndex> {
        self.first_data_index
    }

    /// Newest slot playback has stepped over
    pub fn application_index(&self) -> Option<SlotIndex> {
        self.application_index
    }

    pub fn valid_updates(&self) -> u64 {
        self.valid_updates
    }

    pub fn necessary_count(&self) -> usize {
        self.necessary_count
    }

    pub fn is_index_valid(&self, index: SlotIndex) -> bool {
        self.valid.get(index).copied().unwrap_or(false)
    }

    /// Server time of the snapshot stored in a valid slot
    pub fn time(&self, index: SlotIndex) -> f64 {
        self.times[index]
    }

    pub fn seq_to_index(&self, seq: SequenceNumber) -> SlotIndex {
        let size = self.size();
        let head = self.head.unwrap_or(0);
        let distance_back = usize::from(self.last_seq.wrapping_sub(seq)) % size;
        (head + size - distance_back) % size
    }

    pub fn index_to_seq(&self, index: SlotIndex) -> SequenceNumber {
        let size = self.size();
        let head = self.head.unwrap_or(0);
        let distance_back = (head + size - index) % size;
        self.last_seq.wrapping_sub(distance_back as u16)
    }

    /// Whether `seq` currently has a slot. Before the ring wraps for the first
    /// time the lower bound is the first received sequence.
    pub fn is_seq_in_bounds(&self, seq: SequenceNumber) -> bool {
        let Some(head) = self.head else {
            return false;
        };
        if self.is_empty() {
            return false;
        }

        let distance_back = usize::from(self.last_seq.wrapping_sub(seq));
        match self.first_data_index {
            Some(first) => distance_back <= self.distance_from(first, head),
            None => distance_back < self.size(),
        }
    }

    /// Whether `seq` lies ahead of the head and can be admitted without
    /// overwriting necessary data. Everything is awaited by an empty buffer.
    pub fn is_awaited(&self, seq: SequenceNumber) -> bool {
        if self.is_empty() {
            return true;
        }
        let distance = usize::from(seq.wrapping_sub(self.last_seq));
        distance > 0 && distance < self.size().saturating_sub(self.necessary_count)
    }

    /// Admits an update with sequence `seq` that was encoded against `ack`
    pub fn push_seq(&mut self, seq: SequenceNumber, ack: SequenceNumber, time: f64) -> PushResult {
        // baseline must still be held
        if ack != seq && (!self.is_seq_in_bounds(ack) || !self.valid[self.seq_to_index(ack)]) {
            return PushResult::Rejected;
        }

        if self.is_awaited(seq) {
            let cleared = match self.head {
                None => {
                    self.head = Some(0);
                    self.first_data_index = Some(0);
                    None
                }
                Some(head) => {
                    let size = self.size();
                    let distance = usize::from(seq.wrapping_sub(self.last_seq));
                    let cleared = SlotRange {
                        start: (head + 1) % size,
                        len: distance,
                        size,
                    };
                    for index in cleared.iter() {
                        self.valid[index] = false;
                        if self.first_data_index == Some(index) {
                            self.first_data_index = None;
                        }
                    }
                    self.head = Some((head + distance) % size);
                    Some(cleared)
                }
            };

            self.last_seq = seq;
            let index = self.seq_to_index(seq);
            self.store(index, ack, time);
            return PushResult::Accepted { cleared };
        }

        if self.is_seq_in_bounds(seq) {
            let index = self.seq_to_index(seq);
            if self.valid[index] {
                return PushResult::Rejected;
            }
            self.store(index, ack, time);
            return PushResult::Accepted { cleared: None };
        }

        PushResult::Rejected
    }

    fn store(&mut self, index: SlotIndex, ack: SequenceNumber, time: f64) {
        self.valid[index] = true;
        self.times[index] = time;

        let ack_is_newer = match self.ack_index {
            None => true,
            Some(ack_index) => sequence_greater_than(ack, self.index_to_seq(ack_index)),
        };
        if ack_is_newer {
            self.ack_index = Some(self.seq_to_index(ack));
        }

        self.valid_updates += 1;
        self.update_necessary_count();
    }

    /// Next valid slot after `index`, up to and including the head
    pub fn next_valid_index(&self, index: SlotIndex) -> Option<SlotIndex> {
        let head = self.head?;
        let size = self.size();
        let mut index = index;
        while index != head {
            index = (index + 1) % size;
            if self.valid[index] {
                return Some(index);
            }
        }
        None
    }

    /// Previous valid slot before `index`, never wrapping past the head
    pub fn previous_valid_index(&self, index: SlotIndex) -> Option<SlotIndex> {
        let head = self.head?;
        let size = self.size();
        let mut index = (index + size - 1) % size;
        while index != head {
            if self.valid[index] {
                return Some(index);
            }
            index = (index + size - 1) % size;
        }
        None
    }

    /// Moves the playback slot to the newest valid slot whose time is not
    /// after `time`. Returns false when no such slot is held.
    pub fn update_application_index(&mut self, time: f64) -> bool {
        let Some(mut index) = self.head else {
            return false;
        };
        while self.times[index] > time {
            match self.previous_valid_index(index) {
                Some(previous) => index = previous,
                None => return false,
            }
        }

        self.application_index = Some(index);
        self.update_necessary_count();
        true
    }

    /// Mean of the last `count` intervals between consecutive valid slots
    pub fn average_time_interval(&self, count: usize) -> f64 {
        let Some(head) = self.head else {
            return 0.0;
        };
        if self.valid_updates < 2 || count == 0 {
            return 0.0;
        }

        let mut total_time = 0.0;
        let mut total_count = 0;
        let mut next_time = self.times[head];
        let mut index = self.previous_valid_index(head);
        while let Some(previous) = index {
            if total_count >= count {
                break;
            }
            total_time += next_time - self.times[previous];
            next_time = self.times[previous];
            total_count += 1;
            index = self.previous_valid_index(previous);
        }

        if total_count == 0 {
            return 0.0;
        }
        total_time / total_count as f64
    }

    fn distance_from(&self, from: SlotIndex, to: SlotIndex) -> usize {
        (to + self.size() - from) % self.size()
    }

    fn update_necessary_count(&mut self) {
        let Some(head) = self.head else {
            return;
        };

        let application_distance = match self.application_index {
            Some(application) => self.distance_from(application, head) + INTERPOLATION_CUSHION,
            None => self
                .first_data_index
                .map(|first| self.distance_from(first, head))
                .unwrap_or(0),
        };
        let ack_distance = self
            .ack_index
            .map(|ack| self.distance_from(ack, head))
            .unwrap_or(0);

        self.necessary_count = application_distance.max(ack_distance);
    }
}
