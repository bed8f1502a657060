use snapwire_shared::{sequence_distance, SequenceNumber, SlotIndex};

/// Slots touched by one tick advance
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TickAdvance {
    /// Slot the new tick writes into, whatever it held before is stale
    pub current: SlotIndex,
    /// Slot of the tick before, `None` on the very first tick
    pub previous: Option<SlotIndex>,
}

/// Ring of the most recent server ticks.
///
/// Every tick owns one slot. The first tick is sequence 0 in slot 0, and each
/// later tick advances both by one, so the slot of a sequence still held is
/// an affine function of it.
pub struct ServerHistoryBuffer {
    times: Vec<f64>,
    current: Option<SlotIndex>,
    current_seq: SequenceNumber,
    ticks: u64,
}

impl ServerHistoryBuffer {
    pub fn new(size: usize) -> Self {
        Self {
            times: vec![0.0; size.max(2)],
            current: None,
            current_seq: 0,
            ticks: 0,
        }
    }

    pub fn size(&self) -> usize {
        self.times.len()
    }

    /// Starts a new tick at server time `time`
    pub fn add_seq(&mut self, time: f64) -> TickAdvance {
        let previous = self.current;
        let current = match previous {
            None => 0,
            Some(previous) => {
                self.current_seq = self.current_seq.wrapping_add(1);
                (previous + 1) % self.size()
            }
        };

        self.current = Some(current);
        self.times[current] = time;
        self.ticks += 1;

        TickAdvance { current, previous }
    }

    /// Slot of the running tick, `None` before the first one
    pub fn current_index(&self) -> Option<SlotIndex> {
        self.current
    }

    pub fn current_seq(&self) -> SequenceNumber {
        self.current_seq
    }

    pub fn time(&self, index: SlotIndex) -> f64 {
        self.times[index]
    }

    /// Whether `seq` is one of the ticks still held in the ring
    pub fn is_seq_in_bounds(&self, seq: SequenceNumber) -> bool {
        if self.current.is_none() {
            return false;
        }
        let held = self.ticks.min(self.size() as u64);
        u64::from(sequence_distance(seq, self.current_seq)) < held
    }

    /// Only meaningful for sequences in bounds
    pub fn seq_to_index(&self, seq: SequenceNumber) -> SlotIndex {
        let current = self.current.unwrap_or(0);
        let back = usize::from(sequence_distance(seq, self.current_seq)) % self.size();
        (current + self.size() - back) % self.size()
    }

    pub fn index_to_seq(&self, index: SlotIndex) -> SequenceNumber {
        let current = self.current.unwrap_or(0);
        let back = (current + self.size() - index) % self.size();
        self.current_seq.wrapping_sub(back as SequenceNumber)
    }

    /// Slots from the one after `from` up to, but excluding, the current one
    pub fn slots_after(&self, from: SlotIndex) -> impl Iterator<Item = SlotIndex> + '_ {
        let current = self.current.unwrap_or(0);
        let size = self.size();
        let count = if from == current {
            0
        } else {
            (current + size - from - 1) % size
        };
        (1..=count).map(move |step| (from + step) % size)
    }

    /// Slots from `from` up to, but excluding, the current one
    pub fn slots_since(&self, from: SlotIndex) -> impl Iterator<Item = SlotIndex> + '_ {
        let current = self.current.unwrap_or(0);
        let size = self.size();
        let count = (current + size - from) % size;
        (0..count).map(move |step| (from + step) % size)
    }
}
