use log::{debug, trace};

use snapwire_shared::{LibraryError, SlotIndex};

use crate::{
    client_config::ClientConfig,
    events::{ClientEvents, CreateEvent, DestroyEvent},
    history_buffer::ClientHistoryBuffer,
    object_store::{ClientObject, ClientObjectStore, SnapshotState},
};

/// Whether the client has buffered enough updates to start playback
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ClientStatus {
    Connecting,
    Handshaking,
    Buffering,
    Open,
}

/// Drives application time through the history buffer.
///
/// Application time trails the newest received update by a fixed number of
/// update intervals. The offset between local time and application time is
/// nudged toward that target at a bounded rate, so playback speeds up or
/// slows down smoothly instead of jumping.
pub struct PlaybackScheduler {
    minimal_packet_count: u64,
    interpolation_latency: f64,
    maximal_speedup: f64,
    time_interval_average_count: usize,
    time_overlap: f64,
    application_time: Option<f64>,
}

impl PlaybackScheduler {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            minimal_packet_count: config.minimal_packet_count,
            interpolation_latency: config.interpolation_latency,
            maximal_speedup: config.maximal_speedup,
            time_interval_average_count: config.time_interval_average_count,
            time_overlap: 0.0,
            application_time: None,
        }
    }

    /// Server time the application currently observes
    pub fn application_time(&self) -> Option<f64> {
        self.application_time
    }

    pub fn is_buffering(&self, history: &ClientHistoryBuffer) -> bool {
        history.valid_updates() < self.minimal_packet_count
    }

    /// Advances application time to match local time `now`, `elapsed` seconds
    /// after the previous step, and reports the create & destroy transitions
    /// of every slot stepped over.
    pub fn advance(
        &mut self,
        now: f64,
        elapsed: f64,
        history: &mut ClientHistoryBuffer,
        store: &mut ClientObjectStore,
        events: &mut ClientEvents,
    ) -> Result<ClientStatus, LibraryError> {
        if self.is_buffering(history) {
            return Ok(ClientStatus::Buffering);
        }
        let Some(last_index) = history.last_index() else {
            return Ok(ClientStatus::Buffering);
        };

        let average_interval = history.average_time_interval(self.time_interval_average_count);
        let optimal_time = history.time(last_index) - self.interpolation_latency * average_interval;

        let current_index = history.application_index();
        if current_index.is_none() {
            self.time_overlap = optimal_time - now;
        } else {
            let overlap_diff = optimal_time - now - self.time_overlap;
            let step = overlap_diff
                .abs()
                .min(elapsed * (self.maximal_speedup - 1.0));
            self.time_overlap += step.copysign(overlap_diff);
        }

        let application_time = now + self.time_overlap;
        if !history.update_application_index(application_time) {
            return Err(LibraryError::PlaybackOutOfHistory {
                time: application_time,
            });
        }
        let Some(target_index) = history.application_index() else {
            return Err(LibraryError::PlaybackOutOfHistory {
                time: application_time,
            });
        };

        let first_index = match current_index {
            None => Some(
                history
                    .first_data_index()
                    .ok_or(LibraryError::MissingFirstSnapshot)?,
            ),
            // the current slot was already processed by the previous step
            Some(current) if current == target_index => None,
            Some(current) => history.next_valid_index(current),
        };

        if let Some(first_index) = first_index {
            debug!(
                "playback {:.3} walking slots {} to {}",
                application_time, first_index, target_index
            );
            walk_slots(first_index, target_index, history, store, events);
        }

        self.application_time = Some(application_time);
        Ok(ClientStatus::Open)
    }
}

fn walk_slots(
    first_index: SlotIndex,
    target_index: SlotIndex,
    history: &ClientHistoryBuffer,
    store: &mut ClientObjectStore,
    events: &mut ClientEvents,
) {
    let mut previous_index = history.previous_valid_index(first_index);
    let mut index = first_index;
    loop {
        for object in store.objects_mut() {
            apply_transition(object, index, previous_index, events);
        }

        if index == target_index {
            break;
        }
        previous_index = Some(index);
        match history.next_valid_index(index) {
            Some(next) => index = next,
            None => break,
        }
    }
}

fn apply_transition(
    object: &mut ClientObject,
    index: SlotIndex,
    previous_index: Option<SlotIndex>,
    events: &mut ClientEvents,
) {
    let current = object.state(index);
    let previous = previous_index
        .map(|previous| object.state(previous))
        .unwrap_or(SnapshotState::Empty);

    let (create, destroy) = match (object.is_alive(), current) {
        (_, SnapshotState::Empty) => (false, false),
        (true, SnapshotState::Destroyed | SnapshotState::CreatedAndDestroyed) => (false, true),
        (true, _) => (false, false),
        (false, SnapshotState::Updated | SnapshotState::Created) => (true, false),
        (false, SnapshotState::CreatedAndDestroyed) => {
            let repeated = previous == SnapshotState::CreatedAndDestroyed;
            (!repeated, !repeated)
        }
        (false, SnapshotState::Destroyed) => (false, false),
    };

    if create {
        trace!("object {} created at slot {}", object.id(), index);
        object.set_alive(true);
        events.push_create(CreateEvent {
            object: object.id(),
            class: object.class_id(),
            birth: object.birth(index),
            metadata: object.metadata().map(Box::from),
        });
    }
    if destroy {
        trace!("object {} destroyed at slot {}", object.id(), index);
        object.set_alive(false);
        events.push_destroy(DestroyEvent {
            object: object.id(),
            death: object.death(index),
        });
    }
}
