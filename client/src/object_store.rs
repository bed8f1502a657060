use std::collections::BTreeMap;

use snapwire_shared::{ClassId, ObjectId, SlotIndex};

use crate::history_buffer::ClientHistoryBuffer;

/// What a received update said about an object in one slot
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SnapshotState {
    Empty,
    Updated,
    Created,
    Destroyed,
    CreatedAndDestroyed,
}

/// Per-slot snapshots of one replicated object
pub struct ClientObject {
    id: ObjectId,
    class_id: ClassId,
    snapshots: Vec<Option<Box<[u8]>>>,
    states: Vec<SnapshotState>,
    births: Vec<bool>,
    deaths: Vec<bool>,
    metadata: Option<Box<[u8]>>,
    alive: bool,
}

impl ClientObject {
    fn new(id: ObjectId, class_id: ClassId, size: usize) -> Self {
        Self {
            id,
            class_id,
            snapshots: vec![None; size],
            states: vec![SnapshotState::Empty; size],
            births: vec![false; size],
            deaths: vec![false; size],
            metadata: None,
            alive: false,
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn class_id(&self) -> ClassId {
        self.class_id
    }

    pub fn snapshot(&self, index: SlotIndex) -> Option<&[u8]> {
        self.snapshots[index].as_deref()
    }

    pub fn state(&self, index: SlotIndex) -> SnapshotState {
        self.states[index]
    }

    pub fn birth(&self, index: SlotIndex) -> bool {
        self.births[index]
    }

    pub fn death(&self, index: SlotIndex) -> bool {
        self.deaths[index]
    }

    pub fn set_snapshot(
        &mut self,
        index: SlotIndex,
        data: Box<[u8]>,
        state: SnapshotState,
        birth: bool,
        death: bool,
    ) {
        self.snapshots[index] = Some(data);
        self.states[index] = state;
        self.births[index] = birth;
        self.deaths[index] = death;
    }

    fn clear(&mut self, index: SlotIndex) {
        self.snapshots[index] = None;
        self.states[index] = SnapshotState::Empty;
        self.births[index] = false;
        self.deaths[index] = false;
    }

    fn holds_data(&self, history: &ClientHistoryBuffer) -> bool {
        self.snapshots
            .iter()
            .enumerate()
            .any(|(index, snapshot)| snapshot.is_some() && history.is_index_valid(index))
    }

    pub fn metadata(&self) -> Option<&[u8]> {
        self.metadata.as_deref()
    }

    /// Stores creation metadata unless some was already received
    pub fn offer_metadata(&mut self, metadata: Box<[u8]>) {
        if self.metadata.is_none() {
            self.metadata = Some(metadata);
        }
    }

    /// Whether the application has been told about this object and not yet
    /// about its destruction
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn set_alive(&mut self, alive: bool) {
        self.alive = alive;
    }
}

/// Every object the client has received data for
pub struct ClientObjectStore {
    objects: BTreeMap<ObjectId, ClientObject>,
    packet_objects: Vec<Vec<ObjectId>>,
    size: usize,
}

impl ClientObjectStore {
    pub fn new(size: usize) -> Self {
        Self {
            objects: BTreeMap::new(),
            packet_objects: vec![Vec::new(); size],
            size,
        }
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.objects.contains_key(id)
    }

    pub fn get(&self, id: &ObjectId) -> Option<&ClientObject> {
        self.objects.get(id)
    }

    pub fn get_mut(&mut self, id: &ObjectId) -> Option<&mut ClientObject> {
        self.objects.get_mut(id)
    }

    pub fn insert(&mut self, id: ObjectId, class_id: ClassId) -> &mut ClientObject {
        let size = self.size;
        self.objects
            .entry(id)
            .or_insert_with(|| ClientObject::new(id, class_id, size))
    }

    /// Every object, in id order
    pub fn objects_mut(&mut self) -> impl Iterator<Item = &mut ClientObject> {
        self.objects.values_mut()
    }

    /// Objects whose data in `index` can serve as a diff baseline, in the
    /// order the server wrote them
    pub fn packet_objects(&self, index: SlotIndex) -> &[ObjectId] {
        &self.packet_objects[index]
    }

    pub fn add_to_packet(&mut self, index: SlotIndex, id: ObjectId) {
        self.packet_objects[index].push(id);
    }

    /// Drops every snapshot held in an invalidated slot
    pub fn clear_slot(&mut self, index: SlotIndex) {
        self.packet_objects[index].clear();
        for object in self.objects.values_mut() {
            object.clear(index);
        }
    }

    /// Removes objects that no longer hold data in any valid slot. Returns the
    /// ids of removed objects the application still considered alive.
    pub fn retire_unused(&mut self, history: &ClientHistoryBuffer) -> Vec<ObjectId> {
        let mut orphaned = Vec::new();
        self.objects.retain(|id, object| {
            if object.holds_data(history) {
                return true;
            }
            if object.alive {
                orphaned.push(*id);
            }
            false
        });
        orphaned
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
