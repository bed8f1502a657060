use std::collections::BTreeMap;

use log::trace;

use snapwire_shared::{
    ClassId, ObjectClass, ObjectId, SlotIndex, UsageError, MAX_METADATA_SIZE,
};

use crate::history_buffer::TickAdvance;

/// An authoritative object and its snapshot in every tick still held
pub struct ServerObject {
    id: ObjectId,
    class_id: ClassId,
    snapshots: Vec<Option<Box<[u8]>>>,
    creation_index: Option<SlotIndex>,
    destroy_index: Option<SlotIndex>,
    metadata: Option<Box<[u8]>>,
}

impl ServerObject {
    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn class_id(&self) -> ClassId {
        self.class_id
    }

    pub fn snapshot(&self, index: SlotIndex) -> Option<&[u8]> {
        self.snapshots[index].as_deref()
    }

    pub fn snapshot_mut(&mut self, index: SlotIndex) -> Option<&mut [u8]> {
        self.snapshots[index].as_deref_mut()
    }

    /// Slot of the tick the object was created in, while that tick is held
    pub fn creation_index(&self) -> Option<SlotIndex> {
        self.creation_index
    }

    pub fn destroy_index(&self) -> Option<SlotIndex> {
        self.destroy_index
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroy_index.is_some()
    }

    pub fn metadata(&self) -> Option<&[u8]> {
        self.metadata.as_deref()
    }

    /// Newest snapshot of a destroyed object, or the one in `index` otherwise
    pub fn last_snapshot(&self, index: SlotIndex) -> Option<&[u8]> {
        self.snapshot(index)
            .or_else(|| self.destroy_index.and_then(|destroyed| self.snapshot(destroyed)))
    }

    fn clear(&mut self, advance: TickAdvance) {
        let TickAdvance { current, previous } = advance;

        if self.creation_index == Some(current) {
            self.creation_index = None;
        }
        self.snapshots[current] = match previous {
            Some(previous) if self.destroy_index != Some(previous) => {
                self.snapshots[previous].clone()
            }
            _ => None,
        };
    }
}

/// Every object the server replicates, keyed by id
pub struct ServerObjectStore {
    objects: BTreeMap<ObjectId, ServerObject>,
    last_id: ObjectId,
    size: usize,
}

impl ServerObjectStore {
    pub fn new(size: usize) -> Self {
        Self {
            objects: BTreeMap::new(),
            last_id: 0,
            size,
        }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn get(&self, id: &ObjectId) -> Option<&ServerObject> {
        self.objects.get(id)
    }

    /// Creates a zeroed object of `class` in the running tick
    pub fn create(
        &mut self,
        class: &ObjectClass,
        current: Option<SlotIndex>,
        metadata: Option<&[u8]>,
    ) -> Result<ObjectId, UsageError> {
        let current = current.ok_or(UsageError::NoActiveTick)?;
        if let Some(metadata) = metadata {
            if metadata.len() > MAX_METADATA_SIZE {
                return Err(UsageError::MetadataTooLarge {
                    size: metadata.len(),
                    max: MAX_METADATA_SIZE,
                });
            }
        }

        self.last_id = self.last_id.wrapping_add(1);
        while self.last_id == 0 || self.objects.contains_key(&self.last_id) {
            self.last_id = self.last_id.wrapping_add(1);
        }
        let id = self.last_id;

        let mut snapshots = vec![None; self.size];
        snapshots[current] = Some(class.empty_snapshot());
        self.objects.insert(
            id,
            ServerObject {
                id,
                class_id: class.id(),
                snapshots,
                creation_index: Some(current),
                destroy_index: None,
                metadata: metadata.map(Box::from),
            },
        );

        trace!("created object {} of class {} in slot {}", id, class.id(), current);
        Ok(id)
    }

    /// An object the application may still modify
    pub fn live_object(&self, id: ObjectId) -> Result<&ServerObject, UsageError> {
        let object = self
            .objects
            .get(&id)
            .ok_or(UsageError::ObjectNotFound { object_id: id })?;
        if object.is_destroyed() {
            return Err(UsageError::ObjectDestroyed { object_id: id });
        }
        Ok(object)
    }

    pub fn live_object_mut(&mut self, id: ObjectId) -> Result<&mut ServerObject, UsageError> {
        let object = self
            .objects
            .get_mut(&id)
            .ok_or(UsageError::ObjectNotFound { object_id: id })?;
        if object.is_destroyed() {
            return Err(UsageError::ObjectDestroyed { object_id: id });
        }
        Ok(object)
    }

    /// Marks the object destroyed in the running tick. It is retired once
    /// that tick leaves the history.
    pub fn destroy(&mut self, id: ObjectId, current: Option<SlotIndex>) -> Result<(), UsageError> {
        let current = current.ok_or(UsageError::NoActiveTick)?;
        let object = self.live_object_mut(id)?;
        object.destroy_index = Some(current);
        trace!("destroyed object {} in slot {}", id, current);
        Ok(())
    }

    /// Ids of every object not destroyed, in ascending order
    pub fn live_ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.objects
            .values()
            .filter(|object| !object.is_destroyed())
            .map(|object| object.id)
    }

    /// Prepares `advance.current` for the new tick. Objects destroyed in the
    /// tick being overwritten are retired, every other object carries its
    /// previous snapshot forward.
    pub fn clear_slot(&mut self, advance: TickAdvance) {
        self.objects.retain(|id, object| {
            if object.destroy_index == Some(advance.current) {
                trace!("retiring object {}", id);
                return false;
            }
            object.clear(advance);
            true
        });
    }
}
