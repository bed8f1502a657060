use std::collections::BTreeSet;

use snapwire_shared::{ObjectId, UsageError};

use crate::{object_store::ServerObjectStore, peer::PeerKey};

/// The set of objects one peer is sent in the update being flushed
pub struct ScopeMut<'s> {
    store: &'s ServerObjectStore,
    key: PeerKey,
    objects: BTreeSet<ObjectId>,
}

impl<'s> ScopeMut<'s> {
    pub(crate) fn new(store: &'s ServerObjectStore, key: PeerKey) -> Self {
        Self {
            store,
            key,
            objects: BTreeSet::new(),
        }
    }

    /// Peer the scope is being built for
    pub fn peer(&self) -> PeerKey {
        self.key
    }

    /// Returns true if the scope contains the object
    pub fn has(&self, object_id: &ObjectId) -> bool {
        self.objects.contains(object_id)
    }

    /// Adds an object to the scope. Destroyed objects cannot be added.
    pub fn include(&mut self, object_id: ObjectId) -> Result<&mut Self, UsageError> {
        self.store.live_object(object_id)?;
        self.objects.insert(object_id);
        Ok(self)
    }

    /// Removes an object from the scope
    pub fn exclude(&mut self, object_id: &ObjectId) -> &mut Self {
        self.objects.remove(object_id);
        self
    }

    /// Removes all objects from the scope
    pub fn clear(&mut self) -> &mut Self {
        self.objects.clear();
        self
    }

    /// Adds every object not destroyed
    pub(crate) fn include_all(&mut self) {
        self.objects.extend(self.store.live_ids());
    }

    pub(crate) fn into_objects(self) -> BTreeSet<ObjectId> {
        self.objects
    }
}
