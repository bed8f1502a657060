use std::collections::HashMap;

use crate::{error::UsageError, schema::object_class::ObjectClass, types::ClassId};

/// Every object class known to a client or server. Classes can only be added
/// until the owning host opens its connection.
#[derive(Clone, Debug, Default)]
pub struct ClassRegistry {
    classes: HashMap<ClassId, ObjectClass>,
    locked: bool,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, class: ObjectClass) -> Result<(), UsageError> {
        if self.locked {
            return Err(UsageError::RegistryLocked);
        }
        if self.classes.contains_key(&class.id()) {
            return Err(UsageError::DuplicateClass { class_id: class.id() });
        }
        self.classes.insert(class.id(), class);
        Ok(())
    }

    /// Builder-style registration for setting up a registry in one expression
    pub fn with_class(mut self, class: ObjectClass) -> Result<Self, UsageError> {
        self.register(class)?;
        Ok(self)
    }

    pub fn get(&self, class_id: ClassId) -> Option<&ObjectClass> {
        self.classes.get(&class_id)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }
}
