use std::{mem, vec::IntoIter};

use snapwire_shared::{ClassId, ObjectId};

/// An object became visible to the application
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateEvent {
    pub object: ObjectId,
    pub class: ClassId,
    /// True when the object was created on the server, false when it entered
    /// this client's scope
    pub birth: bool,
    pub metadata: Option<Box<[u8]>>,
}

/// An object stopped being visible to the application
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DestroyEvent {
    pub object: ObjectId,
    /// True when the object was destroyed on the server, false when it left
    /// this client's scope
    pub death: bool,
}

pub struct ClientEvents {
    creates: Vec<CreateEvent>,
    destroys: Vec<DestroyEvent>,
    messages: Vec<Box<[u8]>>,
    empty: bool,
}

impl Default for ClientEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientEvents {
    pub(crate) fn new() -> Self {
        Self {
            creates: Vec::new(),
            destroys: Vec::new(),
            messages: Vec::new(),
            empty: true,
        }
    }

    // Public

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn read<V: ClientEvent>(&mut self) -> V::Iter {
        V::iter(self)
    }

    pub fn has<V: ClientEvent>(&self) -> bool {
        V::has(self)
    }

    // Crate-public

    pub(crate) fn push_create(&mut self, event: CreateEvent) {
        self.creates.push(event);
        self.empty = false;
    }

    pub(crate) fn push_destroy(&mut self, event: DestroyEvent) {
        self.destroys.push(event);
        self.empty = false;
    }

    pub(crate) fn push_message(&mut self, payload: Box<[u8]>) {
        self.messages.push(payload);
        self.empty = false;
    }
}

// Event Trait
pub trait ClientEvent {
    type Iter;

    fn iter(events: &mut ClientEvents) -> Self::Iter;

    fn has(events: &ClientEvents) -> bool;
}

impl ClientEvent for CreateEvent {
    type Iter = IntoIter<CreateEvent>;

    fn iter(events: &mut ClientEvents) -> Self::Iter {
        mem::take(&mut events.creates).into_iter()
    }

    fn has(events: &ClientEvents) -> bool {
        !events.creates.is_empty()
    }
}

impl ClientEvent for DestroyEvent {
    type Iter = IntoIter<DestroyEvent>;

    fn iter(events: &mut ClientEvents) -> Self::Iter {
        mem::take(&mut events.destroys).into_iter()
    }

    fn has(events: &ClientEvents) -> bool {
        !events.destroys.is_empty()
    }
}

// MessageEvent
pub struct MessageEvent;
impl ClientEvent for MessageEvent {
    type Iter = IntoIter<Box<[u8]>>;

    fn iter(events: &mut ClientEvents) -> Self::Iter {
        mem::take(&mut events.messages).into_iter()
    }

    fn has(events: &ClientEvents) -> bool {
        !events.messages.is_empty()
    }
}
