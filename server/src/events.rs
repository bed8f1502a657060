use std::{mem, net::SocketAddr, vec::IntoIter};

use snapwire_shared::ReplicationError;

use crate::peer::PeerKey;

pub struct ServerEvents {
    connections: Vec<PeerKey>,
    disconnections: Vec<(PeerKey, SocketAddr)>,
    messages: Vec<(PeerKey, Box<[u8]>)>,
    errors: Vec<ReplicationError>,
    empty: bool,
}

impl Default for ServerEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerEvents {
    pub(crate) fn new() -> Self {
        Self {
            connections: Vec::new(),
            disconnections: Vec::new(),
            messages: Vec::new(),
            errors: Vec::new(),
            empty: true,
        }
    }

    // Public

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn read<V: ServerEvent>(&mut self) -> V::Iter {
        V::iter(self)
    }

    pub fn has<V: ServerEvent>(&self) -> bool {
        V::has(self)
    }

    // Crate-public

    pub(crate) fn push_connection(&mut self, peer_key: &PeerKey) {
        self.connections.push(*peer_key);
        self.empty = false;
    }

    pub(crate) fn push_disconnection(&mut self, peer_key: &PeerKey, address: SocketAddr) {
        self.disconnections.push((*peer_key, address));
        self.empty = false;
    }

    pub(crate) fn push_message(&mut self, peer_key: &PeerKey, payload: Box<[u8]>) {
        self.messages.push((*peer_key, payload));
        self.empty = false;
    }

    pub(crate) fn push_error(&mut self, error: ReplicationError) {
        self.errors.push(error);
        self.empty = false;
    }
}

// Event Trait
pub trait ServerEvent {
    type Iter;

    fn iter(events: &mut ServerEvents) -> Self::Iter;

    fn has(events: &ServerEvents) -> bool;
}

// ConnectEvent
pub struct ConnectEvent;
impl ServerEvent for ConnectEvent {
    type Iter = IntoIter<PeerKey>;

    fn iter(events: &mut ServerEvents) -> Self::Iter {
        mem::take(&mut events.connections).into_iter()
    }

    fn has(events: &ServerEvents) -> bool {
        !events.connections.is_empty()
    }
}

// DisconnectEvent
pub struct DisconnectEvent;
impl ServerEvent for DisconnectEvent {
    type Iter = IntoIter<(PeerKey, SocketAddr)>;

    fn iter(events: &mut ServerEvents) -> Self::Iter {
        mem::take(&mut events.disconnections).into_iter()
    }

    fn has(events: &ServerEvents) -> bool {
        !events.disconnections.is_empty()
    }
}

// MessageEvent
pub struct MessageEvent;
impl ServerEvent for MessageEvent {
    type Iter = IntoIter<(PeerKey, Box<[u8]>)>;

    fn iter(events: &mut ServerEvents) -> Self::Iter {
        mem::take(&mut events.messages).into_iter()
    }

    fn has(events: &ServerEvents) -> bool {
        !events.messages.is_empty()
    }
}

// ErrorEvent
pub struct ErrorEvent;
impl ServerEvent for ErrorEvent {
    type Iter = IntoIter<ReplicationError>;

    fn iter(events: &mut ServerEvents) -> Self::Iter {
        mem::take(&mut events.errors).into_iter()
    }

    fn has(events: &ServerEvents) -> bool {
        !events.errors.is_empty()
    }
}
