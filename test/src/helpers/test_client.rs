use std::{collections::BTreeSet, net::SocketAddr};

use snapwire_client::{
    Client, ClientConfig, ClientStatus, ConnectionState, CreateEvent, DestroyEvent, MessageEvent,
    ReplicationError,
};
use snapwire_shared::ObjectId;

use super::schema::{client_config, registry, server_address};
use crate::local_socket::LocalHub;

/// A client plus a log of everything it reported
pub struct TestClient {
    pub client: Client,
    pub address: SocketAddr,
    pub status: Option<ClientStatus>,
    pub created: Vec<CreateEvent>,
    pub destroyed: Vec<DestroyEvent>,
    pub messages: Vec<Box<[u8]>>,
    pub errors: Vec<ReplicationError>,
    visible: BTreeSet<ObjectId>,
}

impl TestClient {
    pub fn open(hub: &LocalHub, address: SocketAddr, now: f64) -> Self {
        Self::open_with(hub, address, client_config(), now)
    }

    pub fn open_with(hub: &LocalHub, address: SocketAddr, config: ClientConfig, now: f64) -> Self {
        let mut client = Client::new(config, registry());
        client
            .open(hub.socket(address), server_address(), now)
            .expect("client opens");
        Self {
            client,
            address,
            status: None,
            created: Vec::new(),
            destroyed: Vec::new(),
            messages: Vec::new(),
            errors: Vec::new(),
            visible: BTreeSet::new(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.client.is_connected()
    }

    pub fn is_closed(&self) -> bool {
        self.client.connection_state() == ConnectionState::Closed
    }

    /// Objects created and not yet destroyed, per the events received
    pub fn visible(&self) -> &BTreeSet<ObjectId> {
        &self.visible
    }

    /// Updates the client at local time `now`, records its events and sends
    /// its acknowledgement
    pub fn step(&mut self, now: f64) {
        if self.is_closed() {
            return;
        }
        match self.client.update(now) {
            Ok(status) => self.status = Some(status),
            Err(error) => {
                self.errors.push(error);
                self.collect_events();
                return;
            }
        }
        self.collect_events();
        if let Err(error) = self.client.flush() {
            self.errors.push(error);
        }
    }

    fn collect_events(&mut self) {
        let mut events = self.client.receive();
        for event in events.read::<CreateEvent>() {
            self.visible.insert(event.object);
            self.created.push(event);
        }
        for event in events.read::<DestroyEvent>() {
            self.visible.remove(&event.object);
            self.destroyed.push(event);
        }
        self.messages.extend(events.read::<MessageEvent>());
    }
}
