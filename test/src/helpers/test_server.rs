use std::net::SocketAddr;

use snapwire_server::{
    ConnectEvent, DisconnectEvent, ErrorEvent, MessageEvent, PeerKey, ReplicationError, ScopeMut,
    Server, ServerConfig,
};

use super::schema::{registry, server_address, server_config};
use crate::local_socket::LocalHub;

/// A listening server plus a log of everything it reported
pub struct TestServer {
    pub server: Server,
    pub connected: Vec<PeerKey>,
    pub disconnected: Vec<(PeerKey, SocketAddr)>,
    pub messages: Vec<(PeerKey, Box<[u8]>)>,
    pub errors: Vec<ReplicationError>,
}

impl TestServer {
    pub fn listen(hub: &LocalHub) -> Self {
        Self::listen_with(hub, server_config())
    }

    pub fn listen_with(hub: &LocalHub, config: ServerConfig) -> Self {
        let mut server = Server::new(config, registry());
        server
            .listen(hub.socket(server_address()))
            .expect("server listens");
        Self {
            server,
            connected: Vec::new(),
            disconnected: Vec::new(),
            messages: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Starts a tick at server time `now`
    pub fn begin_tick(&mut self, now: f64) {
        self.server.update(now).expect("server updates");
        self.collect_events();
    }

    pub fn end_tick(&mut self) {
        self.server.flush().expect("server flushes");
        self.collect_events();
    }

    pub fn end_tick_with_scope<F>(&mut self, scope: F)
    where
        F: FnMut(PeerKey, &mut ScopeMut<'_>) -> bool,
    {
        self.server.flush_with_scope(scope).expect("server flushes");
        self.collect_events();
    }

    pub fn is_disconnected(&self, peer_key: &PeerKey) -> bool {
        self.disconnected.iter().any(|(key, _)| key == peer_key)
    }

    pub fn peer_at(&self, address: SocketAddr) -> Option<PeerKey> {
        self.server
            .peer_keys()
            .into_iter()
            .find(|key| self.server.peer_address(key) == Some(address))
    }

    fn collect_events(&mut self) {
        let mut events = self.server.receive();
        self.connected.extend(events.read::<ConnectEvent>());
        self.disconnected.extend(events.read::<DisconnectEvent>());
        self.messages.extend(events.read::<MessageEvent>());
        self.errors.extend(events.read::<ErrorEvent>());
    }
}
