use snapwire_client::ClientConfig;
use snapwire_server::{PeerKey, ScopeMut, Server, ServerConfig};

use super::{
    schema::{client_address, client_config, server_config, TICK_INTERVAL},
    test_client::TestClient,
    test_server::TestServer,
};
use crate::local_socket::LocalHub;

/// A server and its clients sharing one in-memory network, stepped in lock
/// step one server tick at a time
pub struct TestNetwork {
    pub hub: LocalHub,
    pub now: f64,
    pub server: TestServer,
    pub clients: Vec<TestClient>,
}

impl TestNetwork {
    pub fn new(seed: u64, client_count: usize) -> Self {
        Self::with_configs(seed, client_count, server_config(), client_config())
    }

    pub fn with_configs(
        seed: u64,
        client_count: usize,
        server_config: ServerConfig,
        client_config: ClientConfig,
    ) -> Self {
        let hub = LocalHub::new(seed);
        let server = TestServer::listen_with(&hub, server_config);
        let clients = (0..client_count)
            .map(|index| TestClient::open_with(&hub, client_address(index), client_config.clone(), 0.0))
            .collect();
        Self {
            hub,
            now: 0.0,
            server,
            clients,
        }
    }

    pub fn tick(&mut self) {
        self.tick_with(|_| {});
    }

    /// Runs one tick, letting `mutate` change objects between the server's
    /// update and flush
    pub fn tick_with<F: FnOnce(&mut Server)>(&mut self, mutate: F) {
        self.now += TICK_INTERVAL;
        self.server.begin_tick(self.now);
        mutate(&mut self.server.server);
        self.server.end_tick();
        self.step_clients();
    }

    /// Runs one tick flushed with a custom scope
    pub fn tick_with_scope<F>(&mut self, scope: F)
    where
        F: FnMut(PeerKey, &mut ScopeMut<'_>) -> bool,
    {
        self.now += TICK_INTERVAL;
        self.server.begin_tick(self.now);
        self.server.end_tick_with_scope(scope);
        self.step_clients();
    }

    /// Runs one tick where `mutate` changes objects and the flush uses a
    /// custom scope, so new objects never reach peers outside it
    pub fn tick_scoped_with<M, F>(&mut self, mutate: M, scope: F)
    where
        M: FnOnce(&mut Server),
        F: FnMut(PeerKey, &mut ScopeMut<'_>) -> bool,
    {
        self.now += TICK_INTERVAL;
        self.server.begin_tick(self.now);
        mutate(&mut self.server.server);
        self.server.end_tick_with_scope(scope);
        self.step_clients();
    }

    pub fn run(&mut self, ticks: usize) {
        for _ in 0..ticks {
            self.tick();
        }
    }

    /// Ticks until `done` holds, at most `max_ticks` times. Returns whether
    /// it held.
    pub fn run_until<F: Fn(&Self) -> bool>(&mut self, max_ticks: usize, done: F) -> bool {
        for _ in 0..max_ticks {
            if done(self) {
                return true;
            }
            self.tick();
        }
        done(self)
    }

    /// Ticks until every client is connected and known to the server
    pub fn connect_all(&mut self) {
        let client_count = self.clients.len();
        let connected = self.run_until(400, |network| {
            network.server.server.peers_count() == client_count
                && network.clients.iter().all(TestClient::is_connected)
        });
        assert!(connected, "clients failed to connect");
    }

    /// Peer key the server assigned to a client
    pub fn peer_of(&self, client: usize) -> PeerKey {
        self.server
            .peer_at(self.clients[client].address)
            .expect("client is connected")
    }

    fn step_clients(&mut self) {
        for client in self.clients.iter_mut() {
            client.step(self.now);
        }
    }
}
