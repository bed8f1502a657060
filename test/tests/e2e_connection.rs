/// End-to-end tests for the connection handshake, liveness and teardown
/// between a server and its clients over the in-memory network

use std::net::SocketAddr;

use snapwire_client::{ClientStatus, ConnectionState, DisconnectReason, ReplicationError};
use snapwire_server::{ServerConfig, UsageError};
use snapwire_shared::{
    ByteReader, ConnectHeader, ConnectionConfig, Header, PacketKind, PacketReceiver, PacketSender,
    Socket, StandardHeader,
};
use snapwire_test::{
    client_config, server_address, server_config, LocalHub, TestNetwork, APPLICATION_ID,
    TICK_INTERVAL,
};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A hand-driven peer speaking raw datagrams to the server
struct RawPeer {
    sender: Box<dyn PacketSender>,
    receiver: Box<dyn PacketReceiver>,
}

impl RawPeer {
    fn new(hub: &LocalHub, address: SocketAddr) -> Self {
        let (sender, receiver) = Box::new(hub.socket(address)).split().unwrap();
        Self { sender, receiver }
    }

    fn send(&self, datagram: &[u8]) {
        self.sender.send(&server_address(), datagram).unwrap();
    }

    fn received_headers(&mut self) -> Vec<Header> {
        let mut headers = Vec::new();
        while let Some((_, datagram)) = self.receiver.receive().unwrap() {
            headers.push(Header::read(&mut ByteReader::new(datagram)).unwrap());
        }
        headers
    }
}

#[test]
fn clients_connect_and_start_playback() {
    init();
    let mut network = TestNetwork::new(1, 2);

    network.connect_all();
    assert_eq!(network.server.connected.len(), 2);
    assert_ne!(network.peer_of(0), network.peer_of(1));
    assert_ne!(network.peer_of(0).connection_id(), 0);

    network.run(10);
    for client in &network.clients {
        assert_eq!(client.status, Some(ClientStatus::Open));
        assert!(client.errors.is_empty());
        assert!(client.client.application_time().is_some());
    }
    assert!(network.server.errors.is_empty());
}

#[test]
fn clients_connect_through_a_lossy_network() {
    init();
    let mut network = TestNetwork::new(42, 3);
    network.hub.set_loss(0.3);

    network.connect_all();

    assert_eq!(network.server.connected.len(), 3);
    assert!(network.server.disconnected.is_empty());
}

#[test]
fn foreign_and_garbage_datagrams_are_dropped() {
    init();
    let mut network = TestNetwork::new(2, 0);
    let mut peer = RawPeer::new(&network.hub, "10.0.2.1:5000".parse().unwrap());

    peer.send(&ConnectHeader::new(APPLICATION_ID + 1, 0).to_bytes());
    peer.send(&[1, 2, 3]);
    network.tick();
    assert!(peer.received_headers().is_empty());

    peer.send(&ConnectHeader::new(APPLICATION_ID, 0).to_bytes());
    network.tick();
    let headers = peer.received_headers();
    assert_eq!(headers.len(), 1);
    assert!(matches!(headers[0], Header::Connect(header) if header.connection_id != 0));
    assert!(network.server.connected.is_empty());
}

#[test]
fn unknown_connection_is_told_to_disconnect() {
    init();
    let mut network = TestNetwork::new(3, 0);
    let mut peer = RawPeer::new(&network.hub, "10.0.2.1:5000".parse().unwrap());

    peer.send(&StandardHeader::new(APPLICATION_ID, 12345, PacketKind::Update).to_bytes());
    network.tick();

    assert_eq!(
        peer.received_headers(),
        vec![Header::Standard(StandardHeader::new(
            APPLICATION_ID,
            12345,
            PacketKind::Disconnect
        ))]
    );
}

#[test]
fn handshake_promotes_a_raw_peer() {
    init();
    let mut network = TestNetwork::new(4, 0);
    let mut peer = RawPeer::new(&network.hub, "10.0.2.1:5000".parse().unwrap());

    peer.send(&ConnectHeader::new(APPLICATION_ID, 0).to_bytes());
    network.tick();
    let Header::Connect(reply) = peer.received_headers()[0] else {
        panic!("expected a connection reply");
    };

    peer.send(
        &StandardHeader::new(APPLICATION_ID, reply.connection_id, PacketKind::Handshake).to_bytes(),
    );
    network.tick();

    assert_eq!(network.server.connected.len(), 1);
    assert_eq!(network.server.connected[0].connection_id(), reply.connection_id);
    // the first update follows right away
    assert!(peer.received_headers().iter().any(|header| matches!(
        header,
        Header::Standard(header) if header.kind == PacketKind::Update
    )));
}

#[test]
fn client_close_disconnects_the_peer() {
    init();
    let mut network = TestNetwork::new(5, 2);
    network.connect_all();
    let leaving = network.peer_of(0);

    network.clients[0].client.close();
    network.tick();

    assert_eq!(network.server.disconnected.len(), 1);
    assert_eq!(network.server.disconnected[0].0, leaving);
    assert_eq!(network.server.server.peers_count(), 1);
    assert!(network.clients[0].is_closed());
    assert!(network.clients[1].is_connected());
}

#[test]
fn server_close_disconnects_every_client() {
    init();
    let mut network = TestNetwork::new(6, 2);
    network.connect_all();

    network.server.server.close();
    assert!(!network.server.server.is_listening());
    assert_eq!(
        network.server.server.update(network.now + TICK_INTERVAL),
        Err(UsageError::NotConnected.into())
    );

    network.now += TICK_INTERVAL;
    for client in network.clients.iter_mut() {
        client.step(network.now);
        assert_eq!(
            client.errors,
            vec![ReplicationError::Disconnected(DisconnectReason::RemoteClosed)]
        );
        assert_eq!(client.client.connection_state(), ConnectionState::Closed);
    }
}

#[test]
fn silent_peers_time_out_on_both_sides() {
    init();
    let connection = ConnectionConfig {
        disconnection_timeout: std::time::Duration::from_secs(1),
        ..ConnectionConfig::default()
    };
    let server_config = ServerConfig {
        connection: connection.clone(),
        ..server_config()
    };
    let client_config = snapwire_client::ClientConfig {
        connection,
        ..client_config()
    };
    let mut network = TestNetwork::with_configs(7, 2, server_config, client_config);
    network.connect_all();
    let silent = network.peer_of(0);

    network.hub.set_partitioned(network.clients[0].address, true);
    network.run(30);

    assert!(network.server.is_disconnected(&silent));
    assert!(network.server.errors.is_empty());
    assert!(matches!(
        network.clients[0].errors.as_slice(),
        [ReplicationError::Disconnected(DisconnectReason::TimedOut { .. })]
    ));
    assert!(network.clients[1].is_connected());
    assert_eq!(network.server.server.peers_count(), 1);
}

#[test]
fn time_going_backwards_is_a_usage_error() {
    init();
    let mut network = TestNetwork::new(8, 1);
    network.run(2);

    assert_eq!(
        network.server.server.update(network.now - 1.0),
        Err(UsageError::TimeWentBackwards {
            previous: network.now,
            time: network.now - 1.0,
        }
        .into())
    );
}
