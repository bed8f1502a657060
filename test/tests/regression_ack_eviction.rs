/// Regression tests for peers that fall behind the server's history:
/// a stale acknowledgement or a peer that never acknowledges must only
/// cost that peer its connection, never the other peers their updates

use std::net::SocketAddr;

use snapwire_server::{DisconnectReason, ReplicationError, ServerConfig};
use snapwire_shared::{
    ByteReader, ConnectHeader, Header, PacketKind, ReliableMessageBuffer, Socket, StandardHeader,
};
use snapwire_test::{client_config, server_address, server_config, TestNetwork, APPLICATION_ID};

const SERVER_HISTORY: usize = 16;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn short_history_network(seed: u64, client_count: usize) -> TestNetwork {
    init();
    let config = ServerConfig {
        history_size: SERVER_HISTORY,
        ..server_config()
    };
    TestNetwork::with_configs(seed, client_count, config, client_config())
}

#[test]
fn evicted_ack_disconnects_only_that_peer() {
    let mut network = short_history_network(30, 2);
    network.connect_all();
    network.run(5);
    let lagging = network.peer_of(0);
    let healthy = network.peer_of(1);

    network.hub.set_partitioned(network.clients[0].address, true);
    network.run(SERVER_HISTORY + 4);

    assert!(network.server.is_disconnected(&lagging));
    assert!(network.server.errors.iter().any(|error| matches!(
        error,
        ReplicationError::Disconnected(DisconnectReason::AckOutOfHistory { .. })
    )));
    assert_eq!(network.server.server.peer_keys(), vec![healthy]);

    // the healthy peer keeps receiving updates
    let before = network.clients[1].client.application_time().unwrap();
    network.run(5);
    let after = network.clients[1].client.application_time().unwrap();
    assert!(after > before);
    assert!(network.clients[1].errors.is_empty());
}

#[test]
fn peer_that_never_acknowledges_is_disconnected() {
    let mut network = short_history_network(31, 1);
    network.connect_all();

    // a peer that completes the handshake, then ignores every update
    let address: SocketAddr = "10.0.2.1:5000".parse().unwrap();
    let (sender, mut receiver) = Box::new(network.hub.socket(address)).split().unwrap();
    sender
        .send(&server_address(), &ConnectHeader::new(APPLICATION_ID, 0).to_bytes())
        .unwrap();
    network.tick();
    let (_, reply) = receiver.receive().unwrap().unwrap();
    let Header::Connect(reply) = Header::read(&mut ByteReader::new(reply)).unwrap() else {
        panic!("expected a connection reply");
    };
    sender
        .send(
            &server_address(),
            &StandardHeader::new(APPLICATION_ID, reply.connection_id, PacketKind::Handshake)
                .to_bytes(),
        )
        .unwrap();
    network.tick();
    let silent = network
        .server
        .peer_at(address)
        .expect("raw peer is connected");

    network.run(SERVER_HISTORY + 4);
    while receiver.receive().unwrap().is_some() {}

    assert!(network.server.is_disconnected(&silent));
    assert!(network.server.errors.contains(&ReplicationError::Disconnected(
        DisconnectReason::MessageBufferOverflow
    )));
    assert_eq!(network.server.server.peers_count(), 1);
    assert!(network.clients[0].is_connected());
}

#[test]
fn message_ring_overflows_without_acknowledgements() {
    let mut buffer = ReliableMessageBuffer::with_capacity(4);

    // the acknowledged slot is never reused, so three slots can be opened
    for _ in 0..3 {
        buffer.add_seq().unwrap();
        buffer.buffer_message(vec![1].into());
    }

    assert_eq!(buffer.add_seq(), Err(DisconnectReason::MessageBufferOverflow));
    assert_eq!(buffer.add_seq(), Err(DisconnectReason::MessageBufferOverflow));
    assert_eq!(buffer.current_seq(), 3);
    assert_eq!(buffer.unacked_indexes().len(), 2);
}
