/// End-to-end tests for custom messages between the server and its clients

use snapwire_server::UsageError;
use snapwire_test::TestNetwork;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn payloads(messages: impl IntoIterator<Item = Box<[u8]>>) -> Vec<u8> {
    messages.into_iter().map(|message| message[0]).collect()
}

#[test]
fn messages_flow_both_ways() {
    init();
    let mut network = TestNetwork::new(20, 1);
    network.connect_all();
    let peer = network.peer_of(0);

    network.clients[0].client.send_message(b"ping", true).unwrap();
    network.tick_with(|server| server.send_message(&peer, b"pong", false).unwrap());
    network.tick();

    assert_eq!(
        network.server.messages,
        vec![(peer, b"ping".to_vec().into_boxed_slice())]
    );
    assert_eq!(
        network.clients[0].messages,
        vec![b"pong".to_vec().into_boxed_slice()]
    );
}

#[test]
fn reliable_messages_arrive_once_and_in_order_despite_loss() {
    init();
    let mut network = TestNetwork::new(21, 2);
    network.connect_all();
    let peer = network.peer_of(1);
    network.hub.set_loss(0.3);

    for index in 0..40_u8 {
        network.clients[0].client.send_message(&[index], true).unwrap();
        network.tick_with(|server| server.send_message(&peer, &[index], true).unwrap());
    }
    network.hub.set_loss(0.0);
    network.run(10);

    let expected: Vec<u8> = (0..40).collect();
    let from_client: Vec<Box<[u8]>> = network
        .server
        .messages
        .iter()
        .map(|(_, message)| message.clone())
        .collect();
    assert_eq!(payloads(from_client), expected);
    assert_eq!(payloads(network.clients[1].messages.clone()), expected);
    assert!(network.clients[0].messages.is_empty());
    assert!(network.hub.dropped() > 0);
}

#[test]
fn unreliable_messages_are_sent_once() {
    init();
    let mut network = TestNetwork::new(22, 1);
    network.connect_all();

    network.clients[0].client.send_message(&[7], false).unwrap();
    network.run(5);

    assert_eq!(network.server.messages.len(), 1);
}

#[test]
fn message_size_is_checked_at_the_call_site() {
    init();
    let mut network = TestNetwork::new(23, 1);
    network.connect_all();
    let peer = network.peer_of(0);

    assert_eq!(
        network.server.server.send_message(&peer, &[0; 256], true),
        Err(UsageError::MessageTooLarge { size: 256, max: 255 })
    );
    assert_eq!(
        network.clients[0].client.send_message(&[], true),
        Err(UsageError::EmptyMessage)
    );
    assert!(network.server.server.send_message(&peer, &[0; 255], true).is_ok());
}
