/// PROPERTY-BASED TESTS: replication over a lossy network
///
/// Whatever datagrams are lost, once the network recovers every client
/// converges on the server's objects and received each reliable message
/// exactly once.

use proptest::prelude::*;

use snapwire_shared::ObjectId;
use snapwire_test::{TestNetwork, MARKER_CLASS};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn prop_clients_converge_after_loss(
        seed in any::<u64>(),
        loss in 0.0f64..0.4,
        creations in proptest::collection::vec(any::<bool>(), 10..30),
    ) {
        let mut network = TestNetwork::new(seed, 1);
        network.connect_all();
        let peer = network.peer_of(0);
        network.hub.set_loss(loss);

        let mut live: Vec<ObjectId> = Vec::new();
        for (round, create) in creations.iter().enumerate() {
            network.tick_with(|server| {
                if *create || live.is_empty() {
                    live.push(server.create_object(MARKER_CLASS).unwrap());
                } else {
                    server.destroy(live.remove(0)).unwrap();
                }
                server.send_message(&peer, &[round as u8], true).unwrap();
            });
        }
        network.hub.set_loss(0.0);
        network.run(20);

        let client = &network.clients[0];
        prop_assert!(client.errors.is_empty());
        prop_assert_eq!(client.visible().iter().copied().collect::<Vec<_>>(), live);

        let received: Vec<u8> = client.messages.iter().map(|message| message[0]).collect();
        let sent: Vec<u8> = (0..creations.len() as u8).collect();
        prop_assert_eq!(received, sent);
    }
}
