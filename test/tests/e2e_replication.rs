/// End-to-end tests for object replication: lifecycle events, attribute
/// playback, creation metadata and per-peer scopes

use snapwire_client::{CreateEvent, DestroyEvent};
use snapwire_server::{PeerKey, ScopeMut, UsageError};
use snapwire_shared::ObjectId;
use snapwire_test::{TestNetwork, HEALTH, KIND, MARKER_CLASS, UNIT_CLASS, X, Y};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Scope showing `peer_key` only `object`, every other peer everything
fn only(peer_key: PeerKey, object: ObjectId) -> impl FnMut(PeerKey, &mut ScopeMut<'_>) -> bool {
    move |peer, scope| {
        if peer != peer_key {
            return false;
        }
        scope.include(object).unwrap();
        true
    }
}

fn connected(seed: u64, client_count: usize) -> TestNetwork {
    init();
    let mut network = TestNetwork::new(seed, client_count);
    network.connect_all();
    network.run(5);
    network
}

#[test]
fn created_then_destroyed_object_raises_one_event_each() {
    let mut network = connected(10, 1);

    let mut unit: ObjectId = 0;
    network.tick_with(|server| unit = server.create_object(UNIT_CLASS).unwrap());
    network.run(2);
    network.tick_with(|server| server.destroy(unit).unwrap());
    network.run(20);

    let client = &network.clients[0];
    assert_eq!(
        client.created,
        vec![CreateEvent {
            object: unit,
            class: UNIT_CLASS,
            birth: true,
            metadata: None,
        }]
    );
    assert_eq!(
        client.destroyed,
        vec![DestroyEvent {
            object: unit,
            death: true,
        }]
    );
    assert!(client.errors.is_empty());
    assert_eq!(
        network.server.server.get::<f32>(unit, X),
        Err(UsageError::ObjectDestroyed { object_id: unit })
    );
}

#[test]
fn destroyed_objects_are_retired_once_their_tick_leaves_history() {
    let mut network = connected(11, 1);

    let mut unit: ObjectId = 0;
    network.tick_with(|server| unit = server.create_object(UNIT_CLASS).unwrap());
    network.tick_with(|server| server.destroy(unit).unwrap());
    network.run(60);

    assert!(network.server.server.object_ids().is_empty());
    assert_eq!(
        network.server.server.object_class(unit),
        Err(UsageError::ObjectNotFound { object_id: unit })
    );
    assert!(network.clients[0].client.object_class(unit).is_err());
}

#[test]
fn interpolated_attributes_follow_application_time() {
    let mut network = connected(12, 1);

    let mut unit: ObjectId = 0;
    network.tick_with(|server| {
        unit = server.create_object(UNIT_CLASS).unwrap();
    });
    for _ in 0..30 {
        network.tick_with(|server| {
            let tick = server.current_tick().unwrap();
            server.set(unit, X, f32::from(tick) * 2.0).unwrap();
            server.set(unit, Y, -f32::from(tick)).unwrap();
            server.set(unit, HEALTH, tick).unwrap();
        });
    }

    let client = &network.clients[0].client;
    assert!(client.application_time().is_some());
    let x: f32 = client.get(unit, X).unwrap();
    let y: f32 = client.get(unit, Y).unwrap();
    let health: u16 = client.get(unit, HEALTH).unwrap();

    // position is linear in the tick number, so interpolation is exact
    assert!((x + 2.0 * y).abs() < 1e-3, "x = {}, y = {}", x, y);
    // health reads the newest snapshot at or before the interpolated point
    let tick_position = -y;
    assert!(f32::from(health) <= tick_position + 1e-3);
    assert!(tick_position - f32::from(health) < 1.0 + 1e-3);
}

#[test]
fn server_reads_back_what_it_set() {
    let mut network = connected(13, 0);

    network.tick_with(|server| {
        let unit = server.create_object(UNIT_CLASS).unwrap();
        server.set(unit, X, 4.5_f32).unwrap();
        server.set(unit, HEALTH, 77_u16).unwrap();

        assert_eq!(server.get::<f32>(unit, X), Ok(4.5));
        assert_eq!(server.get::<f32>(unit, Y), Ok(0.0));
        assert_eq!(server.get::<u16>(unit, HEALTH), Ok(77));
        assert!(server.get::<u8>(unit, HEALTH).is_err());
        assert!(server.get::<f32>(unit, 9).is_err());
    });
    // values carry over into the next tick
    network.tick_with(|server| {
        let unit = server.object_ids()[0];
        assert_eq!(server.get::<u16>(unit, HEALTH), Ok(77));
    });
}

#[test]
fn creation_metadata_reaches_the_client() {
    let mut network = connected(14, 1);

    let mut marker: ObjectId = 0;
    network.tick_with(|server| {
        marker = server
            .create_object_with_metadata(MARKER_CLASS, b"spawn-point")
            .unwrap();
        server.set(marker, KIND, 3_u8).unwrap();
        assert!(matches!(
            server.create_object_with_metadata(MARKER_CLASS, &[0; 256]),
            Err(UsageError::MetadataTooLarge { .. })
        ));
    });
    network.run(10);

    let client = &network.clients[0];
    assert_eq!(client.created.len(), 1);
    assert_eq!(
        client.created[0].metadata.as_deref(),
        Some(&b"spawn-point"[..])
    );
    assert_eq!(
        client.client.metadata(marker),
        Ok(Some(&b"spawn-point"[..]))
    );
    assert_eq!(client.client.get::<u8>(marker, KIND), Ok(3));
}

#[test]
fn scope_hides_and_shows_objects_per_peer() {
    let mut network = connected(15, 2);
    let restricted = network.peer_of(0);

    // the restricted peer must never be sent the markers' creation tick
    let mut markers: Vec<ObjectId> = Vec::new();
    network.tick_scoped_with(
        |server| {
            markers.push(server.create_object(MARKER_CLASS).unwrap());
            markers.push(server.create_object(MARKER_CLASS).unwrap());
        },
        |peer, _| peer == restricted,
    );
    let (first, second) = (markers[0], markers[1]);

    for _ in 0..10 {
        network.tick_with_scope(only(restricted, first));
    }
    assert_eq!(network.clients[0].visible().iter().copied().collect::<Vec<_>>(), vec![first]);
    assert!(network.clients[0].created.iter().all(|event| event.object != second));
    assert!(network.clients[0].destroyed.is_empty());
    assert_eq!(
        network.clients[1].visible().iter().copied().collect::<Vec<_>>(),
        vec![first, second]
    );

    // hide everything from the restricted peer
    for _ in 0..10 {
        network.tick_with_scope(|peer, _| peer == restricted);
    }
    assert!(network.clients[0].visible().is_empty());
    assert_eq!(
        network.clients[0].destroyed,
        vec![DestroyEvent {
            object: first,
            death: false,
        }]
    );

    // and show it again
    for _ in 0..10 {
        network.tick_with_scope(only(restricted, first));
    }
    let shown_again = network.clients[0].created.last().unwrap();
    assert_eq!(shown_again.object, first);
    assert!(!shown_again.birth);
    assert_eq!(network.clients[1].visible().len(), 2);
    assert!(network.clients[1].destroyed.is_empty());
}

#[test]
fn scope_rejects_destroyed_objects() {
    let mut network = connected(16, 1);

    let mut marker: ObjectId = 0;
    network.tick_with(|server| {
        marker = server.create_object(MARKER_CLASS).unwrap();
        server.destroy(marker).unwrap();
        assert_eq!(
            server.destroy(marker),
            Err(UsageError::ObjectDestroyed { object_id: marker })
        );
    });

    let mut rejected = None;
    network.tick_with_scope(|_, scope| {
        rejected = scope.include(marker).err();
        true
    });
    assert_eq!(rejected, Some(UsageError::ObjectDestroyed { object_id: marker }));
}

#[test]
fn objects_survive_a_lossy_network() {
    init();
    let mut network = TestNetwork::new(17, 2);
    network.connect_all();
    network.hub.set_loss(0.25);

    let mut live: Vec<ObjectId> = Vec::new();
    for round in 0..40 {
        network.tick_with(|server| {
            if round % 3 == 0 {
                live.push(server.create_object(UNIT_CLASS).unwrap());
            }
            if round % 5 == 4 && live.len() > 1 {
                server.destroy(live.remove(0)).unwrap();
            }
            for &unit in &live {
                server.set(unit, X, round as f32).unwrap();
            }
        });
    }
    network.hub.set_loss(0.0);
    network.run(20);

    let expected: Vec<ObjectId> = network.server.server.object_ids();
    assert_eq!(expected, live);
    for client in &network.clients {
        assert!(client.errors.is_empty(), "{:?}", client.errors);
        assert_eq!(client.visible().iter().copied().collect::<Vec<_>>(), expected);
        for destroyed in &client.destroyed {
            assert!(destroyed.death);
        }
        let x: f32 = client.client.get(expected[0], X).unwrap();
        assert_eq!(x, 39.0);
    }
}
