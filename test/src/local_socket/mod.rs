/// In-memory datagram network for end-to-end tests.
/// Every socket registered on a hub can reach every other one, with
/// seeded random loss and per-address partitions.
use std::{
    collections::{HashMap, HashSet, VecDeque},
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use log::trace;

use snapwire_shared::{PacketReceiver, PacketSender, Socket, TransportError};

type Datagram = (SocketAddr, Vec<u8>);

struct HubState {
    queues: HashMap<SocketAddr, VecDeque<Datagram>>,
    partitioned: HashSet<SocketAddr>,
    loss: f64,
    rng: fastrand::Rng,
    delivered: usize,
    dropped: usize,
}

/// Shared medium the local sockets send through
#[derive(Clone)]
pub struct LocalHub {
    state: Arc<Mutex<HubState>>,
}

impl LocalHub {
    pub fn new(seed: u64) -> Self {
        Self {
            state: Arc::new(Mutex::new(HubState {
                queues: HashMap::new(),
                partitioned: HashSet::new(),
                loss: 0.0,
                rng: fastrand::Rng::with_seed(seed),
                delivered: 0,
                dropped: 0,
            })),
        }
    }

    /// Creates a socket bound to `address` on this hub
    pub fn socket(&self, address: SocketAddr) -> LocalSocket {
        self.lock().queues.entry(address).or_default();
        LocalSocket {
            hub: self.clone(),
            address,
        }
    }

    /// Probability in `0.0..=1.0` that any datagram is dropped
    pub fn set_loss(&self, loss: f64) {
        self.lock().loss = loss;
    }

    /// Cuts an address off the network in both directions, or restores it
    pub fn set_partitioned(&self, address: SocketAddr, partitioned: bool) {
        let mut state = self.lock();
        if partitioned {
            state.partitioned.insert(address);
        } else {
            state.partitioned.remove(&address);
        }
    }

    /// Datagrams queued but not yet received
    pub fn in_flight(&self) -> usize {
        self.lock().queues.values().map(VecDeque::len).sum()
    }

    pub fn delivered(&self) -> usize {
        self.lock().delivered
    }

    pub fn dropped(&self) -> usize {
        self.lock().dropped
    }

    /// Sends a raw datagram as if it came from `from`
    pub fn inject(&self, from: SocketAddr, to: SocketAddr, payload: &[u8]) {
        self.lock().route(from, to, payload);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HubState> {
        // a test that panicked while holding the lock poisons it, keep going
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl HubState {
    fn route(&mut self, from: SocketAddr, to: SocketAddr, payload: &[u8]) {
        if self.partitioned.contains(&from) || self.partitioned.contains(&to) {
            self.dropped += 1;
            return;
        }
        if self.loss > 0.0 && self.rng.f64() < self.loss {
            trace!("dropped {} bytes {} -> {}", payload.len(), from, to);
            self.dropped += 1;
            return;
        }
        match self.queues.get_mut(&to) {
            Some(queue) => {
                queue.push_back((from, payload.to_vec()));
                self.delivered += 1;
            }
            None => self.dropped += 1,
        }
    }
}

/// A socket attached to a [`LocalHub`]
pub struct LocalSocket {
    hub: LocalHub,
    address: SocketAddr,
}

impl Socket for LocalSocket {
    fn split(
        self: Box<Self>,
    ) -> Result<(Box<dyn PacketSender>, Box<dyn PacketReceiver>), TransportError> {
        let sender = LocalSender {
            hub: self.hub.clone(),
            address: self.address,
        };
        let receiver = LocalReceiver {
            hub: self.hub,
            address: self.address,
            last_payload: Vec::new(),
        };
        Ok((Box::new(sender), Box::new(receiver)))
    }
}

struct LocalSender {
    hub: LocalHub,
    address: SocketAddr,
}

impl PacketSender for LocalSender {
    fn send(&self, address: &SocketAddr, payload: &[u8]) -> Result<(), TransportError> {
        self.hub.lock().route(self.address, *address, payload);
        Ok(())
    }
}

struct LocalReceiver {
    hub: LocalHub,
    address: SocketAddr,
    last_payload: Vec<u8>,
}

impl PacketReceiver for LocalReceiver {
    fn receive(&mut self) -> Result<Option<(SocketAddr, &[u8])>, TransportError> {
        let next = self
            .hub
            .lock()
            .queues
            .get_mut(&self.address)
            .and_then(VecDeque::pop_front);
        match next {
            Some((from, payload)) => {
                self.last_payload = payload;
                Ok(Some((from, &self.last_payload)))
            }
            None => Ok(None),
        }
    }
}
