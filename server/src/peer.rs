use snapwire_shared::ConnectionId;

/// Handle to a client connected to the server
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug, PartialOrd, Ord)]
pub struct PeerKey(ConnectionId);

impl PeerKey {
    pub(crate) fn new(connection_id: ConnectionId) -> Self {
        Self(connection_id)
    }

    /// Connection id the client presents in every packet
    pub fn connection_id(&self) -> ConnectionId {
        self.0
    }
}
