use std::default::Default;

use snapwire_shared::{ApplicationId, CompressionConfig, ConnectionConfig, HISTORY_BUFFER_SIZE};

/// Contains Config properties which will be used by the Server
#[derive(Clone)]
pub struct ServerConfig {
    /// Clients must present the same id to connect
    pub application_id: ApplicationId,
    /// Used to configure the connections with Clients
    pub connection: ConnectionConfig,
    /// Number of ticks kept as diff baselines. A client whose newest
    /// acknowledged tick falls out of this window is disconnected.
    pub history_size: usize,
    /// Compression of packets in either direction
    pub compression: CompressionConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            application_id: 0,
            connection: ConnectionConfig::default(),
            history_size: HISTORY_BUFFER_SIZE,
            compression: CompressionConfig::default(),
        }
    }
}
