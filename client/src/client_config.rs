use std::default::Default;

use snapwire_shared::{ApplicationId, CompressionConfig, ConnectionConfig, HISTORY_BUFFER_SIZE};

/// Contains Config properties which will be used by the Client
#[derive(Clone)]
pub struct ClientConfig {
    /// Must match the id the Server was configured with
    pub application_id: ApplicationId,
    /// Used to configure the connection with the Server
    pub connection: ConnectionConfig,
    /// Number of received updates kept for baselines & interpolation
    pub history_size: usize,
    /// Number of valid updates that must arrive before playback starts
    pub minimal_packet_count: u64,
    /// How many update intervals playback trails the newest received update
    pub interpolation_latency: f64,
    /// Maximal rate at which playback may speed up or slow down to reach its
    /// optimal time
    pub maximal_speedup: f64,
    /// Number of update intervals averaged when estimating the update rate
    pub time_interval_average_count: usize,
    /// Compression of packets in either direction
    pub compression: CompressionConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            application_id: 0,
            connection: ConnectionConfig::default(),
            history_size: HISTORY_BUFFER_SIZE,
            minimal_packet_count: 3,
            interpolation_latency: 1.1,
            maximal_speedup: 1.1,
            time_interval_average_count: 5,
            compression: CompressionConfig::default(),
        }
    }
}
