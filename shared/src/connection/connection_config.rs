use std::{default::Default, time::Duration};

/// Timing used by both hosts to establish & maintain a connection
#[derive(Clone, Debug)]
pub struct ConnectionConfig {
    /// How often a connecting client re-sends its connection request
    pub request_resend_interval: Duration,
    /// How often handshake packets are re-sent while waiting for an answer
    pub handshake_resend_interval: Duration,
    /// How long a connection may remain in the handshake before it is dropped
    pub handshake_timeout: Duration,
    /// How long to wait for a packet from the remote host before considering
    /// the connection lost
    pub disconnection_timeout: Duration,
}

impl ConnectionConfig {
    pub fn new(
        request_resend_interval: Duration,
        handshake_resend_interval: Duration,
        handshake_timeout: Duration,
        disconnection_timeout: Duration,
    ) -> Self {
        Self {
            request_resend_interval,
            handshake_resend_interval,
            handshake_timeout,
            disconnection_timeout,
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            request_resend_interval: Duration::from_millis(500),
            handshake_resend_interval: Duration::from_millis(500),
            handshake_timeout: Duration::from_secs(5),
            disconnection_timeout: Duration::from_secs(5),
        }
    }
}
