use crate::types::HostType;

/// Which payloads get compressed, and how
#[derive(Clone, Debug, Default)]
pub struct CompressionConfig {
    pub server_to_client: Option<CompressionMode>,
    pub client_to_server: Option<CompressionMode>,
}

impl CompressionConfig {
    pub fn new(
        server_to_client: Option<CompressionMode>,
        client_to_server: Option<CompressionMode>,
    ) -> Self {
        Self {
            server_to_client,
            client_to_server,
        }
    }

    /// Mode used for payloads sent by the given host
    pub fn mode_sent_by(&self, sender: HostType) -> Option<&CompressionMode> {
        match sender {
            HostType::Server => self.server_to_client.as_ref(),
            HostType::Client => self.client_to_server.as_ref(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompressionMode {
    /// Compression level, from -7 to 22
    Default(i32),
    /// Compression level plus a dictionary shared by both hosts
    Dictionary(i32, Vec<u8>),
}
