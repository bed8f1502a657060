use std::net::SocketAddr;

use log::warn;

use snapwire_shared::{
    CompressionConfig, Decoder, Encoder, HostType, LibraryError, PacketReceiver, PacketSender,
    Socket,
};

/// Socket halves plus the payload compression used in each direction
pub struct Io {
    packet_sender: Box<dyn PacketSender>,
    packet_receiver: Box<dyn PacketReceiver>,
    encoder: Encoder,
    decoder: Decoder,
}

impl Io {
    pub fn new<S: Socket + 'static>(
        socket: S,
        compression: &CompressionConfig,
    ) -> Result<Self, LibraryError> {
        let (packet_sender, packet_receiver) = Box::new(socket).split()?;
        Ok(Self {
            packet_sender,
            packet_receiver,
            encoder: Encoder::try_new(compression.mode_sent_by(HostType::Server))?,
            decoder: Decoder::try_new(compression.mode_sent_by(HostType::Client))?,
        })
    }

    /// Sends `header` followed by the compressed `payload`, best effort
    pub fn send_packet(
        &mut self,
        address: &SocketAddr,
        header: &[u8],
        payload: &[u8],
    ) -> Result<(), LibraryError> {
        let encoded = self.encoder.try_encode(payload)?;
        let mut datagram = Vec::with_capacity(header.len() + encoded.len());
        datagram.extend_from_slice(header);
        datagram.extend_from_slice(encoded);
        self.send_raw(address, &datagram);
        Ok(())
    }

    pub fn send_raw(&mut self, address: &SocketAddr, datagram: &[u8]) {
        if let Err(error) = self.packet_sender.send(address, datagram) {
            warn!("Server Error: {}", error);
        }
    }

    pub fn receive(&mut self) -> Option<(SocketAddr, Vec<u8>)> {
        match self.packet_receiver.receive() {
            Ok(Some((address, payload))) => Some((address, payload.to_vec())),
            Ok(None) => None,
            Err(error) => {
                warn!("Server Error: {}", error);
                None
            }
        }
    }

    pub fn decode(&mut self, payload: &[u8]) -> Result<Vec<u8>, LibraryError> {
        Ok(self.decoder.try_decode(payload)?.to_vec())
    }
}
