// The different kinds of framed packets exchanged once a connection id has
// been assigned

use snapwire_serde::{ByteReader, ByteWriter, ConstByteLength, Serde, SerdeErr};

#[derive(Copy, Debug, Clone, Eq, PartialEq)]
pub enum PacketKind {
    // A packet carrying snapshot data (server) or acks & messages (client)
    Update,
    // A packet announcing that the sender is closing the connection
    Disconnect,
    // A packet sent by the client to confirm its assigned connection id
    Handshake,
}

impl PacketKind {
    pub fn to_index(self) -> u8 {
        match self {
            PacketKind::Update => 1,
            PacketKind::Disconnect => 2,
            PacketKind::Handshake => 3,
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            1 => Some(PacketKind::Update),
            2 => Some(PacketKind::Disconnect),
            3 => Some(PacketKind::Handshake),
            // SECURITY: Malformed packets could carry any value, never panic here
            _ => None,
        }
    }
}

impl Serde for PacketKind {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_byte(self.to_index());
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let index = reader.read_byte()?;
        Self::from_index(index).ok_or(SerdeErr::InvalidValue {
            type_name: "PacketKind",
            value: u64::from(index),
        })
    }
}

impl ConstByteLength for PacketKind {
    fn const_byte_length() -> usize {
        1
    }
}
