use snapwire_serde::{ByteReader, ByteWriter, ConstByteLength, Serde};

use super::{error::HeaderError, packet_kind::PacketKind};
use crate::types::{ApplicationId, ConnectionId};

/// Size in bytes of a connection request or its reply
pub const CONNECT_HEADER_SIZE: usize = 6;
/// Size in bytes of the header in front of every framed packet
pub const STANDARD_HEADER_SIZE: usize = 7;

/// Header of a connection request (`connection_id == 0`) or of the server's
/// reply carrying the assigned id. Nothing follows it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ConnectHeader {
    pub application_id: ApplicationId,
    pub connection_id: ConnectionId,
}

/// Header framing every packet once a connection id is known
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StandardHeader {
    pub application_id: ApplicationId,
    pub connection_id: ConnectionId,
    pub kind: PacketKind,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Header {
    Connect(ConnectHeader),
    Standard(StandardHeader),
}

impl ConnectHeader {
    pub fn new(application_id: ApplicationId, connection_id: ConnectionId) -> Self {
        Self {
            application_id,
            connection_id,
        }
    }

    pub fn write(&self, writer: &mut ByteWriter) {
        self.application_id.ser(writer);
        self.connection_id.ser(writer);
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::with_capacity(CONNECT_HEADER_SIZE);
        self.write(&mut writer);
        writer.to_bytes()
    }
}

impl StandardHeader {
    pub fn new(
        application_id: ApplicationId,
        connection_id: ConnectionId,
        kind: PacketKind,
    ) -> Self {
        Self {
            application_id,
            connection_id,
            kind,
        }
    }

    pub fn write(&self, writer: &mut ByteWriter) {
        self.application_id.ser(writer);
        self.connection_id.ser(writer);
        self.kind.ser(writer);
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::with_capacity(STANDARD_HEADER_SIZE);
        self.write(&mut writer);
        writer.to_bytes()
    }
}

impl Header {
    /// Reads the header at the start of a datagram. On success the reader is
    /// left positioned at the payload.
    pub fn read(reader: &mut ByteReader) -> Result<Self, HeaderError> {
        let length = reader.remaining();
        if length < ApplicationId::const_byte_length() + ConnectionId::const_byte_length() {
            return Err(HeaderError::TooShort { length });
        }

        let application_id = reader
            .read::<ApplicationId>()
            .map_err(|_| HeaderError::TooShort { length })?;
        let connection_id = reader
            .read::<ConnectionId>()
            .map_err(|_| HeaderError::TooShort { length })?;

        if reader.is_empty() {
            return Ok(Header::Connect(ConnectHeader {
                application_id,
                connection_id,
            }));
        }

        let index = reader
            .read_byte()
            .map_err(|_| HeaderError::TooShort { length })?;
        let kind = PacketKind::from_index(index).ok_or(HeaderError::InvalidPacketKind { index })?;

        Ok(Header::Standard(StandardHeader {
            application_id,
            connection_id,
            kind,
        }))
    }

    pub fn application_id(&self) -> ApplicationId {
        match self {
            Header::Connect(header) => header.application_id,
            Header::Standard(header) => header.application_id,
        }
    }

    pub fn connection_id(&self) -> ConnectionId {
        match self {
            Header::Connect(header) => header.connection_id,
            Header::Standard(header) => header.connection_id,
        }
    }
}
