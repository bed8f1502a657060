//! # Snapwire Shared
//! Common functionality shared between snapwire-server & snapwire-client crates.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

#[macro_use]
extern crate cfg_if;

pub use snapwire_serde::{ByteReader, ByteWriter, ConstByteLength, Serde, SerdeErr};

mod connection;
mod constants;
mod error;
mod messages;
mod replication;
mod schema;
mod timer;
mod transport;
mod types;
mod wrapping_number;

pub use connection::{
    compression_config::{CompressionConfig, CompressionMode},
    connection_config::ConnectionConfig,
    decoder::Decoder,
    encoder::Encoder,
    error::{DecoderError, EncoderError, HeaderError},
    header::{ConnectHeader, Header, StandardHeader, CONNECT_HEADER_SIZE, STANDARD_HEADER_SIZE},
    packet_kind::PacketKind,
};
pub use constants::{
    HISTORY_BUFFER_SIZE, INTERPOLATION_CUSHION, MAX_DATAGRAM_SIZE, MAX_MESSAGE_SIZE,
    MAX_METADATA_SIZE, MESSAGE_BUFFER_SIZE,
};
pub use error::{DisconnectReason, LibraryError, ReplicationError, UsageError};
pub use messages::{
    message_group::{read_message_groups, write_message_group, MessageGroup},
    message_receiver::MessageReceiver,
    outgoing_message::OutgoingMessage,
    reliable_message_buffer::ReliableMessageBuffer,
};
pub use replication::{
    diff::{apply_diff, diff_snapshots},
    object_tag::{ObjectAction, ObjectTag},
};
pub use schema::{
    attribute::{Attribute, AttributeId, AttributeValue},
    class_registry::ClassRegistry,
    interpolation::{linear, InterpolationFn, InterpolationPoint, Lerp},
    object_class::ObjectClass,
};
pub use timer::Timer;
pub use transport::{PacketReceiver, PacketSender, Socket, TransportError, UdpSocket};
pub use types::{
    ApplicationId, ClassId, ConnectionId, HostType, ObjectId, SequenceNumber, SlotIndex,
};
pub use wrapping_number::{
    sequence_distance, sequence_greater_than, sequence_less_than, wrapping_diff,
    SEQUENCE_HALF_RANGE,
};
