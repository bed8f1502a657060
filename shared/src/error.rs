use snapwire_serde::SerdeErr;
use thiserror::Error;

use crate::{
    connection::error::{DecoderError, EncoderError, HeaderError},
    transport::TransportError,
    types::{ClassId, ObjectId},
};

/// Why a connection was torn down
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DisconnectReason {
    /// The remote host stopped sending packets for longer than the timeout
    #[error("Connection timed out after {seconds:.1}s of silence")]
    TimedOut { seconds: f64 },

    /// The remote host sent an explicit disconnect packet
    #[error("Remote host closed the connection")]
    RemoteClosed,

    /// The connection was closed locally
    #[error("Connection was closed locally")]
    LocalClosed,

    /// The remote host acknowledged a snapshot that is no longer held in history
    #[error("Acknowledged sequence {ack} is no longer held in history")]
    AckOutOfHistory { ack: u16 },

    /// The outgoing reliable message ring is full because the remote host
    /// never acknowledged any of it
    #[error("Reliable message buffer overflowed, remote host stopped acknowledging")]
    MessageBufferOverflow,

    /// A fatal protocol violation occurred
    #[error("Protocol violation: {0}")]
    ProtocolViolation(LibraryError),
}

/// A caller precondition was violated
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UsageError {
    #[error("Object classes cannot be registered once the connection is open")]
    RegistryLocked,

    #[error("Object class {class_id} is already registered")]
    DuplicateClass { class_id: ClassId },

    #[error("Object class {class_id} is not registered")]
    UnknownClass { class_id: ClassId },

    #[error("Attribute {attribute} does not exist on object class {class_id}")]
    UnknownAttribute { class_id: ClassId, attribute: usize },

    #[error("Attribute {attribute} is {expected} bytes wide, but a {actual} byte value was used")]
    AttributeTypeMismatch {
        attribute: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Object {object_id} does not exist")]
    ObjectNotFound { object_id: ObjectId },

    #[error("Object {object_id} has already been destroyed")]
    ObjectDestroyed { object_id: ObjectId },

    #[error("Object {object_id} has no data available at the current application time")]
    ObjectNotVisible { object_id: ObjectId },

    #[error("No tick has started yet, call update() before creating objects")]
    NoActiveTick,

    #[error("Time went backwards: {time} is earlier than the previous update at {previous}")]
    TimeWentBackwards { previous: f64, time: f64 },

    #[error("Message of {size} bytes exceeds the maximum of {max} bytes")]
    MessageTooLarge { size: usize, max: usize },

    #[error("Messages must contain at least one byte")]
    EmptyMessage,

    #[error("Creation metadata of {size} bytes exceeds the maximum of {max} bytes")]
    MetadataTooLarge { size: usize, max: usize },

    #[error("Peer {connection_id} is not connected")]
    UnknownPeer { connection_id: u32 },

    #[error("The connection is not open")]
    NotConnected,

    #[error("The connection is already open")]
    AlreadyOpen,
}

/// An internal invariant failed, typically because of malformed input
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LibraryError {
    #[error("Serialization error: {0}")]
    Serde(#[from] SerdeErr),

    #[error("Packet header error: {0}")]
    Header(#[from] HeaderError),

    #[error("Decoder error: {0}")]
    Decoder(#[from] DecoderError),

    #[error("Encoder error: {0}")]
    Encoder(#[from] EncoderError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Unexpected object tag {tag:#04x} in the {section} section")]
    UnexpectedObjectTag { tag: u8, section: &'static str },

    #[error("Received data for unknown object class {class_id}")]
    UnknownClass { class_id: ClassId },

    #[error("Received a diff for object {object_id} without baseline data")]
    MissingBaseline { object_id: ObjectId },

    #[error("Snapshot size mismatch: expected {expected} bytes, got {actual}")]
    SnapshotSizeMismatch { expected: usize, actual: usize },

    #[error("Playback could not find a valid snapshot to start from")]
    MissingFirstSnapshot,

    #[error("Application time {time} is no longer held in history")]
    PlaybackOutOfHistory { time: f64 },
}

/// Every error the replication engine reports
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReplicationError {
    #[error("Disconnected: {0}")]
    Disconnected(DisconnectReason),

    #[error("Usage error: {0}")]
    Usage(#[from] UsageError),

    #[error("Library error: {0}")]
    Library(#[from] LibraryError),
}

impl From<DisconnectReason> for ReplicationError {
    fn from(reason: DisconnectReason) -> Self {
        ReplicationError::Disconnected(reason)
    }
}

impl From<SerdeErr> for ReplicationError {
    fn from(error: SerdeErr) -> Self {
        ReplicationError::Library(LibraryError::Serde(error))
    }
}

impl ReplicationError {
    /// Whether this error ends the connection it occurred on
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ReplicationError::Usage(_))
    }
}
