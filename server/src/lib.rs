//! # Snapwire Server
//! A server that owns authoritative objects, sends each connected client
//! delta-compressed snapshots of the objects in its scope every tick, and
//! exchanges custom messages with those clients over UDP.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

pub mod shared {
    pub use snapwire_shared::{
        AttributeId, AttributeValue, ByteReader, ByteWriter, ClassId, ClassRegistry,
        CompressionConfig, CompressionMode, ConnectionConfig, ObjectClass, ObjectId, Serde,
        SerdeErr, UdpSocket,
    };
}

mod connection;
mod events;
mod history_buffer;
mod object_store;
mod peer;
mod scope;
mod server;
mod update_writer;

pub use events::{
    ConnectEvent, DisconnectEvent, ErrorEvent, MessageEvent, ServerEvent, ServerEvents,
};
pub use history_buffer::{ServerHistoryBuffer, TickAdvance};
pub use object_store::{ServerObject, ServerObjectStore};
pub use peer::PeerKey;
pub use scope::ScopeMut;
pub use server::{Server, ServerConfig};
pub use snapwire_shared::{DisconnectReason, LibraryError, ReplicationError, UsageError};
