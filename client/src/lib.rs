//! # Snapwire Client
//! A client that connects to a snapwire server over UDP, reconstructs a
//! smooth, interpolated timeline of the objects the server replicates to it,
//! and exchanges custom messages with the server.

#![deny(trivial_casts, trivial_numeric_casts, unstable_features, unused_import_braces)]

pub mod shared {
    pub use snapwire_shared::{
        linear, AttributeId, AttributeValue, ByteReader, ByteWriter, ClassId, ClassRegistry,
        CompressionConfig, CompressionMode, ConnectionConfig, InterpolationFn, InterpolationPoint,
        Lerp, ObjectClass, ObjectId, Serde, SerdeErr, UdpSocket,
    };
}

mod client;
mod client_config;
mod connection;
mod events;
mod history_buffer;
mod object_store;
mod playback;
mod update_reader;

pub use client::Client;
pub use client_config::ClientConfig;
pub use connection::connection::ConnectionState;
pub use events::{ClientEvent, ClientEvents, CreateEvent, DestroyEvent, MessageEvent};
pub use history_buffer::{ClientHistoryBuffer, PushResult, SlotRange};
pub use object_store::SnapshotState;
pub use playback::ClientStatus;
pub use snapwire_shared::{DisconnectReason, LibraryError, ReplicationError, UsageError};
