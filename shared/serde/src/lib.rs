//! # Snapwire Serde
//! Byte-level reading & writing of the scalar values that make up snapwire
//! packets. All multi-byte values are little-endian on the wire.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod byte_reader;
mod byte_writer;
mod error;
mod number;
mod serde;

pub use byte_reader::ByteReader;
pub use byte_writer::ByteWriter;
pub use error::SerdeErr;
pub use serde::{ConstByteLength, Serde};
