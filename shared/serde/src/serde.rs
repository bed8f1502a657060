use crate::{ByteReader, ByteWriter, SerdeErr};

/// A value that can be written to and read from a byte stream
pub trait Serde: Sized {
    /// Writes the value into the given writer
    fn ser(&self, writer: &mut ByteWriter);

    /// Reads a value out of the given reader
    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr>;
}

/// Number of bytes a value of this type always occupies on the wire
pub trait ConstByteLength {
    fn const_byte_length() -> usize;
}
