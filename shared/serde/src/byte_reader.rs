use crate::{Serde, SerdeErr};

/// Reads values sequentially out of a borrowed byte slice
#[derive(Clone)]
pub struct ByteReader<'b> {
    buffer: &'b [u8],
    position: usize,
}

impl<'b> ByteReader<'b> {
    pub fn new(buffer: &'b [u8]) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    pub fn read<T: Serde>(&mut self) -> Result<T, SerdeErr> {
        T::de(self)
    }

    pub fn read_byte(&mut self) -> Result<u8, SerdeErr> {
        let bytes = self.read_bytes(1)?;
        Ok(bytes[0])
    }

    /// Returns the next `count` bytes and advances past them
    pub fn read_bytes(&mut self, count: usize) -> Result<&'b [u8], SerdeErr> {
        let remaining = self.remaining();
        if count > remaining {
            return Err(SerdeErr::UnexpectedEnd {
                needed: count,
                remaining,
            });
        }
        let start = self.position;
        self.position += count;
        Ok(&self.buffer[start..self.position])
    }

    /// Splits off a reader over the next `count` bytes, advancing this reader
    /// past them
    pub fn sub_reader(&mut self, count: usize) -> Result<ByteReader<'b>, SerdeErr> {
        let bytes = self.read_bytes(count)?;
        Ok(ByteReader::new(bytes))
    }

    pub fn skip(&mut self, count: usize) -> Result<(), SerdeErr> {
        self.read_bytes(count).map(|_| ())
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.position
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// The unread portion of the buffer
    pub fn rest(&self) -> &'b [u8] {
        &self.buffer[self.position..]
    }
}
