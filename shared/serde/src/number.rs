use std::mem::size_of;

use crate::{ByteReader, ByteWriter, ConstByteLength, Serde, SerdeErr};

// Numbers

macro_rules! impl_serde_number {
    ($($number_type:ty),*) => {
        $(
            impl Serde for $number_type {
                fn ser(&self, writer: &mut ByteWriter) {
                    writer.write_bytes(&self.to_le_bytes());
                }

                fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
                    let bytes = reader.read_bytes(size_of::<$number_type>())?;
                    let array = bytes.try_into().map_err(|_| SerdeErr::UnexpectedEnd {
                        needed: size_of::<$number_type>(),
                        remaining: bytes.len(),
                    })?;
                    Ok(<$number_type>::from_le_bytes(array))
                }
            }

            impl ConstByteLength for $number_type {
                fn const_byte_length() -> usize {
                    size_of::<$number_type>()
                }
            }
        )*
    };
}

impl_serde_number!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

// Bool

impl Serde for bool {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_byte(u8::from(*self));
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        match reader.read_byte()? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(SerdeErr::InvalidValue {
                type_name: "bool",
                value: u64::from(value),
            }),
        }
    }
}

impl ConstByteLength for bool {
    fn const_byte_length() -> usize {
        1
    }
}
