use std::{fmt, mem::size_of};

use crate::schema::interpolation::{linear, InterpolationFn};

/// Index of an attribute within its object class
pub type AttributeId = usize;

/// A plain value that can be stored in an object snapshot
pub trait AttributeValue: Copy + 'static {
    /// Number of bytes the value occupies inside a snapshot
    const SIZE: usize;

    /// Writes the value into `output`, which is exactly `SIZE` bytes long
    fn write_to(&self, output: &mut [u8]);

    /// Reads the value from `input`, which is exactly `SIZE` bytes long
    fn read_from(input: &[u8]) -> Self;

    /// Interpolation used when the attribute is added without specifying one
    fn default_interpolation() -> Option<InterpolationFn> {
        None
    }
}

macro_rules! impl_attribute_value {
    ($($value_type:ty),*) => {
        $(
            impl AttributeValue for $value_type {
                const SIZE: usize = size_of::<$value_type>();

                fn write_to(&self, output: &mut [u8]) {
                    output.copy_from_slice(&self.to_le_bytes());
                }

                fn read_from(input: &[u8]) -> Self {
                    let mut bytes = [0u8; size_of::<$value_type>()];
                    bytes.copy_from_slice(input);
                    <$value_type>::from_le_bytes(bytes)
                }
            }
        )*
    };
}

impl_attribute_value!(u8, u16, u32, u64, i8, i16, i32, i64);

impl AttributeValue for f32 {
    const SIZE: usize = 4;

    fn write_to(&self, output: &mut [u8]) {
        output.copy_from_slice(&self.to_le_bytes());
    }

    fn read_from(input: &[u8]) -> Self {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(input);
        f32::from_le_bytes(bytes)
    }

    fn default_interpolation() -> Option<InterpolationFn> {
        Some(linear::<f32>)
    }
}

impl AttributeValue for f64 {
    const SIZE: usize = 8;

    fn write_to(&self, output: &mut [u8]) {
        output.copy_from_slice(&self.to_le_bytes());
    }

    fn read_from(input: &[u8]) -> Self {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(input);
        f64::from_le_bytes(bytes)
    }

    fn default_interpolation() -> Option<InterpolationFn> {
        Some(linear::<f64>)
    }
}

impl AttributeValue for bool {
    const SIZE: usize = 1;

    fn write_to(&self, output: &mut [u8]) {
        output[0] = u8::from(*self);
    }

    fn read_from(input: &[u8]) -> Self {
        input[0] != 0
    }
}

/// Layout of one attribute inside an object snapshot
#[derive(Clone, Copy)]
pub struct Attribute {
    pub size: usize,
    pub offset: usize,
    pub interpolation: Option<InterpolationFn>,
}

impl Attribute {
    pub fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.size
    }
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attribute")
            .field("size", &self.size)
            .field("offset", &self.offset)
            .field("interpolated", &self.interpolation.is_some())
            .finish()
    }
}
