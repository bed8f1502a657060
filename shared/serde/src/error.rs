use thiserror::Error;

/// Errors produced while reading values out of a byte stream
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerdeErr {
    /// The stream ended before the requested number of bytes could be read
    #[error("Unexpected end of stream: needed {needed} bytes but only {remaining} remain")]
    UnexpectedEnd { needed: usize, remaining: usize },

    /// A value was read that is not valid for the target type
    #[error("Invalid value {value} for type {type_name}")]
    InvalidValue { type_name: &'static str, value: u64 },
}
