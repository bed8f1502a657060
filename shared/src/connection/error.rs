use thiserror::Error;

/// Errors that can occur while compressing outgoing payloads
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncoderError {
    /// Failed to create compressor with the specified configuration
    #[error("Failed to create compressor with compression level {level}")]
    CompressorCreationFailed { level: i32 },

    /// Failed to create compressor with dictionary
    #[error("Failed to create compressor with dictionary (compression level {level})")]
    CompressorWithDictionaryFailed { level: i32 },

    /// Compression operation failed
    #[error("Failed to compress payload of {payload_size} bytes")]
    CompressionFailed { payload_size: usize },
}

/// Errors that can occur while decompressing incoming payloads
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecoderError {
    /// Failed to create decompressor
    #[error("Failed to create decompressor")]
    DecompressorCreationFailed,

    /// Failed to create decompressor with dictionary
    #[error("Failed to create decompressor with dictionary")]
    DecompressorWithDictionaryFailed,

    /// Decompression operation failed (SECURITY: potentially malicious payload)
    #[error("Failed to decompress payload of {payload_size} bytes (possible malformed or malicious data)")]
    DecompressionFailed { payload_size: usize },
}

/// Errors that can occur while reading packet headers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    /// Datagram is shorter than any valid header
    #[error("Datagram of {length} bytes is too short to hold a header")]
    TooShort { length: usize },

    /// Invalid packet kind received (SECURITY: potentially malicious packet)
    #[error("Invalid packet kind {index} received (valid values: 1-3). This may indicate a malformed or malicious packet")]
    InvalidPacketKind { index: u8 },
}
