cfg_if! {
    if #[cfg(feature = "zstd_support")]
    {
        use zstd::bulk::Decompressor;

        use super::compression_config::CompressionMode;
        use super::error::DecoderError;

        /// Upper bound on the size of a decompressed payload
        const MAX_DECOMPRESSED_SIZE: usize = 1 << 20;

        pub struct Decoder {
            result: Vec<u8>,
            decoder: Option<Decompressor<'static>>,
        }

        impl Decoder {
            /// Try to create a new Decoder. `None` creates a pass-through decoder.
            pub fn try_new(compression_mode: Option<&CompressionMode>) -> Result<Self, DecoderError> {
                let decoder = match compression_mode {
                    None => None,
                    Some(CompressionMode::Default(_)) => Some(
                        Decompressor::new().map_err(|_| DecoderError::DecompressorCreationFailed)?,
                    ),
                    Some(CompressionMode::Dictionary(_, dictionary)) => Some(
                        Decompressor::with_dictionary(dictionary)
                            .map_err(|_| DecoderError::DecompressorWithDictionaryFailed)?,
                    ),
                };

                Ok(Self {
                    decoder,
                    result: Vec::new(),
                })
            }

            /// Try to decode a payload, returning error on decompression failure
            ///
            /// SECURITY: This method processes untrusted network data. Any malformed or
            /// malicious payload will return an error instead of panicking.
            pub fn try_decode(&mut self, payload: &[u8]) -> Result<&[u8], DecoderError> {
                if let Some(decoder) = &mut self.decoder {
                    self.result = decoder
                        .decompress(payload, MAX_DECOMPRESSED_SIZE)
                        .map_err(|_| DecoderError::DecompressionFailed {
                            payload_size: payload.len(),
                        })?;
                } else {
                    self.result = payload.to_vec();
                }
                Ok(&self.result)
            }
        }
    }
    else
    {
        use super::compression_config::CompressionMode;
        use super::error::DecoderError;

        pub struct Decoder {
            result: Vec<u8>,
        }

        impl Decoder {
            pub fn try_new(_: Option<&CompressionMode>) -> Result<Self, DecoderError> {
                Ok(Self {
                    result: Vec::new(),
                })
            }

            pub fn try_decode(&mut self, payload: &[u8]) -> Result<&[u8], DecoderError> {
                self.result = payload.to_vec();
                Ok(&self.result)
            }
        }
    }
}
