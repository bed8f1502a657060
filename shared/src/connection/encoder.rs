cfg_if! {
    if #[cfg(feature = "zstd_support")]
    {
        use log::debug;

        use zstd::bulk::Compressor;

        use super::compression_config::CompressionMode;
        use super::error::EncoderError;

        pub struct Encoder {
            result: Vec<u8>,
            compressor: Option<Compressor<'static>>,
        }

        impl Encoder {
            /// Try to create a new Encoder. `None` creates a pass-through encoder.
            pub fn try_new(compression_mode: Option<&CompressionMode>) -> Result<Self, EncoderError> {
                let compressor = match compression_mode {
                    None => None,
                    Some(CompressionMode::Default(compression_level)) => Some(
                        Compressor::new(*compression_level).map_err(|_| {
                            EncoderError::CompressorCreationFailed {
                                level: *compression_level,
                            }
                        })?,
                    ),
                    Some(CompressionMode::Dictionary(compression_level, dictionary)) => Some(
                        Compressor::with_dictionary(*compression_level, dictionary).map_err(|_| {
                            EncoderError::CompressorWithDictionaryFailed {
                                level: *compression_level,
                            }
                        })?,
                    ),
                };

                Ok(Self {
                    result: Vec::new(),
                    compressor,
                })
            }

            /// Try to encode a payload, returning error on compression failure
            pub fn try_encode(&mut self, payload: &[u8]) -> Result<&[u8], EncoderError> {
                match &mut self.compressor {
                    Some(compressor) => {
                        self.result = compressor.compress(payload).map_err(|_| {
                            EncoderError::CompressionFailed {
                                payload_size: payload.len(),
                            }
                        })?;
                        debug!("compressed payload {} -> {} bytes", payload.len(), self.result.len());
                    }
                    None => {
                        self.result = payload.to_vec();
                    }
                }
                Ok(&self.result)
            }
        }
    }
    else
    {
        use super::compression_config::CompressionMode;
        use super::error::EncoderError;

        pub struct Encoder {
            result: Vec<u8>,
        }

        impl Encoder {
            pub fn try_new(_: Option<&CompressionMode>) -> Result<Self, EncoderError> {
                Ok(Self {
                    result: Vec::new(),
                })
            }

            pub fn try_encode(&mut self, payload: &[u8]) -> Result<&[u8], EncoderError> {
                self.result = payload.to_vec();
                Ok(&self.result)
            }
        }
    }
}
