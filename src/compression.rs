//! Compression capability for the frame block.
//!
//! The replay format stores its input frames as a legacy LZMA ("lzma-alone")
//! stream. Some writers emit the `.xz` container instead, so decoding accepts
//! either while encoding always produces lzma-alone. The codec only sees the [`CompressionCodec`] trait, so other
//! containers can be plugged in without touching the field layout.

use std::io::{Read, Write};

use xz2::read::XzDecoder;
use xz2::stream::{LzmaOptions, Stream};
use xz2::write::XzEncoder;

use crate::error::CompressionError;

/// Whole-buffer compressor used for the frame block.
pub trait CompressionCodec {
    /// Short codec name used in logs and errors.
    fn name(&self) -> &'static str;

    fn compress(&self, input: &[u8]) -> Result<Vec<u8>, CompressionError>;

    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>, CompressionError>;
}

/// liblzma default preset.
pub const DEFAULT_LZMA_PRESET: u32 = 6;

/// Legacy LZMA container (13-byte header followed by the raw LZMA stream).
#[derive(Debug, Clone, Copy)]
pub struct LzmaCodec {
    preset: u32,
}

impl LzmaCodec {
    /// Codec with an explicit liblzma preset (0..=9, optionally or'd with the
    /// extreme flag).
    pub fn with_preset(preset: u32) -> Self {
        Self { preset }
    }

    pub fn preset(&self) -> u32 {
        self.preset
    }
}

impl Default for LzmaCodec {
    fn default() -> Self {
        Self::with_preset(DEFAULT_LZMA_PRESET)
    }
}

impl CompressionCodec for LzmaCodec {
    fn name(&self) -> &'static str {
        "lzma"
    }

    fn compress(&self, input: &[u8]) -> Result<Vec<u8>, CompressionError> {
        let fail = |e: &dyn std::fmt::Display| CompressionError::Compress {
            codec: self.name(),
            msg: e.to_string(),
        };

        let options = LzmaOptions::new_preset(self.preset).map_err(|e| fail(&e))?;
        let stream = Stream::new_lzma_encoder(&options).map_err(|e| fail(&e))?;
        let mut encoder = XzEncoder::new_stream(Vec::with_capacity(input.len() / 2), stream);
        encoder.write_all(input).map_err(|e| fail(&e))?;
        encoder.finish().map_err(|e| fail(&e))
    }

    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>, CompressionError> {
        let fail = |e: &dyn std::fmt::Display| CompressionError::Decompress {
            codec: self.name(),
            msg: e.to_string(),
        };

        // picks lzma-alone or .xz from the magic bytes
        let stream = Stream::new_auto_decoder(u64::MAX, 0).map_err(|e| fail(&e))?;
        let mut decoder = XzDecoder::new_stream(input, stream);
        let mut out = Vec::with_capacity(input.len() * 4);
        decoder.read_to_end(&mut out).map_err(|e| fail(&e))?;
        Ok(out)
    }
}

impl<C: CompressionCodec + ?Sized> CompressionCodec for &C {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn compress(&self, input: &[u8]) -> Result<Vec<u8>, CompressionError> {
        (**self).compress(input)
    }

    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>, CompressionError> {
        (**self).decompress(input)
    }
}
