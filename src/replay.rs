pub mod buffer;
pub mod decoder;
pub mod encoder;
pub mod mods;
pub mod types;

use serde::Serialize;
use tracing::{debug, warn};

use crate::compression::{CompressionCodec, LzmaCodec};
use crate::error::Result;
use decoder::Decoder;
use encoder::Encoder;
use types::ReplayRecord;

/// Replay parser/builder bound to one compression capability.
#[derive(Debug, Clone)]
pub struct ReplayCodec<C: CompressionCodec = LzmaCodec> {
    codec: C,
}

impl ReplayCodec<LzmaCodec> {
    pub fn lzma() -> Self {
        Self::new(LzmaCodec::default())
    }
}

impl Default for ReplayCodec<LzmaCodec> {
    fn default() -> Self {
        Self::lzma()
    }
}

impl<C: CompressionCodec> ReplayCodec<C> {
    pub fn new(codec: C) -> Self {
        Self { codec }
    }

    pub fn compression(&self) -> &C {
        &self.codec
    }

    pub fn parse(&self, data: &[u8]) -> Result<ReplayRecord> {
        Decoder::new(data, &self.codec).decode()
    }

    pub fn build(&self, record: &ReplayRecord) -> Result<Vec<u8>> {
        Encoder::new(&self.codec).encode(record)
    }

    /// Parses `data`, rebuilds it and compares byte for byte.
    pub fn verify_round_trip(&self, data: &[u8]) -> Result<RoundTrip> {
        let record = self.parse(data)?;
        let rebuilt = self.build(&record)?;
        let outcome = RoundTrip::compare(data, &rebuilt);
        match outcome {
            RoundTrip::Identical => debug!(bytes = data.len(), "round trip identical"),
            RoundTrip::Mismatch {
                offset,
                expected,
                actual,
            } => warn!(
                offset,
                ?expected,
                ?actual,
                original = data.len(),
                rebuilt = rebuilt.len(),
                "round trip mismatch"
            ),
        }
        Ok(outcome)
    }
}

/// Outcome of rebuilding a parsed buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RoundTrip {
    Identical,
    /// First differing byte. `None` marks the side that ended early.
    Mismatch {
        offset: usize,
        expected: Option<u8>,
        actual: Option<u8>,
    },
}

impl RoundTrip {
    pub fn compare(original: &[u8], rebuilt: &[u8]) -> Self {
        let common = original.len().min(rebuilt.len());
        let first_diff = original
            .iter()
            .zip(rebuilt)
            .position(|(a, b)| a != b)
            .or((original.len() != rebuilt.len()).then_some(common));

        match first_diff {
            None => RoundTrip::Identical,
            Some(offset) => RoundTrip::Mismatch {
                offset,
                expected: original.get(offset).copied(),
                actual: rebuilt.get(offset).copied(),
            },
        }
    }

    pub fn is_identical(&self) -> bool {
        matches!(self, RoundTrip::Identical)
    }

    pub fn mismatch_offset(&self) -> Option<usize> {
        match self {
            RoundTrip::Identical => None,
            RoundTrip::Mismatch { offset, .. } => Some(*offset),
        }
    }
}

impl ReplayRecord {
    /// Parses a replay with the legacy LZMA frame block.
    pub fn parse(data: &[u8]) -> Result<Self> {
        Self::parse_with(data, &LzmaCodec::default())
    }

    pub fn parse_with<C: CompressionCodec>(data: &[u8], codec: &C) -> Result<Self> {
        Decoder::new(data, codec).decode()
    }

    /// Serializes the record, recompressing its frames.
    pub fn build(&self) -> Result<Vec<u8>> {
        self.build_with(&LzmaCodec::default())
    }

    pub fn build_with<C: CompressionCodec>(&self, codec: &C) -> Result<Vec<u8>> {
        Encoder::new(codec).encode(self)
    }
}
