//! Codec for `.osr` replay recordings.
//!
//! A replay is a fixed-order sequence of little-endian scalars, length-prefixed
//! strings, a modifier bitset, a life-bar graph string and an LZMA-compressed
//! block of input frames. [`ReplayRecord::parse`] and [`ReplayRecord::build`]
//! are exact inverses for anything this crate writes.
//!
//! All entry points work on caller-supplied buffers; nothing here touches the
//! filesystem or the network.

pub mod compression;
pub mod error;
pub mod replay;
pub mod streams;

pub use compression::{CompressionCodec, LzmaCodec};
pub use error::{CompressionError, ReplayError, Result};
pub use replay::mods::ModFlags;
pub use replay::types::{
    GameMode, InputFrame, Keys, LifeBarEntry, ReplayRecord, UnknownGameMode, SEED_FRAME_DELTA,
};
pub use replay::{ReplayCodec, RoundTrip};

pub fn parse_replay(data: &[u8]) -> Result<ReplayRecord> {
    ReplayRecord::parse(data)
}

pub fn build_replay(record: &ReplayRecord) -> Result<Vec<u8>> {
    record.build()
}

/// Parses and rebuilds `data`, reporting the first byte that differs.
pub fn verify_round_trip(data: &[u8]) -> Result<RoundTrip> {
    ReplayCodec::lzma().verify_round_trip(data)
}
