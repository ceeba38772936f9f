use tracing::{debug, warn};

use super::buffer::ByteCursor;
use super::mods::ModFlags;
use super::types::*;
use crate::compression::CompressionCodec;
use crate::error::{ReplayError, Result};
use crate::streams;

/// Reads a replay strictly left to right. The first failing field aborts the
/// whole decode.
pub struct Decoder<'a, C: CompressionCodec> {
    cursor: ByteCursor<'a>,
    codec: &'a C,
}

impl<'a, C: CompressionCodec> Decoder<'a, C> {
    pub fn new(data: &'a [u8], codec: &'a C) -> Self {
        Self {
            cursor: ByteCursor::new(data),
            codec,
        }
    }

    pub fn offset(&self) -> usize {
        self.cursor.offset()
    }

    pub fn decode(&mut self) -> Result<ReplayRecord> {
        let mode = self.decode_mode()?;
        let version = self.cursor.read_i32()?;
        let beatmap_hash = self.cursor.read_string()?;
        let player_name = self.cursor.read_string()?;
        let replay_hash = self.cursor.read_string()?;
        debug!(%mode, version, player = %player_name, "decoded replay header");

        let count_300 = self.cursor.read_i16()?;
        let count_100 = self.cursor.read_i16()?;
        let count_50 = self.cursor.read_i16()?;
        let count_geki = self.cursor.read_i16()?;
        let count_katu = self.cursor.read_i16()?;
        let count_miss = self.cursor.read_i16()?;
        let total_score = self.cursor.read_i32()?;
        let max_combo = self.cursor.read_i16()?;
        let perfect = self.cursor.read_u8()? != 0;
        let mods = ModFlags::from_wire(self.cursor.read_i32()?);

        let life_bar_offset = self.cursor.offset();
        let life_bar_text = self.cursor.read_string()?;
        let life_bar = streams::decode_life_bar(&life_bar_text, life_bar_offset)?;
        let timestamp = self.cursor.read_i64()?;

        let frames = self.decode_frames()?;
        let score_id = self.cursor.read_i64()?;
        let target_practice = if mods.has_target_practice() {
            Some(self.cursor.read_f64()?)
        } else {
            None
        };

        if !self.cursor.done() {
            warn!(
                offset = self.cursor.offset(),
                trailing = self.cursor.remaining(),
                "ignoring trailing bytes after replay"
            );
        }

        Ok(ReplayRecord {
            mode,
            version,
            beatmap_hash,
            player_name,
            replay_hash,
            count_300,
            count_100,
            count_50,
            count_geki,
            count_katu,
            count_miss,
            total_score,
            max_combo,
            perfect,
            mods,
            life_bar,
            timestamp,
            frames,
            score_id,
            target_practice,
        })
    }

    fn decode_mode(&mut self) -> Result<GameMode> {
        let offset = self.cursor.offset();
        let raw = self.cursor.read_u8()?;
        GameMode::try_from(raw).map_err(|_| ReplayError::InvalidEnumValue {
            offset,
            field: "game mode",
            value: i64::from(raw),
        })
    }

    fn decode_frames(&mut self) -> Result<Vec<InputFrame>> {
        let length_offset = self.cursor.offset();
        let length = self.cursor.read_i32()?;
        let length = usize::try_from(length).map_err(|_| {
            ReplayError::invalid_format(
                length_offset,
                format!("negative frame block length {length}"),
            )
        })?;
        let block_offset = self.cursor.offset();
        let block = self.cursor.read_raw(length)?;
        streams::decode_frames(block, self.codec, block_offset)
    }
}
