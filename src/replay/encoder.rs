use tracing::debug;

use super::buffer::ByteWriter;
use super::types::ReplayRecord;
use crate::compression::CompressionCodec;
use crate::error::Result;
use crate::streams;

/// Bytes taken by every fixed-width field, tail included.
const FIXED_FIELDS_LEN: usize = 1 + 4 + 6 * 2 + 4 + 2 + 1 + 4 + 8 + 4 + 8 + 8;

/// Writes a replay in the same field order the decoder reads it.
pub struct Encoder<'a, C: CompressionCodec> {
    codec: &'a C,
}

impl<'a, C: CompressionCodec> Encoder<'a, C> {
    pub fn new(codec: &'a C) -> Self {
        Self { codec }
    }

    pub fn encode(&self, record: &ReplayRecord) -> Result<Vec<u8>> {
        let life_bar = streams::encode_life_bar(&record.life_bar);
        let strings_len = record.beatmap_hash.len()
            + record.player_name.len()
            + record.replay_hash.len()
            + life_bar.len();
        // four strings, each with a presence byte and a short length prefix
        let mut w = ByteWriter::with_capacity(FIXED_FIELDS_LEN + strings_len + 4 * 4);

        w.write_u8(record.mode.as_u8());
        w.write_i32(record.version);
        w.write_string(&record.beatmap_hash);
        w.write_string(&record.player_name);
        w.write_string(&record.replay_hash);
        for count in [
            record.count_300,
            record.count_100,
            record.count_50,
            record.count_geki,
            record.count_katu,
            record.count_miss,
        ] {
            w.write_i16(count);
        }
        w.write_i32(record.total_score);
        w.write_i16(record.max_combo);
        w.write_u8(u8::from(record.perfect));
        w.write_i32(record.mods.to_wire());
        w.write_string(&life_bar);
        w.write_i64(record.timestamp);

        // the length prefix always describes the block compressed right here
        let block = streams::encode_frames(&record.frames, self.codec, w.offset() + 4)?;
        w.write_i32(block.len() as i32);
        w.write_raw(&block);

        w.write_i64(record.score_id);
        if record.mods.has_target_practice() {
            w.write_f64(record.target_practice.unwrap_or_default());
        }

        debug!(
            bytes = w.offset(),
            frames = record.frames.len(),
            mods = %record.mods,
            "encoded replay"
        );
        Ok(w.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compression::LzmaCodec;
    use crate::replay::mods::ModFlags;
    use crate::replay::types::GameMode;

    #[test]
    fn it_writes_header_fields_in_wire_order() {
        let record = ReplayRecord {
            mode: GameMode::Taiko,
            version: 7,
            beatmap_hash: "ab".into(),
            player_name: String::new(),
            replay_hash: "c".into(),
            count_300: 1,
            count_miss: -1,
            total_score: 0x0102_0304,
            max_combo: 9,
            perfect: true,
            mods: ModFlags::HIDDEN,
            ..ReplayRecord::default()
        };
        let codec = LzmaCodec::default();
        let bytes = Encoder::new(&codec).encode(&record).unwrap();

        assert_eq!(bytes[0], 1);
        assert_eq!(&bytes[1..5], &[7, 0, 0, 0]);
        assert_eq!(&bytes[5..9], b"\x0b\x02ab");
        assert_eq!(bytes[9], 0x00);
        assert_eq!(&bytes[10..13], b"\x0b\x01c");
        assert_eq!(&bytes[13..15], &[1, 0]);
        assert_eq!(&bytes[23..25], &[0xff, 0xff]);
        assert_eq!(&bytes[25..29], &[4, 3, 2, 1]);
        assert_eq!(&bytes[29..31], &[9, 0]);
        assert_eq!(bytes[31], 1);
        assert_eq!(&bytes[32..36], &[8, 0, 0, 0]);
        assert_eq!(&bytes[36..41], b"\x0b\x030,|");
    }

    #[test]
    fn it_prefixes_the_frame_block_with_its_length() {
        let record = ReplayRecord::default();
        let codec = LzmaCodec::default();
        let bytes = Encoder::new(&codec).encode(&record).unwrap();

        // mode, version, 3 empty strings, counters, score, combo, perfect, mods
        let life_bar_at = 1 + 4 + 3 + 12 + 4 + 2 + 1 + 4;
        let length_at = life_bar_at + 5 + 8;
        let length = i32::from_le_bytes(bytes[length_at..length_at + 4].try_into().unwrap());
        let expected_block = codec.compress(b"").unwrap();
        assert_eq!(length as usize, expected_block.len());
        assert_eq!(bytes.len(), length_at + 4 + expected_block.len() + 8);
    }

    #[test]
    fn it_reuses_one_encoder_for_several_records() {
        let codec = LzmaCodec::default();
        let encoder = Encoder::new(&codec);
        let first = encoder.encode(&ReplayRecord::default()).unwrap();
        let named = ReplayRecord {
            player_name: "btmc".into(),
            ..ReplayRecord::default()
        };
        let second = encoder.encode(&named).unwrap();
        assert_eq!(second.len(), first.len() + 5);
        assert_eq!(encoder.encode(&ReplayRecord::default()).unwrap(), first);
    }

    #[test]
    fn it_writes_the_tail_from_build_time_mods() {
        let codec = LzmaCodec::default();
        let without = ReplayRecord {
            target_practice: Some(1.5),
            ..ReplayRecord::default()
        };
        let with = ReplayRecord {
            mods: ModFlags::TARGET_PRACTICE,
            target_practice: None,
            ..ReplayRecord::default()
        };
        let a = Encoder::new(&codec).encode(&without).unwrap();
        let b = Encoder::new(&codec).encode(&with).unwrap();
        assert_eq!(b.len(), a.len() + 8);
        assert_eq!(&b[b.len() - 8..], &0.0f64.to_le_bytes());
    }
}
