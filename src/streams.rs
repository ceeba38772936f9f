//! Textual sub-formats embedded in the replay: the life-bar graph string and
//! the compressed input-frame block.

pub mod parsers;

use tracing::{debug, trace};

use crate::compression::CompressionCodec;
use crate::error::{ReplayError, Result};
use crate::replay::types::{InputFrame, LifeBarEntry};
use parsers::{parse_frame_record, parse_life_bar_entry};

/// Leading entry the encoder always writes before the real samples.
pub const LIFE_BAR_SENTINEL: &str = "0,";
const LIFE_BAR_SEPARATOR: char = '|';
const FRAME_SEPARATOR: char = ',';

/// Decodes a life-bar string. `offset` is the wire offset of the string field
/// and is reported on failure.
pub fn decode_life_bar(text: &str, offset: usize) -> Result<Vec<LifeBarEntry>> {
    text.split(LIFE_BAR_SEPARATOR)
        .enumerate()
        .filter(|(index, piece)| {
            !piece.is_empty() && !(*index == 0 && *piece == LIFE_BAR_SENTINEL)
        })
        .map(|(index, piece)| {
            parse_life_bar_entry(piece)
                .map(|(_, entry)| entry)
                .map_err(|_| {
                    ReplayError::invalid_format(
                        offset,
                        format!("malformed life-bar entry #{index}: {piece:?}"),
                    )
                })
        })
        .collect()
}

/// Renders a life-bar string, sentinel first.
pub fn encode_life_bar(entries: &[LifeBarEntry]) -> String {
    let body = entries
        .iter()
        .map(|entry| format!("{},{}", entry.health, entry.time_offset))
        .collect::<Vec<_>>()
        .join("|");
    format!("{LIFE_BAR_SENTINEL}{LIFE_BAR_SEPARATOR}{body}")
}

/// Splits a decompressed frame payload into frames. Empty records (such as
/// the one after a trailing comma) are skipped.
pub fn parse_frame_payload(payload: &str, offset: usize) -> Result<Vec<InputFrame>> {
    payload
        .split(FRAME_SEPARATOR)
        .enumerate()
        .filter(|(_, record)| !record.is_empty())
        .map(|(index, record)| {
            parse_frame_record(record)
                .map(|(_, frame)| {
                    trace!(index, ?frame, "frame");
                    frame
                })
                .map_err(|_| {
                    ReplayError::invalid_format(
                        offset,
                        format!("malformed frame record #{index}: {record:?}"),
                    )
                })
        })
        .collect()
}

pub fn render_frame_payload(frames: &[InputFrame]) -> String {
    frames
        .iter()
        .map(|frame| {
            format!(
                "{}|{}|{}|{}",
                frame.time_delta,
                frame.x,
                frame.y,
                frame.keys.to_wire()
            )
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Decompresses and parses the frame block. `offset` is the wire offset of the
/// compressed bytes.
pub fn decode_frames<C: CompressionCodec>(
    block: &[u8],
    codec: &C,
    offset: usize,
) -> Result<Vec<InputFrame>> {
    if block.is_empty() {
        debug!(offset, "empty frame block");
        return Ok(Vec::new());
    }

    let payload = codec
        .decompress(block)
        .map_err(|source| ReplayError::CompressionFailure { offset, source })?;
    let text = std::str::from_utf8(&payload)
        .map_err(|source| ReplayError::EncodingFailure { offset, source })?;
    let frames = parse_frame_payload(text, offset)?;

    debug!(
        offset,
        compressed = block.len(),
        decompressed = payload.len(),
        frames = frames.len(),
        codec = codec.name(),
        "decoded frame block"
    );
    Ok(frames)
}

/// Renders and compresses the frame block. `offset` is where the block will
/// land in the output and is reported on failure.
pub fn encode_frames<C: CompressionCodec>(
    frames: &[InputFrame],
    codec: &C,
    offset: usize,
) -> Result<Vec<u8>> {
    let payload = render_frame_payload(frames);
    let block = codec
        .compress(payload.as_bytes())
        .map_err(|source| ReplayError::CompressionFailure { offset, source })?;

    debug!(
        offset,
        decompressed = payload.len(),
        compressed = block.len(),
        frames = frames.len(),
        codec = codec.name(),
        "encoded frame block"
    );
    Ok(block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compression::LzmaCodec;
    use crate::replay::types::Keys;

    fn entry(health: f64, time_offset: i32) -> LifeBarEntry {
        LifeBarEntry {
            health,
            time_offset,
        }
    }

    #[test]
    fn it_decodes_life_bar_entries_in_order() {
        let entries = decode_life_bar("0,|1,500|0.5,1500|1500", 0).unwrap();
        assert_eq!(
            entries,
            vec![entry(1.0, 500), entry(0.5, 1500), entry(1.0, 1500)]
        );
    }

    #[test]
    fn it_decodes_a_time_only_first_entry() {
        let entries = decode_life_bar("1500|1,2000|", 0).unwrap();
        assert_eq!(entries, vec![entry(1.0, 1500), entry(1.0, 2000)]);
    }

    #[test]
    fn it_decodes_the_empty_graph() {
        assert!(decode_life_bar("", 0).unwrap().is_empty());
        assert!(decode_life_bar("0,|", 0).unwrap().is_empty());
    }

    #[test]
    fn it_encodes_the_sentinel_first() {
        assert_eq!(encode_life_bar(&[]), "0,|");
        assert_eq!(
            encode_life_bar(&[entry(1.0, 500), entry(0.25, 900)]),
            "0,|1,500|0.25,900"
        );
    }

    #[test]
    fn it_keeps_percentage_style_health_unscaled() {
        let entries = decode_life_bar("100,500", 0).unwrap();
        assert_eq!(entries, vec![entry(100.0, 500)]);
        assert_eq!(encode_life_bar(&entries), "0,|100,500");
    }

    #[test]
    fn it_does_not_grow_the_sentinel_on_reencode() {
        let text = "0,|1,500|0.88,12004";
        let entries = decode_life_bar(text, 0).unwrap();
        assert_eq!(encode_life_bar(&entries), text);
    }

    #[test]
    fn it_reports_the_field_offset_for_bad_entries() {
        let err = decode_life_bar("0,|1,500|oops", 321).unwrap_err();
        assert!(matches!(err, ReplayError::InvalidFormat { offset: 321, .. }));
        assert!(err.to_string().contains("#2"));
    }

    #[test]
    fn it_parses_an_empty_payload_to_no_frames() {
        assert!(parse_frame_payload("", 0).unwrap().is_empty());
    }

    #[test]
    fn it_keeps_the_seed_frame() {
        let frames = parse_frame_payload("0|0|0|0,-12345|0|0|0", 0).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], InputFrame::default());
        assert!(frames[1].is_seed());
        assert_eq!(frames[1].time_delta, -12345);
    }

    #[test]
    fn it_skips_the_trailing_empty_record() {
        let frames = parse_frame_payload("16|1|2|1,16|3|4|0,", 0).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].x, 3.0);
    }

    #[test]
    fn it_rejects_short_frame_records() {
        let err = parse_frame_payload("16|1|2|1,16|3|4", 77).unwrap_err();
        assert!(matches!(err, ReplayError::InvalidFormat { offset: 77, .. }));
    }

    #[test]
    fn it_renders_frames_in_order() {
        let frames = [
            InputFrame {
                time_delta: 0,
                x: 256.0,
                y: -500.0,
                keys: Keys::empty(),
            },
            InputFrame {
                time_delta: 16,
                x: 100.5,
                y: 20.25,
                keys: Keys::M1 | Keys::K1,
            },
            InputFrame::seed(777),
        ];
        assert_eq!(
            render_frame_payload(&frames),
            "0|256|-500|0,16|100.5|20.25|5,-12345|0|0|777"
        );
    }

    #[test]
    fn it_restores_frames_through_the_codec() {
        let codec = LzmaCodec::default();
        let frames = vec![
            InputFrame {
                time_delta: 16,
                x: 0.1,
                y: 383.99,
                keys: Keys::K2 | Keys::M2,
            },
            InputFrame::seed(1234),
        ];
        let block = encode_frames(&frames, &codec, 0).unwrap();
        assert_eq!(decode_frames(&block, &codec, 0).unwrap(), frames);
    }

    #[test]
    fn it_decodes_frames_from_an_xz_block() {
        use std::io::Write;

        let mut encoder = xz2::write::XzEncoder::new(Vec::new(), 6);
        encoder.write_all(b"16|256|192|1,-12345|0|0|777").unwrap();
        let block = encoder.finish().unwrap();

        let frames = decode_frames(&block, &LzmaCodec::default(), 0).unwrap();
        assert_eq!(
            frames,
            vec![
                InputFrame {
                    time_delta: 16,
                    x: 256.0,
                    y: 192.0,
                    keys: Keys::M1,
                },
                InputFrame::seed(777),
            ]
        );
    }

    #[test]
    fn it_decodes_an_empty_block_without_decompressing() {
        let frames = decode_frames(&[], &LzmaCodec::default(), 10).unwrap();
        assert!(frames.is_empty());
    }

    #[test]
    fn it_reports_corrupt_blocks_as_compression_failures() {
        let err = decode_frames(&[1, 2, 3, 4], &LzmaCodec::default(), 55).unwrap_err();
        assert!(matches!(
            err,
            ReplayError::CompressionFailure { offset: 55, .. }
        ));
    }
}
