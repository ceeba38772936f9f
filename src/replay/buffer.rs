use byteorder::{ByteOrder, LittleEndian};

use crate::error::{ReplayError, Result};

/// Presence byte of an empty string field.
pub const STRING_ABSENT: u8 = 0x00;
/// Presence byte of a string field followed by a ULEB128 length and UTF-8 bytes.
pub const STRING_PRESENT: u8 = 0x0b;

const CONTINUATION_BIT: u8 = 0x80;
const LOWEST_SEVEN_BITS: u8 = 0x7f;

/// Positional little-endian reader over a borrowed buffer.
#[derive(Debug, Clone, Copy)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    byte_index: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        ByteCursor {
            data,
            byte_index: 0,
        }
    }

    pub fn offset(&self) -> usize {
        self.byte_index
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.byte_index
    }

    pub fn done(&self) -> bool {
        self.byte_index >= self.data.len()
    }

    /// Returns the next `length` bytes and advances past them.
    pub fn read_raw(&mut self, length: usize) -> Result<&'a [u8]> {
        if length > self.remaining() {
            return Err(ReplayError::TruncatedInput {
                offset: self.byte_index,
                needed: length,
                remaining: self.remaining(),
            });
        }
        let start = self.byte_index;
        self.byte_index += length;
        Ok(&self.data[start..self.byte_index])
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_raw(1)?[0])
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        self.read_raw(2).map(LittleEndian::read_i16)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.read_raw(4).map(LittleEndian::read_i32)
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        self.read_raw(8).map(LittleEndian::read_i64)
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        self.read_raw(8).map(LittleEndian::read_f64)
    }

    /// Reads an unsigned LEB128 value.
    /// Format: 7 data bits per byte, least significant group first.
    ///     * Highest bit tells if another byte follows.
    pub fn read_uleb128(&mut self) -> Result<u64> {
        let start = self.byte_index;
        let mut value: u64 = 0;
        let mut shift = 0;
        loop {
            let byte = self.read_u8()?;
            let group = u64::from(byte & LOWEST_SEVEN_BITS);
            if shift >= 64 || (shift > 0 && group >> (64 - shift) != 0) {
                return Err(ReplayError::invalid_format(
                    start,
                    "variable-length integer overflows 64 bits",
                ));
            }
            value |= group << shift;
            if byte & CONTINUATION_BIT == 0 {
                break;
            }
            shift += 7;
        }
        Ok(value)
    }

    /// Reads a presence-tagged, length-prefixed UTF-8 string.
    pub fn read_string(&mut self) -> Result<String> {
        let start = self.byte_index;
        match self.read_u8()? {
            STRING_ABSENT => Ok(String::new()),
            STRING_PRESENT => {
                let length_offset = self.byte_index;
                let length = usize::try_from(self.read_uleb128()?).map_err(|_| {
                    ReplayError::invalid_format(length_offset, "string length exceeds address space")
                })?;
                let text_offset = self.byte_index;
                let bytes = self.read_raw(length)?;
                std::str::from_utf8(bytes)
                    .map(str::to_owned)
                    .map_err(|source| ReplayError::EncodingFailure {
                        offset: text_offset,
                        source,
                    })
            }
            other => Err(ReplayError::invalid_format(
                start,
                format!("unexpected string presence byte 0x{other:02x}"),
            )),
        }
    }
}

/// Append-only little-endian writer. Writes cannot fail.
#[derive(Debug, Default, Clone)]
pub struct ByteWriter {
    data: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        ByteWriter {
            data: Vec::with_capacity(capacity),
        }
    }

    /// Number of bytes written so far.
    pub fn offset(&self) -> usize {
        self.data.len()
    }

    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.data.push(value);
    }

    pub fn write_i16(&mut self, value: i16) {
        let mut buf = [0; 2];
        LittleEndian::write_i16(&mut buf, value);
        self.write_raw(&buf);
    }

    pub fn write_i32(&mut self, value: i32) {
        let mut buf = [0; 4];
        LittleEndian::write_i32(&mut buf, value);
        self.write_raw(&buf);
    }

    pub fn write_i64(&mut self, value: i64) {
        let mut buf = [0; 8];
        LittleEndian::write_i64(&mut buf, value);
        self.write_raw(&buf);
    }

    pub fn write_f64(&mut self, value: f64) {
        let mut buf = [0; 8];
        LittleEndian::write_f64(&mut buf, value);
        self.write_raw(&buf);
    }

    pub fn write_uleb128(&mut self, mut value: u64) {
        loop {
            let mut byte = (value as u8) & LOWEST_SEVEN_BITS;
            value >>= 7;
            if value != 0 {
                byte |= CONTINUATION_BIT;
            }
            self.data.push(byte);
            if value == 0 {
                break;
            }
        }
    }

    pub fn write_string(&mut self, value: &str) {
        if value.is_empty() {
            self.write_u8(STRING_ABSENT);
            return;
        }
        self.write_u8(STRING_PRESENT);
        self.write_uleb128(value.len() as u64);
        self.write_raw(value.as_bytes());
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}
