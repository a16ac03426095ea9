// Bit-level field reader and writer
//
// Every metadata decoder goes through `read_bits`. Fields are addressed by bit
// offset so the packed STREAMINFO layout can be read the same way as the
// byte-aligned seek table and picture fields.

use crate::error::{FlacError, FlacResult};

/// Byte order of a multi-byte field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    /// Most significant bit first, across byte boundaries
    Big,
    /// Byte groups reversed before assembly; width must be a multiple of 8
    Little,
}

/// Read `width` bits starting at `bit_offset` from `data`.
///
/// Big-endian reads take bits most-significant-first, so a field may start
/// and end anywhere inside a byte. Little-endian reads take the same span and
/// reverse its bytes, which is only meaningful for whole-byte widths.
pub fn read_bits(data: &[u8], bit_offset: usize, width: u32, endian: Endian) -> FlacResult<u64> {
    if width == 0 || width > 64 {
        return Err(FlacError::InvalidFieldWidth(width));
    }
    if endian == Endian::Little && width % 8 != 0 {
        return Err(FlacError::InvalidFieldWidth(width));
    }

    let available = data.len() * 8;
    let out_of_range = FlacError::OutOfRange {
        bit_offset,
        width,
        available,
    };
    match bit_offset.checked_add(width as usize) {
        Some(end) if end <= available => {}
        _ => return Err(out_of_range),
    }

    let mut value: u64 = 0;
    let mut pos = bit_offset;
    let mut remaining = width;
    while remaining > 0 {
        let byte = data[pos / 8];
        let bit_in_byte = (pos % 8) as u32;
        let take = (8 - bit_in_byte).min(remaining);
        let shift = 8 - bit_in_byte - take;
        let mask = ((1u16 << take) - 1) as u8;
        value = (value << take) | u64::from((byte >> shift) & mask);
        pos += take as usize;
        remaining -= take;
    }

    Ok(match endian {
        Endian::Big => value,
        Endian::Little => value.swap_bytes() >> (64 - width),
    })
}

/// Sequential cursor over a block payload.
#[derive(Debug, Clone)]
pub struct FieldReader<'a> {
    data: &'a [u8],
    bit_pos: usize,
}

impl<'a> FieldReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        FieldReader { data, bit_pos: 0 }
    }

    /// Read the next `width` bits in the given byte order.
    pub fn read(&mut self, width: u32, endian: Endian) -> FlacResult<u64> {
        let value = read_bits(self.data, self.bit_pos, width, endian)?;
        self.bit_pos += width as usize;
        Ok(value)
    }

    #[inline]
    pub fn read_be(&mut self, width: u32) -> FlacResult<u64> {
        self.read(width, Endian::Big)
    }

    #[inline]
    pub fn read_le(&mut self, width: u32) -> FlacResult<u64> {
        self.read(width, Endian::Little)
    }

    /// 32-bit big-endian field.
    pub fn read_be_u32(&mut self) -> FlacResult<u32> {
        Ok(self.read_be(32)? as u32)
    }

    /// 32-bit little-endian field.
    pub fn read_le_u32(&mut self) -> FlacResult<u32> {
        Ok(self.read_le(32)? as u32)
    }

    /// Borrow the next `len` bytes. A partially consumed byte is skipped first.
    pub fn read_bytes(&mut self, len: usize) -> FlacResult<&'a [u8]> {
        let start = self.byte_position();
        let end = start
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or(FlacError::OutOfRange {
                bit_offset: start * 8,
                width: u32::try_from(len.saturating_mul(8)).unwrap_or(u32::MAX),
                available: self.data.len() * 8,
            })?;
        self.bit_pos = end * 8;
        Ok(&self.data[start..end])
    }

    /// Borrow up to `len` bytes, stopping at the end of the payload.
    pub fn read_bytes_lossy(&mut self, len: usize) -> &'a [u8] {
        let start = self.byte_position().min(self.data.len());
        let end = start.saturating_add(len).min(self.data.len());
        self.bit_pos = end * 8;
        &self.data[start..end]
    }

    /// Bytes consumed so far, counting a partial byte as consumed.
    pub fn byte_position(&self) -> usize {
        self.bit_pos.div_ceil(8)
    }

    pub fn bit_position(&self) -> usize {
        self.bit_pos
    }

    pub fn remaining_bytes(&self) -> usize {
        self.data.len().saturating_sub(self.byte_position())
    }

    pub fn is_byte_aligned(&self) -> bool {
        self.bit_pos % 8 == 0
    }
}

/// MSB-first bit writer, the inverse of `FieldReader`.
#[derive(Debug, Default, Clone)]
pub struct BitWriter {
    bytes: Vec<u8>,
    bit_len: usize,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the low `width` bits of `value`, most significant first.
    pub fn write(&mut self, value: u64, width: u32) {
        for i in (0..width.min(64)).rev() {
            let bit = ((value >> i) & 1) as u8;
            if self.bit_len % 8 == 0 {
                self.bytes.push(0);
            }
            if bit == 1 {
                let last = self.bytes.len() - 1;
                self.bytes[last] |= 0x80 >> (self.bit_len % 8);
            }
            self.bit_len += 1;
        }
    }

    /// Append a whole-byte field with its bytes reversed.
    pub fn write_le(&mut self, value: u64, width: u32) {
        let width = width.min(64) & !7;
        if width == 0 {
            return;
        }
        self.write(value.swap_bytes() >> (64 - width), width);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        if self.bit_len % 8 == 0 {
            self.bytes.extend_from_slice(bytes);
            self.bit_len += bytes.len() * 8;
        } else {
            for &b in bytes {
                self.write(u64::from(b), 8);
            }
        }
    }

    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn reads_across_byte_boundaries() {
        let data = [0b1010_1100, 0b0101_0011];
        assert_eq!(read_bits(&data, 0, 1, Endian::Big).unwrap(), 1);
        assert_eq!(read_bits(&data, 1, 7, Endian::Big).unwrap(), 0b010_1100);
        assert_eq!(read_bits(&data, 4, 8, Endian::Big).unwrap(), 0b1100_0101);
        assert_eq!(read_bits(&data, 0, 16, Endian::Big).unwrap(), 0xAC53);
    }

    #[test]
    fn little_endian_reverses_bytes() {
        let data = [0x09, 0x00, 0x00, 0x00];
        assert_eq!(read_bits(&data, 0, 32, Endian::Little).unwrap(), 9);
        assert_eq!(read_bits(&data, 0, 32, Endian::Big).unwrap(), 0x0900_0000);
    }

    #[test]
    fn full_width_read() {
        let data = [0xFF; 8];
        assert_eq!(read_bits(&data, 0, 64, Endian::Big).unwrap(), u64::MAX);
        assert_eq!(read_bits(&data, 0, 64, Endian::Little).unwrap(), u64::MAX);
    }

    #[test]
    fn rejects_out_of_range_spans() {
        let data = [0u8; 2];
        let err = read_bits(&data, 9, 8, Endian::Big).unwrap_err();
        assert_eq!(
            err,
            FlacError::OutOfRange {
                bit_offset: 9,
                width: 8,
                available: 16
            }
        );
        assert!(read_bits(&data, usize::MAX, 8, Endian::Big).is_err());
    }

    #[test]
    fn rejects_bad_widths() {
        let data = [0u8; 16];
        assert_eq!(
            read_bits(&data, 0, 0, Endian::Big),
            Err(FlacError::InvalidFieldWidth(0))
        );
        assert_eq!(
            read_bits(&data, 0, 65, Endian::Big),
            Err(FlacError::InvalidFieldWidth(65))
        );
        assert_eq!(
            read_bits(&data, 0, 12, Endian::Little),
            Err(FlacError::InvalidFieldWidth(12))
        );
    }

    #[test]
    fn cursor_tracks_position() {
        let data = [0x12, 0x34, 0x56, 0x78, 0x9A];
        let mut reader = FieldReader::new(&data);
        assert_eq!(reader.read_be(4).unwrap(), 0x1);
        assert!(!reader.is_byte_aligned());
        assert_eq!(reader.byte_position(), 1);
        assert_eq!(reader.read_bytes(2).unwrap(), &[0x34, 0x56]);
        assert_eq!(reader.remaining_bytes(), 2);
        assert!(reader.read_bytes(3).is_err());
        assert_eq!(reader.read_bytes_lossy(3), &[0x78, 0x9A]);
        assert_eq!(reader.remaining_bytes(), 0);
    }

    proptest! {
        #[test]
        fn writer_and_reader_agree(value in any::<u64>(), width in 1u32..=64, pad in 0u32..8) {
            let masked = if width == 64 { value } else { value & ((1u64 << width) - 1) };
            let mut writer = BitWriter::new();
            writer.write(0, pad);
            writer.write(masked, width);
            let bytes = writer.into_bytes();
            prop_assert_eq!(read_bits(&bytes, pad as usize, width, Endian::Big).unwrap(), masked);
        }
    }
}
