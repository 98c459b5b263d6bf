//! Bounds-checked cursor over an in-memory byte buffer.

use super::leb128::{decode_uleb, LebError};
use super::{BytecodeError, BytecodeResult};

#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Current position from the start of the buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn read_bytes(&mut self, len: usize) -> BytecodeResult<&'a [u8]> {
        if len > self.remaining() {
            return Err(BytecodeError::UnexpectedEof {
                offset: self.offset,
                needed: len - self.remaining(),
            });
        }
        let bytes = &self.data[self.offset..self.offset + len];
        self.offset += len;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> BytecodeResult<[u8; N]> {
        let mut out = [0; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> BytecodeResult<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> BytecodeResult<u16> {
        self.read_array().map(u16::from_le_bytes)
    }

    pub fn read_u32(&mut self) -> BytecodeResult<u32> {
        self.read_array().map(u32::from_le_bytes)
    }

    pub fn read_u64(&mut self) -> BytecodeResult<u64> {
        self.read_array().map(u64::from_le_bytes)
    }

    /// Little-endian unsigned integer of `width` bytes (1, 2, 4 or 8), zero-extended.
    pub fn read_uint(&mut self, width: usize) -> BytecodeResult<u64> {
        let mut buf = [0u8; 8];
        buf[..width].copy_from_slice(self.read_bytes(width)?);
        Ok(u64::from_le_bytes(buf))
    }

    pub fn read_uleb(&mut self) -> BytecodeResult<u64> {
        let start = self.offset;
        match decode_uleb(&self.data[start..]) {
            Ok((value, len)) => {
                self.offset += len;
                Ok(value)
            }
            Err(LebError::Overflow) => Err(BytecodeError::Leb128Overflow { offset: start }),
            Err(LebError::Truncated) => Err(BytecodeError::UnexpectedEof {
                offset: self.data.len(),
                needed: 1,
            }),
        }
    }

    /// A ULEB128 length that must still fit in the remaining input.
    pub fn read_len(&mut self) -> BytecodeResult<usize> {
        let offset = self.offset;
        let length = self.read_uleb()?;
        match usize::try_from(length) {
            Ok(len) if len <= self.remaining() => Ok(len),
            _ => Err(BytecodeError::LengthOverflow { length, offset }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_width_reads_are_little_endian() {
        let data = [0x34, 0x12, 0x00, 0x0d, 0xf0, 0x01, 0xff];
        let mut reader = ByteReader::new(&data);
        assert_eq!(reader.read_u16().unwrap(), 0x1234);
        assert_eq!(reader.read_u32().unwrap(), 0x01f0_0d00);
        assert_eq!(reader.read_u8().unwrap(), 0xff);
        assert!(reader.is_empty());
        assert_eq!(reader.offset(), data.len());
    }

    #[test]
    fn test_short_read_reports_offset() {
        let mut reader = ByteReader::new(&[1, 2, 3]);
        reader.read_u8().unwrap();
        assert_eq!(
            reader.read_u32(),
            Err(BytecodeError::UnexpectedEof { offset: 1, needed: 2 })
        );
        // a failed read does not advance
        assert_eq!(reader.offset(), 1);
    }

    #[test]
    fn test_read_uint_widths() {
        let mut reader = ByteReader::new(&[0xaa, 0x01, 0x02, 0x78, 0x56, 0x34, 0x12]);
        assert_eq!(reader.read_uint(1).unwrap(), 0xaa);
        assert_eq!(reader.read_uint(2).unwrap(), 0x0201);
        assert_eq!(reader.read_uint(4).unwrap(), 0x1234_5678);
    }

    #[test]
    fn test_lengths_are_checked_against_input() {
        let mut reader = ByteReader::new(&[0x02, 0xaa, 0xbb]);
        assert_eq!(reader.read_len().unwrap(), 2);

        let mut reader = ByteReader::new(&[0xac, 0x02, 0x00]);
        assert_eq!(
            reader.read_len(),
            Err(BytecodeError::LengthOverflow { length: 300, offset: 0 })
        );
    }

    #[test]
    fn test_uleb_errors() {
        let mut overflow = vec![0xff; 9];
        overflow.push(0x7f);
        assert_eq!(
            ByteReader::new(&overflow).read_uleb(),
            Err(BytecodeError::Leb128Overflow { offset: 0 })
        );
        assert!(matches!(
            ByteReader::new(&[0x80]).read_uleb(),
            Err(BytecodeError::UnexpectedEof { .. })
        ));
    }
}
