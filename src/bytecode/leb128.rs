//! Unsigned LEB128.
//!
//! Seven payload bits per byte, least significant group first; the high bit
//! marks a continuation. At most ten bytes, and the tenth may only carry the
//! 64th bit.

/// Why an encoded value could not be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LebError {
    /// Input ended inside the encoding.
    Truncated,
    /// The value does not fit in 64 bits.
    Overflow,
}

/// Decode one value from the start of `bytes`, returning it and the bytes consumed.
pub fn decode_uleb(bytes: &[u8]) -> Result<(u64, usize), LebError> {
    let mut value = 0u64;
    let mut shift = 0u32;

    for (i, &byte) in bytes.iter().enumerate() {
        let payload = u64::from(byte & 0x7f);
        if shift > 63 || (shift == 63 && payload > 1) {
            return Err(LebError::Overflow);
        }
        value |= payload << shift;
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
        shift += 7;
    }
    Err(LebError::Truncated)
}

/// Append the encoding of `value` to `out`.
pub fn write_uleb(value: u64, out: &mut Vec<u8>) {
    let mut rest = value;
    loop {
        let byte = (rest & 0x7f) as u8;
        rest >>= 7;
        if rest == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

/// Encoded size of `value` in bytes.
pub fn uleb_len(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.max(1).div_ceil(7)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_encodings() {
        assert_eq!(decode_uleb(&[0x00]), Ok((0, 1)));
        assert_eq!(decode_uleb(&[0x7f]), Ok((127, 1)));
        assert_eq!(decode_uleb(&[0xac, 0x02]), Ok((300, 2)));
        assert_eq!(decode_uleb(&[0xe5, 0x8e, 0x26, 0xff]), Ok((624_485, 3)));
    }

    #[test]
    fn test_writer_matches_reader() {
        for value in [0, 1, 127, 128, 300, 16_383, 16_384, u32::MAX as u64, u64::MAX - 1, u64::MAX] {
            let mut out = Vec::new();
            write_uleb(value, &mut out);
            assert_eq!(out.len(), uleb_len(value), "{value}");
            assert_eq!(decode_uleb(&out), Ok((value, out.len())), "{value}");
        }

        let mut out = Vec::new();
        write_uleb(300, &mut out);
        assert_eq!(out, [0xac, 0x02]);
    }

    #[test]
    fn test_u64_max_is_ten_bytes() {
        let mut max = vec![0xff; 9];
        max.push(0x01);
        assert_eq!(decode_uleb(&max), Ok((u64::MAX, 10)));
    }

    #[test]
    fn test_rejects_values_wider_than_64_bits() {
        let mut wide = vec![0xff; 9];
        wide.push(0x02);
        assert_eq!(decode_uleb(&wide), Err(LebError::Overflow));

        let mut long = vec![0x80; 10];
        long.push(0x00);
        assert_eq!(decode_uleb(&long), Err(LebError::Overflow));
    }

    #[test]
    fn test_rejects_truncated_input() {
        assert_eq!(decode_uleb(&[]), Err(LebError::Truncated));
        assert_eq!(decode_uleb(&[0x80, 0x80]), Err(LebError::Truncated));
    }
}
