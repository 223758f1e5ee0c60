//! Base-128 varints and the zig-zag transform.
//!
//! Varints carry 7 bits per byte, low-order group first; every byte but the
//! last has its high bit set. A `u64` never needs more than ten bytes, and
//! the tenth byte can only hold the single remaining bit.

use twpb_buffers::Writer;

use crate::error::{DecodeError, Malformed};

/// Longest possible encoding of a `u64`.
pub const MAX_VARINT_LEN: usize = 10;

/// Encodes `value` into a fresh byte vector.
pub fn encode_varint(value: u64) -> Vec<u8> {
    let mut writer = Writer::with_alloc_size(MAX_VARINT_LEN);
    write_varint(&mut writer, value);
    writer.flush()
}

/// Appends the varint encoding of `value` to `writer`.
pub fn write_varint(writer: &mut Writer, mut value: u64) {
    while value >= 0x80 {
        writer.u8((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    writer.u8(value as u8);
}

/// Number of bytes [`write_varint`] emits for `value`.
pub fn encoded_len(value: u64) -> usize {
    let bits = 64 - (value | 1).leading_zeros() as usize;
    bits.div_ceil(7)
}

/// Decodes one varint from the front of `buf`, returning the value and the
/// number of bytes consumed.
pub fn decode_varint(buf: &[u8]) -> Result<(u64, usize), DecodeError> {
    let mut result: u64 = 0;
    for (i, &byte) in buf.iter().take(MAX_VARINT_LEN).enumerate() {
        if i == MAX_VARINT_LEN - 1 && byte > 0x01 {
            return Err(Malformed::VarintOverflow.into());
        }
        result |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((result, i + 1));
        }
    }
    Err(DecodeError::TruncatedInput)
}

#[inline]
pub fn zigzag_encode(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

#[inline]
pub fn zigzag_decode(n: u64) -> i64 {
    ((n >> 1) as i64) ^ -((n & 1) as i64)
}

/// 32-bit zig-zag, used by `sint32`.
#[inline]
pub fn zigzag_encode32(n: i32) -> u32 {
    ((n << 1) ^ (n >> 31)) as u32
}

#[inline]
pub fn zigzag_decode32(n: u32) -> i32 {
    ((n >> 1) as i32) ^ -((n & 1) as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_300() {
        assert_eq!(encode_varint(300), [0xac, 0x02]);
        assert_eq!(decode_varint(&[0xac, 0x02]), Ok((300, 2)));
    }

    #[test]
    fn encodes_single_byte_values() {
        assert_eq!(encode_varint(0), [0x00]);
        assert_eq!(encode_varint(1), [0x01]);
        assert_eq!(encode_varint(127), [0x7f]);
        assert_eq!(encode_varint(128), [0x80, 0x01]);
    }

    #[test]
    fn encodes_u64_max_in_ten_bytes() {
        let bytes = encode_varint(u64::MAX);
        assert_eq!(bytes.len(), MAX_VARINT_LEN);
        assert_eq!(bytes[9], 0x01);
        assert_eq!(decode_varint(&bytes), Ok((u64::MAX, 10)));
    }

    #[test]
    fn encoded_len_matches_output() {
        for v in [0, 1, 127, 128, 300, 16_383, 16_384, u32::MAX as u64, u64::MAX] {
            assert_eq!(encoded_len(v), encode_varint(v).len(), "value {v}");
        }
    }

    #[test]
    fn decode_ignores_trailing_bytes() {
        assert_eq!(decode_varint(&[0x08, 0xff, 0xff]), Ok((8, 1)));
    }

    #[test]
    fn decode_truncated() {
        assert_eq!(decode_varint(&[]), Err(DecodeError::TruncatedInput));
        assert_eq!(decode_varint(&[0x80, 0x80]), Err(DecodeError::TruncatedInput));
    }

    #[test]
    fn decode_rejects_eleven_byte_varint() {
        let bytes = [0xff; 11];
        assert_eq!(
            decode_varint(&bytes),
            Err(DecodeError::Malformed(Malformed::VarintOverflow))
        );
    }

    #[test]
    fn decode_rejects_bits_beyond_64() {
        let mut bytes = [0x80u8; 10];
        bytes[9] = 0x02;
        assert_eq!(
            decode_varint(&bytes),
            Err(DecodeError::Malformed(Malformed::VarintOverflow))
        );
    }

    #[test]
    fn zigzag_mapping() {
        assert_eq!(zigzag_encode(0), 0);
        assert_eq!(zigzag_encode(-1), 1);
        assert_eq!(zigzag_encode(1), 2);
        assert_eq!(zigzag_encode(-2), 3);
        assert_eq!(zigzag_encode(i64::MAX), u64::MAX - 1);
        assert_eq!(zigzag_encode(i64::MIN), u64::MAX);
        assert_eq!(zigzag_decode(u64::MAX), i64::MIN);
    }

    #[test]
    fn zigzag32_mapping() {
        assert_eq!(zigzag_encode32(-300), 599);
        assert_eq!(zigzag_decode32(599), -300);
        assert_eq!(zigzag_encode32(0x3fff_ffff), 0x7fff_fffe);
        assert_eq!(zigzag_encode32(i32::MIN), u32::MAX);
        assert_eq!(zigzag_decode32(u32::MAX), i32::MIN);
    }
}
