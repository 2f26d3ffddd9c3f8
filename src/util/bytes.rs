//! Fixed-width big-endian byte codecs.
//!
//! Every numeric key and every posting-list entry in the storage layer is
//! an 8-byte big-endian value, so that byte-lexicographic key order matches
//! numeric order for unsigned keys. Floats are raw IEEE-754 bits; negative
//! floats do not sort numerically under this encoding.

use crate::error::{MyricaError, Result};

/// Encode a u64 as 8 big-endian bytes.
pub fn encode_u64(value: u64) -> [u8; 8] {
    value.to_be_bytes()
}

/// Decode 8 big-endian bytes into a u64.
pub fn decode_u64(bytes: &[u8]) -> Result<u64> {
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| MyricaError::parse(format!("expected 8 bytes for u64, got {}", bytes.len())))?;
    Ok(u64::from_be_bytes(arr))
}

/// Encode an i64 as 8 big-endian two's-complement bytes.
pub fn encode_i64(value: i64) -> [u8; 8] {
    value.to_be_bytes()
}

/// Decode 8 big-endian bytes into an i64.
pub fn decode_i64(bytes: &[u8]) -> Result<i64> {
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| MyricaError::parse(format!("expected 8 bytes for i64, got {}", bytes.len())))?;
    Ok(i64::from_be_bytes(arr))
}

/// Encode an f64 as its raw IEEE-754 bits, big-endian.
pub fn encode_f64(value: f64) -> [u8; 8] {
    value.to_bits().to_be_bytes()
}

/// Decode 8 big-endian bytes into an f64.
pub fn decode_f64(bytes: &[u8]) -> Result<f64> {
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| MyricaError::parse(format!("expected 8 bytes for f64, got {}", bytes.len())))?;
    Ok(f64::from_bits(u64::from_be_bytes(arr)))
}

/// Pack a sequence of u64 values into concatenated 8-byte big-endian blocks.
pub fn encode_u64_seq(values: &[u64]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * 8);
    for &v in values {
        out.extend_from_slice(&v.to_be_bytes());
    }
    out
}

/// Unpack concatenated 8-byte big-endian blocks into u64 values.
///
/// Fails with [`MyricaError::CorruptPostingList`] when the input length is
/// not a multiple of 8.
pub fn decode_u64_seq(bytes: &[u8]) -> Result<Vec<u64>> {
    if bytes.len() % 8 != 0 {
        return Err(MyricaError::CorruptPostingList { len: bytes.len() });
    }

    let mut values = Vec::with_capacity(bytes.len() / 8);
    for chunk in bytes.chunks_exact(8) {
        values.push(u64::from_be_bytes(chunk.try_into().unwrap()));
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u64_roundtrip() {
        for value in [0u64, 1, 255, 256, u64::MAX] {
            assert_eq!(decode_u64(&encode_u64(value)).unwrap(), value);
        }
    }

    #[test]
    fn test_i64_roundtrip() {
        for value in [i64::MIN, -1, 0, 1, i64::MAX] {
            assert_eq!(decode_i64(&encode_i64(value)).unwrap(), value);
        }
    }

    #[test]
    fn test_f64_roundtrip() {
        for value in [0.0f64, -1.5, 3.14159, f64::MAX] {
            assert_eq!(decode_f64(&encode_f64(value)).unwrap(), value);
        }
    }

    #[test]
    fn test_unsigned_order_matches_byte_order() {
        // The reason for big-endian: byte order must equal numeric order.
        let a = encode_u64(1);
        let b = encode_u64(256);
        let c = encode_u64(u64::MAX);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn test_seq_roundtrip() {
        let values = vec![1u64, 2, 42, u64::MAX];
        let packed = encode_u64_seq(&values);
        assert_eq!(packed.len(), 32);
        assert_eq!(decode_u64_seq(&packed).unwrap(), values);
    }

    #[test]
    fn test_seq_rejects_ragged_length() {
        let err = decode_u64_seq(&[0u8; 9]).unwrap_err();
        assert!(matches!(
            err,
            MyricaError::CorruptPostingList { len: 9 }
        ));
    }

    #[test]
    fn test_wrong_width() {
        assert!(decode_u64(&[0u8; 4]).is_err());
        assert!(decode_i64(&[0u8; 9]).is_err());
    }
}
