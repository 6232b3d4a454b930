//! CRC-32 helpers
//!
//! Bundles record the CRC-32 of their uncompressed body. When a body is
//! rebuilt, four trailing bytes can be appended to steer the CRC back to the
//! recorded value.

use crate::error::{BinaryError, Result};
use crc32fast::Hasher;

/// Reflected CRC-32 polynomial
const POLYNOMIAL: u32 = 0xEDB8_8320;
/// x^-32 reduced modulo the polynomial, in reflected form
const INVERSE_X32: u32 = 0x5B35_8FD3;

pub fn crc32(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

/// Continue a CRC over more data
pub fn crc32_update(crc: u32, data: &[u8]) -> u32 {
    let mut hasher = Hasher::new_with_initial(crc);
    hasher.update(data);
    hasher.finalize()
}

/// Value whose little-endian bytes, appended to data with CRC `original`,
/// give a CRC of `desired`.
pub fn forge_trailing_crc32(original: u32, desired: u32) -> u32 {
    let original = original ^ 0xFFFF_FFFF;
    let mut desired = desired ^ 0xFFFF_FFFF;
    let mut adjustment = 0u32;
    for _ in 0..32 {
        adjustment = if adjustment & 1 != 0 {
            (adjustment >> 1) ^ POLYNOMIAL
        } else {
            adjustment >> 1
        };
        if desired & 1 != 0 {
            adjustment ^= INVERSE_X32;
        }
        desired >>= 1;
    }
    adjustment ^ original
}

/// Append a forged adjustment to `body` if its CRC is not already `desired`.
///
/// Returns whether bytes were appended. A forged value that does not produce
/// the requested CRC is an [`BinaryError::Internal`] error.
pub fn append_crc_adjustment(body: &mut Vec<u8>, desired: u32) -> Result<bool> {
    let current = crc32(body);
    if current == desired {
        return Ok(false);
    }
    let adjustment = forge_trailing_crc32(current, desired).to_le_bytes();
    let forged = crc32_update(current, &adjustment);
    if forged != desired {
        return Err(BinaryError::internal(format!(
            "CRC forgery produced {:08x} instead of {:08x}",
            forged, desired
        )));
    }
    body.extend_from_slice(&adjustment);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_crc() {
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
        assert_eq!(crc32_update(crc32(b"1234"), b"56789"), 0xCBF4_3926);
    }

    #[test]
    fn test_forge_on_empty_data() {
        let adjustment = forge_trailing_crc32(crc32(&[]), 0xDEAD_BEEF);
        assert_eq!(crc32(&adjustment.to_le_bytes()), 0xDEAD_BEEF);
    }

    #[test]
    fn test_append_adjustment() {
        let mut body = b"rebuilt bundle body".to_vec();
        assert!(append_crc_adjustment(&mut body, 0x1234_5678).unwrap());
        assert_eq!(body.len(), 23);
        assert_eq!(crc32(&body), 0x1234_5678);

        assert!(!append_crc_adjustment(&mut body, 0x1234_5678).unwrap());
        assert_eq!(body.len(), 23);
    }
}
