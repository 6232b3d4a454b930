//! Compression support for Unity bundle blocks
//!
//! Unity tags every block and the bundle directory with a compression kind
//! stored in the low six bits of a flags word. LZ4 and LZ4HC share a block
//! format, so one decompressor serves both. LZMA payloads start with the
//! five byte properties header and carry no size field.

use crate::error::{BinaryError, Result};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

/// Compression types used in Unity files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u32)]
pub enum CompressionType {
    /// No compression
    #[default]
    None = 0,
    /// LZMA compression
    Lzma = 1,
    /// LZ4 compression
    Lz4 = 2,
    /// LZ4HC (High Compression)
    Lz4Hc = 3,
    /// LZHAM compression, never produced by supported engine versions
    Lzham = 4,
}

impl CompressionType {
    /// Bits of a flags word that hold the compression kind
    pub const MASK: u32 = 0x3F;

    /// Create compression type from the low bits of a flags word
    pub fn from_flags(flags: u32) -> Result<Self> {
        match flags & Self::MASK {
            0 => Ok(CompressionType::None),
            1 => Ok(CompressionType::Lzma),
            2 => Ok(CompressionType::Lz4),
            3 => Ok(CompressionType::Lz4Hc),
            4 => Ok(CompressionType::Lzham),
            other => Err(BinaryError::unsupported_compression(format!(
                "Unknown compression type: {}",
                other
            ))),
        }
    }

    pub fn as_flags(self) -> u32 {
        self as u32
    }

    /// LZ4 variants bound the usable block size and are chunked on encode
    pub fn is_lz4(self) -> bool {
        matches!(self, CompressionType::Lz4 | CompressionType::Lz4Hc)
    }

    pub fn name(self) -> &'static str {
        match self {
            CompressionType::None => "None",
            CompressionType::Lzma => "LZMA",
            CompressionType::Lz4 => "LZ4",
            CompressionType::Lz4Hc => "LZ4HC",
            CompressionType::Lzham => "LZHAM",
        }
    }
}

/// Size of the LZMA properties header that precedes the raw stream
pub const LZMA_PROPERTIES_SIZE: usize = 5;

/// Result of [`compress`]
///
/// `Stored` is not a failure: the codec could not shrink the input and the
/// caller must keep the data uncompressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompressOutcome {
    Compressed(Vec<u8>),
    Stored(Vec<u8>),
}

impl CompressOutcome {
    pub fn is_compressed(&self) -> bool {
        matches!(self, CompressOutcome::Compressed(_))
    }

    pub fn data(&self) -> &[u8] {
        match self {
            CompressOutcome::Compressed(data) | CompressOutcome::Stored(data) => data,
        }
    }

    pub fn into_data(self) -> Vec<u8> {
        match self {
            CompressOutcome::Compressed(data) | CompressOutcome::Stored(data) => data,
        }
    }
}

/// Decompress `data`, which must expand to exactly `uncompressed_size` bytes
pub fn decompress(
    data: &[u8],
    compression: CompressionType,
    uncompressed_size: usize,
) -> Result<Vec<u8>> {
    let mut output = vec![0u8; uncompressed_size];
    decompress_into(data, compression, &mut output)?;
    Ok(output)
}

/// Decompress into a pre-sized output slice
pub fn decompress_into(data: &[u8], compression: CompressionType, output: &mut [u8]) -> Result<()> {
    match compression {
        CompressionType::None => {
            if data.len() != output.len() {
                return Err(BinaryError::decompression_failed(format!(
                    "stored block is {} bytes, expected {}",
                    data.len(),
                    output.len()
                )));
            }
            output.copy_from_slice(data);
            Ok(())
        }
        CompressionType::Lz4 | CompressionType::Lz4Hc => {
            let written = lz4_flex::block::decompress_into(data, output)?;
            if written != output.len() {
                return Err(BinaryError::decompression_failed(format!(
                    "LZ4 block expanded to {} bytes, expected {}",
                    written,
                    output.len()
                )));
            }
            Ok(())
        }
        CompressionType::Lzma => decompress_lzma(data, output),
        CompressionType::Lzham => Err(BinaryError::unsupported_compression(
            "LZHAM compression is not supported",
        )),
    }
}

fn decompress_lzma(data: &[u8], output: &mut [u8]) -> Result<()> {
    if data.len() < LZMA_PROPERTIES_SIZE {
        return Err(BinaryError::not_enough_data(LZMA_PROPERTIES_SIZE, data.len()));
    }
    let options = lzma_rs::decompress::Options {
        unpacked_size: lzma_rs::decompress::UnpackedSize::UseProvided(Some(
            output.len() as u64,
        )),
        ..Default::default()
    };
    let mut decoded = Vec::with_capacity(output.len());
    lzma_rs::lzma_decompress_with_options(&mut Cursor::new(data), &mut decoded, &options)?;
    if decoded.len() != output.len() {
        return Err(BinaryError::decompression_failed(format!(
            "LZMA stream expanded to {} bytes, expected {}",
            decoded.len(),
            output.len()
        )));
    }
    output.copy_from_slice(&decoded);
    Ok(())
}

/// Compress `data`; [`CompressOutcome::Stored`] when the result would not be smaller
pub fn compress(data: &[u8], compression: CompressionType) -> Result<CompressOutcome> {
    let compressed = match compression {
        CompressionType::None => return Ok(CompressOutcome::Stored(data.to_vec())),
        CompressionType::Lz4 | CompressionType::Lz4Hc => lz4_flex::block::compress(data),
        CompressionType::Lzma => compress_lzma(data)?,
        CompressionType::Lzham => {
            return Err(BinaryError::unsupported_compression(
                "LZHAM compression is not supported",
            ));
        }
    };

    if compressed.len() >= data.len() {
        Ok(CompressOutcome::Stored(data.to_vec()))
    } else {
        Ok(CompressOutcome::Compressed(compressed))
    }
}

fn compress_lzma(data: &[u8]) -> Result<Vec<u8>> {
    let options = lzma_rs::compress::Options {
        unpacked_size: lzma_rs::compress::UnpackedSize::SkipWritingToHeader,
    };
    let mut output = Vec::new();
    lzma_rs::lzma_compress_with_options(&mut Cursor::new(data), &mut output, &options)
        .map_err(|e| BinaryError::compression_failed(format!("LZMA: {}", e)))?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<u8> {
        b"UnityFS block payload "
            .iter()
            .copied()
            .cycle()
            .take(4096)
            .collect()
    }

    #[test]
    fn test_compression_type_from_flags() {
        assert_eq!(CompressionType::from_flags(0).unwrap(), CompressionType::None);
        assert_eq!(CompressionType::from_flags(0x43).unwrap(), CompressionType::Lz4Hc);
        assert!(CompressionType::from_flags(5).is_err());
    }

    #[test]
    fn test_lz4_round_trip() {
        let data = sample();
        let outcome = compress(&data, CompressionType::Lz4Hc).unwrap();
        assert!(outcome.is_compressed());
        let restored = decompress(outcome.data(), CompressionType::Lz4, data.len()).unwrap();
        assert_eq!(restored, data);
    }

    #[test]
    fn test_lzma_round_trip() {
        let data = sample();
        let outcome = compress(&data, CompressionType::Lzma).unwrap();
        assert!(outcome.is_compressed());
        let restored = decompress(outcome.data(), CompressionType::Lzma, data.len()).unwrap();
        assert_eq!(restored, data);
    }

    #[test]
    fn test_lz4_rejects_wrong_size() {
        let data = sample();
        let outcome = compress(&data, CompressionType::Lz4).unwrap();
        assert!(decompress(outcome.data(), CompressionType::Lz4, data.len() + 1).is_err());
    }

    #[test]
    fn test_stored_requires_exact_length() {
        assert!(decompress(&[1, 2, 3], CompressionType::None, 3).is_ok());
        assert!(decompress(&[1, 2, 3], CompressionType::None, 4).is_err());
    }

    #[test]
    fn test_empty_input_is_stored() {
        let outcome = compress(&[], CompressionType::Lz4).unwrap();
        assert_eq!(outcome, CompressOutcome::Stored(Vec::new()));
    }

    #[test]
    fn test_lzham_unsupported() {
        assert!(matches!(
            compress(b"abc", CompressionType::Lzham),
            Err(BinaryError::UnsupportedCompression(_))
        ));
        assert!(decompress(b"abc", CompressionType::Lzham, 3).is_err());
    }
}
