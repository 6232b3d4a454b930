//! SerializedFile header parsing
//!
//! The header is big-endian. Version 22 moved the sizes and offsets into a
//! wider trailer and left the original 32-bit fields zeroed.

use crate::error::{BinaryError, Result};
use crate::stream::Stream;
use serde::{Deserialize, Serialize};

/// First version with 64-bit file size and data offset
pub const WIDE_OFFSETS_VERSION: u32 = 22;
/// Oldest supported SerializedFile version
pub const MIN_SUPPORTED_VERSION: u32 = 21;
/// Newest supported SerializedFile version
pub const MAX_SUPPORTED_VERSION: u32 = 22;

/// Size of the narrow header
pub const NARROW_HEADER_SIZE: usize = 20;
/// Size of the wide header
pub const WIDE_HEADER_SIZE: usize = 48;

/// Header of a Unity SerializedFile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedFileHeader {
    /// Size of the metadata section that follows the header
    pub metadata_size: u32,
    /// Total file size
    pub file_size: u64,
    /// File format version
    pub version: u32,
    /// Offset of the object data area
    pub data_offset: u64,
    /// Endianness of the metadata (0 = little); only 0 is supported
    pub endian: u8,
    /// Reserved bytes, always zero
    pub reserved: [u8; 3],
}

impl SerializedFileHeader {
    pub fn new(version: u32) -> Self {
        Self {
            metadata_size: 0,
            file_size: 0,
            version,
            data_offset: 0,
            endian: 0,
            reserved: [0; 3],
        }
    }

    /// Parse the header and check it against the stream length.
    ///
    /// Nothing past the header is read.
    pub fn from_stream(stream: &mut Stream) -> Result<Self> {
        let metadata_size = stream.read_u32()?;
        let file_size = stream.read_u32()?;
        let version = stream.read_u32()?;
        let data_offset = stream.read_u32()?;
        let endian = stream.read_u8()?;
        let reserved = stream.read_array::<3>()?;

        check_version(version)?;

        let mut header = Self {
            metadata_size,
            file_size: u64::from(file_size),
            version,
            data_offset: u64::from(data_offset),
            endian,
            reserved,
        };

        if version >= WIDE_OFFSETS_VERSION {
            if metadata_size != 0 || file_size != 0 || data_offset != 0 {
                return Err(BinaryError::invalid_format(
                    "legacy header fields must be zero in wide headers",
                ));
            }
            header.metadata_size = stream.read_u32()?;
            header.file_size = stream.read_u64()?;
            header.data_offset = stream.read_u64()?;
            let unknown = stream.read_u64()?;
            if unknown != 0 {
                return Err(BinaryError::invalid_format(format!(
                    "reserved wide header field is {:#x}, expected zero",
                    unknown
                )));
            }
        }

        header.validate(stream.len())?;
        Ok(header)
    }

    /// Check sizes and flags against the physical stream length
    pub fn validate(&self, stream_length: usize) -> Result<()> {
        if self.endian != 0 || self.reserved != [0; 3] {
            return Err(BinaryError::unsupported(format!(
                "SerializedFile flags {:#04x} {:?} (only little-endian metadata is supported)",
                self.endian, self.reserved
            )));
        }

        if self.file_size != stream_length as u64 {
            return Err(BinaryError::invalid_format(format!(
                "SerializedFile declares {} bytes but the stream holds {}",
                self.file_size, stream_length
            )));
        }

        let metadata_end = (self.header_size() as u64) + u64::from(self.metadata_size);
        if metadata_end > self.data_offset || self.data_offset > self.file_size {
            return Err(BinaryError::invalid_format(format!(
                "inconsistent layout: metadata ends at {}, data starts at {}, file ends at {}",
                metadata_end, self.data_offset, self.file_size
            )));
        }
        Ok(())
    }

    pub fn uses_wide_offsets(&self) -> bool {
        self.version >= WIDE_OFFSETS_VERSION
    }

    /// Get the size of the header itself
    pub fn header_size(&self) -> usize {
        if self.uses_wide_offsets() {
            WIDE_HEADER_SIZE
        } else {
            NARROW_HEADER_SIZE
        }
    }

    /// Write the header at the cursor
    pub fn write(&self, stream: &mut Stream) -> Result<()> {
        check_version(self.version)?;
        if self.uses_wide_offsets() {
            stream.write_u32(0)?;
            stream.write_u32(0)?;
            stream.write_u32(self.version)?;
            stream.write_u32(0)?;
            stream.write_u8(self.endian)?;
            stream.write_data(&self.reserved)?;
            stream.write_u32(self.metadata_size)?;
            stream.write_u64(self.file_size)?;
            stream.write_u64(self.data_offset)?;
            stream.write_u64(0)
        } else {
            stream.write_u32(self.metadata_size)?;
            stream.write_u32(narrow(self.file_size, "file size")?)?;
            stream.write_u32(self.version)?;
            stream.write_u32(narrow(self.data_offset, "data offset")?)?;
            stream.write_u8(self.endian)?;
            stream.write_data(&self.reserved)
        }
    }
}

pub(crate) fn check_version(version: u32) -> Result<()> {
    if !(MIN_SUPPORTED_VERSION..=MAX_SUPPORTED_VERSION).contains(&version) {
        return Err(BinaryError::unsupported_version(format!(
            "SerializedFile version {} (supported: {}..={})",
            version, MIN_SUPPORTED_VERSION, MAX_SUPPORTED_VERSION
        )));
    }
    Ok(())
}

fn narrow(value: u64, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| {
        BinaryError::invalid_data(format!(
            "{} {} does not fit a version {} header",
            what,
            value,
            WIDE_OFFSETS_VERSION - 1
        ))
    })
}
