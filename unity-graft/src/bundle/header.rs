//! UnityFS bundle header
//!
//! The header is big-endian and sits at the very start of the file:
//! signature, format version, two engine version strings, the declared
//! file size, the directory lengths and the archive flags.

use crate::compression::CompressionType;
use crate::error::{BinaryError, Result};
use crate::stream::Stream;
use serde::{Deserialize, Serialize};

/// Bundle signature of the UnityFS format
pub const UNITYFS_SIGNATURE: &str = "UnityFS";
/// The only UnityFS format version this crate reads and writes
pub const UNITYFS_VERSION: u32 = 6;

/// Archive flags stored in the header
pub struct ArchiveFlags;

impl ArchiveFlags {
    /// Compression type mask
    pub const COMPRESSION_TYPE_MASK: u32 = 0x3F;
    /// Blocks and directory are stored together after the header
    pub const BLOCKS_AND_DIRECTORY_INFO_COMBINED: u32 = 0x40;
    /// Directory stored at the end of the file
    pub const BLOCK_INFO_AT_END: u32 = 0x80;
    /// Old web plugin compatibility
    pub const OLD_WEB_PLUGIN_COMPATIBILITY: u32 = 0x100;
    /// Directory needs padding at start
    pub const BLOCK_INFO_NEEDS_PADDING_AT_START: u32 = 0x200;
}

/// AssetBundle header information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleHeader {
    /// Bundle signature, always "UnityFS"
    pub signature: String,
    /// Bundle format version
    pub version: u32,
    /// Unity version that created this bundle
    pub unity_version: String,
    /// Unity revision
    pub unity_revision: String,
    /// Total bundle size
    pub size: u64,
    /// Compressed directory size
    pub compressed_blocks_info_size: u32,
    /// Uncompressed directory size
    pub uncompressed_blocks_info_size: u32,
    /// Archive flags
    pub flags: u32,
}

impl BundleHeader {
    /// Parse and validate the header at the cursor.
    ///
    /// The stream must be big-endian and positioned at the start of the
    /// bundle; the declared size is checked against the stream length.
    pub fn from_stream(stream: &mut Stream) -> Result<Self> {
        let signature = stream.read_cstring()?;
        if signature != UNITYFS_SIGNATURE {
            return Err(BinaryError::invalid_signature(
                UNITYFS_SIGNATURE.to_string(),
                signature,
            ));
        }

        let version = stream.read_u32()?;
        if version != UNITYFS_VERSION {
            return Err(BinaryError::unsupported_version(format!(
                "UnityFS version {} (expected {})",
                version, UNITYFS_VERSION
            )));
        }

        let header = Self {
            signature,
            version,
            unity_version: stream.read_cstring()?,
            unity_revision: stream.read_cstring()?,
            size: stream.read_u64()?,
            compressed_blocks_info_size: stream.read_u32()?,
            uncompressed_blocks_info_size: stream.read_u32()?,
            flags: stream.read_u32()?,
        };
        header.validate(stream.len())?;
        Ok(header)
    }

    /// Check the declared size and option bits
    pub fn validate(&self, stream_length: usize) -> Result<()> {
        if self.size != stream_length as u64 {
            return Err(BinaryError::invalid_format(format!(
                "bundle declares {} bytes but the stream holds {}",
                self.size, stream_length
            )));
        }

        let options = self.flags & !ArchiveFlags::COMPRESSION_TYPE_MASK;
        if options != ArchiveFlags::BLOCKS_AND_DIRECTORY_INFO_COMBINED {
            return Err(BinaryError::unsupported(format!(
                "bundle archive options {:#x} (only the combined directory layout is supported)",
                options
            )));
        }
        Ok(())
    }

    /// Compression of the directory block
    pub fn directory_compression(&self) -> Result<CompressionType> {
        CompressionType::from_flags(self.flags)
    }

    /// Write the header; returns the position of the size field for backpatching
    pub fn write(&self, stream: &mut Stream) -> Result<usize> {
        stream.write_cstring(&self.signature)?;
        stream.write_u32(self.version)?;
        stream.write_cstring(&self.unity_version)?;
        stream.write_cstring(&self.unity_revision)?;
        let size_position = stream.position();
        stream.write_u64(self.size)?;
        stream.write_u32(self.compressed_blocks_info_size)?;
        stream.write_u32(self.uncompressed_blocks_info_size)?;
        stream.write_u32(self.flags)?;
        Ok(size_position)
    }
}
