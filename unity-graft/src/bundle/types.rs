//! Bundle data structures
//!
//! The directory (block table plus file table) is shared by the parser and
//! the writer; [`BundleFile`] is the decoded, editable form of a bundle.

use crate::compression::CompressionType;
use crate::error::{BinaryError, Result};
use crate::stream::Stream;
use serde::{Deserialize, Serialize};

/// Default maximum uncompressed size of one LZ4 block
pub const DEFAULT_BLOCK_SIZE: usize = 128 * 1024;
/// Smallest block size the decode heuristic will report
pub const MIN_BLOCK_SIZE: usize = 16 * 1024;
/// Entries start on this boundary inside the uncompressed body
pub const ENTRY_ALIGNMENT: usize = 16;

/// One compressed block of the bundle body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CompressionBlock {
    pub uncompressed_size: u32,
    pub compressed_size: u32,
    /// Low six bits hold the compression type; no other bits are supported
    pub flags: u16,
}

impl CompressionBlock {
    pub fn new(uncompressed_size: u32, compressed_size: u32, compression: CompressionType) -> Self {
        Self {
            uncompressed_size,
            compressed_size,
            flags: compression.as_flags() as u16,
        }
    }

    pub fn compression_type(&self) -> Result<CompressionType> {
        let flags = u32::from(self.flags);
        if flags & !CompressionType::MASK != 0 {
            return Err(BinaryError::unsupported(format!(
                "block flags {:#x} carry unsupported options",
                flags
            )));
        }
        CompressionType::from_flags(flags)
    }

    fn read(stream: &mut Stream) -> Result<Self> {
        Ok(Self {
            uncompressed_size: stream.read_u32()?,
            compressed_size: stream.read_u32()?,
            flags: stream.read_u16()?,
        })
    }

    fn write(&self, stream: &mut Stream) -> Result<()> {
        stream.write_u32(self.uncompressed_size)?;
        stream.write_u32(self.compressed_size)?;
        stream.write_u16(self.flags)
    }
}

/// A named slice of the uncompressed body
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DirectoryNode {
    /// Offset in the uncompressed body
    pub offset: u64,
    /// Size of the data
    pub size: u64,
    pub flags: u32,
    /// Node path
    pub name: String,
}

impl DirectoryNode {
    pub fn new(name: String, offset: u64, size: u64, flags: u32) -> Self {
        Self {
            offset,
            size,
            flags,
            name,
        }
    }

    /// Get the end offset of this node
    pub fn end_offset(&self) -> u64 {
        self.offset + self.size
    }
}

/// Decoded bundle directory
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BundleDirectory {
    /// Hash of the uncompressed body; always zero in supported bundles
    pub uncompressed_data_hash: [u8; 16],
    pub blocks: Vec<CompressionBlock>,
    pub nodes: Vec<DirectoryNode>,
}

impl BundleDirectory {
    /// Parse a big-endian directory
    pub fn from_stream(stream: &mut Stream) -> Result<Self> {
        let uncompressed_data_hash = stream.read_array::<16>()?;
        if uncompressed_data_hash.iter().any(|&b| b != 0) {
            return Err(BinaryError::invalid_format(
                "bundle directory hash must be zero",
            ));
        }

        let block_count = stream.read_u32()? as usize;
        let mut blocks = Vec::with_capacity(block_count.min(stream.remaining() / 10));
        for _ in 0..block_count {
            blocks.push(CompressionBlock::read(stream)?);
        }

        let node_count = stream.read_u32()? as usize;
        let mut nodes = Vec::with_capacity(node_count.min(stream.remaining() / 21));
        for _ in 0..node_count {
            let offset = stream.read_u64()?;
            let size = stream.read_u64()?;
            let flags = stream.read_u32()?;
            let name = stream.read_cstring()?;
            nodes.push(DirectoryNode::new(name, offset, size, flags));
        }

        Ok(Self {
            uncompressed_data_hash,
            blocks,
            nodes,
        })
    }

    pub fn write(&self, stream: &mut Stream) -> Result<()> {
        stream.write_data(&self.uncompressed_data_hash)?;
        stream.write_u32(self.blocks.len() as u32)?;
        for block in &self.blocks {
            block.write(stream)?;
        }
        stream.write_u32(self.nodes.len() as u32)?;
        for node in &self.nodes {
            stream.write_u64(node.offset)?;
            stream.write_u64(node.size)?;
            stream.write_u32(node.flags)?;
            stream.write_cstring(&node.name)?;
        }
        Ok(())
    }

    /// Total uncompressed body length described by the block table
    pub fn uncompressed_size(&self) -> u64 {
        self.blocks
            .iter()
            .map(|block| u64::from(block.uncompressed_size))
            .sum()
    }

    /// Total stored body length described by the block table
    pub fn compressed_size(&self) -> u64 {
        self.blocks
            .iter()
            .map(|block| u64::from(block.compressed_size))
            .sum()
    }
}

/// A file stored in a bundle
#[derive(Debug, Clone)]
pub struct BundleEntry {
    pub name: String,
    pub flags: u32,
    /// View into the bundle body, or caller supplied data
    pub data: Stream,
}

impl BundleEntry {
    pub fn new<S: Into<String>>(name: S, data: Stream) -> Self {
        Self {
            name: name.into(),
            flags: 0,
            data,
        }
    }

    /// Swap in new contents, keeping name and flags
    pub fn replace_data(&mut self, data: Stream) -> Stream {
        std::mem::replace(&mut self.data, data)
    }
}

/// Options for [`BundleFile::serialize_with_options`]
#[derive(Debug, Clone, Default)]
pub struct BundleWriteOptions {
    /// Threads used for block compression; `None` uses one per CPU
    pub worker_threads: Option<usize>,
}

/// Decoded UnityFS bundle
///
/// Decoding records the compression settings and checksum of the input so
/// re-encoding produces an equivalent file.
#[derive(Debug, Clone)]
pub struct BundleFile {
    pub unity_version: String,
    pub unity_revision: String,
    pub directory_compression: CompressionType,
    pub data_compression: CompressionType,
    /// Largest uncompressed block produced for LZ4 data
    pub block_size: usize,
    /// CRC-32 of the uncompressed body to reproduce when encoding
    pub asset_bundle_crc: Option<u32>,
    pub entries: Vec<BundleEntry>,
}

impl Default for BundleFile {
    fn default() -> Self {
        Self {
            unity_version: "5.x.x".to_string(),
            unity_revision: String::new(),
            directory_compression: CompressionType::Lz4Hc,
            data_compression: CompressionType::None,
            block_size: DEFAULT_BLOCK_SIZE,
            asset_bundle_crc: None,
            entries: Vec::new(),
        }
    }
}

impl BundleFile {
    /// Empty bundle for the given engine revision
    pub fn new<S: Into<String>>(unity_revision: S) -> Self {
        Self {
            unity_revision: unity_revision.into(),
            ..Self::default()
        }
    }

    pub fn entry(&self, name: &str) -> Option<&BundleEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn entry_mut(&mut self, name: &str) -> Option<&mut BundleEntry> {
        self.entries.iter_mut().find(|entry| entry.name == name)
    }

    pub fn add_entry(&mut self, entry: BundleEntry) {
        self.entries.push(entry);
    }
}
