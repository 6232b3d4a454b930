//! UnityFS bundle parser

use super::header::BundleHeader;
use super::types::{
    BundleDirectory, BundleEntry, BundleFile, CompressionBlock, DEFAULT_BLOCK_SIZE, MIN_BLOCK_SIZE,
};
use crate::compression::{self, CompressionType};
use crate::crc::crc32;
use crate::error::{BinaryError, Result};
use crate::stream::{ByteOrder, Stream};
use std::path::Path;
use tracing::{debug, trace};

/// Parser for UnityFS bundles
///
/// Parsing is single-threaded and eager: every block is decompressed into
/// one body buffer and entries become views into it.
pub struct BundleParser;

impl BundleParser {
    /// Parse a bundle occupying the whole stream
    pub fn parse(input: &Stream) -> Result<BundleFile> {
        let mut stream = input.create_view(0, input.len())?;
        stream.set_byte_order(ByteOrder::Big);

        let header = BundleHeader::from_stream(&mut stream)?;
        debug!(
            unity_version = %header.unity_version,
            unity_revision = %header.unity_revision,
            size = header.size,
            flags = header.flags,
            "parsing UnityFS bundle"
        );

        let directory = Self::read_directory(&header, &mut stream)?;
        debug!(
            blocks = directory.blocks.len(),
            files = directory.nodes.len(),
            "bundle directory decoded"
        );

        let (body, data_compression) = Self::read_body(&directory, &mut stream)?;
        let asset_bundle_crc = crc32(&body);
        let body = Stream::from_vec(body);

        let mut entries = Vec::with_capacity(directory.nodes.len());
        for node in &directory.nodes {
            let offset = usize::try_from(node.offset)
                .map_err(|_| BinaryError::invalid_format("entry offset overflows"))?;
            let size = usize::try_from(node.size)
                .map_err(|_| BinaryError::invalid_format("entry size overflows"))?;
            let data = body.create_view(offset, size).map_err(|_| {
                BinaryError::invalid_format(format!(
                    "entry '{}' ({}..{}) lies outside the {} byte body",
                    node.name,
                    node.offset,
                    node.end_offset(),
                    body.len()
                ))
            })?;
            trace!(name = %node.name, offset, size, "bundle entry");
            entries.push(BundleEntry {
                name: node.name.clone(),
                flags: node.flags,
                data,
            });
        }

        let directory_compression = header.directory_compression()?;
        Ok(BundleFile {
            unity_version: header.unity_version,
            unity_revision: header.unity_revision,
            directory_compression,
            data_compression,
            block_size: estimate_block_size(&directory.blocks),
            asset_bundle_crc: Some(asset_bundle_crc),
            entries,
        })
    }

    fn read_directory(header: &BundleHeader, stream: &mut Stream) -> Result<BundleDirectory> {
        let compressed = stream.read_view(header.compressed_blocks_info_size as usize)?;
        let directory_data = compression::decompress(
            compressed.data(),
            header.directory_compression()?,
            header.uncompressed_blocks_info_size as usize,
        )?;
        let mut directory_stream = Stream::from_vec(directory_data).with_byte_order(ByteOrder::Big);
        BundleDirectory::from_stream(&mut directory_stream)
    }

    /// Decompress all blocks back to back; also reports the body compression
    fn read_body(
        directory: &BundleDirectory,
        stream: &mut Stream,
    ) -> Result<(Vec<u8>, CompressionType)> {
        let stored = directory.compressed_size();
        if stored != stream.remaining() as u64 {
            return Err(BinaryError::invalid_format(format!(
                "blocks hold {} bytes but {} bytes follow the directory",
                stored,
                stream.remaining()
            )));
        }

        let total = usize::try_from(directory.uncompressed_size())
            .map_err(|_| BinaryError::invalid_format("bundle body is too large"))?;
        let mut body = vec![0u8; total];
        let mut data_compression = CompressionType::None;
        let mut cursor = 0usize;

        for block in &directory.blocks {
            let kind = block.compression_type()?;
            if kind != CompressionType::None {
                data_compression = kind;
            }
            let input = stream.read_view(block.compressed_size as usize)?;
            let end = cursor + block.uncompressed_size as usize;
            compression::decompress_into(input.data(), kind, &mut body[cursor..end])?;
            cursor = end;
        }

        Ok((body, data_compression))
    }
}

/// Largest block rounded up to a power of two, never below [`MIN_BLOCK_SIZE`]
fn estimate_block_size(blocks: &[CompressionBlock]) -> usize {
    blocks
        .iter()
        .map(|block| block.uncompressed_size as usize)
        .max()
        .map(|largest| largest.next_power_of_two().max(MIN_BLOCK_SIZE))
        .unwrap_or(DEFAULT_BLOCK_SIZE)
}

impl BundleFile {
    /// Parse a bundle occupying the whole stream
    pub fn from_stream(stream: &Stream) -> Result<Self> {
        BundleParser::parse(stream)
    }

    /// Parse a bundle from owned bytes
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        BundleParser::parse(&Stream::from_vec(data))
    }

    /// Memory-map and parse a bundle file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        BundleParser::parse(&Stream::map_file(path)?)
    }
}
