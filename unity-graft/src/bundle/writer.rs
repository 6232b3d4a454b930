//! UnityFS bundle writer

use super::compression::BlockCompressor;
use super::header::{ArchiveFlags, BundleHeader, UNITYFS_SIGNATURE, UNITYFS_VERSION};
use super::types::{
    BundleDirectory, BundleFile, BundleWriteOptions, DirectoryNode, ENTRY_ALIGNMENT,
};
use crate::compression::{self, CompressionType};
use crate::crc::append_crc_adjustment;
use crate::error::{BinaryError, Result};
use crate::stream::{ByteOrder, Stream, align_up};
use tracing::debug;

impl BundleFile {
    /// Encode the bundle with default options
    pub fn serialize(&self) -> Result<Stream> {
        self.serialize_with_options(&BundleWriteOptions::default())
    }

    /// Encode the bundle into a new big-endian stream
    pub fn serialize_with_options(&self, options: &BundleWriteOptions) -> Result<Stream> {
        let (body, nodes) = self.build_body()?;

        let compressor = BlockCompressor::new(self.data_compression, self.block_size, options)?;
        let compressed_blocks = compressor.compress(&body)?;

        let directory = BundleDirectory {
            uncompressed_data_hash: [0; 16],
            blocks: compressed_blocks.iter().map(|c| c.block).collect(),
            nodes,
        };
        let mut directory_stream = Stream::new().with_byte_order(ByteOrder::Big);
        directory.write(&mut directory_stream)?;
        let directory_data = directory_stream.data();

        let outcome = compression::compress(directory_data, self.directory_compression)?;
        let directory_kind = if outcome.is_compressed() {
            self.directory_compression
        } else {
            CompressionType::None
        };
        let stored_directory = outcome.into_data();

        let header = BundleHeader {
            signature: UNITYFS_SIGNATURE.to_string(),
            version: UNITYFS_VERSION,
            unity_version: self.unity_version.clone(),
            unity_revision: self.unity_revision.clone(),
            size: 0,
            compressed_blocks_info_size: u32_len(stored_directory.len(), "directory")?,
            uncompressed_blocks_info_size: u32_len(directory_data.len(), "directory")?,
            flags: directory_kind.as_flags() | ArchiveFlags::BLOCKS_AND_DIRECTORY_INFO_COMBINED,
        };

        let mut output = Stream::new().with_byte_order(ByteOrder::Big);
        let size_position = header.write(&mut output)?;
        output.write_data(&stored_directory)?;
        for block in &compressed_blocks {
            output.write_data(&block.payload)?;
        }

        let total = output.len() as u64;
        output.set_position(size_position)?;
        output.write_u64(total)?;
        output.set_position(0)?;

        debug!(
            entries = self.entries.len(),
            blocks = compressed_blocks.len(),
            size = total,
            "bundle serialized"
        );
        Ok(output)
    }

    /// Concatenate entries on 16 byte boundaries and restore the recorded CRC
    fn build_body(&self) -> Result<(Vec<u8>, Vec<DirectoryNode>)> {
        let mut body = Vec::new();
        let mut nodes = Vec::with_capacity(self.entries.len());

        for entry in &self.entries {
            let offset = body.len();
            body.extend_from_slice(entry.data.data());
            nodes.push(DirectoryNode::new(
                entry.name.clone(),
                offset as u64,
                entry.data.len() as u64,
                entry.flags,
            ));
            body.resize(align_up(body.len(), ENTRY_ALIGNMENT), 0);
        }

        if let Some(crc) = self.asset_bundle_crc {
            if append_crc_adjustment(&mut body, crc)? {
                debug!(crc, "appended CRC adjustment to bundle body");
            }
        }

        Ok((body, nodes))
    }
}

fn u32_len(length: usize, what: &str) -> Result<u32> {
    u32::try_from(length)
        .map_err(|_| BinaryError::invalid_data(format!("{} of {} bytes is too large", what, length)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::BundleEntry;
    use crate::crc::crc32;

    #[test]
    fn test_body_layout_is_aligned() {
        let mut bundle = BundleFile::new("2019.4.40f1");
        bundle.add_entry(BundleEntry::new("a", Stream::from_vec(vec![1; 5])));
        bundle.add_entry(BundleEntry::new("b", Stream::from_vec(vec![2; 16])));
        let (body, nodes) = bundle.build_body().unwrap();
        assert_eq!(body.len(), 32);
        assert_eq!(nodes[0].offset, 0);
        assert_eq!(nodes[1].offset, 16);
        assert_eq!(&body[5..16], &[0; 11]);
    }

    #[test]
    fn test_recorded_crc_is_restored() {
        let mut bundle = BundleFile::new("2019.4.40f1");
        bundle.add_entry(BundleEntry::new("a", Stream::from_vec(vec![3; 40])));
        bundle.asset_bundle_crc = Some(0xCAFE_F00D);
        let (body, _) = bundle.build_body().unwrap();
        assert_eq!(body.len(), 52);
        assert_eq!(crc32(&body), 0xCAFE_F00D);
    }
}
