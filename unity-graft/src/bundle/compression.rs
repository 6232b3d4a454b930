//! Block compression for bundle bodies
//!
//! LZ4 bodies are cut into fixed size chunks that are compressed
//! independently on a worker pool. Results come back in chunk order, so the
//! output does not depend on scheduling.

use super::types::{BundleWriteOptions, CompressionBlock};
use crate::compression::{self, CompressionType};
use crate::error::{BinaryError, Result};
use rayon::prelude::*;
use tracing::debug;

/// A block header together with its stored bytes
#[derive(Debug, Clone)]
pub struct CompressedBlock {
    pub block: CompressionBlock,
    pub payload: Vec<u8>,
}

/// Splits and compresses a bundle body
pub struct BlockCompressor {
    compression: CompressionType,
    block_size: usize,
    worker_threads: usize,
}

impl BlockCompressor {
    pub fn new(
        compression: CompressionType,
        block_size: usize,
        options: &BundleWriteOptions,
    ) -> Result<Self> {
        if block_size == 0 {
            return Err(BinaryError::invalid_data("block size must not be zero"));
        }
        if block_size > u32::MAX as usize {
            return Err(BinaryError::invalid_data(format!(
                "block size {} does not fit the block table",
                block_size
            )));
        }
        Ok(Self {
            compression,
            block_size,
            worker_threads: options.worker_threads.unwrap_or_else(num_cpus::get).max(1),
        })
    }

    /// Compress `body` into blocks, in body order
    pub fn compress(&self, body: &[u8]) -> Result<Vec<CompressedBlock>> {
        if !self.compression.is_lz4() {
            // Non-LZ4 codecs take the whole body as one block
            return Ok(vec![compress_block(body, self.compression)?]);
        }

        let chunk_count = body.len().div_ceil(self.block_size);
        if chunk_count <= 1 || self.worker_threads == 1 {
            return body
                .chunks(self.block_size)
                .map(|chunk| compress_block(chunk, self.compression))
                .collect();
        }

        debug!(
            chunks = chunk_count,
            threads = self.worker_threads,
            "compressing bundle body"
        );
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.worker_threads)
            .build()
            .map_err(|e| BinaryError::generic(format!("failed to start compression pool: {}", e)))?;
        let compression = self.compression;
        pool.install(|| {
            body.par_chunks(self.block_size)
                .map(|chunk| compress_block(chunk, compression))
                .collect()
        })
    }
}

/// Compress one block; falls back to storing it when it does not shrink
fn compress_block(chunk: &[u8], compression: CompressionType) -> Result<CompressedBlock> {
    let uncompressed_size = u32::try_from(chunk.len()).map_err(|_| {
        BinaryError::invalid_data(format!("block of {} bytes is too large", chunk.len()))
    })?;
    let outcome = compression::compress(chunk, compression)?;
    let kind = if outcome.is_compressed() {
        compression
    } else {
        CompressionType::None
    };
    let payload = outcome.into_data();
    Ok(CompressedBlock {
        block: CompressionBlock::new(uncompressed_size, payload.len() as u32, kind),
        payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(threads: usize) -> BundleWriteOptions {
        BundleWriteOptions {
            worker_threads: Some(threads),
        }
    }

    #[test]
    fn test_lz4_chunks_keep_order() {
        let body: Vec<u8> = (0..10_000u32).flat_map(|i| (i / 7).to_le_bytes()).collect();
        let compressor = BlockCompressor::new(CompressionType::Lz4Hc, 4096, &options(4)).unwrap();
        let blocks = compressor.compress(&body).unwrap();
        assert_eq!(blocks.len(), body.len().div_ceil(4096));

        let mut restored = Vec::new();
        for block in &blocks {
            assert!(block.block.uncompressed_size <= 4096);
            let kind = block.block.compression_type().unwrap();
            restored.extend(
                compression::decompress(
                    &block.payload,
                    kind,
                    block.block.uncompressed_size as usize,
                )
                .unwrap(),
            );
        }
        assert_eq!(restored, body);
    }

    #[test]
    fn test_stored_body_is_single_block() {
        let body = vec![7u8; 300_000];
        let compressor = BlockCompressor::new(CompressionType::None, 4096, &options(2)).unwrap();
        let blocks = compressor.compress(&body).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].block.flags, 0);
        assert_eq!(blocks[0].payload.len(), body.len());
    }

    #[test]
    fn test_empty_lz4_body_has_no_blocks() {
        let compressor = BlockCompressor::new(CompressionType::Lz4, 4096, &options(2)).unwrap();
        assert!(compressor.compress(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_zero_block_size_rejected() {
        assert!(BlockCompressor::new(CompressionType::Lz4, 0, &options(1)).is_err());
    }
}
