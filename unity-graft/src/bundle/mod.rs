//! Unity AssetBundle (UnityFS) container
//!
//! A bundle is a big-endian header, a compressed directory and a run of
//! compressed blocks. The blocks concatenate into one body from which the
//! directory slices named entries.
//!
//! - `header` - header parsing and validation
//! - `types` - directory, entries and the [`BundleFile`] model
//! - `parser` - decoding
//! - `writer` - encoding
//! - `compression` - parallel block compression for the writer
//!
//! # Examples
//!
//! ```rust,no_run
//! use unity_graft::bundle::BundleFile;
//!
//! let bundle = BundleFile::from_file("example.bundle")?;
//! for entry in &bundle.entries {
//!     println!("{} ({} bytes)", entry.name, entry.data.len());
//! }
//! let rewritten = bundle.serialize()?;
//! std::fs::write("rewritten.bundle", rewritten.data())?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod compression;
pub mod header;
pub mod parser;
pub mod types;
pub mod writer;

pub use compression::{BlockCompressor, CompressedBlock};
pub use header::{ArchiveFlags, BundleHeader, UNITYFS_SIGNATURE, UNITYFS_VERSION};
pub use parser::BundleParser;
pub use types::{
    BundleDirectory, BundleEntry, BundleFile, BundleWriteOptions, CompressionBlock,
    DEFAULT_BLOCK_SIZE, DirectoryNode,
};
