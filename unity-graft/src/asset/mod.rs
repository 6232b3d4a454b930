//! Unity SerializedFile processing module
//!
//! A SerializedFile is a big-endian header, a little-endian metadata section
//! (type table, object table, script types, externals, ref types) and a
//! data area holding the raw bytes of every object.
//!
//! - `header` - version gated header layouts
//! - `types` - metadata records
//! - `parser` - decoding and the [`SerializedFile`] model
//! - `writer` - encoding
//!
//! # Examples
//!
//! ```rust,no_run
//! use unity_graft::asset::SerializedFile;
//! use unity_graft::stream::Stream;
//!
//! let file = SerializedFile::from_stream(&Stream::map_file("CAB-0123")?)?;
//! for object in &file.objects {
//!     let ty = file.object_type(object)?;
//!     println!("{}: class {} ({} bytes)", object.path_id, ty.class_id, object.byte_size());
//! }
//! # Ok::<(), unity_graft::error::BinaryError>(())
//! ```

pub mod header;
pub mod parser;
pub mod types;
pub mod writer;

pub use header::{MAX_SUPPORTED_VERSION, MIN_SUPPORTED_VERSION, SerializedFileHeader, WIDE_OFFSETS_VERSION};
pub use parser::{SerializedFile, SerializedFileParser};
pub use types::{FileIdentifier, LocalSerializedObjectIdentifier, ObjectInfo, SerializedType};
