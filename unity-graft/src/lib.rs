//! Unity Graft
//!
//! Reading, editing and rewriting of Unity player data:
//! - UnityFS bundles (.bundle, .unity3d)
//! - SerializedFiles stored in bundles (CAB-*)
//! - Streamed resource files (.resS, .resource)
//!
//! # Features
//!
//! - **Bundle codec**: LZ4/LZ4HC and LZMA blocks, parallel block compression on
//!   encode, and checksum preservation across edits
//! - **SerializedFile codec**: versions 21 and 22 (narrow and wide offsets)
//! - **Object graph**: a closed set of registered classes decoded, encoded and
//!   linked by one field serializer
//! - **Linking**: cross-file pointers resolved into non-owning handles
//!
//! # Example
//!
//! ```rust,no_run
//! use unity_graft::{BundleFile, LinkedEnvironment, Texture2D, object_cast};
//!
//! let bundle = BundleFile::from_file("textures.unity3d")?;
//! let mut environment = LinkedEnvironment::new();
//! environment.add_asset_bundle(&bundle)?;
//! environment.link()?;
//!
//! for asset in environment.assets() {
//!     for (path_id, object) in asset.objects() {
//!         if let Some(texture) = object_cast::<Texture2D>(object) {
//!             let size = texture.image_data().map_or(0, <[u8]>::len);
//!             println!("{} {}: {}x{}, {} bytes", path_id, texture.name, texture.width, texture.height, size);
//!         }
//!     }
//! }
//!
//! // Unchanged content re-encodes with the same checksum
//! let rewritten = bundle.serialize()?;
//! std::fs::write("textures.rewritten.unity3d", rewritten.data())?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod asset;
pub mod bundle;
pub mod classes;
pub mod compression;
pub mod crc;
pub mod environment;
pub mod error;
pub mod object;
pub mod serializer;
pub mod stream;
pub mod streamed_resource;

pub use asset::{SerializedFile, SerializedType};
pub use bundle::{BundleEntry, BundleFile, BundleWriteOptions};
pub use classes::{AssetBundle, Cubemap, GameObject, MeshFilter, PreloadData, TextAsset, Texture2D, Transform};
pub use compression::CompressionType;
pub use environment::{LinkedEnvironment, LoadedAsset};
pub use error::{BinaryError, Result, SoftFailure};
pub use object::{AssetId, Downcast, ObjectHandle, ObjectPointer, StreamingInfo, UnityClass, UnityObject, object_cast};
pub use stream::{ByteOrder, Stream};
pub use streamed_resource::StreamedResourceManipulator;
