//! Loading and linking environment
//!
//! A [`LinkedEnvironment`] is an arena of [`LoadedAsset`]s addressed by
//! [`AssetId`](crate::object::AssetId). Objects reference each other through
//! `(file_id, path_id)` pairs; [`LinkedEnvironment::link`] turns those into
//! [`ObjectHandle`](crate::object::ObjectHandle)s, which stay plain
//! identifiers and never own their target.
//!
//! # Examples
//!
//! ```rust,no_run
//! use unity_graft::bundle::BundleFile;
//! use unity_graft::classes::AssetBundle;
//! use unity_graft::environment::LinkedEnvironment;
//!
//! let bundle = BundleFile::from_file("level1.unity3d")?;
//! let mut environment = LinkedEnvironment::new();
//! let manifest = environment.add_asset_bundle(&bundle)?;
//! environment.link()?;
//!
//! if let Some(manifest) = manifest.and_then(|handle| environment.get::<AssetBundle>(handle)) {
//!     for (path, info) in &manifest.container {
//!         println!("{} -> {:?}", path, environment.resolve_object(&info.asset).map(|o| o.class_name()));
//!     }
//! }
//! for failure in environment.soft_failures() {
//!     eprintln!("{}", failure);
//! }
//! # Ok::<(), unity_graft::error::BinaryError>(())
//! ```

mod linked;
mod loaded_asset;

pub use linked::{LinkedEnvironment, STREAMED_RESOURCE_SUFFIXES, is_streamed_resource};
pub use loaded_asset::{AssetExternal, LoadedAsset};

/// Part of an asset path after the last `:` or `/`
///
/// Bundle entries and external references name the same file differently
/// (`CAB-x` against `archive:/CAB-x/CAB-x`); both reduce to the same basename.
pub fn asset_basename(name: &str) -> &str {
    match name.rfind([':', '/']) {
        Some(position) => &name[position + 1..],
        None => name,
    }
}
