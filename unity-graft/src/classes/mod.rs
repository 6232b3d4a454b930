//! Registered Unity classes
//!
//! Field layouts follow the 2019.4 player format. Each class lists its
//! fields in serialized order inside its [`Transfer`] implementation; fields
//! the engine marks as aligned are visited with [`ALIGN_BYTES`].
//!
//! [`ALIGN_BYTES`]: crate::serializer::ALIGN_BYTES

pub mod asset_bundle;
pub mod game_object;
pub mod text_asset;
pub mod texture;

pub use asset_bundle::{AssetBundle, AssetInfo, PreloadData};
pub use game_object::{ComponentPair, GameObject, MeshFilter, Transform};
pub use text_asset::TextAsset;
pub use texture::{Cubemap, Texture2D, TextureSettings};

use crate::error::Result;
use crate::serializer::{Direction, Transfer, TypeSerializer};

/// 3D vector
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector3f {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3f {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn one() -> Self {
        Self::new(1.0, 1.0, 1.0)
    }
}

impl Transfer for Vector3f {
    fn transfer<D: Direction>(&mut self, serializer: &mut TypeSerializer<'_, D>) -> Result<()> {
        serializer.field(&mut self.x, 0)?;
        serializer.field(&mut self.y, 0)?;
        serializer.field(&mut self.z, 0)
    }
}

/// Rotation quaternion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternionf {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quaternionf {
    pub fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    pub fn identity() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }
}

impl Default for Quaternionf {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transfer for Quaternionf {
    fn transfer<D: Direction>(&mut self, serializer: &mut TypeSerializer<'_, D>) -> Result<()> {
        serializer.field(&mut self.x, 0)?;
        serializer.field(&mut self.y, 0)?;
        serializer.field(&mut self.z, 0)?;
        serializer.field(&mut self.w, 0)
    }
}
