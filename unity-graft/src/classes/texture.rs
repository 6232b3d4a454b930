//! Texture classes
//!
//! Pixel data is either inline in `image_data` or stored in a streamed
//! resource file referenced by `stream_data`. Decoding pixel formats is left
//! to consumers; this module only exposes the bytes.

use crate::error::{BinaryError, Result};
use crate::object::{ObjectPointer, StreamingInfo, UnityClass};
use crate::serializer::{ALIGN_BYTES, Direction, Transfer, TypeSerializer};
use unity_graft_core::class_id;

/// Number of faces of a cubemap
pub const CUBEMAP_FACES: i32 = 6;

/// Sampler state of a texture
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TextureSettings {
    pub filter_mode: i32,
    pub aniso: i32,
    pub mip_bias: f32,
    pub wrap_u: i32,
    pub wrap_v: i32,
    pub wrap_w: i32,
}

impl Transfer for TextureSettings {
    fn transfer<D: Direction>(&mut self, serializer: &mut TypeSerializer<'_, D>) -> Result<()> {
        serializer.field(&mut self.filter_mode, 0)?;
        serializer.field(&mut self.aniso, 0)?;
        serializer.field(&mut self.mip_bias, 0)?;
        serializer.field(&mut self.wrap_u, 0)?;
        serializer.field(&mut self.wrap_v, 0)?;
        serializer.field(&mut self.wrap_w, 0)
    }
}

/// Unity Texture2D
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Texture2D {
    pub name: String,
    pub forced_fallback_format: i32,
    pub downscale_fallback: bool,
    pub width: i32,
    pub height: i32,
    pub complete_image_size: i32,
    pub texture_format: i32,
    pub mip_count: i32,
    pub is_readable: bool,
    pub ignore_master_texture_limit: bool,
    pub is_pre_processed: bool,
    pub streaming_mipmaps: bool,
    pub streaming_mipmaps_priority: i32,
    pub image_count: i32,
    pub texture_dimension: i32,
    pub texture_settings: TextureSettings,
    pub lightmap_format: i32,
    pub color_space: i32,
    pub image_data: Vec<u8>,
    pub stream_data: StreamingInfo,
}

impl Texture2D {
    /// Check that the image count has a known meaning.
    ///
    /// Only 0 (empty) and 1 are understood; anything else is rejected
    /// rather than guessed at.
    pub fn validate_image_layout(&self) -> Result<()> {
        match self.image_count {
            0 | 1 => Ok(()),
            count => Err(BinaryError::unsupported(format!(
                "Texture2D '{}' with {} images",
                self.name, count
            ))),
        }
    }

    /// Pixel bytes: the linked streamed data when external, else the inline data.
    ///
    /// `None` when the data lives in a resource file that was not linked.
    pub fn image_data(&self) -> Option<&[u8]> {
        if self.stream_data.is_external() {
            self.stream_data.stream().map(|stream| stream.data())
        } else {
            Some(&self.image_data)
        }
    }
}

impl UnityClass for Texture2D {
    const CLASS_ID: i32 = class_id::TEXTURE_2D;
}

impl Transfer for Texture2D {
    fn transfer<D: Direction>(&mut self, serializer: &mut TypeSerializer<'_, D>) -> Result<()> {
        serializer.field(&mut self.name, 0)?;
        serializer.field(&mut self.forced_fallback_format, 0)?;
        serializer.field(&mut self.downscale_fallback, ALIGN_BYTES)?;
        serializer.field(&mut self.width, 0)?;
        serializer.field(&mut self.height, 0)?;
        serializer.field(&mut self.complete_image_size, 0)?;
        serializer.field(&mut self.texture_format, 0)?;
        serializer.field(&mut self.mip_count, 0)?;
        serializer.field(&mut self.is_readable, 0)?;
        serializer.field(&mut self.ignore_master_texture_limit, 0)?;
        serializer.field(&mut self.is_pre_processed, 0)?;
        serializer.field(&mut self.streaming_mipmaps, ALIGN_BYTES)?;
        serializer.field(&mut self.streaming_mipmaps_priority, 0)?;
        serializer.field(&mut self.image_count, 0)?;
        serializer.field(&mut self.texture_dimension, 0)?;
        serializer.field(&mut self.texture_settings, 0)?;
        serializer.field(&mut self.lightmap_format, 0)?;
        serializer.field(&mut self.color_space, 0)?;
        serializer.field(&mut self.image_data, 0)?;
        serializer.field(&mut self.stream_data, 0)
    }
}

/// Six-faced texture; stored as a Texture2D followed by its sources
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cubemap {
    pub texture: Texture2D,
    pub source_textures: Vec<ObjectPointer<Texture2D>>,
}

impl Cubemap {
    pub fn validate_image_layout(&self) -> Result<()> {
        if self.texture.image_count != CUBEMAP_FACES {
            return Err(BinaryError::unsupported(format!(
                "Cubemap '{}' with {} faces",
                self.texture.name, self.texture.image_count
            )));
        }
        Ok(())
    }
}

impl UnityClass for Cubemap {
    const CLASS_ID: i32 = class_id::CUBEMAP;
}

impl Transfer for Cubemap {
    fn transfer<D: Direction>(&mut self, serializer: &mut TypeSerializer<'_, D>) -> Result<()> {
        serializer.field(&mut self.texture, 0)?;
        serializer.field(&mut self.source_textures, 0)
    }
}
