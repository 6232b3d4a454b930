//! Text asset class
//!
//! `.txt`, `.json` and `.bytes` files imported into a project end up here;
//! the payload is kept as raw bytes.

use crate::error::Result;
use crate::object::UnityClass;
use crate::serializer::{Direction, Transfer, TypeSerializer};
use unity_graft_core::class_id;

/// Named blob of text or binary data
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextAsset {
    pub name: String,
    /// Stored as a string field but not required to be UTF-8
    pub script: Vec<u8>,
}

impl TextAsset {
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.script).ok()
    }
}

impl UnityClass for TextAsset {
    const CLASS_ID: i32 = class_id::TEXT_ASSET;
}

impl Transfer for TextAsset {
    fn transfer<D: Direction>(&mut self, serializer: &mut TypeSerializer<'_, D>) -> Result<()> {
        serializer.field(&mut self.name, 0)?;
        serializer.field(&mut self.script, 0)
    }
}
