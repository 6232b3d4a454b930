//! Bundle manifest classes

use crate::error::{BinaryError, Result};
use crate::object::{Object, ObjectPointer, UnityClass};
use crate::serializer::{ALIGN_BYTES, Direction, Transfer, TypeSerializer};
use unity_graft_core::class_id;

/// Container entry of an AssetBundle: an asset and its slice of the preload table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetInfo {
    pub preload_index: i32,
    pub preload_size: i32,
    pub asset: ObjectPointer<Object>,
}

impl Transfer for AssetInfo {
    fn transfer<D: Direction>(&mut self, serializer: &mut TypeSerializer<'_, D>) -> Result<()> {
        serializer.field(&mut self.preload_index, 0)?;
        serializer.field(&mut self.preload_size, 0)?;
        serializer.field(&mut self.asset, 0)
    }
}

/// Manifest object of an asset bundle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetBundle {
    pub name: String,
    pub preload_table: Vec<ObjectPointer<Object>>,
    /// Asset path to asset, in file order; paths may repeat
    pub container: Vec<(String, AssetInfo)>,
    pub main_asset: AssetInfo,
    pub runtime_compatibility: u32,
    pub asset_bundle_name: String,
    pub dependencies: Vec<String>,
    pub is_streamed_scene_asset_bundle: bool,
    pub explicit_data_layout: i32,
    pub path_flags: i32,
    pub scene_hashes: Vec<(String, String)>,
}

impl AssetBundle {
    /// First container entry registered under `path`
    pub fn find_asset(&self, path: &str) -> Option<&AssetInfo> {
        self.container
            .iter()
            .find(|(asset_path, _)| asset_path == path)
            .map(|(_, info)| info)
    }

    /// Objects that must be loaded together with `info`'s asset
    pub fn preload_objects(&self, info: &AssetInfo) -> Result<&[ObjectPointer<Object>]> {
        let start = usize::try_from(info.preload_index).ok();
        let size = usize::try_from(info.preload_size).ok();
        start
            .zip(size)
            .and_then(|(start, size)| self.preload_table.get(start..start.checked_add(size)?))
            .ok_or_else(|| {
                BinaryError::out_of_range(format!(
                    "preload range {}+{} outside table of {}",
                    info.preload_index,
                    info.preload_size,
                    self.preload_table.len()
                ))
            })
    }
}

impl UnityClass for AssetBundle {
    const CLASS_ID: i32 = class_id::ASSET_BUNDLE;
}

impl Transfer for AssetBundle {
    fn transfer<D: Direction>(&mut self, serializer: &mut TypeSerializer<'_, D>) -> Result<()> {
        serializer.field(&mut self.name, 0)?;
        serializer.field(&mut self.preload_table, 0)?;
        serializer.field(&mut self.container, 0)?;
        serializer.field(&mut self.main_asset, 0)?;
        serializer.field(&mut self.runtime_compatibility, 0)?;
        serializer.field(&mut self.asset_bundle_name, 0)?;
        serializer.field(&mut self.dependencies, 0)?;
        serializer.field(&mut self.is_streamed_scene_asset_bundle, ALIGN_BYTES)?;
        serializer.field(&mut self.explicit_data_layout, 0)?;
        serializer.field(&mut self.path_flags, 0)?;
        serializer.field(&mut self.scene_hashes, 0)
    }
}

/// Preload list of a scene bundle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreloadData {
    pub name: String,
    pub assets: Vec<ObjectPointer<Object>>,
    pub dependencies: Vec<String>,
    pub explicit_data_layout: bool,
}

impl UnityClass for PreloadData {
    const CLASS_ID: i32 = class_id::PRELOAD_DATA;
}

impl Transfer for PreloadData {
    fn transfer<D: Direction>(&mut self, serializer: &mut TypeSerializer<'_, D>) -> Result<()> {
        serializer.field(&mut self.name, 0)?;
        serializer.field(&mut self.assets, 0)?;
        serializer.field(&mut self.dependencies, 0)?;
        serializer.field(&mut self.explicit_data_layout, ALIGN_BYTES)
    }
}
