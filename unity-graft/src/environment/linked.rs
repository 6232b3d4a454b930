//! Assets from one or more bundles, linked into a single object graph

use super::asset_basename;
use super::loaded_asset::{AssetExternal, LoadedAsset};
use crate::bundle::BundleFile;
use crate::classes::AssetBundle;
use crate::error::{BinaryError, Result, SoftFailure};
use crate::object::{AssetId, Downcast, ObjectHandle, ObjectPointer, UnityObject, object_cast};
use crate::serializer::{AssetLinker, ResolvedObject};
use crate::stream::Stream;
use std::collections::HashMap;
use tracing::{debug, trace, warn};

/// Bundle entries with these suffixes hold streamed data, not serialized files
pub const STREAMED_RESOURCE_SUFFIXES: &[&str] = &[".resource", ".resS"];

/// Whether a bundle entry name denotes a streamed resource file
pub fn is_streamed_resource(name: &str) -> bool {
    STREAMED_RESOURCE_SUFFIXES
        .iter()
        .any(|suffix| name.ends_with(suffix))
}

/// Arena of loaded assets plus the streamed resource files they refer to
#[derive(Debug, Default)]
pub struct LinkedEnvironment {
    assets: Vec<LoadedAsset>,
    resources: HashMap<String, Stream>,
}

impl LinkedEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every entry of a bundle.
    ///
    /// Streamed resource entries are registered by basename; all other
    /// entries are parsed as serialized files. Returns the first
    /// [`AssetBundle`] manifest found among the new assets. Nothing is
    /// registered unless every entry parses.
    pub fn add_asset_bundle(&mut self, bundle: &BundleFile) -> Result<Option<ObjectHandle>> {
        let mut assets = Vec::new();
        let mut resources = Vec::new();
        for entry in &bundle.entries {
            if is_streamed_resource(&entry.name) {
                resources.push((entry.name.as_str(), entry.data.clone()));
            } else {
                assets.push(LoadedAsset::new(entry.name.as_str(), &entry.data)?);
            }
        }

        let first_id = self.assets.len();
        let manifest = assets.iter().enumerate().find_map(|(index, asset)| {
            asset
                .objects()
                .find(|(_, object)| object_cast::<AssetBundle>(object).is_some())
                .map(|(path_id, _)| ObjectHandle::new(AssetId(first_id + index), path_id))
        });
        self.assets.extend(assets);
        for (name, data) in resources {
            self.add_streamed_resource(name, data);
        }

        debug!(
            entries = bundle.entries.len(),
            assets = self.assets.len(),
            resources = self.resources.len(),
            has_manifest = manifest.is_some(),
            "bundle added to environment"
        );
        Ok(manifest)
    }

    /// Parse a serialized file and add it to the arena
    pub fn add_asset(&mut self, name: &str, data: &Stream) -> Result<AssetId> {
        let asset = LoadedAsset::new(name, data)?;
        let id = AssetId(self.assets.len());
        self.assets.push(asset);
        Ok(id)
    }

    /// Register a streamed resource file under its basename
    pub fn add_streamed_resource(&mut self, name: &str, data: Stream) {
        trace!(name, size = data.len(), "streamed resource registered");
        self.resources.insert(asset_basename(name).to_string(), data);
    }

    pub fn assets(&self) -> &[LoadedAsset] {
        &self.assets
    }

    pub fn asset(&self, id: AssetId) -> Option<&LoadedAsset> {
        self.assets.get(id.0)
    }

    /// First asset whose basename matches `name`'s basename
    pub fn find_asset(&self, name: &str) -> Option<AssetId> {
        find_by_basename(self.assets.iter().map(LoadedAsset::name), name)
    }

    /// Look up a streamed resource file by basename
    pub fn resolve_streamed_data_file(&self, name: &str) -> Option<Stream> {
        self.resources.get(asset_basename(name)).cloned()
    }

    /// Resolve externals and bind every pointer of every live object.
    ///
    /// Can be run again after adding assets; failures from a previous pass
    /// are discarded.
    pub fn link(&mut self) -> Result<()> {
        let index: Vec<AssetIndex> = self
            .assets
            .iter()
            .map(|asset| AssetIndex {
                name: asset.name.clone(),
                classes: asset.class_index(),
            })
            .collect();

        let resources = &self.resources;
        for (position, asset) in self.assets.iter_mut().enumerate() {
            asset.link_failures.clear();
            resolve_externals(&asset.name, &mut asset.externals, &index, &mut asset.link_failures);

            let mut context = AssetLinkContext {
                asset: AssetId(position),
                asset_name: &asset.name,
                externals: &asset.externals,
                index: &index,
                resources,
                failures: &mut asset.link_failures,
            };
            for object in asset.objects.values_mut().flatten() {
                object.link(&mut context)?;
            }
            trace!(asset = %asset.name, failures = asset.link_failures.len(), "asset linked");
        }

        debug!(
            assets = self.assets.len(),
            soft_failures = self.soft_failures().count(),
            "environment linked"
        );
        Ok(())
    }

    pub fn object(&self, handle: ObjectHandle) -> Option<&UnityObject> {
        self.asset(handle.asset)?.object(handle.path_id)
    }

    pub fn object_mut(&mut self, handle: ObjectHandle) -> Option<&mut UnityObject> {
        self.assets.get_mut(handle.asset.0)?.object_mut(handle.path_id)
    }

    /// Object behind `handle`, narrowed to `T`
    pub fn get<T: Downcast>(&self, handle: ObjectHandle) -> Option<&T> {
        self.object(handle).and_then(object_cast::<T>)
    }

    /// Target of a linked pointer, whatever its class
    pub fn resolve_object<T>(&self, pointer: &ObjectPointer<T>) -> Option<&UnityObject> {
        self.object(pointer.handle()?)
    }

    /// Target of a linked pointer, narrowed to `T`
    pub fn resolve<T: Downcast>(&self, pointer: &ObjectPointer<T>) -> Option<&T> {
        self.get(pointer.handle()?)
    }

    /// Every soft failure of every asset, in asset order
    pub fn soft_failures(&self) -> impl Iterator<Item = &SoftFailure> {
        self.assets.iter().flat_map(LoadedAsset::soft_failures)
    }
}

/// What the link pass needs to know about an asset while others are borrowed
struct AssetIndex {
    name: String,
    classes: HashMap<i64, Option<i32>>,
}

fn find_by_basename<'a>(names: impl IntoIterator<Item = &'a str>, name: &str) -> Option<AssetId> {
    let basename = asset_basename(name);
    names
        .into_iter()
        .position(|candidate| asset_basename(candidate) == basename)
        .map(AssetId)
}

fn resolve_externals(
    asset_name: &str,
    externals: &mut [AssetExternal],
    index: &[AssetIndex],
    failures: &mut Vec<SoftFailure>,
) {
    for external in externals.iter_mut() {
        external.asset = find_by_basename(index.iter().map(|entry| entry.name.as_str()), &external.path_name);
        if external.asset.is_none() {
            let failure = SoftFailure::UnresolvedExternal {
                asset: asset_name.to_string(),
                path_name: external.path_name.clone(),
            };
            warn!("{}", failure);
            failures.push(failure);
        }
    }
}

/// Pointer resolution on behalf of one asset
struct AssetLinkContext<'a> {
    asset: AssetId,
    asset_name: &'a str,
    externals: &'a [AssetExternal],
    index: &'a [AssetIndex],
    resources: &'a HashMap<String, Stream>,
    failures: &'a mut Vec<SoftFailure>,
}

impl AssetLinkContext<'_> {
    fn record(&mut self, failure: SoftFailure) {
        warn!("{}", failure);
        self.failures.push(failure);
    }

    /// Asset a file ID points into; `Ok(None)` when the external did not resolve
    fn target_asset(&self, file_id: i32) -> Result<Option<AssetId>> {
        if file_id == 0 {
            return Ok(Some(self.asset));
        }
        let external = usize::try_from(file_id)
            .ok()
            .and_then(|file_id| self.externals.get(file_id - 1))
            .ok_or_else(|| {
                BinaryError::invalid_format(format!(
                    "file ID {} in '{}' is outside the external table of {} entries",
                    file_id,
                    self.asset_name,
                    self.externals.len()
                ))
            })?;
        if external.asset.is_none() {
            trace!(file_id, path_name = %external.path_name, "pointer into an unresolved external");
        }
        Ok(external.asset)
    }
}

impl AssetLinker for AssetLinkContext<'_> {
    fn resolve_pointer(&mut self, file_id: i32, path_id: i64) -> Result<Option<ResolvedObject>> {
        let Some(target) = self.target_asset(file_id)? else {
            return Ok(None);
        };
        if path_id == 0 {
            return Ok(None);
        }

        let entry = self
            .index
            .get(target.0)
            .ok_or_else(|| BinaryError::internal(format!("asset {} missing from link index", target.0)))?;
        match entry.classes.get(&path_id) {
            Some(Some(class_id)) => Ok(Some(ResolvedObject {
                handle: ObjectHandle::new(target, path_id),
                class_id: *class_id,
            })),
            Some(None) => {
                let asset = entry.name.clone();
                self.record(SoftFailure::ObjectUnavailable { asset, path_id });
                Ok(None)
            }
            None => {
                let asset = entry.name.clone();
                self.record(SoftFailure::UnknownPathId { asset, path_id });
                Ok(None)
            }
        }
    }

    fn resolve_streamed_data_file(&mut self, name: &str) -> Option<Stream> {
        let stream = self.resources.get(asset_basename(name)).cloned();
        if stream.is_none() {
            self.record(SoftFailure::UnresolvedStreamedData {
                asset: self.asset_name.to_string(),
                name: name.to_string(),
            });
        }
        stream
    }
}
