//! One serialized file with its objects built

use crate::asset::SerializedFile;
use crate::error::{Result, SoftFailure};
use crate::object::{AssetId, LoadOutcome, SkipReason, UnityObject, load_object};
use crate::stream::Stream;
use indexmap::IndexMap;
use std::collections::HashMap;
use tracing::{debug, warn};

/// External file reference of a loaded asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetExternal {
    pub path_name: String,
    /// Asset the reference resolved to during the last link pass
    pub asset: Option<AssetId>,
}

/// Objects of one serialized file, keyed by path ID
#[derive(Debug)]
pub struct LoadedAsset {
    pub(crate) name: String,
    pub(crate) externals: Vec<AssetExternal>,
    /// `None` marks an object the factory could not build
    pub(crate) objects: IndexMap<i64, Option<UnityObject>>,
    pub(crate) load_failures: Vec<SoftFailure>,
    pub(crate) link_failures: Vec<SoftFailure>,
}

impl LoadedAsset {
    /// Parse a serialized file and build its objects
    pub fn new<S: Into<String>>(name: S, data: &Stream) -> Result<Self> {
        let file = SerializedFile::from_stream(data)?;
        Self::from_serialized_file(name, &file)
    }

    pub fn from_serialized_file<S: Into<String>>(name: S, file: &SerializedFile) -> Result<Self> {
        let name = name.into();
        let externals = file
            .externals
            .iter()
            .map(|external| AssetExternal {
                path_name: external.path.clone(),
                asset: None,
            })
            .collect();

        let mut objects = IndexMap::with_capacity(file.objects.len());
        let mut load_failures = Vec::new();
        for object in &file.objects {
            let serialized_type = file.object_type(object)?;
            let loaded = match load_object(serialized_type, &object.data)? {
                LoadOutcome::Loaded(loaded) => Some(loaded),
                LoadOutcome::Skipped(reason) => {
                    let failure = match reason {
                        SkipReason::ScriptData => SoftFailure::ScriptDataAttached {
                            asset: name.clone(),
                            path_id: object.path_id,
                            class_id: serialized_type.class_id,
                        },
                        SkipReason::UnregisteredClass => SoftFailure::UnregisteredClass {
                            asset: name.clone(),
                            path_id: object.path_id,
                            class_id: serialized_type.class_id,
                        },
                    };
                    warn!("{}", failure);
                    load_failures.push(failure);
                    None
                }
            };
            objects.insert(object.path_id, loaded);
        }

        debug!(
            asset = %name,
            objects = objects.len(),
            skipped = load_failures.len(),
            externals = file.externals.len(),
            "asset loaded"
        );

        Ok(Self {
            name,
            externals,
            objects,
            load_failures,
            link_failures: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn externals(&self) -> &[AssetExternal] {
        &self.externals
    }

    /// Live objects in file order
    pub fn objects(&self) -> impl Iterator<Item = (i64, &UnityObject)> {
        self.objects
            .iter()
            .filter_map(|(&path_id, object)| object.as_ref().map(|object| (path_id, object)))
    }

    /// Number of object records, built or not
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Look up a live object; path ID 0 is always `None`
    pub fn object(&self, path_id: i64) -> Option<&UnityObject> {
        if path_id == 0 {
            return None;
        }
        match self.objects.get(&path_id) {
            Some(Some(object)) => Some(object),
            Some(None) => {
                warn!(asset = %self.name, path_id, "object was not loaded");
                None
            }
            None => {
                warn!(asset = %self.name, path_id, "no object with this path ID");
                None
            }
        }
    }

    pub fn object_mut(&mut self, path_id: i64) -> Option<&mut UnityObject> {
        self.objects.get_mut(&path_id).and_then(Option::as_mut)
    }

    /// Failures from loading plus those of the last link pass
    pub fn soft_failures(&self) -> impl Iterator<Item = &SoftFailure> {
        self.load_failures.iter().chain(self.link_failures.iter())
    }

    /// Path ID to class ID, `None` for objects that were not built
    pub(crate) fn class_index(&self) -> HashMap<i64, Option<i32>> {
        self.objects
            .iter()
            .map(|(&path_id, object)| (path_id, object.as_ref().map(UnityObject::class_id)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{FileIdentifier, SerializedType};
    use crate::classes::TextAsset;
    use crate::object::object_cast;
    use crate::serializer::encode_object;
    use unity_graft_core::class_id;

    fn sample_file() -> SerializedFile {
        let mut file = SerializedFile::new(22).unwrap();
        let text_type = file.add_type(SerializedType::new(class_id::TEXT_ASSET));
        let material_type = file.add_type(SerializedType::new(class_id::MATERIAL));
        let mut text = TextAsset {
            name: "readme".to_string(),
            script: b"hi".to_vec(),
        };
        file.add_object(5, text_type, encode_object(&mut text, 0).unwrap());
        file.add_object(6, material_type, Stream::from_vec(vec![0; 8]));
        file.add_external(FileIdentifier::new([0; 16], 0, "archive:/CAB-other/CAB-other".to_string()));
        file
    }

    #[test]
    fn test_objects_and_failures() {
        let asset = LoadedAsset::from_serialized_file("CAB-main", &sample_file()).unwrap();
        assert_eq!(asset.object_count(), 2);
        assert_eq!(asset.objects().count(), 1);
        assert_eq!(asset.externals()[0].path_name, "archive:/CAB-other/CAB-other");
        assert!(asset.externals()[0].asset.is_none());

        let text = asset.object(5).and_then(object_cast::<TextAsset>).unwrap();
        assert_eq!(text.name, "readme");
        assert!(asset.object(0).is_none());
        assert!(asset.object(6).is_none());
        assert!(asset.object(99).is_none());

        let failures: Vec<_> = asset.soft_failures().collect();
        assert_eq!(
            failures,
            vec![&SoftFailure::UnregisteredClass {
                asset: "CAB-main".to_string(),
                path_id: 6,
                class_id: class_id::MATERIAL,
            }]
        );
    }

    #[test]
    fn test_class_index() {
        let asset = LoadedAsset::from_serialized_file("CAB-main", &sample_file()).unwrap();
        let index = asset.class_index();
        assert_eq!(index.get(&5), Some(&Some(class_id::TEXT_ASSET)));
        assert_eq!(index.get(&6), Some(&None));
    }

    #[test]
    fn test_parse_from_stream() {
        let stream = sample_file().serialize().unwrap();
        let asset = LoadedAsset::new("CAB-main", &stream).unwrap();
        assert_eq!(asset.name(), "CAB-main");
        assert_eq!(asset.objects().count(), 1);
    }
}
