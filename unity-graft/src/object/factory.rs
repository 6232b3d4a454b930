//! Class ID to constructor mapping

use super::{UnityClass, UnityObject};
use crate::asset::SerializedType;
use crate::classes::{AssetBundle, Cubemap, GameObject, MeshFilter, PreloadData, TextAsset, Texture2D, Transform};
use crate::error::Result;
use crate::serializer::{Transfer, decode_object};
use crate::stream::Stream;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use tracing::trace;

type Loader = fn(&Stream) -> Result<UnityObject>;

fn load<T>(data: &Stream) -> Result<UnityObject>
where
    T: Transfer + Default + Into<UnityObject>,
{
    Ok(decode_object::<T>(data, 0)?.into())
}

static LOADERS: Lazy<HashMap<i32, Loader>> = Lazy::new(|| {
    let mut loaders: HashMap<i32, Loader> = HashMap::new();
    loaders.insert(GameObject::CLASS_ID, load::<GameObject>);
    loaders.insert(Transform::CLASS_ID, load::<Transform>);
    loaders.insert(MeshFilter::CLASS_ID, load::<MeshFilter>);
    loaders.insert(TextAsset::CLASS_ID, load::<TextAsset>);
    loaders.insert(Texture2D::CLASS_ID, load::<Texture2D>);
    loaders.insert(Cubemap::CLASS_ID, load::<Cubemap>);
    loaders.insert(AssetBundle::CLASS_ID, load::<AssetBundle>);
    loaders.insert(PreloadData::CLASS_ID, load::<PreloadData>);
    loaders
});

/// Why the factory produced no object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The type has a script attached; managed data is not decoded
    ScriptData,
    /// No constructor is registered for the class
    UnregisteredClass,
}

/// Result of [`load_object`]
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    Loaded(UnityObject),
    Skipped(SkipReason),
}

impl LoadOutcome {
    pub fn into_object(self) -> Option<UnityObject> {
        match self {
            Self::Loaded(object) => Some(object),
            Self::Skipped(_) => None,
        }
    }
}

/// Whether the factory can build objects of `class_id`
pub fn is_registered(class_id: i32) -> bool {
    LOADERS.contains_key(&class_id)
}

/// Every class ID the factory can build, in ascending order
pub fn registered_classes() -> Vec<i32> {
    let mut ids: Vec<i32> = LOADERS.keys().copied().collect();
    ids.sort_unstable();
    ids
}

/// Build an object of the declared type from its serialized bytes.
///
/// Script-bearing and unregistered types are skipped, not errors. A
/// registered type whose data does not decode is an error.
pub fn load_object(serialized_type: &SerializedType, data: &Stream) -> Result<LoadOutcome> {
    if serialized_type.is_script_type() {
        return Ok(LoadOutcome::Skipped(SkipReason::ScriptData));
    }
    let Some(loader) = LOADERS.get(&serialized_type.class_id) else {
        return Ok(LoadOutcome::Skipped(SkipReason::UnregisteredClass));
    };

    let object = loader(data)?;
    trace!(class_id = serialized_type.class_id, size = data.len(), "object loaded");
    Ok(LoadOutcome::Loaded(object))
}
