//! Unity class IDs and their inheritance chain
//!
//! The table only lists the classes the codec knows how to name or cast.
//! Unknown IDs are not an error; they simply have no name and derive from
//! nothing.

use serde::Serialize;

pub const OBJECT: i32 = 0;
pub const GAME_OBJECT: i32 = 1;
pub const COMPONENT: i32 = 2;
pub const TRANSFORM: i32 = 4;
pub const BEHAVIOUR: i32 = 8;
pub const EDITOR_EXTENSION: i32 = 18;
pub const MATERIAL: i32 = 21;
pub const TEXTURE: i32 = 27;
pub const TEXTURE_2D: i32 = 28;
pub const MESH_FILTER: i32 = 33;
pub const MESH: i32 = 43;
pub const SHADER: i32 = 48;
pub const TEXT_ASSET: i32 = 49;
pub const CUBEMAP: i32 = 89;
/// Scripted component. Objects of this class always carry script data.
pub const MONO_BEHAVIOUR: i32 = 114;
pub const MONO_SCRIPT: i32 = 115;
pub const NAMED_OBJECT: i32 = 130;
pub const ASSET_BUNDLE: i32 = 142;
pub const PRELOAD_DATA: i32 = 150;

/// Static description of one Unity class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClassInfo {
    /// Numeric class ID as stored in serialized files
    pub id: i32,
    /// Engine class name
    pub name: &'static str,
    /// Direct base class, `None` only for `Object`
    pub base: Option<i32>,
}

const fn class(id: i32, name: &'static str, base: Option<i32>) -> ClassInfo {
    ClassInfo { id, name, base }
}

static CLASSES: &[ClassInfo] = &[
    class(OBJECT, "Object", None),
    class(GAME_OBJECT, "GameObject", Some(EDITOR_EXTENSION)),
    class(COMPONENT, "Component", Some(EDITOR_EXTENSION)),
    class(TRANSFORM, "Transform", Some(COMPONENT)),
    class(BEHAVIOUR, "Behaviour", Some(COMPONENT)),
    class(EDITOR_EXTENSION, "EditorExtension", Some(OBJECT)),
    class(MATERIAL, "Material", Some(NAMED_OBJECT)),
    class(TEXTURE, "Texture", Some(NAMED_OBJECT)),
    class(TEXTURE_2D, "Texture2D", Some(TEXTURE)),
    class(MESH_FILTER, "MeshFilter", Some(COMPONENT)),
    class(MESH, "Mesh", Some(NAMED_OBJECT)),
    class(SHADER, "Shader", Some(NAMED_OBJECT)),
    class(TEXT_ASSET, "TextAsset", Some(NAMED_OBJECT)),
    class(CUBEMAP, "Cubemap", Some(TEXTURE_2D)),
    class(MONO_BEHAVIOUR, "MonoBehaviour", Some(BEHAVIOUR)),
    class(MONO_SCRIPT, "MonoScript", Some(TEXT_ASSET)),
    class(NAMED_OBJECT, "NamedObject", Some(EDITOR_EXTENSION)),
    class(ASSET_BUNDLE, "AssetBundle", Some(NAMED_OBJECT)),
    class(PRELOAD_DATA, "PreloadData", Some(NAMED_OBJECT)),
];

/// Look up the static description of a class
pub fn class_info(id: i32) -> Option<&'static ClassInfo> {
    CLASSES.iter().find(|info| info.id == id)
}

/// Engine name of a class, if known
pub fn class_name(id: i32) -> Option<&'static str> {
    class_info(id).map(|info| info.name)
}

/// Whether `class_id` is `base_id` or inherits from it.
///
/// Every known class derives from `Object`. An unknown class only matches
/// itself.
pub fn is_derived_from(class_id: i32, base_id: i32) -> bool {
    let mut current = Some(class_id);
    while let Some(id) = current {
        if id == base_id {
            return true;
        }
        current = class_info(id).and_then(|info| info.base);
    }
    false
}
