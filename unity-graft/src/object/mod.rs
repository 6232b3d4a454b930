//! Polymorphic Unity objects
//!
//! Every object the factory can build is one variant of [`UnityObject`].
//! The set is closed: dispatch is a `match` on the variant, and "is this
//! object a `T`" is answered by [`Downcast`] or, for classes without a Rust
//! type, by the class hierarchy in `unity_graft_core`.

pub mod factory;
pub mod pointer;

pub use factory::{LoadOutcome, SkipReason, is_registered, load_object, registered_classes};
pub use pointer::{AssetId, ObjectHandle, ObjectPointer, StreamingInfo};

use crate::classes::{AssetBundle, Cubemap, GameObject, MeshFilter, PreloadData, TextAsset, Texture2D, Transform};
use crate::error::Result;
use crate::serializer::{AssetLinker, encode_object, link_object};
use crate::stream::Stream;
use unity_graft_core::class_id;

/// A Unity class with a fixed numeric ID
pub trait UnityClass {
    const CLASS_ID: i32;
}

/// Safe narrowing from [`UnityObject`] to a concrete class
pub trait Downcast: UnityClass + Sized {
    fn downcast_ref(object: &UnityObject) -> Option<&Self>;
}

/// Narrow an object to `T`, or `None` when it is not a `T`
pub fn object_cast<T: Downcast>(object: &UnityObject) -> Option<&T> {
    T::downcast_ref(object)
}

macro_rules! marker_classes {
    ($($(#[$meta:meta])* $name:ident = $id:expr;)*) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
            pub struct $name;

            impl UnityClass for $name {
                const CLASS_ID: i32 = $id;
            }
        )*
    };
}

marker_classes! {
    /// Any object; a pointer to `Object` accepts every target
    Object = class_id::OBJECT;
    Component = class_id::COMPONENT;
    NamedObject = class_id::NAMED_OBJECT;
    Texture = class_id::TEXTURE;
    Mesh = class_id::MESH;
}

macro_rules! unity_objects {
    ($($variant:ident),* $(,)?) => {
        /// An object built by the factory
        #[derive(Debug, Clone)]
        pub enum UnityObject {
            $($variant($variant),)*
        }

        impl UnityObject {
            pub fn class_id(&self) -> i32 {
                match self {
                    $(Self::$variant(_) => <$variant as UnityClass>::CLASS_ID,)*
                }
            }

            /// Run the link pass over this object's fields
            pub fn link(&mut self, linker: &mut dyn AssetLinker) -> Result<()> {
                match self {
                    $(Self::$variant(object) => link_object(object, linker, 0),)*
                }
            }

            /// Encode the object's fields into a new stream
            pub fn encode(&mut self) -> Result<Stream> {
                match self {
                    $(Self::$variant(object) => encode_object(object, 0),)*
                }
            }
        }

        $(
            impl From<$variant> for UnityObject {
                fn from(object: $variant) -> Self {
                    Self::$variant(object)
                }
            }
        )*
    };
}

unity_objects!(
    GameObject,
    Transform,
    MeshFilter,
    TextAsset,
    Texture2D,
    Cubemap,
    AssetBundle,
    PreloadData,
);

impl UnityObject {
    pub fn class_name(&self) -> &'static str {
        unity_graft_core::class_name(self.class_id()).unwrap_or("Unknown")
    }

    /// Whether this object is an instance of `class_id` or of a class derived from it
    pub fn can_be_cast_to(&self, class_id: i32) -> bool {
        unity_graft_core::is_derived_from(self.class_id(), class_id)
    }
}

macro_rules! downcast_exact {
    ($($variant:ident),*) => {
        $(
            impl Downcast for $variant {
                fn downcast_ref(object: &UnityObject) -> Option<&Self> {
                    match object {
                        UnityObject::$variant(inner) => Some(inner),
                        _ => None,
                    }
                }
            }
        )*
    };
}

downcast_exact!(GameObject, Transform, MeshFilter, TextAsset, Cubemap, AssetBundle, PreloadData);

// A cubemap is a Texture2D with extra fields
impl Downcast for Texture2D {
    fn downcast_ref(object: &UnityObject) -> Option<&Self> {
        match object {
            UnityObject::Texture2D(texture) => Some(texture),
            UnityObject::Cubemap(cubemap) => Some(&cubemap.texture),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_cast() {
        let object = UnityObject::from(TextAsset {
            name: "notes".to_string(),
            script: b"hello".to_vec(),
        });
        assert_eq!(object.class_id(), class_id::TEXT_ASSET);
        assert_eq!(object.class_name(), "TextAsset");
        assert_eq!(object_cast::<TextAsset>(&object).map(|t| t.name.as_str()), Some("notes"));
        assert!(object_cast::<Texture2D>(&object).is_none());
    }

    #[test]
    fn test_cubemap_is_a_texture() {
        let mut cubemap = Cubemap::default();
        cubemap.texture.name = "sky".to_string();
        let object = UnityObject::from(cubemap);

        assert!(object.can_be_cast_to(class_id::TEXTURE_2D));
        assert!(object.can_be_cast_to(class_id::TEXTURE));
        assert!(object.can_be_cast_to(class_id::OBJECT));
        assert!(!object.can_be_cast_to(class_id::COMPONENT));
        assert_eq!(object_cast::<Texture2D>(&object).map(|t| t.name.as_str()), Some("sky"));
        assert!(object_cast::<Cubemap>(&object).is_some());
    }

    #[test]
    fn test_encode_matches_class_layout() {
        let mut object = UnityObject::from(TextAsset {
            name: "a".to_string(),
            script: vec![1, 2],
        });
        let stream = object.encode().unwrap();
        assert_eq!(stream.len(), 16);
    }
}
