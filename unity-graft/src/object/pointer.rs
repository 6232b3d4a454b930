//! Object references and streamed data references

use super::UnityClass;
use crate::error::Result;
use crate::serializer::{Direction, Transfer, TypeSerializer};
use crate::stream::Stream;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// Index of a loaded asset inside a [`LinkedEnvironment`](crate::environment::LinkedEnvironment)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub usize);

/// Non-owning address of a live object: the asset arena plus the path ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectHandle {
    pub asset: AssetId,
    pub path_id: i64,
}

impl ObjectHandle {
    pub fn new(asset: AssetId, path_id: i64) -> Self {
        Self { asset, path_id }
    }
}

/// Typed `(file_id, path_id)` reference to another object
///
/// The identifiers are what the file stores. The target handle is only set
/// by a link pass, and only when the object found there is a `T`.
pub struct ObjectPointer<T> {
    pub file_id: i32,
    pub path_id: i64,
    target: Option<ObjectHandle>,
    marker: PhantomData<fn() -> T>,
}

impl<T> ObjectPointer<T> {
    pub fn new(file_id: i32, path_id: i64) -> Self {
        Self {
            file_id,
            path_id,
            target: None,
            marker: PhantomData,
        }
    }

    /// Path ID 0 is the null reference in every file
    pub fn is_null(&self) -> bool {
        self.path_id == 0
    }

    /// Object bound by the last link pass
    pub fn handle(&self) -> Option<ObjectHandle> {
        self.target
    }

    pub(crate) fn bind(&mut self, target: Option<ObjectHandle>) {
        self.target = target;
    }
}

impl<T> Default for ObjectPointer<T> {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl<T> Clone for ObjectPointer<T> {
    fn clone(&self) -> Self {
        Self {
            file_id: self.file_id,
            path_id: self.path_id,
            target: self.target,
            marker: PhantomData,
        }
    }
}

impl<T> PartialEq for ObjectPointer<T> {
    fn eq(&self, other: &Self) -> bool {
        self.file_id == other.file_id && self.path_id == other.path_id
    }
}

impl<T> fmt::Debug for ObjectPointer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectPointer")
            .field("file_id", &self.file_id)
            .field("path_id", &self.path_id)
            .field("target", &self.target)
            .finish()
    }
}

impl<T: UnityClass> Transfer for ObjectPointer<T> {
    fn transfer<D: Direction>(&mut self, serializer: &mut TypeSerializer<'_, D>) -> Result<()> {
        serializer.field(&mut self.file_id, 0)?;
        serializer.field(&mut self.path_id, 0)?;
        serializer.bind_pointer(self)
    }
}

/// Reference to bulk data kept in a streamed resource file
#[derive(Debug, Clone, Default)]
pub struct StreamingInfo {
    pub offset: u32,
    pub size: u32,
    /// Resource file name; empty when the data is stored inline
    pub path: String,
    stream: Option<Stream>,
}

impl StreamingInfo {
    pub fn new<S: Into<String>>(path: S, offset: u32, size: u32) -> Self {
        Self {
            offset,
            size,
            path: path.into(),
            stream: None,
        }
    }

    /// View of the streamed bytes, once linked
    pub fn stream(&self) -> Option<&Stream> {
        self.stream.as_ref()
    }

    pub fn is_external(&self) -> bool {
        !self.path.is_empty()
    }

    pub(crate) fn bind(&mut self, stream: Option<Stream>) {
        self.stream = stream;
    }
}

impl PartialEq for StreamingInfo {
    fn eq(&self, other: &Self) -> bool {
        self.offset == other.offset && self.size == other.size && self.path == other.path
    }
}

impl Transfer for StreamingInfo {
    fn transfer<D: Direction>(&mut self, serializer: &mut TypeSerializer<'_, D>) -> Result<()> {
        serializer.field(&mut self.offset, 0)?;
        serializer.field(&mut self.size, 0)?;
        serializer.field(&mut self.path, 0)?;
        serializer.bind_streamed_data(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classes::Transform;
    use crate::object::Component;
    use crate::serializer::{decode_object, encode_object};

    #[test]
    fn test_pointer_layout() {
        let mut pointer = ObjectPointer::<Transform>::new(1, -5);
        let stream = encode_object(&mut pointer, 0).unwrap();
        assert_eq!(stream.len(), 12);
        assert_eq!(&stream.data()[..4], &1i32.to_le_bytes());

        let decoded: ObjectPointer<Transform> = decode_object(&stream, 0).unwrap();
        assert_eq!(decoded, pointer);
        assert!(decoded.handle().is_none());
    }

    #[test]
    fn test_null_pointer() {
        let pointer = ObjectPointer::<Component>::default();
        assert!(pointer.is_null());
    }

    #[test]
    fn test_streaming_info_layout() {
        let mut info = StreamingInfo::new("archive:/CAB-1/CAB-1.resS", 32, 64);
        assert!(info.is_external());
        let stream = encode_object(&mut info, 0).unwrap();
        // offset, size, length prefix, 25 bytes of path, 3 padding
        assert_eq!(stream.len(), 4 + 4 + 4 + 25 + 3);
        let decoded: StreamingInfo = decode_object(&stream, 0).unwrap();
        assert_eq!(decoded, info);
        assert!(decoded.stream().is_none());
    }
}
