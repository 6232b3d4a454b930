//! SerializedFile metadata records
//!
//! All records live in the little-endian metadata section.

use crate::error::{BinaryError, Result};
use crate::stream::Stream;
use serde::{Deserialize, Serialize};
use unity_graft_core::class_id::MONO_BEHAVIOUR;

/// Type table entry of a SerializedFile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedType {
    /// Unity class ID
    pub class_id: i32,
    /// Whether the type was stripped from the build; never supported
    pub is_stripped_type: bool,
    /// Index into the script type table, -1 for native classes
    pub script_type_index: i16,
    /// Script ID hash, present for scripted classes
    pub script_id: Option<[u8; 16]>,
    /// Hash of the native type layout
    pub old_type_hash: [u8; 16],
}

impl SerializedType {
    pub fn new(class_id: i32) -> Self {
        Self {
            class_id,
            is_stripped_type: false,
            script_type_index: -1,
            script_id: None,
            old_type_hash: [0; 16],
        }
    }

    /// Whether the record layout includes a script ID
    fn has_script_id(class_id: i32, script_type_index: i16, is_ref_type: bool) -> bool {
        (is_ref_type && script_type_index >= 0) || class_id == MONO_BEHAVIOUR
    }

    /// Parse one type record; type trees are not supported
    pub(crate) fn read(stream: &mut Stream, is_ref_type: bool, type_tree_enabled: bool) -> Result<Self> {
        let class_id = stream.read_i32()?;
        let is_stripped_type = stream.read_bool()?;
        if is_stripped_type {
            return Err(BinaryError::unsupported(format!(
                "stripped type for class {}",
                class_id
            )));
        }
        let script_type_index = stream.read_i16()?;
        let script_id = if Self::has_script_id(class_id, script_type_index, is_ref_type) {
            Some(stream.read_array::<16>()?)
        } else {
            None
        };
        let old_type_hash = stream.read_array::<16>()?;

        if type_tree_enabled {
            return Err(BinaryError::unsupported(format!(
                "type tree for class {}",
                class_id
            )));
        }

        Ok(Self {
            class_id,
            is_stripped_type,
            script_type_index,
            script_id,
            old_type_hash,
        })
    }

    pub(crate) fn write(&self, stream: &mut Stream, is_ref_type: bool) -> Result<()> {
        if self.is_stripped_type {
            return Err(BinaryError::unsupported(format!(
                "stripped type for class {}",
                self.class_id
            )));
        }
        stream.write_i32(self.class_id)?;
        stream.write_bool(false)?;
        stream.write_i16(self.script_type_index)?;
        if Self::has_script_id(self.class_id, self.script_type_index, is_ref_type) {
            let script_id = self.script_id.ok_or_else(|| {
                BinaryError::invalid_data(format!(
                    "class {} requires a script ID",
                    self.class_id
                ))
            })?;
            stream.write_data(&script_id)?;
        }
        stream.write_data(&self.old_type_hash)
    }

    /// Whether objects of this type carry managed script data
    pub fn is_script_type(&self) -> bool {
        self.script_type_index >= 0 || self.script_id.is_some()
    }
}

/// Object table entry with its raw data
#[derive(Debug, Clone)]
pub struct ObjectInfo {
    /// Unique object ID within the file
    pub path_id: i64,
    /// Index into the type table
    pub type_id: i32,
    /// View of the object's bytes in the data area
    pub data: Stream,
}

impl ObjectInfo {
    pub fn new(path_id: i64, type_id: i32, data: Stream) -> Self {
        Self {
            path_id,
            type_id,
            data,
        }
    }

    pub fn byte_size(&self) -> usize {
        self.data.len()
    }
}

/// Reference to an object in another file, used by the script type table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LocalSerializedObjectIdentifier {
    pub local_serialized_file_index: i32,
    pub local_identifier_in_file: i64,
}

impl LocalSerializedObjectIdentifier {
    pub(crate) fn read(stream: &mut Stream) -> Result<Self> {
        let local_serialized_file_index = stream.read_i32()?;
        stream.skip_alignment(4)?;
        let local_identifier_in_file = stream.read_i64()?;
        Ok(Self {
            local_serialized_file_index,
            local_identifier_in_file,
        })
    }

    pub(crate) fn write(&self, stream: &mut Stream) -> Result<()> {
        stream.write_i32(self.local_serialized_file_index)?;
        stream.align_position(4)?;
        stream.write_i64(self.local_identifier_in_file)
    }
}

/// External file referenced by a SerializedFile
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FileIdentifier {
    /// GUID of the referenced file
    pub guid: [u8; 16],
    /// Reference type
    pub type_: i32,
    /// Path of the referenced file, e.g. `archive:/CAB-xxx/CAB-xxx`
    pub path: String,
}

impl FileIdentifier {
    pub fn new(guid: [u8; 16], type_: i32, path: String) -> Self {
        Self { guid, type_, path }
    }

    pub(crate) fn read(stream: &mut Stream) -> Result<Self> {
        // Editor-only asset path, empty in builds
        stream.read_cstring()?;
        let guid = stream.read_array::<16>()?;
        let type_ = stream.read_i32()?;
        let path = stream.read_cstring()?;
        Ok(Self { guid, type_, path })
    }

    pub(crate) fn write(&self, stream: &mut Stream) -> Result<()> {
        stream.write_cstring("")?;
        stream.write_data(&self.guid)?;
        stream.write_i32(self.type_)?;
        stream.write_cstring(&self.path)
    }

    /// GUID as lowercase hex, in Unity's nibble order
    pub fn guid_string(&self) -> String {
        self.guid
            .iter()
            .map(|byte| format!("{:x}{:x}", byte & 0x0F, byte >> 4))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unity_graft_core::class_id;

    #[test]
    fn test_mono_behaviour_type_carries_script_id() {
        let mut ty = SerializedType::new(class_id::MONO_BEHAVIOUR);
        ty.script_type_index = 0;
        ty.script_id = Some([7; 16]);
        let mut stream = Stream::new();
        ty.write(&mut stream, false).unwrap();
        assert_eq!(stream.len(), 4 + 1 + 2 + 16 + 16);
        stream.set_position(0).unwrap();
        let parsed = SerializedType::read(&mut stream, false, false).unwrap();
        assert_eq!(parsed, ty);
        assert!(parsed.is_script_type());
    }

    #[test]
    fn test_native_type_has_no_script_id() {
        let ty = SerializedType::new(class_id::TEXTURE_2D);
        let mut stream = Stream::new();
        ty.write(&mut stream, true).unwrap();
        assert_eq!(stream.len(), 4 + 1 + 2 + 16);
        assert!(!ty.is_script_type());
    }

    #[test]
    fn test_stripped_and_type_tree_rejected() {
        let mut stream = Stream::new();
        SerializedType::new(class_id::TRANSFORM)
            .write(&mut stream, false)
            .unwrap();
        stream.set_position(0).unwrap();
        assert!(matches!(
            SerializedType::read(&mut stream, false, true),
            Err(BinaryError::Unsupported(_))
        ));

        let mut stream = Stream::from_vec(vec![4, 0, 0, 0, 1, 0xFF, 0xFF]);
        assert!(matches!(
            SerializedType::read(&mut stream, false, false),
            Err(BinaryError::Unsupported(_))
        ));
    }

    #[test]
    fn test_guid_string() {
        let mut guid = [0u8; 16];
        guid[0] = 0x12;
        let file = FileIdentifier::new(guid, 0, "archive:/CAB-a/CAB-a".to_string());
        assert!(file.guid_string().starts_with("21"));
        assert_eq!(file.guid_string().len(), 32);
    }
}
