//! SerializedFile parser
//!
//! The parser reads the header, then walks the metadata section in a fixed
//! order and requires it to be consumed exactly. Object data is never
//! copied; each [`ObjectInfo`] holds a view into the data area.

use super::header::{SerializedFileHeader, WIDE_OFFSETS_VERSION, check_version};
use super::types::{FileIdentifier, LocalSerializedObjectIdentifier, ObjectInfo, SerializedType};
use crate::error::{BinaryError, Result};
use crate::stream::{ByteOrder, Stream};
use std::collections::HashSet;
use tracing::{debug, trace};

/// Parser for Unity SerializedFile format
pub struct SerializedFileParser;

impl SerializedFileParser {
    /// Parse a SerializedFile occupying the whole stream
    pub fn parse(input: &Stream) -> Result<SerializedFile> {
        let mut stream = input.create_view(0, input.len())?;
        stream.set_byte_order(ByteOrder::Big);

        let header = SerializedFileHeader::from_stream(&mut stream)?;
        debug!(
            version = header.version,
            metadata_size = header.metadata_size,
            data_offset = header.data_offset,
            file_size = header.file_size,
            "parsing SerializedFile"
        );

        let mut metadata = stream.read_view(header.metadata_size as usize)?;
        metadata.set_byte_order(ByteOrder::Little);
        let data_area = stream.create_view_to_end(header.data_offset as usize)?;

        let file = Self::parse_metadata(&header, &mut metadata, &data_area)?;
        if metadata.remaining() != 0 {
            return Err(BinaryError::invalid_format(format!(
                "{} bytes of metadata left unread",
                metadata.remaining()
            )));
        }
        Ok(file)
    }

    fn parse_metadata(
        header: &SerializedFileHeader,
        metadata: &mut Stream,
        data_area: &Stream,
    ) -> Result<SerializedFile> {
        let version = header.version;
        let unity_version = metadata.read_cstring()?;
        let target_platform = metadata.read_u32()?;
        let enable_type_tree = metadata.read_bool()?;

        let types = Self::read_types(metadata, false, enable_type_tree)?;

        let object_count = read_count(metadata, "object")?;
        let mut objects = Vec::with_capacity(object_count.min(metadata.remaining() / 20));
        let mut seen = HashSet::with_capacity(objects.capacity());
        for _ in 0..object_count {
            let object = Self::read_object(version, metadata, data_area)?;
            if !seen.insert(object.path_id) {
                return Err(BinaryError::invalid_format(format!(
                    "path ID {} appears twice",
                    object.path_id
                )));
            }
            trace!(path_id = object.path_id, type_id = object.type_id, size = object.byte_size(), "object");
            objects.push(object);
        }

        let script_count = read_count(metadata, "script type")?;
        let mut script_types = Vec::with_capacity(script_count.min(metadata.remaining() / 12));
        for _ in 0..script_count {
            script_types.push(LocalSerializedObjectIdentifier::read(metadata)?);
        }

        let external_count = read_count(metadata, "external")?;
        let mut externals = Vec::with_capacity(external_count.min(metadata.remaining() / 22));
        for _ in 0..external_count {
            externals.push(FileIdentifier::read(metadata)?);
        }

        let ref_types = Self::read_types(metadata, true, enable_type_tree)?;
        let user_information = metadata.read_cstring()?;

        debug!(
            types = types.len(),
            objects = objects.len(),
            externals = externals.len(),
            "SerializedFile metadata decoded"
        );

        Ok(SerializedFile {
            version,
            unity_version,
            target_platform,
            enable_type_tree,
            types,
            objects,
            script_types,
            externals,
            ref_types,
            user_information,
        })
    }

    fn read_types(
        metadata: &mut Stream,
        is_ref_type: bool,
        enable_type_tree: bool,
    ) -> Result<Vec<SerializedType>> {
        let count = read_count(metadata, "type")?;
        let mut types = Vec::with_capacity(count.min(metadata.remaining() / 23));
        for _ in 0..count {
            types.push(SerializedType::read(metadata, is_ref_type, enable_type_tree)?);
        }
        Ok(types)
    }

    fn read_object(version: u32, metadata: &mut Stream, data_area: &Stream) -> Result<ObjectInfo> {
        metadata.skip_alignment(4)?;
        let path_id = metadata.read_i64()?;
        let byte_start = if version >= WIDE_OFFSETS_VERSION {
            metadata.read_u64()?
        } else {
            u64::from(metadata.read_u32()?)
        };
        let byte_size = metadata.read_u32()?;
        let type_id = metadata.read_i32()?;

        let start = usize::try_from(byte_start)
            .map_err(|_| BinaryError::invalid_format("object offset overflows"))?;
        let mut data = data_area
            .create_view(start, byte_size as usize)
            .map_err(|_| {
                BinaryError::invalid_format(format!(
                    "object {} ({}+{}) lies outside the {} byte data area",
                    path_id,
                    byte_start,
                    byte_size,
                    data_area.len()
                ))
            })?;
        data.set_byte_order(ByteOrder::Little);
        Ok(ObjectInfo::new(path_id, type_id, data))
    }
}

fn read_count(metadata: &mut Stream, what: &str) -> Result<usize> {
    let count = metadata.read_i32()?;
    usize::try_from(count)
        .map_err(|_| BinaryError::invalid_format(format!("negative {} count {}", what, count)))
}

/// Decoded Unity SerializedFile
#[derive(Debug, Clone)]
pub struct SerializedFile {
    /// File format version (21 or 22)
    pub version: u32,
    /// Unity version string
    pub unity_version: String,
    /// Build target platform
    pub target_platform: u32,
    /// Whether type trees are stored; must be false when types are present
    pub enable_type_tree: bool,
    /// Type table
    pub types: Vec<SerializedType>,
    /// Object table
    pub objects: Vec<ObjectInfo>,
    /// Script type identifiers
    pub script_types: Vec<LocalSerializedObjectIdentifier>,
    /// External file references, addressed by file ID minus one
    pub externals: Vec<FileIdentifier>,
    /// Types of managed reference fields
    pub ref_types: Vec<SerializedType>,
    /// User information string
    pub user_information: String,
}

impl SerializedFile {
    /// Empty file of the given format version
    pub fn new(version: u32) -> Result<Self> {
        check_version(version)?;
        Ok(Self {
            version,
            unity_version: "5.x.x".to_string(),
            target_platform: 0,
            enable_type_tree: false,
            types: Vec::new(),
            objects: Vec::new(),
            script_types: Vec::new(),
            externals: Vec::new(),
            ref_types: Vec::new(),
            user_information: String::new(),
        })
    }

    /// Parse a SerializedFile occupying the whole stream
    pub fn from_stream(stream: &Stream) -> Result<Self> {
        SerializedFileParser::parse(stream)
    }

    /// Add a type and return its index in the type table
    pub fn add_type(&mut self, serialized_type: SerializedType) -> i32 {
        self.types.push(serialized_type);
        (self.types.len() - 1) as i32
    }

    /// Index of the first native type with this class ID
    pub fn find_type(&self, class_id: i32) -> Option<i32> {
        self.types
            .iter()
            .position(|ty| ty.class_id == class_id && !ty.is_script_type())
            .map(|index| index as i32)
    }

    pub fn add_object(&mut self, path_id: i64, type_id: i32, data: Stream) {
        self.objects.push(ObjectInfo::new(path_id, type_id, data));
    }

    /// Add an external reference and return the file ID that addresses it
    pub fn add_external(&mut self, external: FileIdentifier) -> i32 {
        self.externals.push(external);
        self.externals.len() as i32
    }

    pub fn find_object(&self, path_id: i64) -> Option<&ObjectInfo> {
        self.objects.iter().find(|object| object.path_id == path_id)
    }

    /// Type record of an object
    pub fn object_type(&self, object: &ObjectInfo) -> Result<&SerializedType> {
        usize::try_from(object.type_id)
            .ok()
            .and_then(|index| self.types.get(index))
            .ok_or_else(|| {
                BinaryError::invalid_format(format!(
                    "object {} uses type index {} of {}",
                    object.path_id,
                    object.type_id,
                    self.types.len()
                ))
            })
    }
}
