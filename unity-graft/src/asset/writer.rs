//! SerializedFile writer

use super::header::{SerializedFileHeader, WIDE_OFFSETS_VERSION, check_version};
use super::parser::SerializedFile;
use super::types::SerializedType;
use crate::error::{BinaryError, Result};
use crate::stream::{ByteOrder, Stream, align_up};
use tracing::debug;

/// The data area never starts before this offset
pub const MIN_DATA_OFFSET: usize = 4096;
/// Object data is laid out on this boundary
pub const OBJECT_ALIGNMENT: usize = 16;

impl SerializedFile {
    /// Encode the file into a new big-endian stream
    pub fn serialize(&self) -> Result<Stream> {
        check_version(self.version)?;
        if self.enable_type_tree && !(self.types.is_empty() && self.ref_types.is_empty()) {
            return Err(BinaryError::unsupported("writing type trees"));
        }

        let offsets = self.object_offsets()?;
        let metadata = self.write_metadata(&offsets)?;

        let mut header = SerializedFileHeader::new(self.version);
        header.metadata_size = u32::try_from(metadata.len())
            .map_err(|_| BinaryError::invalid_data("metadata section is too large"))?;

        let mut output = Stream::new().with_byte_order(ByteOrder::Big);
        header.write(&mut output)?;
        output.write_data(metadata.data())?;

        let metadata_end = output.position();
        let data_offset = if metadata_end < MIN_DATA_OFFSET {
            MIN_DATA_OFFSET
        } else {
            align_up(metadata_end, OBJECT_ALIGNMENT)
        };
        output.set_position(data_offset)?;
        for (object, offset) in self.objects.iter().zip(&offsets) {
            output.set_position(data_offset + offset)?;
            output.write_data(object.data.data())?;
        }

        // Both values depend on everything written above
        header.data_offset = data_offset as u64;
        header.file_size = output.len() as u64;
        output.set_position(0)?;
        header.write(&mut output)?;
        output.set_position(0)?;

        debug!(
            version = self.version,
            objects = self.objects.len(),
            data_offset,
            file_size = header.file_size,
            "SerializedFile serialized"
        );
        Ok(output)
    }

    /// Offsets of every object relative to the data area
    fn object_offsets(&self) -> Result<Vec<usize>> {
        let mut offsets = Vec::with_capacity(self.objects.len());
        let mut cursor = 0usize;
        for object in &self.objects {
            if self.version < WIDE_OFFSETS_VERSION && u32::try_from(cursor).is_err() {
                return Err(BinaryError::invalid_data(format!(
                    "object {} starts at {}, beyond the reach of version {} offsets",
                    object.path_id, cursor, self.version
                )));
            }
            u32::try_from(object.byte_size()).map_err(|_| {
                BinaryError::invalid_data(format!("object {} is too large", object.path_id))
            })?;
            offsets.push(cursor);
            cursor = align_up(cursor + object.byte_size(), OBJECT_ALIGNMENT);
        }
        Ok(offsets)
    }

    fn write_metadata(&self, offsets: &[usize]) -> Result<Stream> {
        let mut metadata = Stream::new().with_byte_order(ByteOrder::Little);
        metadata.write_cstring(&self.unity_version)?;
        metadata.write_u32(self.target_platform)?;
        metadata.write_bool(self.enable_type_tree)?;

        write_types(&mut metadata, &self.types, false)?;

        metadata.write_i32(count(self.objects.len())?)?;
        for (object, &offset) in self.objects.iter().zip(offsets) {
            metadata.align_position(4)?;
            metadata.write_i64(object.path_id)?;
            if self.version >= WIDE_OFFSETS_VERSION {
                metadata.write_u64(offset as u64)?;
            } else {
                metadata.write_u32(offset as u32)?;
            }
            metadata.write_u32(object.byte_size() as u32)?;
            metadata.write_i32(object.type_id)?;
        }

        metadata.write_i32(count(self.script_types.len())?)?;
        for script_type in &self.script_types {
            script_type.write(&mut metadata)?;
        }

        metadata.write_i32(count(self.externals.len())?)?;
        for external in &self.externals {
            external.write(&mut metadata)?;
        }

        write_types(&mut metadata, &self.ref_types, true)?;
        metadata.write_cstring(&self.user_information)?;
        Ok(metadata)
    }
}

fn write_types(metadata: &mut Stream, types: &[SerializedType], is_ref_type: bool) -> Result<()> {
    metadata.write_i32(count(types.len())?)?;
    for serialized_type in types {
        serialized_type.write(metadata, is_ref_type)?;
    }
    Ok(())
}

fn count(length: usize) -> Result<i32> {
    i32::try_from(length).map_err(|_| BinaryError::invalid_data(format!("{} entries is too many", length)))
}
