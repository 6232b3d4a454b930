//! Field serializer for Unity object data
//!
//! Every content type implements [`Transfer`] once, visiting its fields in
//! serialized order. The same routine then decodes, encodes or links the
//! object depending on the [`Direction`] the [`TypeSerializer`] runs in.
//!
//! Layout rules:
//! - sequences and strings carry an `i32` length prefix and are followed by
//!   a four byte alignment (neither applies while linking)
//! - a field visited with [`ALIGN_BYTES`] is followed by a four byte alignment
//! - pointers and streamed data references are bound only while linking

mod direction;
mod primitives;

pub use direction::{Decode, Direction, DirectionKind, Encode, Link};
pub use primitives::Scalar;

use crate::error::{BinaryError, Result};
use crate::object::{ObjectHandle, ObjectPointer, StreamingInfo, UnityClass};
use crate::stream::Stream;
use std::marker::PhantomData;
use tracing::debug;
use unity_graft_core::is_derived_from;

/// Field flag requesting alignment after the field
pub const ALIGN_BYTES: u32 = 0x4000;

/// A type whose fields can be visited by the serializer
pub trait Transfer {
    fn transfer<D: Direction>(&mut self, serializer: &mut TypeSerializer<'_, D>) -> Result<()>;

    /// Visit a vector of `Self`; overridden by types stored in bulk
    fn transfer_vec<D: Direction>(
        items: &mut Vec<Self>,
        serializer: &mut TypeSerializer<'_, D>,
    ) -> Result<()>
    where
        Self: Sized + Default,
    {
        if let Some(length) = serializer.sequence_length(items.len())? {
            items.clear();
            items.resize_with(length, Self::default);
        }
        for item in items.iter_mut() {
            item.transfer(serializer)?;
        }
        serializer.align()
    }
}

/// Object found by an [`AssetLinker`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedObject {
    pub handle: ObjectHandle,
    pub class_id: i32,
}

/// Resolves identifiers while linking
pub trait AssetLinker {
    /// Find the live object a `(file_id, path_id)` pair refers to.
    ///
    /// Missing objects are `Ok(None)`; a file ID outside the external table
    /// is an error.
    fn resolve_pointer(&mut self, file_id: i32, path_id: i64) -> Result<Option<ResolvedObject>>;

    /// Look up a streamed resource file by name
    fn resolve_streamed_data_file(&mut self, name: &str) -> Option<Stream>;
}

/// Drives one pass over an object's fields
pub struct TypeSerializer<'a, D: Direction> {
    stream: Stream,
    linker: Option<&'a mut dyn AssetLinker>,
    direction: PhantomData<D>,
}

impl<'a, D: Direction> TypeSerializer<'a, D> {
    fn with_parts(stream: Stream, linker: Option<&'a mut dyn AssetLinker>) -> Self {
        Self {
            stream,
            linker,
            direction: PhantomData,
        }
    }

    pub fn kind(&self) -> DirectionKind {
        D::KIND
    }

    /// Visit one field, aligning afterwards when `flags` has [`ALIGN_BYTES`]
    pub fn field<T: Transfer>(&mut self, value: &mut T, flags: u32) -> Result<()> {
        value.transfer(self)?;
        if flags & ALIGN_BYTES != 0 {
            self.align()?;
        }
        Ok(())
    }

    pub fn scalar<T: Scalar>(&mut self, value: &mut T) -> Result<()> {
        D::scalar(&mut self.stream, value)
    }

    pub fn sequence_length(&mut self, length: usize) -> Result<Option<usize>> {
        D::sequence_length(&mut self.stream, length)
    }

    pub fn raw_bytes(&mut self, bytes: &mut [u8]) -> Result<()> {
        D::raw_bytes(&mut self.stream, bytes)
    }

    pub fn align(&mut self) -> Result<()> {
        D::align(&mut self.stream)
    }

    /// Resolve an object pointer; does nothing outside the link pass.
    ///
    /// A target of the wrong class leaves the pointer unbound.
    pub fn bind_pointer<T: UnityClass>(&mut self, pointer: &mut ObjectPointer<T>) -> Result<()> {
        if D::KIND != DirectionKind::Link {
            return Ok(());
        }
        let linker = self
            .linker
            .as_mut()
            .ok_or_else(|| BinaryError::internal("link pass without an asset linker"))?;

        let resolved = linker.resolve_pointer(pointer.file_id, pointer.path_id)?;
        let target = match resolved {
            Some(object) if is_derived_from(object.class_id, T::CLASS_ID) => Some(object.handle),
            Some(object) => {
                debug!(
                    file_id = pointer.file_id,
                    path_id = pointer.path_id,
                    class_id = object.class_id,
                    expected = T::CLASS_ID,
                    "pointer target has an incompatible class"
                );
                None
            }
            None => None,
        };
        pointer.bind(target);
        Ok(())
    }

    /// Resolve streamed data; an empty path means the data is inline
    pub fn bind_streamed_data(&mut self, info: &mut StreamingInfo) -> Result<()> {
        if D::KIND != DirectionKind::Link {
            return Ok(());
        }
        if info.path.is_empty() {
            info.bind(None);
            return Ok(());
        }
        let linker = self
            .linker
            .as_mut()
            .ok_or_else(|| BinaryError::internal("link pass without an asset linker"))?;

        let view = match linker.resolve_streamed_data_file(&info.path) {
            Some(file) => Some(file.create_view(info.offset as usize, info.size as usize)?),
            None => None,
        };
        info.bind(view);
        Ok(())
    }
}

/// Decode an object that must span the whole stream
pub fn decode_object<T: Transfer + Default>(data: &Stream, flags: u32) -> Result<T> {
    let mut object = T::default();
    let mut serializer = TypeSerializer::<Decode>::with_parts(data.create_view(0, data.len())?, None);
    serializer.field(&mut object, flags)?;
    let stream = serializer.stream;
    if stream.remaining() != 0 {
        return Err(BinaryError::invalid_format(format!(
            "{} trailing bytes after object of {} bytes",
            stream.remaining(),
            stream.len()
        )));
    }
    Ok(object)
}

/// Encode an object into a new little-endian stream
pub fn encode_object<T: Transfer>(object: &mut T, flags: u32) -> Result<Stream> {
    let mut serializer = TypeSerializer::<Encode>::with_parts(Stream::new(), None);
    serializer.field(object, flags)?;
    let mut stream = serializer.stream;
    stream.set_position(0)?;
    Ok(stream)
}

/// Run the link pass over an object
pub fn link_object<T: Transfer>(
    object: &mut T,
    linker: &mut dyn AssetLinker,
    flags: u32,
) -> Result<()> {
    TypeSerializer::<Link>::with_parts(Stream::new(), Some(linker)).field(object, flags)
}
