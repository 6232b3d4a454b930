//! Serialization directions
//!
//! Each direction is a zero-sized type whose associated functions make up
//! the operation table of one pass. The serializer is generic over the
//! direction, so the table is fixed when a pass starts and never consulted
//! per field.

use super::primitives::Scalar;
use crate::error::{BinaryError, Result};
use crate::stream::Stream;

/// Which pass a serializer is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionKind {
    Decode,
    Encode,
    Link,
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Decode {}
    impl Sealed for super::Encode {}
    impl Sealed for super::Link {}
}

/// Operations of one serialization pass
pub trait Direction: sealed::Sealed + Sized {
    const KIND: DirectionKind;

    fn scalar<T: Scalar>(stream: &mut Stream, value: &mut T) -> Result<()>;

    /// Length prefix of a sequence; `Some(n)` when the caller must resize to `n`
    fn sequence_length(stream: &mut Stream, length: usize) -> Result<Option<usize>>;

    fn raw_bytes(stream: &mut Stream, bytes: &mut [u8]) -> Result<()>;

    /// Four byte alignment after sequences and aligned fields
    fn align(stream: &mut Stream) -> Result<()>;
}

/// Reads fields from object data
pub struct Decode;

/// Writes fields to a new stream
pub struct Encode;

/// Resolves pointers and streamed data; never touches the stream
pub struct Link;

impl Direction for Decode {
    const KIND: DirectionKind = DirectionKind::Decode;

    fn scalar<T: Scalar>(stream: &mut Stream, value: &mut T) -> Result<()> {
        *value = T::read(stream)?;
        Ok(())
    }

    fn sequence_length(stream: &mut Stream, _length: usize) -> Result<Option<usize>> {
        let length = stream.read_i32()?;
        let length = usize::try_from(length)
            .map_err(|_| BinaryError::invalid_data(format!("negative sequence length {}", length)))?;
        // Every element takes at least one byte
        if length > stream.remaining() {
            return Err(BinaryError::not_enough_data(length, stream.remaining()));
        }
        Ok(Some(length))
    }

    fn raw_bytes(stream: &mut Stream, bytes: &mut [u8]) -> Result<()> {
        stream.read_data(bytes)
    }

    fn align(stream: &mut Stream) -> Result<()> {
        stream.skip_alignment(4)
    }
}

impl Direction for Encode {
    const KIND: DirectionKind = DirectionKind::Encode;

    fn scalar<T: Scalar>(stream: &mut Stream, value: &mut T) -> Result<()> {
        value.write(stream)
    }

    fn sequence_length(stream: &mut Stream, length: usize) -> Result<Option<usize>> {
        let length = i32::try_from(length)
            .map_err(|_| BinaryError::invalid_data(format!("sequence of {} elements is too long", length)))?;
        stream.write_i32(length)?;
        Ok(None)
    }

    fn raw_bytes(stream: &mut Stream, bytes: &mut [u8]) -> Result<()> {
        stream.write_data(bytes)
    }

    fn align(stream: &mut Stream) -> Result<()> {
        stream.align_position(4)
    }
}

impl Direction for Link {
    const KIND: DirectionKind = DirectionKind::Link;

    fn scalar<T: Scalar>(_stream: &mut Stream, _value: &mut T) -> Result<()> {
        Ok(())
    }

    fn sequence_length(_stream: &mut Stream, _length: usize) -> Result<Option<usize>> {
        Ok(None)
    }

    fn raw_bytes(_stream: &mut Stream, _bytes: &mut [u8]) -> Result<()> {
        Ok(())
    }

    fn align(_stream: &mut Stream) -> Result<()> {
        Ok(())
    }
}
