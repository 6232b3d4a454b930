//! Shared, byte-order aware binary streams
//!
//! A [`Stream`] is a cursor over an offset/length window of a reference
//! counted [`BackingBuffer`]. Views created with [`Stream::create_view`] share
//! the backing store without copying. Writes are only possible through the
//! stream that owns an in-memory backing, and only while it holds the sole
//! reference to it. Views are always read-only.

mod backing;
mod byte_order;

pub use backing::{BackingBuffer, InMemoryBuffer, MappedBuffer};
pub use byte_order::ByteOrder;

use crate::error::{BinaryError, Result};
use byte_order::ByteOrderOps;
use std::path::Path;
use std::sync::Arc;

/// Cursor over a shared byte region
#[derive(Clone)]
pub struct Stream {
    backing: Arc<dyn BackingBuffer>,
    offset: usize,
    length: usize,
    position: usize,
    byte_order: ByteOrder,
    ops: &'static ByteOrderOps,
    /// Created by `create_view`; never writable even when unshared
    view: bool,
}

impl Stream {
    /// Create an empty, writable, little-endian stream
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    /// Take ownership of a byte vector
    pub fn from_vec(data: Vec<u8>) -> Self {
        Self::from_backing(Arc::new(InMemoryBuffer::new(data)))
    }

    /// Wrap a whole backing buffer
    pub fn from_backing(backing: Arc<dyn BackingBuffer>) -> Self {
        let length = backing.len();
        Self {
            backing,
            offset: 0,
            length,
            position: 0,
            byte_order: ByteOrder::Little,
            ops: ByteOrder::Little.ops(),
            view: false,
        }
    }

    /// Memory-map a file read-only
    pub fn map_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if std::fs::metadata(path)?.len() == 0 {
            // Zero-length mappings are rejected by the OS
            return Ok(Self::new());
        }
        Ok(Self::from_backing(Arc::new(MappedBuffer::open(path)?)))
    }

    /// Builder-style byte order selection
    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.set_byte_order(byte_order);
        self
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn set_byte_order(&mut self, byte_order: ByteOrder) {
        self.byte_order = byte_order;
        self.ops = byte_order.ops();
    }

    /// Current position relative to the start of the view
    pub fn position(&self) -> usize {
        self.position
    }

    /// Move the cursor; positions past the end grow the buffer
    pub fn set_position(&mut self, position: usize) -> Result<()> {
        if position > self.length {
            self.resize(position)?;
        }
        self.position = position;
        Ok(())
    }

    /// Advance the cursor to the next multiple of `alignment`
    pub fn align_position(&mut self, alignment: usize) -> Result<()> {
        let aligned = align_up(self.position, alignment);
        if aligned != self.position {
            self.set_position(aligned)?;
        }
        Ok(())
    }

    /// Skip padding up to the next multiple of `alignment` while reading.
    ///
    /// Unlike [`Stream::align_position`] this never grows the stream; padding
    /// past the end is a [`BinaryError::NotEnoughData`] error.
    pub fn skip_alignment(&mut self, alignment: usize) -> Result<()> {
        let aligned = align_up(self.position, alignment);
        if aligned > self.length {
            return Err(BinaryError::not_enough_data(
                aligned - self.position,
                self.remaining(),
            ));
        }
        self.position = aligned;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Bytes left between the cursor and the end of the view
    pub fn remaining(&self) -> usize {
        self.length.saturating_sub(self.position)
    }

    /// Whole view contents, independent of the cursor
    pub fn data(&self) -> &[u8] {
        &self.backing.data()[self.offset..self.offset + self.length]
    }

    /// Copy of the view contents
    pub fn to_vec(&self) -> Vec<u8> {
        self.data().to_vec()
    }

    /// Zero-copy sub-view of `length` bytes starting at `offset`.
    ///
    /// The view starts with its cursor at zero and inherits the byte order.
    pub fn create_view(&self, offset: usize, length: usize) -> Result<Stream> {
        let end = offset.checked_add(length).ok_or_else(|| {
            BinaryError::out_of_range(format!("view {}+{} overflows", offset, length))
        })?;
        if offset > self.length || end > self.length {
            return Err(BinaryError::out_of_range(format!(
                "view {}..{} exceeds stream length {}",
                offset, end, self.length
            )));
        }
        Ok(Stream {
            backing: Arc::clone(&self.backing),
            offset: self.offset + offset,
            length,
            position: 0,
            byte_order: self.byte_order,
            ops: self.ops,
            view: true,
        })
    }

    /// Sub-view from `offset` to the end of this view
    pub fn create_view_to_end(&self, offset: usize) -> Result<Stream> {
        if offset > self.length {
            return Err(BinaryError::out_of_range(format!(
                "view offset {} exceeds stream length {}",
                offset, self.length
            )));
        }
        self.create_view(offset, self.length - offset)
    }

    /// Take a view of the next `length` bytes and advance past them
    pub fn read_view(&mut self, length: usize) -> Result<Stream> {
        self.ensure_available(length)?;
        let view = self.create_view(self.position, length)?;
        self.position += length;
        Ok(view)
    }

    /// Fill `buf` from the cursor
    pub fn read_data(&mut self, buf: &mut [u8]) -> Result<()> {
        self.ensure_available(buf.len())?;
        let start = self.offset + self.position;
        buf.copy_from_slice(&self.backing.data()[start..start + buf.len()]);
        self.position += buf.len();
        Ok(())
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>> {
        self.ensure_available(count)?;
        let mut buf = vec![0u8; count];
        self.read_data(&mut buf)?;
        Ok(buf)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.read_data(&mut buf)?;
        Ok(buf)
    }

    /// Write at the cursor, growing the buffer as needed
    pub fn write_data(&mut self, data: &[u8]) -> Result<()> {
        let end = self.position + data.len();
        if end > self.length {
            self.resize(end)?;
        }
        let start = self.offset + self.position;
        let buffer = self.backing_mut()?.data_mut()?;
        buffer[start..start + data.len()].copy_from_slice(data);
        self.position = end;
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    /// Read a boolean stored as one byte; only 0 and 1 are accepted
    pub fn read_bool(&mut self) -> Result<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(BinaryError::invalid_data(format!(
                "invalid boolean value {}",
                other
            ))),
        }
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.read_array::<2>()?;
        Ok((self.ops.read_u16)(&bytes))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(self.read_u16()? as i16)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.read_array::<4>()?;
        Ok((self.ops.read_u32)(&bytes))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(self.read_u32()? as i32)
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        let bytes = self.read_array::<8>()?;
        Ok((self.ops.read_u64)(&bytes))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(self.read_u64()? as i64)
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_bits(self.read_u64()?))
    }

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.write_data(&[value])
    }

    pub fn write_i8(&mut self, value: i8) -> Result<()> {
        self.write_u8(value as u8)
    }

    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_u8(value as u8)
    }

    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        let mut bytes = [0u8; 2];
        (self.ops.write_u16)(&mut bytes, value);
        self.write_data(&bytes)
    }

    pub fn write_i16(&mut self, value: i16) -> Result<()> {
        self.write_u16(value as u16)
    }

    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        let mut bytes = [0u8; 4];
        (self.ops.write_u32)(&mut bytes, value);
        self.write_data(&bytes)
    }

    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.write_u32(value as u32)
    }

    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        let mut bytes = [0u8; 8];
        (self.ops.write_u64)(&mut bytes, value);
        self.write_data(&bytes)
    }

    pub fn write_i64(&mut self, value: i64) -> Result<()> {
        self.write_u64(value as u64)
    }

    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        self.write_u32(value.to_bits())
    }

    pub fn write_f64(&mut self, value: f64) -> Result<()> {
        self.write_u64(value.to_bits())
    }

    /// Read a null-terminated string from the remaining bytes of the view
    pub fn read_cstring(&mut self) -> Result<String> {
        let remaining = &self.data()[self.position..];
        let terminator = remaining.iter().position(|&b| b == 0).ok_or_else(|| {
            BinaryError::invalid_data(format!(
                "null terminator not found in the remaining {} bytes",
                remaining.len()
            ))
        })?;
        let value = std::str::from_utf8(&remaining[..terminator])?.to_string();
        self.position += terminator + 1;
        Ok(value)
    }

    pub fn write_cstring(&mut self, value: &str) -> Result<()> {
        if value.as_bytes().contains(&0) {
            return Err(BinaryError::invalid_data(format!(
                "string {:?} contains a null byte",
                value
            )));
        }
        self.write_data(value.as_bytes())?;
        self.write_u8(0)
    }

    fn ensure_available(&self, count: usize) -> Result<()> {
        if self.remaining() < count {
            return Err(BinaryError::not_enough_data(count, self.remaining()));
        }
        Ok(())
    }

    fn backing_mut(&mut self) -> Result<&mut (dyn BackingBuffer + 'static)> {
        if self.view {
            return Err(BinaryError::read_only(format!(
                "view {}+{} cannot be written or grown",
                self.offset, self.length
            )));
        }
        Arc::get_mut(&mut self.backing).ok_or_else(|| {
            BinaryError::read_only("the buffer is shared with another stream or view")
        })
    }

    fn resize(&mut self, length: usize) -> Result<()> {
        let required = self.offset + length;
        let backing = self.backing_mut()?;
        if backing.len() < required {
            backing.resize(required)?;
        }
        self.length = length;
        Ok(())
    }
}

impl Default for Stream {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stream")
            .field("offset", &self.offset)
            .field("length", &self.length)
            .field("position", &self.position)
            .field("byte_order", &self.byte_order)
            .finish()
    }
}

impl From<Vec<u8>> for Stream {
    fn from(data: Vec<u8>) -> Self {
        Self::from_vec(data)
    }
}

/// Round `value` up to a multiple of `alignment`
pub fn align_up(value: usize, alignment: usize) -> usize {
    if alignment <= 1 {
        return value;
    }
    value.div_ceil(alignment) * alignment
}
