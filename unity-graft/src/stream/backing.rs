//! Backing stores for streams
//!
//! A backing buffer owns the bytes; streams hold it behind an `Arc` and only
//! ever see an offset/length window of it.

use crate::error::{BinaryError, Result};
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

/// Randomly addressable byte region shared between streams
pub trait BackingBuffer: Send + Sync {
    /// All bytes of the buffer
    fn data(&self) -> &[u8];

    /// Mutable access, if the buffer supports writes
    fn data_mut(&mut self) -> Result<&mut [u8]>;

    /// Grow or shrink the buffer, zero-filling new bytes
    fn resize(&mut self, len: usize) -> Result<()>;

    fn len(&self) -> usize {
        self.data().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Owned, growable in-memory buffer
#[derive(Debug, Default, Clone)]
pub struct InMemoryBuffer {
    data: Vec<u8>,
}

impl InMemoryBuffer {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

impl BackingBuffer for InMemoryBuffer {
    fn data(&self) -> &[u8] {
        &self.data
    }

    fn data_mut(&mut self) -> Result<&mut [u8]> {
        Ok(&mut self.data)
    }

    fn resize(&mut self, len: usize) -> Result<()> {
        self.data.resize(len, 0);
        Ok(())
    }
}

/// Read-only memory-mapped file
pub struct MappedBuffer {
    map: Mmap,
}

impl MappedBuffer {
    /// Map the whole file read-only.
    ///
    /// The file must not be modified by anyone while the mapping is alive.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        // SAFETY: the mapping is read-only and callers promise the file is
        // not truncated or rewritten while it is mapped.
        let map = unsafe { Mmap::map(&file)? };
        Ok(Self { map })
    }
}

impl std::fmt::Debug for MappedBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedBuffer")
            .field("len", &self.map.len())
            .finish()
    }
}

impl BackingBuffer for MappedBuffer {
    fn data(&self) -> &[u8] {
        &self.map
    }

    fn data_mut(&mut self) -> Result<&mut [u8]> {
        Err(BinaryError::read_only("memory-mapped files cannot be written"))
    }

    fn resize(&mut self, len: usize) -> Result<()> {
        Err(BinaryError::read_only(format!(
            "memory-mapped files cannot be resized (requested {} bytes, mapped {})",
            len,
            self.map.len()
        )))
    }
}
