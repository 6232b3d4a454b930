//! Per byte order function tables
//!
//! A stream picks one table when its byte order is set and calls through it
//! for every multi-byte scalar.

use byteorder::{BigEndian, ByteOrder as _, LittleEndian};
use serde::{Deserialize, Serialize};

/// Byte order for reading and writing binary data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ByteOrder {
    /// Big endian (most significant byte first)
    Big,
    /// Little endian (least significant byte first)
    #[default]
    Little,
}

impl ByteOrder {
    pub(crate) fn ops(self) -> &'static ByteOrderOps {
        match self {
            ByteOrder::Big => &BIG_ENDIAN,
            ByteOrder::Little => &LITTLE_ENDIAN,
        }
    }
}

pub(crate) struct ByteOrderOps {
    pub read_u16: fn(&[u8]) -> u16,
    pub read_u32: fn(&[u8]) -> u32,
    pub read_u64: fn(&[u8]) -> u64,
    pub write_u16: fn(&mut [u8], u16),
    pub write_u32: fn(&mut [u8], u32),
    pub write_u64: fn(&mut [u8], u64),
}

static BIG_ENDIAN: ByteOrderOps = ByteOrderOps {
    read_u16: BigEndian::read_u16,
    read_u32: BigEndian::read_u32,
    read_u64: BigEndian::read_u64,
    write_u16: BigEndian::write_u16,
    write_u32: BigEndian::write_u32,
    write_u64: BigEndian::write_u64,
};

static LITTLE_ENDIAN: ByteOrderOps = ByteOrderOps {
    read_u16: LittleEndian::read_u16,
    read_u32: LittleEndian::read_u32,
    read_u64: LittleEndian::read_u64,
    write_u16: LittleEndian::write_u16,
    write_u32: LittleEndian::write_u32,
    write_u64: LittleEndian::write_u64,
};
