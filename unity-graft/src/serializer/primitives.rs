//! [`Transfer`] for scalars, strings, sequences, arrays and pairs

use super::{Direction, DirectionKind, Transfer, TypeSerializer};
use crate::error::{BinaryError, Result};
use crate::stream::Stream;

/// Fixed-size value read and written through the stream's byte order
pub trait Scalar: Copy + Default {
    fn read(stream: &mut Stream) -> Result<Self>;
    fn write(self, stream: &mut Stream) -> Result<()>;
}

macro_rules! scalar {
    ($($ty:ty => $read:ident, $write:ident;)*) => {
        $(
            impl Scalar for $ty {
                fn read(stream: &mut Stream) -> Result<Self> {
                    stream.$read()
                }

                fn write(self, stream: &mut Stream) -> Result<()> {
                    stream.$write(self)
                }
            }
        )*
    };
}

scalar! {
    u8 => read_u8, write_u8;
    i8 => read_i8, write_i8;
    u16 => read_u16, write_u16;
    i16 => read_i16, write_i16;
    u32 => read_u32, write_u32;
    i32 => read_i32, write_i32;
    u64 => read_u64, write_u64;
    i64 => read_i64, write_i64;
    f32 => read_f32, write_f32;
    f64 => read_f64, write_f64;
    bool => read_bool, write_bool;
}

macro_rules! transfer_scalar {
    ($($ty:ty),*) => {
        $(
            impl Transfer for $ty {
                fn transfer<D: Direction>(&mut self, serializer: &mut TypeSerializer<'_, D>) -> Result<()> {
                    serializer.scalar(self)
                }
            }
        )*
    };
}

transfer_scalar!(i8, u16, i16, u32, i32, u64, i64, f32, f64);

impl Transfer for u8 {
    fn transfer<D: Direction>(&mut self, serializer: &mut TypeSerializer<'_, D>) -> Result<()> {
        serializer.scalar(self)
    }

    /// Byte vectors are copied as one blob
    fn transfer_vec<D: Direction>(
        items: &mut Vec<Self>,
        serializer: &mut TypeSerializer<'_, D>,
    ) -> Result<()> {
        if let Some(length) = serializer.sequence_length(items.len())? {
            *items = vec![0; length];
        }
        serializer.raw_bytes(items)?;
        serializer.align()
    }
}

impl Transfer for bool {
    fn transfer<D: Direction>(&mut self, serializer: &mut TypeSerializer<'_, D>) -> Result<()> {
        serializer.scalar(self)
    }

    /// One byte per element, copied in bulk.
    ///
    /// Player data does not pack boolean sequences into bits; each element
    /// is a whole byte that must be 0 or 1 on decode.
    fn transfer_vec<D: Direction>(
        items: &mut Vec<Self>,
        serializer: &mut TypeSerializer<'_, D>,
    ) -> Result<()> {
        let mut bytes: Vec<u8> = items.iter().map(|&value| value as u8).collect();
        u8::transfer_vec(&mut bytes, serializer)?;
        if D::KIND == DirectionKind::Decode {
            *items = bytes
                .into_iter()
                .map(|byte| match byte {
                    0 => Ok(false),
                    1 => Ok(true),
                    other => Err(BinaryError::invalid_data(format!(
                        "invalid boolean value {}",
                        other
                    ))),
                })
                .collect::<Result<_>>()?;
        }
        Ok(())
    }
}

/// Strings share the byte vector layout: length, bytes, alignment
impl Transfer for String {
    fn transfer<D: Direction>(&mut self, serializer: &mut TypeSerializer<'_, D>) -> Result<()> {
        if D::KIND == DirectionKind::Link {
            return Ok(());
        }
        let mut bytes = std::mem::take(self).into_bytes();
        u8::transfer_vec(&mut bytes, serializer)?;
        *self = String::from_utf8(bytes)?;
        Ok(())
    }
}

impl<T: Transfer + Default> Transfer for Vec<T> {
    fn transfer<D: Direction>(&mut self, serializer: &mut TypeSerializer<'_, D>) -> Result<()> {
        T::transfer_vec(self, serializer)
    }
}

impl<T: Transfer, const N: usize> Transfer for [T; N] {
    fn transfer<D: Direction>(&mut self, serializer: &mut TypeSerializer<'_, D>) -> Result<()> {
        for item in self.iter_mut() {
            item.transfer(serializer)?;
        }
        Ok(())
    }
}

impl<A: Transfer, B: Transfer> Transfer for (A, B) {
    fn transfer<D: Direction>(&mut self, serializer: &mut TypeSerializer<'_, D>) -> Result<()> {
        self.0.transfer(serializer)?;
        self.1.transfer(serializer)
    }
}
