//! Fixed-size values that can be encoded in either byte order.

use std::fmt::Debug;

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::Endian;

/// A fixed-size value with an endian-aware binary representation.
///
/// Implemented for the integer and float primitives, `bool`, and the small
/// vector and color aggregates in [`crate::types`]. Every typed accessor on
/// the cursors goes through this trait, which is how a single code path
/// serves both byte orders.
pub trait Primitive: Copy + PartialEq + Debug {
    /// Encoded size in bytes.
    const SIZE: usize;

    /// Decode from exactly `Self::SIZE` bytes.
    fn decode(bytes: &[u8], endian: Endian) -> Self;

    /// Encode into exactly `Self::SIZE` bytes.
    fn encode(self, out: &mut [u8], endian: Endian);
}

macro_rules! impl_primitive {
    ($($ty:ty => $read:ident, $write:ident;)*) => {$(
        impl Primitive for $ty {
            const SIZE: usize = std::mem::size_of::<$ty>();

            #[inline]
            fn decode(bytes: &[u8], endian: Endian) -> Self {
                match endian {
                    Endian::Little => LittleEndian::$read(bytes),
                    Endian::Big => BigEndian::$read(bytes),
                }
            }

            #[inline]
            fn encode(self, out: &mut [u8], endian: Endian) {
                match endian {
                    Endian::Little => LittleEndian::$write(out, self),
                    Endian::Big => BigEndian::$write(out, self),
                }
            }
        }
    )*};
}

impl_primitive! {
    u16 => read_u16, write_u16;
    i16 => read_i16, write_i16;
    u32 => read_u32, write_u32;
    i32 => read_i32, write_i32;
    u64 => read_u64, write_u64;
    i64 => read_i64, write_i64;
    f32 => read_f32, write_f32;
    f64 => read_f64, write_f64;
}

impl Primitive for u8 {
    const SIZE: usize = 1;

    #[inline]
    fn decode(bytes: &[u8], _endian: Endian) -> Self {
        bytes[0]
    }

    #[inline]
    fn encode(self, out: &mut [u8], _endian: Endian) {
        out[0] = self;
    }
}

impl Primitive for i8 {
    const SIZE: usize = 1;

    #[inline]
    fn decode(bytes: &[u8], _endian: Endian) -> Self {
        bytes[0] as i8
    }

    #[inline]
    fn encode(self, out: &mut [u8], _endian: Endian) {
        out[0] = self as u8;
    }
}

/// Any non-zero byte decodes as `true`; `true` encodes as `1`.
impl Primitive for bool {
    const SIZE: usize = 1;

    #[inline]
    fn decode(bytes: &[u8], _endian: Endian) -> Self {
        bytes[0] != 0
    }

    #[inline]
    fn encode(self, out: &mut [u8], _endian: Endian) {
        out[0] = self as u8;
    }
}

/// Encode a value into a freshly allocated buffer.
pub fn to_bytes<T: Primitive>(value: T, endian: Endian) -> Vec<u8> {
    let mut out = vec![0u8; T::SIZE];
    value.encode(&mut out, endian);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u32_byte_order() {
        assert_eq!(to_bytes(0x0102_0304u32, Endian::Big), [1, 2, 3, 4]);
        assert_eq!(to_bytes(0x0102_0304u32, Endian::Little), [4, 3, 2, 1]);
        assert_eq!(u32::decode(&[1, 2, 3, 4], Endian::Big), 0x0102_0304);
    }

    #[test]
    fn test_signed_twos_complement() {
        assert_eq!(to_bytes(-2i16, Endian::Little), [0xFE, 0xFF]);
        assert_eq!(i8::decode(&[0xFF], Endian::Big), -1);
        assert_eq!(i64::decode(&[0xFF; 8], Endian::Little), -1);
    }

    #[test]
    fn test_float_ieee754() {
        assert_eq!(to_bytes(1.0f32, Endian::Little), [0x00, 0x00, 0x80, 0x3F]);
        assert_eq!(f64::decode(&[0x3F, 0xF0, 0, 0, 0, 0, 0, 0], Endian::Big), 1.0);
    }

    #[test]
    fn test_bool() {
        assert!(bool::decode(&[7], Endian::Little));
        assert!(!bool::decode(&[0], Endian::Little));
        assert_eq!(to_bytes(true, Endian::Big), [1]);
    }
}
