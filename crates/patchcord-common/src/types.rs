//! Small vector and color aggregates common to game formats.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{Endian, Primitive};

macro_rules! float_aggregate {
    (@count $head:ident $($tail:ident)*) => { 1 + float_aggregate!(@count $($tail)*) };
    (@count) => { 0 };
    ($(#[$meta:meta])* $name:ident { $($field:ident),+ }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Default)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name {
            $(pub $field: f32,)+
        }

        impl $name {
            pub const fn new($($field: f32),+) -> Self {
                Self { $($field),+ }
            }
        }

        impl Primitive for $name {
            const SIZE: usize = float_aggregate!(@count $($field)+) * 4;

            fn decode(bytes: &[u8], endian: Endian) -> Self {
                let mut chunks = bytes.chunks_exact(4);
                Self {
                    $($field: chunks.next().map(|c| f32::decode(c, endian)).unwrap_or_default(),)+
                }
            }

            fn encode(self, out: &mut [u8], endian: Endian) {
                let mut chunks = out.chunks_exact_mut(4);
                $(
                    if let Some(chunk) = chunks.next() {
                        self.$field.encode(chunk, endian);
                    }
                )+
            }
        }
    };
}

float_aggregate! {
    /// Two-component float vector.
    Vec2 { x, y }
}

float_aggregate! {
    /// Three-component float vector.
    Vec3 { x, y, z }
}

float_aggregate! {
    /// Four-component float vector.
    Vec4 { x, y, z, w }
}

float_aggregate! {
    /// Rotation quaternion, stored `x, y, z, w`.
    Quat { x, y, z, w }
}

float_aggregate! {
    /// Floating point RGBA color.
    Color { r, g, b, a }
}

/// 8-bit-per-channel RGBA color. Byte order does not apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(C)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

impl Primitive for Rgba8 {
    const SIZE: usize = 4;

    fn decode(bytes: &[u8], _endian: Endian) -> Self {
        Self::new(bytes[0], bytes[1], bytes[2], bytes[3])
    }

    fn encode(self, out: &mut [u8], _endian: Endian) {
        out[..4].copy_from_slice(self.as_bytes());
    }
}
