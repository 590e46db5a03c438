//! Binary reader for parsing byte slices.
//!
//! This module provides [`BinaryReader`], a cursor-like type that reads
//! typed values from a byte slice without copying, in whichever byte order
//! and pointer width its [`Context`] currently says.

use zerocopy::FromBytes;

use crate::align::padding_for;
use crate::step::{Seekable, StepStack};
use crate::text::{self, Encoding};
use crate::types::{Color, Quat, Rgba8, Vec2, Vec3, Vec4};
use crate::{Context, Error, HasContext, PointerWidth, Primitive, Result};

/// A binary reader over a byte slice.
///
/// Sequential `read_*` calls advance the position; `get_*` and
/// [`peek_bytes`](Self::peek_bytes) read at an absolute offset and leave it
/// alone, which is what format sniffing relies on.
///
/// # Example
///
/// ```
/// use patchcord_common::{BinaryReader, HasContext};
///
/// let data = [0x01, 0x02, 0x03, 0x04, 0x01, 0x02, 0x03, 0x04];
/// let mut reader = BinaryReader::new(&data);
///
/// assert_eq!(reader.read_u32().unwrap(), 0x04030201);
/// reader.set_big_endian(true);
/// assert_eq!(reader.read_u32().unwrap(), 0x01020304);
/// assert!(reader.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    data: &'a [u8],
    position: usize,
    context: Context,
    steps: StepStack,
}

macro_rules! read_accessors {
    ($($ty:ty => $read:ident, $get:ident, $assert:ident;)*) => {$(
        #[doc = concat!("Read a `", stringify!($ty), "` and advance.")]
        #[inline]
        pub fn $read(&mut self) -> Result<$ty> {
            self.read::<$ty>()
        }

        #[doc = concat!("Read a `", stringify!($ty), "` at an absolute offset without moving.")]
        #[inline]
        pub fn $get(&self, offset: usize) -> Result<$ty> {
            self.get::<$ty>(offset)
        }

        #[doc = concat!("Read a `", stringify!($ty), "` that must equal one of `expected`.")]
        #[inline]
        pub fn $assert(&mut self, expected: &[$ty]) -> Result<$ty> {
            self.assert::<$ty>(expected)
        }
    )*};
}

impl<'a> BinaryReader<'a> {
    /// Create a new reader from a byte slice.
    #[inline]
    pub const fn new(data: &'a [u8]) -> Self {
        Self::with_context(data, Context::new())
    }

    /// Create a new reader starting at a specific position.
    #[inline]
    pub const fn new_at(data: &'a [u8], position: usize) -> Self {
        Self {
            data,
            position,
            context: Context::new(),
            steps: StepStack::new(),
        }
    }

    /// Create a new reader with the given byte order and pointer width.
    #[inline]
    pub const fn with_context(data: &'a [u8], context: Context) -> Self {
        Self {
            data,
            position: 0,
            context,
            steps: StepStack::new(),
        }
    }

    /// Get the current position in the buffer.
    #[inline]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Get the total length of the underlying buffer.
    #[inline]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    /// Get the number of bytes remaining to read.
    #[inline]
    pub const fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Check if there are no more bytes to read.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.position >= self.data.len()
    }

    /// The whole underlying buffer.
    #[inline]
    pub const fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Seek to an absolute position.
    #[inline]
    pub fn seek(&mut self, position: usize) {
        self.position = position;
    }

    /// Advance the position by `count` bytes, failing if that runs off the end.
    pub fn skip(&mut self, count: usize) -> Result<()> {
        if self.remaining() < count {
            return Err(self.eof(self.position, count));
        }
        self.position += count;
        Ok(())
    }

    /// Get the remaining bytes as a slice.
    #[inline]
    pub fn remaining_bytes(&self) -> &'a [u8] {
        &self.data[self.position.min(self.data.len())..]
    }

    /// Read `count` bytes at an absolute offset without moving.
    #[inline]
    pub fn peek_bytes(&self, offset: usize, count: usize) -> Result<&'a [u8]> {
        let available = self.data.len().saturating_sub(offset);
        if available < count || offset > self.data.len() {
            return Err(Error::UnexpectedEof {
                offset,
                needed: count,
                available,
            });
        }
        Ok(&self.data[offset..offset + count])
    }

    /// Read bytes and advance the position.
    #[inline]
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        let bytes = self.peek_bytes(self.position, count)?;
        self.position += count;
        Ok(bytes)
    }

    /// Read a value in the current byte order and advance.
    #[inline]
    pub fn read<T: Primitive>(&mut self) -> Result<T> {
        let value = self.get::<T>(self.position)?;
        self.position += T::SIZE;
        Ok(value)
    }

    /// Read a value at an absolute offset without moving.
    #[inline]
    pub fn get<T: Primitive>(&self, offset: usize) -> Result<T> {
        let bytes = self.peek_bytes(offset, T::SIZE)?;
        Ok(T::decode(bytes, self.context.endian))
    }

    /// Read a value that must be one of `expected`, returning the match.
    ///
    /// This is a membership test; the returned value tells the caller which
    /// candidate was found, which is how sub-variants are told apart.
    ///
    /// ```
    /// use patchcord_common::{BinaryReader, Error};
    ///
    /// let mut reader = BinaryReader::new(&[2, 4]);
    /// assert_eq!(reader.assert_u8(&[1, 2, 3]).unwrap(), 2);
    ///
    /// match reader.assert_u8(&[1, 2, 3]) {
    ///     Err(Error::Mismatch { expected, actual, offset }) => {
    ///         assert_eq!(expected, "[1, 2, 3]");
    ///         assert_eq!(actual, "4");
    ///         assert_eq!(offset, 1);
    ///     }
    ///     other => panic!("unexpected: {other:?}"),
    /// }
    /// ```
    pub fn assert<T: Primitive>(&mut self, expected: &[T]) -> Result<T> {
        let offset = self.position;
        let actual = self.read::<T>()?;
        if expected.contains(&actual) {
            Ok(actual)
        } else {
            Err(mismatch(offset, expected, actual))
        }
    }

    /// Read `count` consecutive values.
    pub fn read_array<T: Primitive>(&mut self, count: usize) -> Result<Vec<T>> {
        let total = count
            .checked_mul(T::SIZE)
            .ok_or_else(|| self.eof(self.position, usize::MAX))?;
        let bytes = self.read_bytes(total)?;
        let endian = self.context.endian;
        Ok(bytes
            .chunks_exact(T::SIZE.max(1))
            .map(|chunk| T::decode(chunk, endian))
            .collect())
    }

    read_accessors! {
        u8 => read_u8, get_u8, assert_u8;
        i8 => read_i8, get_i8, assert_i8;
        u16 => read_u16, get_u16, assert_u16;
        i16 => read_i16, get_i16, assert_i16;
        u32 => read_u32, get_u32, assert_u32;
        i32 => read_i32, get_i32, assert_i32;
        u64 => read_u64, get_u64, assert_u64;
        i64 => read_i64, get_i64, assert_i64;
        f32 => read_f32, get_f32, assert_f32;
        f64 => read_f64, get_f64, assert_f64;
        bool => read_bool, get_bool, assert_bool;
        Vec2 => read_vec2, get_vec2, assert_vec2;
        Vec3 => read_vec3, get_vec3, assert_vec3;
        Vec4 => read_vec4, get_vec4, assert_vec4;
        Quat => read_quat, get_quat, assert_quat;
        Color => read_color, get_color, assert_color;
        Rgba8 => read_rgba8, get_rgba8, assert_rgba8;
    }

    /// Read a pointer-sized integer (4 or 8 bytes, per the context).
    #[inline]
    pub fn read_ptr(&mut self) -> Result<u64> {
        let value = self.get_ptr(self.position)?;
        self.position += self.context.pointer_size();
        Ok(value)
    }

    /// Read a pointer-sized integer at an absolute offset without moving.
    #[inline]
    pub fn get_ptr(&self, offset: usize) -> Result<u64> {
        match self.context.pointer_width {
            PointerWidth::Short => self.get::<u32>(offset).map(u64::from),
            PointerWidth::Long => self.get::<u64>(offset),
        }
    }

    /// Read a pointer-sized integer that must be one of `expected`.
    pub fn assert_ptr(&mut self, expected: &[u64]) -> Result<u64> {
        let offset = self.position;
        let actual = self.read_ptr()?;
        if expected.contains(&actual) {
            Ok(actual)
        } else {
            Err(mismatch(offset, expected, actual))
        }
    }

    /// Read a pointer and convert it to a buffer offset.
    pub fn read_offset(&mut self) -> Result<usize> {
        let at = self.position;
        let value = self.read_ptr()?;
        usize::try_from(value).map_err(|_| Error::OffsetOutOfRange {
            offset: at,
            len: self.data.len(),
        })
    }

    /// Read a null-terminated string and advance past the terminator.
    pub fn read_cstring(&mut self, encoding: Encoding) -> Result<String> {
        let start = self.position;
        let (string, consumed) = self.decode_cstring(start, encoding)?;
        self.position = start + consumed;
        Ok(string)
    }

    /// Read a null-terminated string at an absolute offset without moving.
    pub fn get_cstring(&self, offset: usize, encoding: Encoding) -> Result<String> {
        self.decode_cstring(offset, encoding).map(|(string, _)| string)
    }

    /// Read a string from a fixed-size field, stopping at the first null.
    pub fn read_fixed_string(&mut self, size: usize, encoding: Encoding) -> Result<String> {
        let start = self.position;
        let bytes = self.read_bytes(size)?;
        let end = text::find_terminator(bytes, encoding).unwrap_or(size);
        text::decode(&bytes[..end], encoding, self.context.endian, start)
    }

    fn decode_cstring(&self, offset: usize, encoding: Encoding) -> Result<(String, usize)> {
        let tail = self.data.get(offset..).ok_or(Error::OffsetOutOfRange {
            offset,
            len: self.data.len(),
        })?;
        let end = text::find_terminator(tail, encoding)
            .ok_or(Error::MissingNullTerminator { offset })?;
        let string = text::decode(&tail[..end], encoding, self.context.endian, offset)?;
        Ok((string, end + encoding.unit_size()))
    }

    /// Skip forward to the next multiple of `alignment`.
    pub fn align(&mut self, alignment: usize) -> Result<()> {
        self.skip(padding_for(self.position, alignment))
    }

    /// Read `count` bytes that must all equal `filler`.
    pub fn assert_padding(&mut self, count: usize, filler: u8) -> Result<()> {
        let start = self.position;
        let bytes = self.read_bytes(count)?;
        match bytes.iter().position(|&b| b != filler) {
            Some(i) => Err(Error::PaddingMismatch {
                offset: start + i,
                filler,
                actual: bytes[i],
            }),
            None => Ok(()),
        }
    }

    /// Skip to the next multiple of `alignment`, checking the filler bytes.
    pub fn assert_align(&mut self, alignment: usize, filler: u8) -> Result<()> {
        self.assert_padding(padding_for(self.position, alignment), filler)
    }

    /// Read a struct using zerocopy.
    ///
    /// The struct must implement `FromBytes` from the zerocopy crate. Its
    /// bytes are taken verbatim; the context's byte order does not apply.
    #[inline]
    pub fn read_struct<T: FromBytes>(&mut self) -> Result<T> {
        let size = std::mem::size_of::<T>();
        let offset = self.position;
        let bytes = self.read_bytes(size)?;
        T::read_from_bytes(bytes).map_err(|_| Error::UnexpectedEof {
            offset,
            needed: size,
            available: bytes.len(),
        })
    }

    /// Expect specific magic bytes.
    pub fn expect_magic(&mut self, expected: &[u8]) -> Result<()> {
        let offset = self.position;
        let actual = self.read_bytes(expected.len())?;
        if actual != expected {
            return Err(Error::InvalidMagic {
                offset,
                expected: expected.to_vec(),
                actual: actual.to_vec(),
            });
        }
        Ok(())
    }

    /// Check whether `magic` appears at `offset`, never failing.
    pub fn has_magic(&self, offset: usize, magic: &[u8]) -> bool {
        self.peek_bytes(offset, magic.len())
            .map(|bytes| bytes == magic)
            .unwrap_or(false)
    }

    /// End-of-parse check: every step must have been stepped out of.
    pub fn finish(&self) -> Result<()> {
        if let Err(err) = self.steps.ensure_empty() {
            tracing::debug!(%err, "reader finished with open steps");
            return Err(err);
        }
        Ok(())
    }

    fn eof(&self, offset: usize, needed: usize) -> Error {
        Error::UnexpectedEof {
            offset,
            needed,
            available: self.data.len().saturating_sub(offset),
        }
    }
}

impl HasContext for BinaryReader<'_> {
    #[inline]
    fn context(&self) -> Context {
        self.context
    }

    #[inline]
    fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }
}

impl Seekable for BinaryReader<'_> {
    #[inline]
    fn position(&self) -> usize {
        self.position
    }

    #[inline]
    fn seek(&mut self, position: usize) {
        self.position = position;
    }

    fn steps(&self) -> &StepStack {
        &self.steps
    }

    fn steps_mut(&mut self) -> &mut StepStack {
        &mut self.steps
    }

    fn check_step_target(&self, offset: usize) -> Result<()> {
        if offset > self.data.len() {
            return Err(Error::OffsetOutOfRange {
                offset,
                len: self.data.len(),
            });
        }
        Ok(())
    }
}

pub(crate) fn mismatch<T: std::fmt::Debug>(offset: usize, expected: &[T], actual: T) -> Error {
    Error::Mismatch {
        offset,
        expected: format!("{:?}", expected),
        actual: format!("{:?}", actual),
    }
}
