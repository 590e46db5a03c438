//! Binary writer with deferred patching.
//!
//! [`BinaryWriter`] is the write-side counterpart of
//! [`BinaryReader`](crate::BinaryReader): a growable buffer with an absolute
//! position, the same [`Context`] flags, the same step stack, and a
//! reservation table for values that are only known after later data has
//! been written.

use zerocopy::{Immutable, IntoBytes};

use crate::align::padding_for;
use crate::reservation::{Reservation, ReservationTable, Slot};
use crate::step::{Seekable, StepStack};
use crate::text::{self, Encoding};
use crate::types::{Color, Quat, Rgba8, Vec2, Vec3, Vec4};
use crate::{Context, Error, HasContext, PointerWidth, Primitive, Result};

/// A growable binary writer.
///
/// # Example
///
/// ```
/// use patchcord_common::BinaryWriter;
///
/// let mut writer = BinaryWriter::new();
///
/// let len = writer.reserve::<u32>();
/// let start = writer.position();
/// writer.write_bytes(b"payload!");
/// let size = (writer.position() - start) as u32;
/// writer.fill(len, size)?;
///
/// let bytes = writer.finish()?;
/// assert_eq!(&bytes[..4], &[8, 0, 0, 0]);
/// # Ok::<(), patchcord_common::Error>(())
/// ```
#[derive(Debug)]
pub struct BinaryWriter {
    data: Vec<u8>,
    position: usize,
    context: Context,
    steps: StepStack,
    reservations: ReservationTable,
}

macro_rules! write_accessors {
    ($($ty:ty => $write:ident;)*) => {$(
        #[doc = concat!("Write a `", stringify!($ty), "` and advance.")]
        #[inline]
        pub fn $write(&mut self, value: $ty) {
            self.write::<$ty>(value)
        }
    )*};
}

impl BinaryWriter {
    /// Create an empty little-endian writer with 4-byte pointers.
    pub fn new() -> Self {
        Self::with_context(Context::new())
    }

    /// Create an empty writer with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut writer = Self::new();
        writer.data.reserve(capacity);
        writer
    }

    /// Create an empty writer with the given byte order and pointer width.
    pub fn with_context(context: Context) -> Self {
        Self {
            data: Vec::new(),
            position: 0,
            context,
            steps: StepStack::new(),
            reservations: ReservationTable::new(),
        }
    }

    /// Current write position.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of bytes in the buffer.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether nothing has been written yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Seek to an absolute position. Seeking past the end is allowed; the
    /// gap is zero-filled by the next write.
    ///
    /// A write whose end would not fit in `usize` panics.
    #[inline]
    pub fn seek(&mut self, position: usize) {
        self.position = position;
    }

    /// Bytes written so far, including unfilled placeholders.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Mutable view of `len` bytes at `offset`, growing the buffer as needed.
    ///
    /// # Panics
    ///
    /// Panics if `offset + len` overflows `usize`.
    fn span_mut(&mut self, offset: usize, len: usize) -> &mut [u8] {
        let Some(end) = offset.checked_add(len) else {
            panic!("write of {len} bytes at {offset:#x} overflows the address space");
        };
        if self.data.len() < end {
            self.data.resize(end, 0);
        }
        &mut self.data[offset..end]
    }

    /// Write raw bytes at the current position and advance.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        let start = self.position;
        self.span_mut(start, bytes.len()).copy_from_slice(bytes);
        self.position = start + bytes.len();
    }

    /// Write a value in the current byte order and advance.
    #[inline]
    pub fn write<T: Primitive>(&mut self, value: T) {
        let start = self.position;
        self.write_at(start, value);
        self.position = start + T::SIZE;
    }

    /// Write a value at an absolute offset without moving.
    #[inline]
    pub fn write_at<T: Primitive>(&mut self, offset: usize, value: T) {
        let endian = self.context.endian;
        value.encode(self.span_mut(offset, T::SIZE), endian);
    }

    /// Write consecutive values.
    pub fn write_array<T: Primitive>(&mut self, values: &[T]) {
        for &value in values {
            self.write(value);
        }
    }

    write_accessors! {
        u8 => write_u8;
        i8 => write_i8;
        u16 => write_u16;
        i16 => write_i16;
        u32 => write_u32;
        i32 => write_i32;
        u64 => write_u64;
        i64 => write_i64;
        f32 => write_f32;
        f64 => write_f64;
        bool => write_bool;
        Vec2 => write_vec2;
        Vec3 => write_vec3;
        Vec4 => write_vec4;
        Quat => write_quat;
        Color => write_color;
        Rgba8 => write_rgba8;
    }

    /// Write a pointer-sized integer (4 or 8 bytes, per the context).
    pub fn write_ptr(&mut self, value: u64) -> Result<()> {
        match self.context.pointer_width {
            PointerWidth::Short => {
                let value = u32::try_from(value)
                    .map_err(|_| Error::PointerOverflow { value, width: 4 })?;
                self.write_u32(value);
            }
            PointerWidth::Long => self.write_u64(value),
        }
        Ok(())
    }

    /// Write a struct's bytes verbatim using zerocopy.
    pub fn write_struct<T: IntoBytes + Immutable>(&mut self, value: &T) {
        self.write_bytes(value.as_bytes());
    }

    /// Write `count` copies of `filler`.
    pub fn pad(&mut self, count: usize, filler: u8) {
        let start = self.position;
        self.span_mut(start, count).fill(filler);
        self.position = start + count;
    }

    /// Zero-pad to the next multiple of `alignment`.
    pub fn align(&mut self, alignment: usize) {
        self.align_with(alignment, 0);
    }

    /// Pad with `filler` to the next multiple of `alignment`.
    pub fn align_with(&mut self, alignment: usize, filler: u8) {
        self.pad(padding_for(self.position, alignment), filler);
    }

    /// Write a string followed by a null terminator.
    pub fn write_cstring(&mut self, value: &str, encoding: Encoding) -> Result<()> {
        let bytes = text::encode(value, encoding, self.context.endian)?;
        self.write_bytes(&bytes);
        self.pad(encoding.unit_size(), 0);
        Ok(())
    }

    /// Write a string into a zero-padded field of exactly `size` bytes.
    ///
    /// The string may fill the field completely, leaving no terminator.
    pub fn write_fixed_string(&mut self, value: &str, size: usize, encoding: Encoding) -> Result<()> {
        let bytes = text::encode(value, encoding, self.context.endian)?;
        if bytes.len() > size {
            return Err(Error::StringTooLong {
                len: bytes.len(),
                capacity: size,
            });
        }
        self.write_bytes(&bytes);
        self.pad(size - bytes.len(), 0);
        Ok(())
    }

    /// Emit a zeroed placeholder as wide as `T` and return its handle.
    pub fn reserve<T: Primitive>(&mut self) -> Reservation {
        self.reserve_bytes(T::SIZE)
    }

    /// Emit a zeroed placeholder as wide as a pointer under the current context.
    pub fn reserve_ptr(&mut self) -> Reservation {
        self.reserve_bytes(self.context.pointer_size())
    }

    /// Emit `width` zero bytes and record them as a reservation.
    pub fn reserve_bytes(&mut self, width: usize) -> Reservation {
        let offset = self.position;
        self.pad(width, 0);
        let reservation = self.reservations.record(offset, width);
        tracing::trace!(id = reservation.id(), offset, width, "reserve");
        reservation
    }

    /// Patch a placeholder with `value` in the current byte order.
    ///
    /// The write position is left where it was.
    pub fn fill<T: Primitive>(&mut self, reservation: Reservation, value: T) -> Result<()> {
        let slot = self.reservations.slot(&reservation)?;
        if slot.width != T::SIZE {
            return Err(Error::WidthMismatch {
                offset: slot.offset,
                reserved: slot.width,
                actual: T::SIZE,
            });
        }
        self.write_at(slot.offset, value);
        self.consume(reservation, slot);
        Ok(())
    }

    /// Patch a pointer placeholder. The width recorded at reserve time is
    /// used even if the pointer width changed since.
    pub fn fill_ptr(&mut self, reservation: Reservation, value: u64) -> Result<()> {
        let slot = self.reservations.slot(&reservation)?;
        let overflow = Error::PointerOverflow {
            value,
            width: slot.width,
        };
        match slot.width {
            1 => self.write_at(slot.offset, u8::try_from(value).map_err(|_| overflow)?),
            2 => self.write_at(slot.offset, u16::try_from(value).map_err(|_| overflow)?),
            4 => self.write_at(slot.offset, u32::try_from(value).map_err(|_| overflow)?),
            8 => self.write_at(slot.offset, value),
            width => {
                return Err(Error::UnsupportedPointerWidth {
                    offset: slot.offset,
                    width,
                })
            }
        }
        self.consume(reservation, slot);
        Ok(())
    }

    /// Patch a placeholder with the current write position.
    pub fn fill_offset(&mut self, reservation: Reservation) -> Result<()> {
        self.fill_ptr(reservation, self.position as u64)
    }

    /// Patch a placeholder with the distance from `base` to the current
    /// write position.
    pub fn fill_relative(&mut self, reservation: Reservation, base: usize) -> Result<()> {
        let distance = self
            .position
            .checked_sub(base)
            .ok_or(Error::NegativeDistance {
                base,
                position: self.position,
            })?;
        self.fill_ptr(reservation, distance as u64)
    }

    fn consume(&mut self, reservation: Reservation, slot: Slot) {
        tracing::trace!(id = reservation.id(), offset = slot.offset, "fill");
        self.reservations.consume(reservation);
    }

    /// Number of reservations not filled yet.
    pub fn outstanding(&self) -> usize {
        self.reservations.outstanding()
    }

    /// Check the end-of-write invariants without consuming the writer.
    pub fn ensure_complete(&self) -> Result<()> {
        let result = self
            .steps
            .ensure_empty()
            .and_then(|()| self.reservations.ensure_closed());
        if let Err(err) = &result {
            tracing::debug!(%err, "writer is not complete");
        }
        result
    }

    /// Finish writing and return the bytes.
    ///
    /// Fails if any reservation is unfilled or any step is still open.
    pub fn finish(self) -> Result<Vec<u8>> {
        self.ensure_complete()?;
        Ok(self.data)
    }
}

impl Default for BinaryWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl HasContext for BinaryWriter {
    #[inline]
    fn context(&self) -> Context {
        self.context
    }

    #[inline]
    fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }
}

impl Seekable for BinaryWriter {
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Endian;

    #[test]
    fn test_endianness() {
        let mut writer = BinaryWriter::new();
        writer.set_big_endian(true);
        writer.write_u32(0x01020304);
        writer.set_big_endian(false);
        writer.write_u32(0x01020304);
        assert_eq!(writer.as_bytes(), &[1, 2, 3, 4, 4, 3, 2, 1]);
    }

    #[test]
    fn test_pointer_width() {
        let mut writer = BinaryWriter::new();
        writer.write_ptr(5).unwrap();
        assert_eq!(writer.len(), 4);

        writer.set_wide_pointers(true);
        writer.write_ptr(5).unwrap();
        assert_eq!(writer.len(), 12);
        assert_eq!(writer.as_bytes(), &[5, 0, 0, 0, 5, 0, 0, 0, 0, 0, 0, 0]);

        writer.set_wide_pointers(false);
        assert!(matches!(
            writer.write_ptr(0x1_0000_0000),
            Err(Error::PointerOverflow { width: 4, .. })
        ));
    }

    #[test]
    fn test_reserve_then_fill() {
        let mut writer = BinaryWriter::new();
        let len = writer.reserve::<u32>();
        assert_eq!(writer.position(), 4);
        writer.write_bytes(&[1, 2, 3, 4, 5, 6, 7, 8]);
        writer.fill(len, 8u32).unwrap();

        assert_eq!(writer.position(), 12);
        assert_eq!(writer.outstanding(), 0);
        let bytes = writer.finish().unwrap();
        assert_eq!(bytes, [8, 0, 0, 0, 1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_fill_uses_current_endianness() {
        let mut writer = BinaryWriter::new();
        let slot = writer.reserve::<u16>();
        writer.write_u8(0xFF);
        writer.set_big_endian(true);
        writer.fill(slot, 0x1234u16).unwrap();
        assert_eq!(writer.finish().unwrap(), [0x12, 0x34, 0xFF]);
    }

    #[test]
    fn test_fill_width_mismatch() {
        let mut writer = BinaryWriter::new();
        let slot = writer.reserve::<u32>();
        assert!(matches!(
            writer.fill(slot, 1u64),
            Err(Error::WidthMismatch {
                offset: 0,
                reserved: 4,
                actual: 8
            })
        ));
        // The failed fill leaves the placeholder outstanding.
        assert_eq!(writer.outstanding(), 1);
        assert!(writer.finish().is_err());
    }

    #[test]
    fn test_unfilled_reservation_fails_finish() {
        let mut writer = BinaryWriter::new();
        writer.write_u8(1);
        let _forgotten = writer.reserve_ptr();
        let err = writer.finish().unwrap_err();
        assert!(matches!(
            err,
            Error::UnfilledReservations {
                count: 1,
                first_offset: 1
            }
        ));
        assert!(err.is_usage());
    }

    #[test]
    fn test_foreign_reservation_is_unknown() {
        let mut a = BinaryWriter::new();
        let mut b = BinaryWriter::new();
        let from_b = b.reserve::<u32>();
        assert!(matches!(
            a.fill(from_b, 1u32),
            Err(Error::UnknownReservation { .. })
        ));
    }

    #[test]
    fn test_ptr_reservation_keeps_reserved_width() {
        let mut writer = BinaryWriter::with_context(
            Context::new()
                .with_endian(Endian::Big)
                .with_pointer_width(crate::PointerWidth::Long),
        );
        let wide = writer.reserve_ptr();
        writer.set_wide_pointers(false);
        let narrow = writer.reserve_ptr();
        writer.fill_ptr(wide, 0x10).unwrap();
        writer.fill_offset(narrow).unwrap();

        assert_eq!(
            writer.finish().unwrap(),
            [0, 0, 0, 0, 0, 0, 0, 0x10, 0, 0, 0, 12]
        );
    }

    #[test]
    fn test_fill_relative() {
        let mut writer = BinaryWriter::new();
        writer.pad(4, 0xEE);
        let base = writer.position();
        let size = writer.reserve::<u16>();
        writer.write_u32(0);
        writer.fill_relative(size, base).unwrap();
        assert_eq!(writer.as_bytes(), &[0xEE, 0xEE, 0xEE, 0xEE, 6, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_fill_relative_base_past_position() {
        let mut writer = BinaryWriter::new();
        let slot = writer.reserve::<u32>();
        let err = writer.fill_relative(slot, 100).unwrap_err();
        assert!(matches!(
            err,
            Error::NegativeDistance { base: 100, position: 4 }
        ));
        assert!(err.is_usage());
    }

    #[test]
    fn test_fill_ptr_rejects_odd_slot_width() {
        let mut writer = BinaryWriter::new();
        let slot = writer.reserve_bytes(3);
        let err = writer.fill_ptr(slot, 1).unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedPointerWidth { offset: 0, width: 3 }
        ));
        assert!(err.is_usage());
        assert_eq!(writer.outstanding(), 1);
    }

    #[test]
    #[should_panic(expected = "overflows the address space")]
    fn test_write_past_address_space_panics() {
        let mut writer = BinaryWriter::new();
        writer.step_in(usize::MAX).unwrap();
        writer.write_u8(1);
    }

    #[test]
    fn test_fill_does_not_move_position() {
        let mut writer = BinaryWriter::new();
        let first = writer.reserve::<u32>();
        let second = writer.reserve::<u32>();
        writer.write_u8(0xAB);
        let before = writer.position();
        writer.fill(second, 2u32).unwrap();
        writer.fill(first, 1u32).unwrap();
        assert_eq!(writer.position(), before);
        assert_eq!(writer.finish().unwrap(), [1, 0, 0, 0, 2, 0, 0, 0, 0xAB]);
    }

    #[test]
    fn test_seek_past_end_zero_fills() {
        let mut writer = BinaryWriter::new();
        writer.seek(3);
        writer.write_u8(0x7F);
        assert_eq!(writer.as_bytes(), &[0, 0, 0, 0x7F]);
    }

    #[test]
    fn test_alignment_and_strings() {
        let mut writer = BinaryWriter::new();
        writer.write_cstring("abc", Encoding::Ascii).unwrap();
        writer.align_with(8, 0xFF);
        writer.write_fixed_string("xy", 4, Encoding::Ascii).unwrap();
        assert_eq!(
            writer.as_bytes(),
            b"abc\0\xFF\xFF\xFF\xFFxy\0\0".as_slice()
        );
        assert!(matches!(
            writer.write_fixed_string("toolong", 4, Encoding::Ascii),
            Err(Error::StringTooLong { len: 7, capacity: 4 })
        ));
    }

    #[test]
    fn test_unbalanced_steps_fail_finish() {
        let mut writer = BinaryWriter::new();
        writer.write_u32(0);
        writer.step_in(0).unwrap();
        assert!(matches!(
            writer.finish(),
            Err(Error::UnbalancedSteps { depth: 1 })
        ));
    }

    #[test]
    fn test_write_vectors() {
        let mut writer = BinaryWriter::new();
        writer.write_vec3(Vec3::new(1.0, 0.0, 0.0));
        writer.write_rgba8(Rgba8::new(1, 2, 3, 4));
        writer.write_array(&[1u16, 2]);
        assert_eq!(writer.len(), 12 + 4 + 4);
        assert_eq!(&writer.as_bytes()[..4], &[0, 0, 0x80, 0x3F]);
        assert_eq!(&writer.as_bytes()[12..16], &[1, 2, 3, 4]);
    }
}
