//! Byte order and pointer width flags carried by every cursor.
//!
//! Both flags are read at call time. A format module may flip them after
//! inspecting a header and every later read or write sees the new value.

/// Byte order of multi-byte values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Endian {
    #[default]
    Little,
    Big,
}

/// Width of pointer-sized integers (offsets whose size is chosen per file).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PointerWidth {
    /// 4-byte pointers.
    #[default]
    Short,
    /// 8-byte pointers.
    Long,
}

impl PointerWidth {
    /// Size of a pointer in bytes.
    #[inline]
    pub const fn size(self) -> usize {
        match self {
            PointerWidth::Short => 4,
            PointerWidth::Long => 8,
        }
    }

    /// Largest value a pointer of this width can hold.
    #[inline]
    pub const fn max_value(self) -> u64 {
        match self {
            PointerWidth::Short => u32::MAX as u64,
            PointerWidth::Long => u64::MAX,
        }
    }
}

/// Endianness and pointer width of a cursor.
///
/// # Example
///
/// ```
/// use patchcord_common::{Context, Endian, PointerWidth};
///
/// let ctx = Context::new()
///     .with_endian(Endian::Big)
///     .with_pointer_width(PointerWidth::Long);
///
/// assert!(ctx.is_big_endian());
/// assert_eq!(ctx.pointer_size(), 8);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Context {
    pub endian: Endian,
    pub pointer_width: PointerWidth,
}

impl Context {
    /// Little-endian, 4-byte pointers.
    pub const fn new() -> Self {
        Self {
            endian: Endian::Little,
            pointer_width: PointerWidth::Short,
        }
    }

    /// Replace the byte order.
    pub const fn with_endian(mut self, endian: Endian) -> Self {
        self.endian = endian;
        self
    }

    /// Replace the pointer width.
    pub const fn with_pointer_width(mut self, pointer_width: PointerWidth) -> Self {
        self.pointer_width = pointer_width;
        self
    }

    /// Whether values are big-endian.
    #[inline]
    pub const fn is_big_endian(&self) -> bool {
        matches!(self.endian, Endian::Big)
    }

    /// Whether pointers are 8 bytes wide.
    #[inline]
    pub const fn is_wide(&self) -> bool {
        matches!(self.pointer_width, PointerWidth::Long)
    }

    /// Pointer size in bytes.
    #[inline]
    pub const fn pointer_size(&self) -> usize {
        self.pointer_width.size()
    }
}

/// Shared flag accessors for anything that carries a [`Context`].
pub trait HasContext {
    fn context(&self) -> Context;
    fn context_mut(&mut self) -> &mut Context;

    fn set_context(&mut self, context: Context) {
        *self.context_mut() = context;
    }

    fn big_endian(&self) -> bool {
        self.context().is_big_endian()
    }

    fn set_big_endian(&mut self, big: bool) {
        self.context_mut().endian = if big { Endian::Big } else { Endian::Little };
    }

    fn wide_pointers(&self) -> bool {
        self.context().is_wide()
    }

    fn set_wide_pointers(&mut self, wide: bool) {
        self.context_mut().pointer_width = if wide {
            PointerWidth::Long
        } else {
            PointerWidth::Short
        };
    }

    fn pointer_size(&self) -> usize {
        self.context().pointer_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let ctx = Context::default();
        assert_eq!(ctx, Context::new());
        assert!(!ctx.is_big_endian());
        assert!(!ctx.is_wide());
        assert_eq!(ctx.pointer_size(), 4);
    }

    #[test]
    fn test_pointer_limits() {
        assert_eq!(PointerWidth::Short.max_value(), 0xFFFF_FFFF);
        assert_eq!(PointerWidth::Long.max_value(), u64::MAX);
        assert_eq!(PointerWidth::Long.size(), 8);
    }
}
