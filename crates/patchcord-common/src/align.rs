//! Alignment arithmetic shared by the reader and writer.

/// Number of filler bytes needed to move `position` to a multiple of
/// `alignment`. Alignments of 0 and 1 never need padding.
#[inline]
pub const fn padding_for(position: usize, alignment: usize) -> usize {
    if alignment <= 1 {
        return 0;
    }
    (alignment - position % alignment) % alignment
}

/// Round `position` up to a multiple of `alignment`.
#[inline]
pub const fn align_up(position: usize, alignment: usize) -> usize {
    position + padding_for(position, alignment)
}
