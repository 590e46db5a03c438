//! Error types for patchcord-common.

use thiserror::Error;

use crate::text::Encoding;

/// Broad classification of an [`Error`].
///
/// Callers use this to tell "the file is corrupt or not what we thought"
/// apart from "the format module misused the cursor".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The bytes being read are truncated, corrupt or of an unknown variant.
    Data,
    /// A format module used the engine incorrectly (a bug, not bad input).
    Usage,
}

/// Common error type for cursor operations.
#[derive(Debug, Error)]
pub enum Error {
    /// End of buffer reached while reading.
    #[error("unexpected end of buffer at {offset:#x}: needed {needed} bytes but only {available} available")]
    UnexpectedEof {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// An absolute offset points outside the buffer.
    #[error("offset {offset:#x} out of range (buffer length {len:#x})")]
    OffsetOutOfRange { offset: usize, len: usize },

    /// An asserted value did not match any of the expected candidates.
    #[error("unexpected value at {offset:#x}: expected one of {expected}, got {actual}")]
    Mismatch {
        offset: usize,
        expected: String,
        actual: String,
    },

    /// Invalid magic bytes encountered.
    #[error("invalid magic at {offset:#x}: expected {expected:?}, got {actual:?}")]
    InvalidMagic {
        offset: usize,
        expected: Vec<u8>,
        actual: Vec<u8>,
    },

    /// A padding run contained a byte other than the filler.
    #[error("padding at {offset:#x} should be {filler:#04x}, found {actual:#04x}")]
    PaddingMismatch { offset: usize, filler: u8, actual: u8 },

    /// Bytes could not be decoded in the requested text encoding.
    #[error("invalid {encoding} text at {offset:#x}")]
    InvalidText { offset: usize, encoding: Encoding },

    /// Missing null terminator in string.
    #[error("string at {offset:#x} missing null terminator")]
    MissingNullTerminator { offset: usize },

    /// `step_out` was called without a matching `step_in`.
    #[error("step_out called with an empty step stack")]
    StepUnderflow,

    /// A scoped step or a top-level operation ended with step frames left
    /// unbalanced.
    #[error("{depth} step frame(s) left unbalanced")]
    UnbalancedSteps { depth: usize },

    /// A reservation handle does not belong to this writer or was already filled.
    #[error("unknown reservation handle #{id}")]
    UnknownReservation { id: usize },

    /// A reservation was filled with a value of a different width.
    #[error("reservation at {offset:#x} is {reserved} bytes wide, fill value is {actual} bytes")]
    WidthMismatch {
        offset: usize,
        reserved: usize,
        actual: usize,
    },

    /// A pointer fill targets a slot whose width is not 1, 2, 4 or 8 bytes.
    #[error("reservation at {offset:#x} is {width} bytes wide; pointer fills need 1, 2, 4 or 8")]
    UnsupportedPointerWidth { offset: usize, width: usize },

    /// A relative fill was asked for a base beyond the write position.
    #[error("relative base {base:#x} is past the write position {position:#x}")]
    NegativeDistance { base: usize, position: usize },

    /// The writer finished with reservations that were never filled.
    #[error("{count} reservation(s) never filled, first at {first_offset:#x}")]
    UnfilledReservations { count: usize, first_offset: usize },

    /// A pointer value does not fit the current pointer width.
    #[error("pointer value {value:#x} does not fit in {width} bytes")]
    PointerOverflow { value: u64, width: usize },

    /// A string is too long for its fixed-size field.
    #[error("string of {len} bytes does not fit a {capacity}-byte field")]
    StringTooLong { len: usize, capacity: usize },

    /// A string contains characters the target encoding cannot represent.
    #[error("string cannot be encoded as {encoding}")]
    UnencodableText { encoding: Encoding },
}

impl Error {
    /// Classify this error as a data error or an engine usage error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnexpectedEof { .. }
            | Error::OffsetOutOfRange { .. }
            | Error::Mismatch { .. }
            | Error::InvalidMagic { .. }
            | Error::PaddingMismatch { .. }
            | Error::InvalidText { .. }
            | Error::MissingNullTerminator { .. }
            | Error::StepUnderflow => ErrorKind::Data,
            Error::UnbalancedSteps { .. }
            | Error::UnknownReservation { .. }
            | Error::WidthMismatch { .. }
            | Error::UnsupportedPointerWidth { .. }
            | Error::NegativeDistance { .. }
            | Error::UnfilledReservations { .. }
            | Error::PointerOverflow { .. }
            | Error::StringTooLong { .. }
            | Error::UnencodableText { .. } => ErrorKind::Usage,
        }
    }

    /// Shorthand for `self.kind() == ErrorKind::Usage`.
    pub fn is_usage(&self) -> bool {
        self.kind() == ErrorKind::Usage
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
