//! Error types for format modules.

use thiserror::Error;

use patchcord_common::ErrorKind;

/// Errors that can occur when reading or writing a format.
#[derive(Debug, Error)]
pub enum Error {
    /// Cursor error (truncation, assert mismatch, reservation misuse, ...).
    #[error("{0}")]
    Common(#[from] patchcord_common::Error),

    /// The data is a known format but a variant this module cannot handle.
    #[error("unsupported {format} variant: {detail}")]
    Unsupported {
        format: &'static str,
        detail: String,
    },

    /// The data is structurally readable but internally inconsistent.
    #[error("invalid {format} data: {detail}")]
    Invalid {
        format: &'static str,
        detail: String,
    },

    /// No registered format recognized the data.
    #[error("no registered format recognizes this data")]
    Unrecognized,
}

impl Error {
    /// Shorthand for an [`Error::Unsupported`].
    pub fn unsupported(format: &'static str, detail: impl Into<String>) -> Self {
        Error::Unsupported {
            format,
            detail: detail.into(),
        }
    }

    /// Shorthand for an [`Error::Invalid`].
    pub fn invalid(format: &'static str, detail: impl Into<String>) -> Self {
        Error::Invalid {
            format,
            detail: detail.into(),
        }
    }

    /// Whether this is bad input or a module bug.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Common(err) => err.kind(),
            Error::Unsupported { .. } | Error::Invalid { .. } | Error::Unrecognized => {
                ErrorKind::Data
            }
        }
    }
}

/// Result type for format operations.
pub type Result<T> = std::result::Result<T, Error>;
