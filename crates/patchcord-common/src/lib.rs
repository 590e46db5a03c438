//! Binary cursor engine for patchcord.
//!
//! This crate provides the substrate every format module is written against:
//!
//! - [`BinaryReader`] - bounds-checked reading from a byte slice
//! - [`BinaryWriter`] - growable output with deferred patching ([`Reservation`])
//! - [`Context`] - byte order and pointer width, switchable mid-parse
//! - [`Primitive`] - the endian-aware codec behind every typed accessor
//! - [`Seekable`] - the step-in / step-out position stack shared by both cursors
//! - [`text`] - ASCII, Shift-JIS and UTF-16 string codecs
//! - Vector and color types ([`Vec3`], [`Color`], ...)
//!
//! # Example
//!
//! ```
//! use patchcord_common::{BinaryReader, BinaryWriter, Encoding, Seekable};
//!
//! // Header with an offset to a name stored after it.
//! let mut writer = BinaryWriter::new();
//! let name_offset = writer.reserve_ptr();
//! writer.write_u32(7);
//! writer.fill_offset(name_offset)?;
//! writer.write_cstring("root", Encoding::Ascii)?;
//! let bytes = writer.finish()?;
//!
//! let mut reader = BinaryReader::new(&bytes);
//! let offset = reader.read_offset()?;
//! let name = reader.at(offset, |r| r.read_cstring(Encoding::Ascii))?;
//! assert_eq!(name, "root");
//! assert_eq!(reader.read_u32()?, 7);
//! # Ok::<(), patchcord_common::Error>(())
//! ```

mod align;
mod context;
mod error;
mod primitive;
mod reader;
mod reservation;
mod step;
mod writer;

pub mod text;
pub mod types;

pub use align::{align_up, padding_for};
pub use context::{Context, Endian, HasContext, PointerWidth};
pub use error::{Error, ErrorKind, Result};
pub use primitive::{to_bytes, Primitive};
pub use reader::BinaryReader;
pub use reservation::{Reservation, Slot};
pub use step::{Seekable, Step, StepStack};
pub use text::Encoding;
pub use types::{Color, Quat, Rgba8, Vec2, Vec3, Vec4};
pub use writer::BinaryWriter;

/// Re-export zerocopy traits for convenience
pub use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};
