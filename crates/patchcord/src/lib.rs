//! Patchcord - binary cursor and deferred-patch serialization engine.
//!
//! This crate provides a unified interface to the patchcord crates for
//! writing readers and writers of binary game file formats.
//!
//! # Crates
//!
//! - [`patchcord_common`] - Cursors, endian-aware codec, stepping, reservations, strings
//! - [`patchcord_format`] - The `Format` trait, parse/serialize drivers, detection
//!
//! # Example
//!
//! ```
//! use patchcord::prelude::*;
//!
//! struct Header {
//!     entries: Vec<u16>,
//! }
//!
//! impl Format for Header {
//!     const NAME: &'static str = "header";
//!
//!     fn sniff(reader: &BinaryReader<'_>) -> bool {
//!         reader.has_magic(0, b"HDR\0")
//!     }
//!
//!     fn read(reader: &mut BinaryReader<'_>) -> patchcord::format::Result<Self> {
//!         reader.expect_magic(b"HDR\0")?;
//!         let count = reader.read_u32()? as usize;
//!         let offset = reader.read_offset()?;
//!         let entries = reader.at(offset, |r| r.read_array::<u16>(count))?;
//!         Ok(Header { entries })
//!     }
//!
//!     fn write(&self, writer: &mut BinaryWriter) -> patchcord::format::Result<()> {
//!         writer.write_bytes(b"HDR\0");
//!         writer.write_u32(self.entries.len() as u32);
//!         let table = writer.reserve_ptr();
//!         writer.align(16);
//!         writer.fill_offset(table)?;
//!         writer.write_array(&self.entries);
//!         Ok(())
//!     }
//! }
//!
//! let bytes = serialize(&Header { entries: vec![3, 1, 4] })?;
//! assert_eq!(bytes.len(), 16 + 6);
//! assert_eq!(parse::<Header>(&bytes)?.entries, [3, 1, 4]);
//! # Ok::<(), patchcord::format::Error>(())
//! ```

// Re-export all sub-crates
pub use patchcord_common as common;
pub use patchcord_format as format;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use patchcord_common::{
        BinaryReader, BinaryWriter, Color, Context, Encoding, Endian, HasContext, PointerWidth,
        Quat, Reservation, Rgba8, Seekable, Vec2, Vec3, Vec4,
    };
    pub use patchcord_format::{parse, serialize, sniff, Format, Registry};
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
