//! The contract every format module implements.

use patchcord_common::{BinaryReader, BinaryWriter};

use crate::Result;

/// A binary format: how to recognize it, read it, and write it back.
///
/// Implementations are thin field-by-field mappings written against the
/// cursors; offsets to sub-structures are followed with
/// [`Seekable::at`](patchcord_common::Seekable::at) on read and emitted with
/// [`BinaryWriter::reserve_ptr`] / [`BinaryWriter::fill_offset`] on write.
///
/// # Example
///
/// ```
/// use patchcord_common::{BinaryReader, BinaryWriter};
/// use patchcord_format::{parse, serialize, Format, Result};
///
/// #[derive(Debug, PartialEq)]
/// struct Version(u16);
///
/// impl Format for Version {
///     const NAME: &'static str = "version";
///
///     fn sniff(reader: &BinaryReader<'_>) -> bool {
///         reader.has_magic(0, b"VER")
///     }
///
///     fn read(reader: &mut BinaryReader<'_>) -> Result<Self> {
///         reader.expect_magic(b"VER")?;
///         Ok(Version(reader.assert_u16(&[1, 2])?))
///     }
///
///     fn write(&self, writer: &mut BinaryWriter) -> Result<()> {
///         writer.write_bytes(b"VER");
///         writer.write_u16(self.0);
///         Ok(())
///     }
/// }
///
/// let bytes = serialize(&Version(2))?;
/// assert_eq!(parse::<Version>(&bytes)?, Version(2));
/// # Ok::<(), patchcord_format::Error>(())
/// ```
pub trait Format: Sized {
    /// Short human-readable name, used in errors and detection results.
    const NAME: &'static str;

    /// Cheap check of whether the data looks like this format.
    ///
    /// Takes the reader by shared reference, so it can only use the
    /// non-moving `get_*` / `peek_bytes` / `has_magic` accessors. Must return
    /// `false` instead of failing on truncated or garbage input.
    fn sniff(reader: &BinaryReader<'_>) -> bool;

    /// Read a model. The reader starts at offset 0 with a default context.
    fn read(reader: &mut BinaryReader<'_>) -> Result<Self>;

    /// Write the model. The writer starts empty with a default context.
    fn write(&self, writer: &mut BinaryWriter) -> Result<()>;
}

/// Run `F::sniff` over a byte buffer.
pub fn sniff<F: Format>(data: &[u8]) -> bool {
    F::sniff(&BinaryReader::new(data))
}

/// Read a complete `F` from `data`.
///
/// Fails if the module leaves step frames open.
pub fn parse<F: Format>(data: &[u8]) -> Result<F> {
    let mut reader = BinaryReader::new(data);
    let model = F::read(&mut reader).map_err(|err| {
        tracing::debug!(format = F::NAME, %err, "read failed");
        err
    })?;
    reader.finish()?;
    Ok(model)
}

/// Write `model` to a new buffer.
///
/// Fails if the module leaves a reservation unfilled or a step frame open.
pub fn serialize<F: Format>(model: &F) -> Result<Vec<u8>> {
    let mut writer = BinaryWriter::new();
    model.write(&mut writer).map_err(|err| {
        tracing::debug!(format = F::NAME, %err, "write failed");
        err
    })?;
    Ok(writer.finish()?)
}
