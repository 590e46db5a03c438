//! Format module interface for patchcord.
//!
//! A format module describes one binary file type as a [`Format`]
//! implementation: a cheap `sniff`, a `read` from a [`BinaryReader`] and a
//! `write` into a [`BinaryWriter`]. The drivers in this crate run the module
//! and then check that it left the cursor balanced:
//!
//! - [`parse`] - read a model and verify every step frame was closed
//! - [`serialize`] - write a model and verify every reservation was filled
//! - [`Registry`] - detect which registered format a buffer holds
//!
//! [`BinaryReader`]: patchcord_common::BinaryReader
//! [`BinaryWriter`]: patchcord_common::BinaryWriter

mod error;
mod format;
mod registry;

pub use error::{Error, Result};
pub use format::{parse, serialize, sniff, Format};
pub use registry::{Parsed, Registry};
