//! Format auto-detection.
//!
//! A [`Registry`] holds type-erased entry points for a set of formats and
//! probes a buffer against each one's `sniff` in registration order.

use std::any::Any;
use std::fmt;

use patchcord_common::BinaryReader;

use crate::{parse, Error, Format, Result};

type SniffFn = fn(&BinaryReader<'_>) -> bool;
type ParseFn = fn(&[u8]) -> Result<Box<dyn Any + Send>>;

#[derive(Clone, Copy)]
struct Entry {
    name: &'static str,
    sniff: SniffFn,
    parse: ParseFn,
}

fn parse_boxed<F: Format + Send + 'static>(data: &[u8]) -> Result<Box<dyn Any + Send>> {
    Ok(Box::new(parse::<F>(data)?))
}

/// A model produced by [`Registry::parse`], tagged with its format name.
pub struct Parsed {
    name: &'static str,
    model: Box<dyn Any + Send>,
}

impl Parsed {
    /// Name of the format that read the data.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether the model is an `F`.
    pub fn is<F: Format + 'static>(&self) -> bool {
        self.model.is::<F>()
    }

    /// Borrow the model as an `F`.
    pub fn downcast_ref<F: Format + 'static>(&self) -> Option<&F> {
        self.model.downcast_ref::<F>()
    }

    /// Take the model as an `F`, or get `self` back if it is another format.
    pub fn downcast<F: Format + 'static>(self) -> std::result::Result<F, Self> {
        match self.model.downcast::<F>() {
            Ok(model) => Ok(*model),
            Err(model) => Err(Self {
                name: self.name,
                model,
            }),
        }
    }
}

impl fmt::Debug for Parsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parsed").field("name", &self.name).finish_non_exhaustive()
    }
}

/// A set of formats to detect between.
///
/// # Example
///
/// ```
/// use patchcord_common::{BinaryReader, BinaryWriter};
/// use patchcord_format::{Format, Registry, Result};
///
/// struct Empty;
///
/// impl Format for Empty {
///     const NAME: &'static str = "empty";
///     fn sniff(reader: &BinaryReader<'_>) -> bool { reader.len() == 0 }
///     fn read(_: &mut BinaryReader<'_>) -> Result<Self> { Ok(Empty) }
///     fn write(&self, _: &mut BinaryWriter) -> Result<()> { Ok(()) }
/// }
///
/// let registry = Registry::new().with::<Empty>();
/// assert_eq!(registry.detect(&[]), Some("empty"));
/// assert_eq!(registry.detect(&[1]), None);
/// ```
#[derive(Clone, Default)]
pub struct Registry {
    entries: Vec<Entry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a format. Earlier registrations win when several formats match.
    pub fn register<F: Format + Send + 'static>(&mut self) -> &mut Self {
        self.entries.push(Entry {
            name: F::NAME,
            sniff: F::sniff,
            parse: parse_boxed::<F>,
        });
        self
    }

    /// Builder form of [`register`](Self::register).
    pub fn with<F: Format + Send + 'static>(mut self) -> Self {
        self.register::<F>();
        self
    }

    /// Names of the registered formats, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|entry| entry.name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| entry.name == name)
    }

    /// Name of the first format whose sniff accepts `data`.
    pub fn detect(&self, data: &[u8]) -> Option<&'static str> {
        self.matching(data).next().map(|entry| entry.name)
    }

    /// Names of every format whose sniff accepts `data`.
    pub fn candidates(&self, data: &[u8]) -> Vec<&'static str> {
        self.matching(data).map(|entry| entry.name).collect()
    }

    /// Detect the format of `data` and read it.
    pub fn parse(&self, data: &[u8]) -> Result<Parsed> {
        let entry = self.matching(data).next().ok_or(Error::Unrecognized)?;
        tracing::debug!(format = entry.name, len = data.len(), "detected format");
        let model = (entry.parse)(data)?;
        Ok(Parsed {
            name: entry.name,
            model,
        })
    }

    fn matching<'r>(&'r self, data: &'r [u8]) -> impl Iterator<Item = &'r Entry> + 'r {
        let reader = BinaryReader::new(data);
        self.entries.iter().filter(move |entry| {
            let hit = (entry.sniff)(&reader);
            debug_assert_eq!(reader.position(), 0);
            hit
        })
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use patchcord_common::BinaryWriter;

    use super::*;

    #[derive(Debug, PartialEq)]
    struct Alpha(u32);

    impl Format for Alpha {
        const NAME: &'static str = "alpha";

        fn sniff(reader: &BinaryReader<'_>) -> bool {
            reader.has_magic(0, b"AL")
        }

        fn read(reader: &mut BinaryReader<'_>) -> Result<Self> {
            reader.expect_magic(b"AL")?;
            Ok(Alpha(reader.read_u32()?))
        }

        fn write(&self, writer: &mut BinaryWriter) -> Result<()> {
            writer.write_bytes(b"AL");
            writer.write_u32(self.0);
            Ok(())
        }
    }

    /// Accepts anything that starts with 'A'.
    #[derive(Debug)]
    struct Loose;

    impl Format for Loose {
        const NAME: &'static str = "loose";

        fn sniff(reader: &BinaryReader<'_>) -> bool {
            reader.get_u8(0).map(|b| b == b'A').unwrap_or(false)
        }

        fn read(_reader: &mut BinaryReader<'_>) -> Result<Self> {
            Ok(Loose)
        }

        fn write(&self, _writer: &mut BinaryWriter) -> Result<()> {
            Ok(())
        }
    }

    fn registry() -> Registry {
        Registry::new().with::<Alpha>().with::<Loose>()
    }

    #[test]
    fn test_detect_in_registration_order() {
        let registry = registry();
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("loose"));
        assert_eq!(registry.detect(b"AL\x01\0\0\0"), Some("alpha"));
        assert_eq!(registry.candidates(b"AL\x01\0\0\0"), vec!["alpha", "loose"]);
        assert_eq!(registry.detect(b"AX"), Some("loose"));
    }

    #[test]
    fn test_sniff_tolerates_truncated_input() {
        let registry = registry();
        assert_eq!(registry.detect(&[]), None);
        assert_eq!(registry.detect(b"Z"), None);
        assert!(registry.candidates(b"A").contains(&"loose"));
    }

    #[test]
    fn test_parse_and_downcast() {
        let registry = registry();
        let parsed = registry.parse(b"AL\x2A\0\0\0").unwrap();
        assert_eq!(parsed.name(), "alpha");
        assert!(parsed.is::<Alpha>());
        assert!(parsed.downcast_ref::<Loose>().is_none());
        let parsed = parsed.downcast::<Loose>().unwrap_err();
        assert_eq!(parsed.downcast::<Alpha>().unwrap(), Alpha(42));
    }

    #[test]
    fn test_parse_unrecognized() {
        assert!(matches!(registry().parse(b"??"), Err(Error::Unrecognized)));
    }

    #[test]
    fn test_parse_truncated_after_sniff() {
        // Sniffs as alpha but the payload is short.
        let err = registry().parse(b"AL\x01").unwrap_err();
        assert!(matches!(
            err,
            Error::Common(patchcord_common::Error::UnexpectedEof { offset: 2, .. })
        ));
    }
}
