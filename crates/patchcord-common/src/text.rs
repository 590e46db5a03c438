//! Text encodings used by string fields.
//!
//! These are leaf helpers: the cursors locate the bytes, this module turns
//! them into `String`s and back.

use std::fmt;

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::{Endian, Error, Result};

/// Character encoding of a string field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Encoding {
    /// 7-bit ASCII, one byte per character.
    #[default]
    Ascii,
    /// Shift-JIS, one or two bytes per character.
    ShiftJis,
    /// UTF-16 in the cursor's byte order.
    Utf16,
}

impl Encoding {
    /// Size of one code unit (and of the null terminator).
    #[inline]
    pub const fn unit_size(self) -> usize {
        match self {
            Encoding::Ascii | Encoding::ShiftJis => 1,
            Encoding::Utf16 => 2,
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Encoding::Ascii => "ASCII",
            Encoding::ShiftJis => "Shift-JIS",
            Encoding::Utf16 => "UTF-16",
        })
    }
}

/// Byte length of the string before its null terminator, if there is one.
pub fn find_terminator(bytes: &[u8], encoding: Encoding) -> Option<usize> {
    match encoding {
        Encoding::Ascii | Encoding::ShiftJis => memchr::memchr(0, bytes),
        Encoding::Utf16 => bytes
            .chunks_exact(2)
            .position(|unit| unit == [0, 0])
            .map(|units| units * 2),
    }
}

/// Decode `bytes` (without terminator). `offset` is only used for errors.
pub fn decode(bytes: &[u8], encoding: Encoding, endian: Endian, offset: usize) -> Result<String> {
    let invalid = || Error::InvalidText { offset, encoding };

    match encoding {
        Encoding::Ascii => {
            if !bytes.is_ascii() {
                return Err(invalid());
            }
            std::str::from_utf8(bytes)
                .map(str::to_owned)
                .map_err(|_| invalid())
        }
        Encoding::ShiftJis => encoding_rs::SHIFT_JIS
            .decode_without_bom_handling_and_without_replacement(bytes)
            .map(|s| s.into_owned())
            .ok_or_else(invalid),
        Encoding::Utf16 => {
            if bytes.len() % 2 != 0 {
                return Err(invalid());
            }
            let units = bytes.chunks_exact(2).map(|unit| match endian {
                Endian::Little => LittleEndian::read_u16(unit),
                Endian::Big => BigEndian::read_u16(unit),
            });
            char::decode_utf16(units)
                .collect::<std::result::Result<String, _>>()
                .map_err(|_| invalid())
        }
    }
}

/// Encode `text` without a terminator.
pub fn encode(text: &str, encoding: Encoding, endian: Endian) -> Result<Vec<u8>> {
    match encoding {
        Encoding::Ascii => {
            if !text.is_ascii() {
                return Err(Error::UnencodableText { encoding });
            }
            Ok(text.as_bytes().to_vec())
        }
        Encoding::ShiftJis => {
            let (bytes, _, had_errors) = encoding_rs::SHIFT_JIS.encode(text);
            if had_errors {
                return Err(Error::UnencodableText { encoding });
            }
            Ok(bytes.into_owned())
        }
        Encoding::Utf16 => {
            let mut out = Vec::with_capacity(text.len() * 2);
            for unit in text.encode_utf16() {
                let mut buf = [0u8; 2];
                match endian {
                    Endian::Little => LittleEndian::write_u16(&mut buf, unit),
                    Endian::Big => BigEndian::write_u16(&mut buf, unit),
                }
                out.extend_from_slice(&buf);
            }
            Ok(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_rejects_high_bytes() {
        assert_eq!(decode(b"abc", Encoding::Ascii, Endian::Little, 0).unwrap(), "abc");
        assert!(matches!(
            decode(&[0x61, 0xE9], Encoding::Ascii, Endian::Little, 4),
            Err(Error::InvalidText { offset: 4, .. })
        ));
        assert!(matches!(
            encode("café", Encoding::Ascii, Endian::Little),
            Err(Error::UnencodableText { .. })
        ));
    }

    #[test]
    fn test_shift_jis() {
        // "テスト"
        let bytes = [0x83, 0x65, 0x83, 0x58, 0x83, 0x67];
        assert_eq!(decode(&bytes, Encoding::ShiftJis, Endian::Big, 0).unwrap(), "テスト");
        assert_eq!(encode("テスト", Encoding::ShiftJis, Endian::Big).unwrap(), bytes);
    }

    #[test]
    fn test_utf16_follows_endianness() {
        assert_eq!(encode("Hi", Encoding::Utf16, Endian::Little).unwrap(), [0x48, 0, 0x69, 0]);
        assert_eq!(encode("Hi", Encoding::Utf16, Endian::Big).unwrap(), [0, 0x48, 0, 0x69]);
        assert_eq!(decode(&[0, 0x48, 0, 0x69], Encoding::Utf16, Endian::Big, 0).unwrap(), "Hi");
    }

    #[test]
    fn test_find_terminator() {
        assert_eq!(find_terminator(b"abc\0def", Encoding::Ascii), Some(3));
        assert_eq!(find_terminator(b"abc", Encoding::ShiftJis), None);
        // A zero high byte must not be mistaken for a terminator.
        assert_eq!(find_terminator(&[0x48, 0x00, 0x00, 0x00], Encoding::Utf16), Some(2));
        assert_eq!(find_terminator(&[0x00, 0x48, 0x00, 0x00], Encoding::Utf16), Some(2));
    }
}
