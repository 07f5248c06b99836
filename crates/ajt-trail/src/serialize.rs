//! Single-line JSON serialization.
//!
//! Output is compact JSON with no trailing newline. With
//! [`Encoding::Ascii`] every non-ASCII character is written as a `\uXXXX`
//! escape (UTF-16 surrogate pairs above the BMP); with [`Encoding::Utf8`]
//! text is written as-is.

use serde::Serialize;
use serde_json::ser::{CompactFormatter, Formatter, Serializer};
use std::io::{self, Write};

use crate::error::TrailError;
use crate::event::JudgmentEvent;
use ajt_core::Encoding;

/// Serialize a judgment event to one JSON line.
pub fn to_line(event: &JudgmentEvent, encoding: Encoding) -> Result<String, TrailError> {
    to_json_string(event, encoding)
}

/// Serialize any value compactly with the given encoding.
pub fn to_json_string<T: Serialize + ?Sized>(
    value: &T,
    encoding: Encoding,
) -> Result<String, TrailError> {
    let bytes = to_json_vec(value, encoding)?;
    String::from_utf8(bytes)
        .map_err(|e| TrailError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}

/// Serialize any value compactly with the given encoding, as bytes.
pub fn to_json_vec<T: Serialize + ?Sized>(
    value: &T,
    encoding: Encoding,
) -> Result<Vec<u8>, TrailError> {
    let mut buf = Vec::with_capacity(256);
    match encoding {
        Encoding::Utf8 => {
            let mut ser = Serializer::with_formatter(&mut buf, CompactFormatter);
            value.serialize(&mut ser)?;
        }
        Encoding::Ascii => {
            let mut ser = Serializer::with_formatter(&mut buf, AsciiFormatter);
            value.serialize(&mut ser)?;
        }
    }
    Ok(buf)
}

/// Compact formatter that escapes non-ASCII characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsciiFormatter;

impl Formatter for AsciiFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        let mut start = 0;
        for (idx, ch) in fragment.char_indices() {
            if ch.is_ascii() {
                continue;
            }
            writer.write_all(fragment[start..idx].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = idx + ch.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}

/// RFC 3339 timestamps with microsecond precision and a `+00:00` offset.
pub(crate) mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, de};

    pub fn format(ts: &DateTime<Utc>) -> String {
        ts.to_rfc3339_opts(SecondsFormat::Micros, false)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(de::Error::custom)
    }
}
