//! Conversion between raw member bytes and C string-literal fragments.
//!
//! A fragment is one or more adjacent quoted segments. Every line feed in the
//! content closes the current segment and opens a new one on the next source
//! line, so generated files stay line-oriented and diff cleanly:
//!
//! ```text
//! "<?xml version=\"1.0\"?>\n"
//!                 "<w:document/>"
//! ```
//!
//! The compiler concatenates adjacent segments, so the fragment denotes exactly
//! the original bytes plus the implicit NUL terminator. Lengths in generated
//! code are always `sizeof(literal) - 1`, which keeps embedded NUL bytes intact.

use crate::error::{EmbedError, Result};

/// Emitted for each line feed: close the segment, start an indented new one.
const LINE_BREAK: &str = "\\n\"\n                \"";

/// Escape `bytes` into a quoted C string-literal fragment.
///
/// Printable ASCII passes through unchanged apart from `"` and `\`. Line
/// feeds split the literal (see module docs), CR and TAB use their short
/// escapes, a `?` directly after another `?` is escaped so no trigraph can
/// form, and every other byte becomes a three-digit octal escape.
pub fn escape(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() + 2);
    out.push('"');

    let mut prev = 0u8;
    for &b in bytes {
        match b {
            b'\n' => out.push_str(LINE_BREAK),
            b'"' => out.push_str("\\\""),
            b'\\' => out.push_str("\\\\"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            b'?' if prev == b'?' => out.push_str("\\?"),
            0x20..=0x7e => out.push(b as char),
            _ => out.push_str(&format!("\\{b:03o}")),
        }
        prev = b;
    }

    out.push('"');
    out
}

/// Decode a fragment produced by [`escape`] (or any sequence of adjacent C
/// string literals separated by whitespace) back into raw bytes.
///
/// The implicit terminator is not included in the result.
pub fn unescape(fragment: &str) -> Result<Vec<u8>> {
    let src = fragment.as_bytes();
    let mut out = Vec::with_capacity(src.len());
    let mut i = 0;
    let mut segments = 0;

    while i < src.len() {
        if src[i].is_ascii_whitespace() {
            i += 1;
            continue;
        }
        if src[i] != b'"' {
            return Err(malformed(i, "expected opening quote"));
        }
        i += 1;
        segments += 1;

        loop {
            let Some(&b) = src.get(i) else {
                return Err(malformed(i, "unterminated segment"));
            };
            match b {
                b'"' => {
                    i += 1;
                    break;
                }
                b'\n' => return Err(malformed(i, "raw line feed inside segment")),
                b'\\' => {
                    let (byte, consumed) = decode_escape(src, i)?;
                    out.push(byte);
                    i += consumed;
                }
                _ => {
                    out.push(b);
                    i += 1;
                }
            }
        }
    }

    if segments == 0 {
        return Err(malformed(0, "no literal segments"));
    }
    Ok(out)
}

/// Decode the escape sequence starting at the backslash at `start`.
/// Returns the byte and the number of source bytes consumed.
fn decode_escape(src: &[u8], start: usize) -> Result<(u8, usize)> {
    let Some(&c) = src.get(start + 1) else {
        return Err(malformed(start, "dangling backslash"));
    };
    let simple = match c {
        b'"' => Some(b'"'),
        b'\'' => Some(b'\''),
        b'\\' => Some(b'\\'),
        b'?' => Some(b'?'),
        b'n' => Some(b'\n'),
        b'r' => Some(b'\r'),
        b't' => Some(b'\t'),
        b'a' => Some(0x07),
        b'b' => Some(0x08),
        b'f' => Some(0x0c),
        b'v' => Some(0x0b),
        _ => None,
    };
    if let Some(byte) = simple {
        return Ok((byte, 2));
    }

    if (b'0'..=b'7').contains(&c) {
        let mut value: u32 = 0;
        let mut digits = 0;
        while digits < 3 {
            match src.get(start + 1 + digits) {
                Some(&d) if (b'0'..=b'7').contains(&d) => {
                    value = value * 8 + u32::from(d - b'0');
                    digits += 1;
                }
                _ => break,
            }
        }
        let byte = u8::try_from(value).map_err(|_| malformed(start, "octal escape out of range"))?;
        return Ok((byte, 1 + digits));
    }

    Err(malformed(start, "unsupported escape sequence"))
}

fn malformed(offset: usize, reason: &'static str) -> EmbedError {
    EmbedError::MalformedLiteral { offset, reason }
}
