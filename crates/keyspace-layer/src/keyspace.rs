//! Raw key construction and range-boundary arithmetic.
//!
//! These helpers work on plain byte strings and know nothing about the tuple
//! encoding. They are used alongside it to build scan ranges: a packed tuple
//! gives the inclusive start of a range, [`successor`] or [`strinc`] gives the
//! exclusive end.
//!
//! # Successor vs strinc
//!
//! Both return a key strictly greater than their input, but differ on trailing
//! `0xFF` bytes:
//!
//! | Input | `successor` | `strinc` |
//! |-------|-------------|----------|
//! | `[]` | `[00]` | overflow |
//! | `[01 02]` | `[01 03]` | `[01 03]` |
//! | `[01 FF]` | `[02 00]` | `[02]` |
//! | `[FF FF]` | overflow | overflow |
//!
//! `successor` keeps the length and carries like big-endian addition.
//! `strinc` yields the smallest key greater than every key prefixed by the
//! input, which is the right exclusive end for a prefix scan.

use snafu::ResultExt;
use snafu::Snafu;

/// Smallest possible key (`0x00`).
pub const MIN_KEY: &[u8] = &[0x00];

/// Largest user key (`0xFF`); keys at or above it are reserved.
pub const MAX_KEY: &[u8] = &[0xFF];

/// Errors raised by key construction and range arithmetic.
#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum KeyError {
    /// The key is missing or empty where a non-empty key is required.
    #[snafu(display("invalid key: {reason}"))]
    InvalidKey {
        /// What was wrong with the key.
        reason: &'static str,
    },

    /// An argument violates the function's contract.
    #[snafu(display("invalid argument: {reason}"))]
    InvalidArgument {
        /// What was wrong with the argument.
        reason: String,
    },

    /// Key bytes are not valid UTF-8 text.
    #[snafu(display("key is not valid UTF-8"))]
    InvalidUtf8 {
        /// Decoder error, carrying the offset of the first invalid byte.
        source: std::str::Utf8Error,
    },

    /// No greater key exists under the requested scheme.
    #[snafu(display("key {key:02X?} has no successor"))]
    Overflow {
        /// The key that could not be incremented.
        key: Vec<u8>,
    },
}

/// Result type for key operations.
pub type KeyResult<T> = Result<T, KeyError>;

/// How text is turned into key bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// One byte per character, keeping the low 8 bits of each code point.
    ///
    /// Lossy for anything outside Latin-1; use [`TextEncoding::Utf8`] when
    /// the text may contain such characters.
    ///
    /// Truncation is per Unicode scalar value, so a character outside the
    /// Basic Multilingual Plane yields one byte. FoundationDB's .NET binding
    /// truncates UTF-16 code units instead and yields two bytes for it
    /// ("😀" becomes `[00]`, where the .NET binding produces `[3D 00]`).
    Ascii,
    /// Standard UTF-8 bytes.
    Utf8,
}

/// Build a key from text.
pub fn from_text(text: &str, encoding: TextEncoding) -> KeyResult<Vec<u8>> {
    if text.is_empty() {
        return Err(KeyError::InvalidKey {
            reason: "key text cannot be empty",
        });
    }
    Ok(match encoding {
        TextEncoding::Ascii => text.chars().map(|c| (u32::from(c) & 0xFF) as u8).collect(),
        TextEncoding::Utf8 => text.as_bytes().to_vec(),
    })
}

/// Build a key with one byte per character. See [`TextEncoding::Ascii`].
pub fn from_ascii(text: &str) -> KeyResult<Vec<u8>> {
    from_text(text, TextEncoding::Ascii)
}

/// Build a key from the UTF-8 bytes of `text`.
pub fn from_utf8(text: &str) -> KeyResult<Vec<u8>> {
    from_text(text, TextEncoding::Utf8)
}

/// Text of a key built with [`TextEncoding::Ascii`]: one character per byte.
///
/// Every byte maps to the code point of the same value, so this is the
/// inverse of [`from_ascii`] for Latin-1 text.
pub fn to_ascii(key: &[u8]) -> String {
    key.iter().map(|&b| char::from(b)).collect()
}

/// Text of a key built with [`TextEncoding::Utf8`].
///
/// # Errors
///
/// [`KeyError::InvalidUtf8`] when `key` is not valid UTF-8.
pub fn to_utf8(key: &[u8]) -> KeyResult<String> {
    let text = std::str::from_utf8(key).context(InvalidUtf8Snafu)?;
    Ok(text.to_owned())
}

/// Build a key by copying a non-empty buffer.
pub fn from_bytes(buffer: &[u8]) -> KeyResult<Vec<u8>> {
    if buffer.is_empty() {
        return Err(KeyError::InvalidKey {
            reason: "key buffer cannot be empty",
        });
    }
    Ok(buffer.to_vec())
}

/// Build a key from `count` bytes of `buffer` starting at `offset`.
pub fn from_bytes_range(buffer: &[u8], offset: usize, count: usize) -> KeyResult<Vec<u8>> {
    if count == 0 {
        return Err(KeyError::InvalidKey {
            reason: "key byte count cannot be zero",
        });
    }
    offset
        .checked_add(count)
        .and_then(|end| buffer.get(offset..end))
        .map(<[u8]>::to_vec)
        .ok_or_else(|| KeyError::InvalidArgument {
            reason: format!("window {offset}+{count} exceeds buffer of {} bytes", buffer.len()),
        })
}

/// The smallest key of the same length that is greater than `key`.
///
/// Treats the key as a big-endian number and adds one, carrying through
/// trailing `0xFF` bytes (`[01 FF]` becomes `[02 00]`). The empty key's
/// successor is `[00]`.
///
/// # Errors
///
/// - [`KeyError::InvalidKey`] when `key` is `None`.
/// - [`KeyError::Overflow`] when every byte is already `0xFF`.
pub fn successor(key: Option<&[u8]>) -> KeyResult<Vec<u8>> {
    let Some(key) = key else {
        return Err(KeyError::InvalidKey {
            reason: "cannot increment an absent key",
        });
    };

    if key.is_empty() {
        return Ok(MIN_KEY.to_vec());
    }

    let mut next = key.to_vec();
    for byte in next.iter_mut().rev() {
        if *byte == 0xFF {
            *byte = 0x00;
        } else {
            *byte += 1;
            return Ok(next);
        }
    }

    Err(KeyError::Overflow { key: key.to_vec() })
}

/// The smallest key greater than every key that starts with `prefix`.
///
/// Drops trailing `0xFF` bytes and increments the last remaining byte
/// (`[01 FF]` becomes `[02]`).
///
/// # Errors
///
/// [`KeyError::Overflow`] when `prefix` is empty or made only of `0xFF` bytes.
pub fn strinc(prefix: &[u8]) -> KeyResult<Vec<u8>> {
    match prefix.iter().rposition(|&b| b != 0xFF) {
        Some(last) => {
            let mut next = prefix[..=last].to_vec();
            next[last] += 1;
            Ok(next)
        }
        None => Err(KeyError::Overflow { key: prefix.to_vec() }),
    }
}

/// Split a buffer holding contiguous segments into borrowed views.
///
/// The first segment starts at `start`; each entry of `cut_offsets` is the
/// exclusive end of one segment and the start of the next.
///
/// ```
/// use keyspace_layer::keyspace::split_segments;
///
/// let parts = split_segments(b"HelloWorld", 0, &[5, 10]).unwrap();
/// assert_eq!(parts, vec![&b"Hello"[..], &b"World"[..]]);
/// ```
///
/// # Errors
///
/// [`KeyError::InvalidArgument`] when a cut precedes the previous one (or
/// `start`), or lies beyond the end of `buffer`.
pub fn split_segments<'a>(buffer: &'a [u8], start: usize, cut_offsets: &[usize]) -> KeyResult<Vec<&'a [u8]>> {
    if start > buffer.len() {
        return Err(KeyError::InvalidArgument {
            reason: format!("start {start} exceeds buffer of {} bytes", buffer.len()),
        });
    }

    let mut segments = Vec::with_capacity(cut_offsets.len());
    let mut cursor = start;
    for &end in cut_offsets {
        if end < cursor || end > buffer.len() {
            return Err(KeyError::InvalidArgument {
                reason: format!("cut {end} outside {cursor}..={}", buffer.len()),
            });
        }
        segments.push(&buffer[cursor..end]);
        cursor = end;
    }
    Ok(segments)
}
