//! Order-preserving tuple encoding.
//!
//! A [`Tuple`] is an immutable, ordered sequence of typed [`Element`]s. Packing
//! a tuple yields a byte string whose lexicographic order matches the order of
//! the tuple itself, so tuples can be used directly as keys in an ordered
//! keyspace and scanned by prefix.
//!
//! The byte format is the [FoundationDB tuple layer format](
//! https://github.com/apple/foundationdb/blob/main/design/tuple.md). It is a
//! format, not an implementation detail: two encoders must produce identical
//! bytes for the same logical tuple.
//!
//! # Type Codes
//!
//! | Code | Element | Payload |
//! |------|---------|---------|
//! | 0x00 | `Null` | none (`0x00 0xFF` inside a nested tuple) |
//! | 0x01 | `Bytes` | raw bytes, 0x00 escaped as 0x00 0xFF, then 0x00 |
//! | 0x02 | `String` | UTF-8 bytes, escaped and terminated like `Bytes` |
//! | 0x05 | `Tuple` | nested elements, then 0x00 |
//! | 0x0C..=0x13 | `Int` < 0 | `0x14 - code` bytes, one's complement of the magnitude |
//! | 0x14 | `Int(0)` | none |
//! | 0x15..=0x1C | `Int` / `UInt` > 0 | `code - 0x14` big-endian bytes |
//! | 0x20 | `Float` | 4 order-transformed IEEE-754 bytes |
//! | 0x21 | `Double` | 8 order-transformed IEEE-754 bytes |
//! | 0x26 / 0x27 | `Bool` | none |
//!
//! # Integer Encoding
//!
//! - Zero: single byte 0x14
//! - Positive: 0x14 + size_in_bytes, then the big-endian magnitude
//! - Negative: 0x14 - size_in_bytes, then the one's complement of the magnitude
//!
//! A longer magnitude always gets a code further from 0x14, so the code byte
//! alone already orders integers of different sizes.
//!
//! # Example
//!
//! ```
//! use keyspace_layer::{tuple, Tuple};
//!
//! let key = tuple!("users", 42i64, "profile");
//! let packed = key.pack();
//!
//! assert_eq!(Tuple::unpack(&packed).unwrap(), key);
//! assert!(tuple!("users", 41i64).pack() < packed);
//! ```

mod convert;
mod decoding;
mod element;
mod encoding;
mod tuple_type;


pub use convert::FromElement;
pub use element::Element;
use snafu::Snafu;
pub use tuple_type::IntoTuple;
pub use tuple_type::Tuple;

// Type codes. Their relative order fixes the cross-type sort order.

const NULL_CODE: u8 = 0x00;
const BYTES_CODE: u8 = 0x01;
const STRING_CODE: u8 = 0x02;
const NESTED_CODE: u8 = 0x05;
/// Negative integer with an 8-byte magnitude; codes up to 0x13 use fewer bytes.
const NEG_INT_MIN_CODE: u8 = 0x0C;
/// Integer zero, and the pivot the other integer codes are measured from.
const INT_ZERO_CODE: u8 = 0x14;
/// Positive integer with an 8-byte magnitude.
const POS_INT_MAX_CODE: u8 = 0x1C;
const FLOAT_CODE: u8 = 0x20;
const DOUBLE_CODE: u8 = 0x21;
const FALSE_CODE: u8 = 0x26;
const TRUE_CODE: u8 = 0x27;

/// Ends byte strings, strings and nested tuples.
const TERMINATOR: u8 = 0x00;

/// Follows a 0x00 that is data rather than a terminator.
const NULL_ESCAPE: u8 = 0xFF;

/// Errors raised by tuple construction, access, encoding and decoding.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TupleError {
    /// Positional access outside `[-len, len - 1]`.
    #[snafu(display("index {index} out of range for tuple of length {len}"))]
    IndexOutOfRange {
        /// Requested index (negative indices count from the end).
        index: isize,
        /// Length of the tuple.
        len: usize,
    },

    /// The stored element cannot be represented as the requested type.
    #[snafu(display("cannot convert {from} element to {to}"))]
    Conversion {
        /// Kind of the stored element.
        from: &'static str,
        /// Requested Rust type.
        to: &'static str,
    },

    /// The value has no encoding in the tuple format.
    #[snafu(display("unsupported value of type {type_name}: {reason}"))]
    UnsupportedType {
        /// Rust type of the rejected value.
        type_name: &'static str,
        /// Why the value was rejected.
        reason: &'static str,
    },

    /// The input ends inside an element.
    #[snafu(display("input ends inside element at offset {offset}"))]
    UnexpectedEnd {
        /// Offset of the truncated element.
        offset: usize,
    },

    /// A byte that should start an element is not a known type code.
    #[snafu(display("byte 0x{code:02X} at offset {offset} is not a type code"))]
    UnknownTypeCode {
        /// The offending byte.
        code: u8,
        /// Where it was found.
        offset: usize,
    },

    /// A string element holds bytes that are not UTF-8.
    #[snafu(display("string at offset {offset} is not UTF-8: {source}"))]
    InvalidUtf8 {
        /// Offset of the string element.
        offset: usize,
        /// Where the UTF-8 check failed.
        source: std::str::Utf8Error,
    },

    /// A byte string or string runs to the end of input without its terminator.
    #[snafu(display("unterminated payload starting at offset {offset}"))]
    MissingTerminator {
        /// First payload byte.
        offset: usize,
    },

    /// Integer magnitude does not fit any supported integer type.
    #[snafu(display("integer at offset {offset} does not fit 64 bits"))]
    IntegerOverflow {
        /// Offset of the integer element.
        offset: usize,
    },

    /// A nested tuple runs to the end of input without its terminator.
    #[snafu(display("nested tuple starting at offset {offset} has no terminator"))]
    UnterminatedNested {
        /// First byte after the nested type code.
        offset: usize,
    },
}

impl TupleError {
    /// Whether this error means the input bytes are not a valid encoding.
    ///
    /// Storage callers use this to tell data corruption or format skew apart
    /// from programming errors such as a bad index or conversion.
    pub fn is_malformed(&self) -> bool {
        !matches!(
            self,
            TupleError::IndexOutOfRange { .. } | TupleError::Conversion { .. } | TupleError::UnsupportedType { .. }
        )
    }

    /// Byte offset of a decode failure, if this is one.
    pub fn offset(&self) -> Option<usize> {
        match self {
            TupleError::UnexpectedEnd { offset }
            | TupleError::UnknownTypeCode { offset, .. }
            | TupleError::InvalidUtf8 { offset, .. }
            | TupleError::MissingTerminator { offset }
            | TupleError::IntegerOverflow { offset }
            | TupleError::UnterminatedNested { offset } => Some(*offset),
            TupleError::IndexOutOfRange { .. } | TupleError::Conversion { .. } | TupleError::UnsupportedType { .. } => {
                None
            }
        }
    }
}

/// Result type for tuple operations.
pub type TupleResult<T> = Result<T, TupleError>;

/// Build a [`Tuple`] from a list of values convertible into [`Element`].
///
/// ```
/// use keyspace_layer::{tuple, Element};
///
/// let t = tuple!("orders", 7u32, ());
/// assert_eq!(t.len(), 3);
/// assert_eq!(t.get(-1).unwrap(), &Element::Null);
/// ```
#[macro_export]
macro_rules! tuple {
    () => {
        $crate::Tuple::new()
    };
    ($($value:expr),+ $(,)?) => {
        $crate::Tuple::from_elements(::std::vec![$($crate::Element::from($value)),+])
    };
}
