use std::cmp::Ordering;
use std::fmt;
use std::hash::Hash;
use std::hash::Hasher;

use super::BYTES_CODE;
use super::DOUBLE_CODE;
use super::FALSE_CODE;
use super::FLOAT_CODE;
use super::INT_ZERO_CODE;
use super::NESTED_CODE;
use super::NULL_CODE;
use super::STRING_CODE;
use super::TupleError;
use super::decoding::decode_element;
use super::encoding::order_bits_32;
use super::encoding::order_bits_64;
use super::tuple_type::Tuple;

/// One typed value inside a [`Tuple`].
///
/// Integers carry a signedness tag so that values built from unsigned Rust
/// types keep their full range. Equality and hashing look at the value, not
/// the tag: `Int(5)` equals `UInt(5)` and both hash the same, matching the
/// fact that they pack to identical bytes.
///
/// Ordering matches the lexicographic ordering of the packed bytes.
#[derive(Debug, Clone)]
pub enum Element {
    /// Absent value; sorts before every other kind.
    Null,

    /// Byte string.
    Bytes(Vec<u8>),

    /// UTF-8 string.
    String(String),

    /// Signed integer.
    Int(i64),

    /// Unsigned integer, used for values built from unsigned Rust types.
    UInt(u64),

    /// Boolean value.
    Bool(bool),

    /// Single-precision float.
    Float(f32),

    /// Double-precision float.
    Double(f64),

    /// Nested tuple, boxed because `Tuple` stores small arities inline.
    Tuple(Box<Tuple>),
}

impl Element {
    /// Short name of the element's kind, used in conversion errors and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Element::Null => "null",
            Element::Bytes(_) => "bytes",
            Element::String(_) => "string",
            Element::Int(_) | Element::UInt(_) => "integer",
            Element::Bool(_) => "bool",
            Element::Float(_) => "float",
            Element::Double(_) => "double",
            Element::Tuple(_) => "tuple",
        }
    }

    /// Whether this element is [`Element::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Element::Null)
    }

    /// The integer value widened to `i128`, if this is an integer element.
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Element::Int(n) => Some(i128::from(*n)),
            Element::UInt(n) => Some(i128::from(*n)),
            _ => None,
        }
    }

    /// Encode this element on its own.
    pub fn pack(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.pack_into(&mut buf);
        buf
    }

    /// Decode one element starting at `offset`.
    ///
    /// Returns the element and the number of bytes it occupied, so callers can
    /// walk a concatenation of encodings.
    pub fn unpack_from(data: &[u8], offset: usize) -> Result<(Element, usize), TupleError> {
        decode_element(data, offset)
    }

    /// Position of this element's kind in the type-code table.
    ///
    /// Integers of either tag share one rank and order among themselves by value.
    fn kind_rank(&self) -> u8 {
        match self {
            Element::Null => NULL_CODE,
            Element::Bytes(_) => BYTES_CODE,
            Element::String(_) => STRING_CODE,
            Element::Tuple(_) => NESTED_CODE,
            Element::Int(_) | Element::UInt(_) => INT_ZERO_CODE,
            Element::Float(_) => FLOAT_CODE,
            Element::Double(_) => DOUBLE_CODE,
            Element::Bool(_) => FALSE_CODE,
        }
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Element::Null, Element::Null) => true,
            (Element::Bytes(a), Element::Bytes(b)) => a == b,
            (Element::String(a), Element::String(b)) => a == b,
            (Element::Bool(a), Element::Bool(b)) => a == b,
            // Bit equality keeps NaN reflexive and -0.0 distinct from 0.0,
            // in line with their encodings.
            (Element::Float(a), Element::Float(b)) => a.to_bits() == b.to_bits(),
            (Element::Double(a), Element::Double(b)) => a.to_bits() == b.to_bits(),
            (Element::Tuple(a), Element::Tuple(b)) => a == b,
            (a, b) => match (a.as_i128(), b.as_i128()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
        }
    }
}

impl Eq for Element {}

impl Hash for Element {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Element::Null => state.write_u8(0),
            Element::Bytes(b) => {
                state.write_u8(1);
                b.hash(state);
            }
            Element::String(s) => {
                state.write_u8(2);
                s.hash(state);
            }
            Element::Int(_) | Element::UInt(_) => {
                state.write_u8(3);
                if let Some(n) = self.as_i128() {
                    state.write_i128(n);
                }
            }
            Element::Bool(b) => {
                state.write_u8(4);
                b.hash(state);
            }
            Element::Float(f) => {
                state.write_u8(5);
                state.write_u32(f.to_bits());
            }
            Element::Double(d) => {
                state.write_u8(6);
                state.write_u64(d.to_bits());
            }
            Element::Tuple(t) => {
                state.write_u8(7);
                t.hash(state);
            }
        }
    }
}

impl PartialOrd for Element {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Element {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Element::Bytes(a), Element::Bytes(b)) => a.cmp(b),
            (Element::String(a), Element::String(b)) => a.as_bytes().cmp(b.as_bytes()),
            (Element::Tuple(a), Element::Tuple(b)) => a.cmp(b),
            (Element::Float(a), Element::Float(b)) => order_bits_32(a.to_bits()).cmp(&order_bits_32(b.to_bits())),
            (Element::Double(a), Element::Double(b)) => order_bits_64(a.to_bits()).cmp(&order_bits_64(b.to_bits())),
            (Element::Bool(a), Element::Bool(b)) => a.cmp(b),
            (a, b) => match (a.as_i128(), b.as_i128()) {
                (Some(x), Some(y)) => x.cmp(&y),
                _ => a.kind_rank().cmp(&b.kind_rank()),
            },
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Null => f.write_str("null"),
            Element::Bytes(bytes) => {
                f.write_str("b\"")?;
                for &b in bytes {
                    write!(f, "{}", std::ascii::escape_default(b))?;
                }
                f.write_str("\"")
            }
            Element::String(s) => write!(f, "{s:?}"),
            Element::Int(n) => write!(f, "{n}"),
            Element::UInt(n) => write!(f, "{n}"),
            Element::Bool(b) => write!(f, "{b}"),
            Element::Float(x) => write!(f, "{x:?}"),
            Element::Double(x) => write!(f, "{x:?}"),
            Element::Tuple(t) => write!(f, "{t}"),
        }
    }
}

// Conversions into Element

impl From<()> for Element {
    fn from(_: ()) -> Self {
        Element::Null
    }
}

impl From<Vec<u8>> for Element {
    fn from(v: Vec<u8>) -> Self {
        Element::Bytes(v)
    }
}

impl From<&[u8]> for Element {
    fn from(v: &[u8]) -> Self {
        Element::Bytes(v.to_vec())
    }
}

impl<const N: usize> From<[u8; N]> for Element {
    fn from(v: [u8; N]) -> Self {
        Element::Bytes(v.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for Element {
    fn from(v: &[u8; N]) -> Self {
        Element::Bytes(v.to_vec())
    }
}

impl From<String> for Element {
    fn from(s: String) -> Self {
        Element::String(s)
    }
}

impl From<&str> for Element {
    fn from(s: &str) -> Self {
        Element::String(s.to_string())
    }
}

impl From<&String> for Element {
    fn from(s: &String) -> Self {
        Element::String(s.clone())
    }
}

macro_rules! impl_from_signed {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Element {
                fn from(n: $ty) -> Self {
                    Element::Int(i64::from(n))
                }
            }
        )*
    };
}

macro_rules! impl_from_unsigned {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Element {
                fn from(n: $ty) -> Self {
                    Element::UInt(u64::from(n))
                }
            }
        )*
    };
}

impl_from_signed!(i8, i16, i32, i64);
impl_from_unsigned!(u8, u16, u32, u64);

impl From<isize> for Element {
    fn from(n: isize) -> Self {
        // isize is at most 64 bits on every supported target.
        Element::Int(n as i64)
    }
}

impl From<usize> for Element {
    fn from(n: usize) -> Self {
        Element::UInt(n as u64)
    }
}

impl TryFrom<i128> for Element {
    type Error = TupleError;

    fn try_from(n: i128) -> Result<Self, Self::Error> {
        if let Ok(v) = i64::try_from(n) {
            return Ok(Element::Int(v));
        }
        match u64::try_from(n) {
            Ok(v) => Ok(Element::UInt(v)),
            Err(_) => Err(TupleError::UnsupportedType {
                type_name: "i128",
                reason: "magnitude exceeds 64 bits",
            }),
        }
    }
}

impl TryFrom<u128> for Element {
    type Error = TupleError;

    fn try_from(n: u128) -> Result<Self, Self::Error> {
        u64::try_from(n).map(Element::UInt).map_err(|_| TupleError::UnsupportedType {
            type_name: "u128",
            reason: "magnitude exceeds 64 bits",
        })
    }
}

impl From<bool> for Element {
    fn from(b: bool) -> Self {
        Element::Bool(b)
    }
}

impl From<f32> for Element {
    fn from(f: f32) -> Self {
        Element::Float(f)
    }
}

impl From<f64> for Element {
    fn from(f: f64) -> Self {
        Element::Double(f)
    }
}

impl From<Tuple> for Element {
    fn from(t: Tuple) -> Self {
        Element::Tuple(Box::new(t))
    }
}

impl<T: Into<Element>> From<Option<T>> for Element {
    fn from(value: Option<T>) -> Self {
        value.map_or(Element::Null, Into::into)
    }
}
