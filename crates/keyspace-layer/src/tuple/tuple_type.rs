use std::cmp::Ordering;
use std::fmt;
use std::hash::Hash;
use std::hash::Hasher;

use tracing::debug;

use super::TupleError;
use super::convert::FromElement;
use super::decoding::decode_tuple;
use super::element::Element;
use crate::keyspace;
use crate::keyspace::KeyError;

/// Element storage, specialized by arity.
///
/// Keys of two to four elements are by far the most common, so those arities
/// live in fixed arrays; everything else uses a `Vec`. A given length always
/// maps to the same variant.
#[derive(Clone)]
enum Repr {
    Pair([Element; 2]),
    Triple([Element; 3]),
    Quad([Element; 4]),
    List(Vec<Element>),
}

impl Repr {
    fn from_vec(elements: Vec<Element>) -> Self {
        match elements.len() {
            2 => <[Element; 2]>::try_from(elements).map_or_else(Repr::List, Repr::Pair),
            3 => <[Element; 3]>::try_from(elements).map_or_else(Repr::List, Repr::Triple),
            4 => <[Element; 4]>::try_from(elements).map_or_else(Repr::List, Repr::Quad),
            _ => Repr::List(elements),
        }
    }

    fn as_slice(&self) -> &[Element] {
        match self {
            Repr::Pair(items) => items,
            Repr::Triple(items) => items,
            Repr::Quad(items) => items,
            Repr::List(items) => items,
        }
    }

    fn into_vec(self) -> Vec<Element> {
        match self {
            Repr::Pair(items) => items.into(),
            Repr::Triple(items) => items.into(),
            Repr::Quad(items) => items.into(),
            Repr::List(items) => items,
        }
    }
}

/// An immutable, ordered collection of typed elements that can be packed into bytes.
///
/// Packing a tuple gives a key whose byte order is the tuple's element-wise
/// order, and a tuple that is a strict prefix of another sorts before it.
///
/// Indices may be negative: `-1` is the last element, `-len` the first.
///
/// # Example
///
/// ```
/// use keyspace_layer::Tuple;
///
/// let alice = Tuple::new().push("accounts").push(1i64);
/// let bob = alice.slice(None, Some(-1)).append(2i64);
///
/// assert!(alice.pack() < bob.pack());
/// assert_eq!(bob.last::<i64>().unwrap(), 2);
/// ```
#[derive(Clone)]
pub struct Tuple {
    repr: Repr,
}

impl Tuple {
    /// The empty tuple.
    pub fn new() -> Self {
        Self {
            repr: Repr::List(Vec::new()),
        }
    }

    /// Create a tuple holding exactly `elements`, in order.
    pub fn from_elements(elements: Vec<Element>) -> Self {
        Self {
            repr: Repr::from_vec(elements),
        }
    }

    /// Create a tuple from a Rust tuple of up to four values.
    ///
    /// ```
    /// use keyspace_layer::Tuple;
    ///
    /// let t = Tuple::of(("orders", 17u32, true));
    /// assert_eq!(t.len(), 3);
    /// ```
    pub fn of<T: IntoTuple>(values: T) -> Self {
        values.into_tuple()
    }

    /// Return a tuple with `element` added at the end (builder pattern).
    pub fn push<E: Into<Element>>(self, element: E) -> Self {
        let mut elements = self.repr.into_vec();
        elements.push(element.into());
        Self::from_elements(elements)
    }

    /// Return a new tuple with `element` appended; `self` is left unchanged.
    pub fn append<E: Into<Element>>(&self, element: E) -> Self {
        let mut elements = Vec::with_capacity(self.len() + 1);
        elements.extend_from_slice(self.as_slice());
        elements.push(element.into());
        Self::from_elements(elements)
    }

    /// Return a new tuple holding the elements of `self` followed by those of `other`.
    pub fn concat(&self, other: &Tuple) -> Self {
        let mut elements = Vec::with_capacity(self.len() + other.len());
        elements.extend_from_slice(self.as_slice());
        elements.extend_from_slice(other.as_slice());
        Self::from_elements(elements)
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// Whether the tuple has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow the elements as a slice.
    pub fn as_slice(&self) -> &[Element] {
        self.repr.as_slice()
    }

    /// Iterate over the elements in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Element> {
        self.as_slice().iter()
    }

    /// Get an element by index, counting from the end when `index` is negative.
    pub fn get(&self, index: isize) -> Result<&Element, TupleError> {
        let len = self.len();
        self.resolve(index)
            .and_then(|i| self.as_slice().get(i))
            .ok_or(TupleError::IndexOutOfRange { index, len })
    }

    /// Get an element by index and convert it to `R`.
    pub fn get_as<R: FromElement>(&self, index: isize) -> Result<R, TupleError> {
        R::from_element(self.get(index)?)
    }

    /// Convert the last element to `R`. Equivalent to `get_as::<R>(-1)`.
    pub fn last<R: FromElement>(&self) -> Result<R, TupleError> {
        self.get_as(-1)
    }

    /// Return the elements in `[from, to)` as a new tuple.
    ///
    /// Bounds follow Python slicing: negative values count from the end,
    /// `None` means the start (for `from`) or the end (for `to`), and
    /// out-of-range bounds are clamped. An empty or inverted range yields an
    /// empty tuple.
    ///
    /// ```
    /// use keyspace_layer::tuple;
    ///
    /// let t = tuple!(1, 2, 3, 4);
    /// assert_eq!(t.slice(Some(1), Some(3)), tuple!(2, 3));
    /// assert_eq!(t.slice(Some(-2), None), tuple!(3, 4));
    /// ```
    pub fn slice(&self, from: Option<isize>, to: Option<isize>) -> Self {
        let len = self.len();
        let start = from.map_or(0, |i| self.clamp(i));
        let end = to.map_or(len, |i| self.clamp(i));
        if start >= end {
            return Self::new();
        }
        Self::from_elements(self.as_slice()[start..end].to_vec())
    }

    /// Encode the tuple as the concatenation of its element encodings.
    pub fn pack(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.len() * 8);
        self.pack_into(&mut buf);
        buf
    }

    /// Append the encoding to `buf`.
    pub fn pack_into(&self, buf: &mut Vec<u8>) {
        for elem in self.iter() {
            elem.pack_into(buf);
        }
    }

    /// Decode a packed tuple.
    ///
    /// Every byte must belong to an element; trailing bytes that do not start a
    /// valid element are an error.
    pub fn unpack(data: &[u8]) -> Result<Self, TupleError> {
        decode_tuple(data).inspect_err(|error| {
            debug!(len = data.len(), offset = ?error.offset(), %error, "rejected tuple encoding");
        })
    }

    /// Scan bounds `[begin, end)` for keys that strictly extend this tuple.
    ///
    /// `begin` is the packed tuple followed by 0x00 and `end` the packed tuple
    /// followed by 0xFF. The packed tuple itself falls outside the range; use
    /// [`prefix_end`](Self::prefix_end) to include it.
    pub fn range(&self) -> (Vec<u8>, Vec<u8>) {
        let packed = self.pack();
        let mut start = packed.clone();
        start.push(0x00);
        let mut end = packed;
        end.push(0xFF);
        (start, end)
    }

    /// Exclusive end key covering every key that starts with the packed tuple.
    ///
    /// Fails with [`KeyError::Overflow`] for the empty tuple, which has no
    /// finite prefix end.
    pub fn prefix_end(&self) -> Result<Vec<u8>, KeyError> {
        keyspace::strinc(&self.pack())
    }

    /// Map a possibly negative index to a position, if it is in range.
    fn resolve(&self, index: isize) -> Option<usize> {
        let len = self.len();
        if index < 0 {
            len.checked_sub(index.unsigned_abs())
        } else {
            Some(index.unsigned_abs()).filter(|&i| i < len)
        }
    }

    /// Map a possibly negative slice bound to a position in `0..=len`.
    fn clamp(&self, index: isize) -> usize {
        let len = self.len();
        if index < 0 {
            len.saturating_sub(index.unsigned_abs())
        } else {
            index.unsigned_abs().min(len)
        }
    }
}

impl Default for Tuple {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Tuple {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for Tuple {}

impl Hash for Tuple {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.len());
        for elem in self.iter() {
            elem.hash(state);
        }
    }
}

impl PartialOrd for Tuple {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Tuple {
    fn cmp(&self, other: &Self) -> Ordering {
        // Element encodings are self-delimiting, so comparing element-wise and
        // then by length agrees with comparing the packed bytes.
        for (a, b) in self.iter().zip(other.iter()) {
            match a.cmp(b) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }
        self.len().cmp(&other.len())
    }
}

impl fmt::Debug for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Tuple").field(&self.as_slice()).finish()
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, elem) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{elem}")?;
        }
        if self.len() == 1 {
            f.write_str(",")?;
        }
        f.write_str(")")
    }
}

impl FromIterator<Element> for Tuple {
    fn from_iter<I: IntoIterator<Item = Element>>(iter: I) -> Self {
        Self::from_elements(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Tuple {
    type Item = &'a Element;
    type IntoIter = std::slice::Iter<'a, Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl From<Vec<Element>> for Tuple {
    fn from(elements: Vec<Element>) -> Self {
        Self::from_elements(elements)
    }
}

// Construction from Rust tuples

/// Values that can be turned into a [`Tuple`] in one step.
///
/// Implemented for Rust tuples of up to four [`Into<Element>`] values, which
/// land directly in the fixed-arity storage.
pub trait IntoTuple {
    /// Build the tuple.
    fn into_tuple(self) -> Tuple;
}

impl IntoTuple for () {
    fn into_tuple(self) -> Tuple {
        Tuple::new()
    }
}

impl<A: Into<Element>> IntoTuple for (A,) {
    fn into_tuple(self) -> Tuple {
        Tuple::from_elements(vec![self.0.into()])
    }
}

impl<A: Into<Element>, B: Into<Element>> IntoTuple for (A, B) {
    fn into_tuple(self) -> Tuple {
        Tuple {
            repr: Repr::Pair([self.0.into(), self.1.into()]),
        }
    }
}

impl<A: Into<Element>, B: Into<Element>, C: Into<Element>> IntoTuple for (A, B, C) {
    fn into_tuple(self) -> Tuple {
        Tuple {
            repr: Repr::Triple([self.0.into(), self.1.into(), self.2.into()]),
        }
    }
}

impl<A: Into<Element>, B: Into<Element>, C: Into<Element>, D: Into<Element>> IntoTuple for (A, B, C, D) {
    fn into_tuple(self) -> Tuple {
        Tuple {
            repr: Repr::Quad([self.0.into(), self.1.into(), self.2.into(), self.3.into()]),
        }
    }
}

impl IntoTuple for Tuple {
    fn into_tuple(self) -> Tuple {
        self
    }
}

impl IntoTuple for Vec<Element> {
    fn into_tuple(self) -> Tuple {
        Tuple::from_elements(self)
    }
}

#[cfg(test)]
pub(super) fn is_fixed_arity(tuple: &Tuple) -> bool {
    !matches!(tuple.repr, Repr::List(_))
}
