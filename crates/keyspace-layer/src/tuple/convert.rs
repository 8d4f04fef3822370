//! Typed extraction of tuple elements.
//!
//! [`FromElement`] backs [`Tuple::get_as`](super::Tuple::get_as) and
//! [`Tuple::last`](super::Tuple::last). Conversions either preserve the value
//! exactly or fail with [`TupleError::Conversion`]; nothing is silently
//! truncated.

use super::TupleError;
use super::element::Element;
use super::tuple_type::Tuple;

/// Largest integer magnitude an `f64` represents exactly.
const F64_EXACT_INT: i128 = 1 << 53;

/// Largest integer magnitude an `f32` represents exactly.
const F32_EXACT_INT: i128 = 1 << 24;

/// Conversion from a borrowed [`Element`] into a Rust value.
pub trait FromElement: Sized {
    /// Convert `element`, failing when the value cannot be represented.
    fn from_element(element: &Element) -> Result<Self, TupleError>;
}

fn mismatch<T>(element: &Element) -> TupleError {
    TupleError::Conversion {
        from: element.kind(),
        to: std::any::type_name::<T>(),
    }
}

macro_rules! impl_from_element_int {
    ($($ty:ty),*) => {
        $(
            impl FromElement for $ty {
                fn from_element(element: &Element) -> Result<Self, TupleError> {
                    let wide = match element {
                        Element::Bool(b) => i128::from(*b),
                        other => other.as_i128().ok_or_else(|| mismatch::<$ty>(other))?,
                    };
                    <$ty>::try_from(wide).map_err(|_| mismatch::<$ty>(element))
                }
            }
        )*
    };
}

impl_from_element_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl FromElement for f64 {
    fn from_element(element: &Element) -> Result<Self, TupleError> {
        match element {
            Element::Double(d) => Ok(*d),
            Element::Float(f) => Ok(f64::from(*f)),
            other => match other.as_i128() {
                Some(n) if n.abs() <= F64_EXACT_INT => Ok(n as f64),
                _ => Err(mismatch::<f64>(other)),
            },
        }
    }
}

impl FromElement for f32 {
    fn from_element(element: &Element) -> Result<Self, TupleError> {
        match element {
            Element::Float(f) => Ok(*f),
            Element::Double(d) => {
                let narrow = *d as f32;
                if d.is_nan() || f64::from(narrow) == *d {
                    Ok(narrow)
                } else {
                    Err(mismatch::<f32>(element))
                }
            }
            other => match other.as_i128() {
                Some(n) if n.abs() <= F32_EXACT_INT => Ok(n as f32),
                _ => Err(mismatch::<f32>(other)),
            },
        }
    }
}

impl FromElement for bool {
    fn from_element(element: &Element) -> Result<Self, TupleError> {
        match element {
            Element::Bool(b) => Ok(*b),
            other => other.as_i128().map(|n| n != 0).ok_or_else(|| mismatch::<bool>(other)),
        }
    }
}

impl FromElement for String {
    fn from_element(element: &Element) -> Result<Self, TupleError> {
        match element {
            Element::String(s) => Ok(s.clone()),
            Element::Bytes(b) => String::from_utf8(b.clone()).map_err(|_| mismatch::<String>(element)),
            other => Err(mismatch::<String>(other)),
        }
    }
}

impl FromElement for Vec<u8> {
    fn from_element(element: &Element) -> Result<Self, TupleError> {
        match element {
            Element::Bytes(b) => Ok(b.clone()),
            Element::String(s) => Ok(s.as_bytes().to_vec()),
            other => Err(mismatch::<Vec<u8>>(other)),
        }
    }
}

impl FromElement for Tuple {
    fn from_element(element: &Element) -> Result<Self, TupleError> {
        match element {
            Element::Tuple(t) => Ok(t.as_ref().clone()),
            other => Err(mismatch::<Tuple>(other)),
        }
    }
}

impl FromElement for Element {
    fn from_element(element: &Element) -> Result<Self, TupleError> {
        Ok(element.clone())
    }
}

impl FromElement for () {
    fn from_element(element: &Element) -> Result<Self, TupleError> {
        match element {
            Element::Null => Ok(()),
            other => Err(mismatch::<()>(other)),
        }
    }
}

impl<T: FromElement> FromElement for Option<T> {
    fn from_element(element: &Element) -> Result<Self, TupleError> {
        match element {
            Element::Null => Ok(None),
            other => T::from_element(other).map(Some),
        }
    }
}
