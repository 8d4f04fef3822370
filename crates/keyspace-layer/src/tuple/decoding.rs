use snafu::ResultExt;

use super::BYTES_CODE;
use super::DOUBLE_CODE;
use super::FALSE_CODE;
use super::FLOAT_CODE;
use super::INT_ZERO_CODE;
use super::InvalidUtf8Snafu;
use super::NEG_INT_MIN_CODE;
use super::NESTED_CODE;
use super::NULL_CODE;
use super::NULL_ESCAPE;
use super::POS_INT_MAX_CODE;
use super::STRING_CODE;
use super::TERMINATOR;
use super::TRUE_CODE;
use super::TupleError;
use super::element::Element;
use super::tuple_type::Tuple;

/// Decode all of `data` as the elements of one top-level tuple.
pub(super) fn decode_tuple(data: &[u8]) -> Result<Tuple, TupleError> {
    let mut elements = Vec::new();
    let mut pos = 0;
    while pos < data.len() {
        let (element, used) = decode_element(data, pos)?;
        elements.push(element);
        pos += used;
    }
    Ok(Tuple::from_elements(elements))
}

/// Decode the element whose type code sits at `offset`.
///
/// Returns the element and its encoded length. Nested tuples recurse, so
/// stack use grows with the nesting depth of the input.
pub(super) fn decode_element(data: &[u8], offset: usize) -> Result<(Element, usize), TupleError> {
    let Some(&code) = data.get(offset) else {
        return Err(TupleError::UnexpectedEnd { offset });
    };

    let decoded = match code {
        NULL_CODE => (Element::Null, 1),
        BYTES_CODE => {
            let (bytes, len) = read_terminated(data, offset)?;
            (Element::Bytes(bytes), len)
        }
        STRING_CODE => {
            let (bytes, len) = read_terminated(data, offset)?;
            let text = String::from_utf8(bytes)
                .map_err(|e| e.utf8_error())
                .context(InvalidUtf8Snafu { offset })?;
            (Element::String(text), len)
        }
        NESTED_CODE => {
            let (nested, len) = read_nested(data, offset)?;
            (Element::Tuple(Box::new(nested)), len)
        }
        NEG_INT_MIN_CODE..=POS_INT_MAX_CODE => read_int(data, offset, code)?,
        FLOAT_CODE => {
            let raw = payload::<4>(data, offset)?;
            (Element::Float(f32::from_bits(unorder_bits_32(u32::from_be_bytes(raw)))), 5)
        }
        DOUBLE_CODE => {
            let raw = payload::<8>(data, offset)?;
            (Element::Double(f64::from_bits(unorder_bits_64(u64::from_be_bytes(raw)))), 9)
        }
        FALSE_CODE => (Element::Bool(false), 1),
        TRUE_CODE => (Element::Bool(true), 1),
        _ => return Err(TupleError::UnknownTypeCode { code, offset }),
    };
    Ok(decoded)
}

/// The `N` bytes after the type code at `offset`.
fn payload<const N: usize>(data: &[u8], offset: usize) -> Result<[u8; N], TupleError> {
    data.get(offset + 1..)
        .and_then(|rest| rest.first_chunk::<N>())
        .copied()
        .ok_or(TupleError::UnexpectedEnd { offset })
}

/// Read an escaped, 0x00-terminated payload following the type code at `offset`.
///
/// Returns the unescaped bytes and the encoded length including code and terminator.
fn read_terminated(data: &[u8], offset: usize) -> Result<(Vec<u8>, usize), TupleError> {
    let start = offset + 1;
    let mut out = Vec::new();
    let mut pos = start;
    while let Some(&b) = data.get(pos) {
        if b != 0x00 {
            out.push(b);
            pos += 1;
        } else if data.get(pos + 1) == Some(&NULL_ESCAPE) {
            out.push(0x00);
            pos += 2;
        } else {
            return Ok((out, pos + 1 - offset));
        }
    }
    Err(TupleError::MissingTerminator { offset: start })
}

/// Read an integer whose type code `code` sits at `offset`.
///
/// Values above `i64::MAX` come back as [`Element::UInt`]. Negative
/// magnitudes beyond `2^63` fit no supported type.
fn read_int(data: &[u8], offset: usize, code: u8) -> Result<(Element, usize), TupleError> {
    let len = usize::from(code.abs_diff(INT_ZERO_CODE));
    let Some(raw) = data.get(offset + 1..offset + 1 + len) else {
        return Err(TupleError::UnexpectedEnd { offset });
    };
    let stored = raw.iter().fold(0u64, |acc, &b| acc << 8 | u64::from(b));

    let element = if code >= INT_ZERO_CODE {
        i64::try_from(stored).map_or(Element::UInt(stored), Element::Int)
    } else {
        // One's complement of the magnitude, limited to `len` bytes.
        let magnitude = !stored & (u64::MAX >> (64 - 8 * len));
        let value = -i128::from(magnitude);
        Element::Int(i64::try_from(value).map_err(|_| TupleError::IntegerOverflow { offset })?)
    };
    Ok((element, 1 + len))
}

/// Read a nested tuple whose code sits at `offset`.
fn read_nested(data: &[u8], offset: usize) -> Result<(Tuple, usize), TupleError> {
    let mut elements = Vec::new();
    let mut pos = offset + 1;
    while let Some(&b) = data.get(pos) {
        if b == TERMINATOR {
            if data.get(pos + 1) != Some(&NULL_ESCAPE) {
                return Ok((Tuple::from_elements(elements), pos + 1 - offset));
            }
            elements.push(Element::Null);
            pos += 2;
        } else {
            let (element, used) = decode_element(data, pos)?;
            elements.push(element);
            pos += used;
        }
    }
    Err(TupleError::UnterminatedNested { offset: offset + 1 })
}

/// Inverse of the encoder's float order transform.
fn unorder_bits_32(ordered: u32) -> u32 {
    if ordered >> 31 == 1 { ordered & !(1 << 31) } else { !ordered }
}

/// Inverse of the encoder's double order transform.
fn unorder_bits_64(ordered: u64) -> u64 {
    if ordered >> 63 == 1 { ordered & !(1 << 63) } else { !ordered }
}
