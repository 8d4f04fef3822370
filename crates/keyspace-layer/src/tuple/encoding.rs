use super::BYTES_CODE;
use super::DOUBLE_CODE;
use super::FALSE_CODE;
use super::FLOAT_CODE;
use super::INT_ZERO_CODE;
use super::NESTED_CODE;
use super::NULL_CODE;
use super::NULL_ESCAPE;
use super::STRING_CODE;
use super::TERMINATOR;
use super::TRUE_CODE;
use super::element::Element;

impl Element {
    /// Append this element's encoding to `buf`.
    pub fn pack_into(&self, buf: &mut Vec<u8>) {
        match self {
            Element::Null => buf.push(NULL_CODE),
            Element::Bytes(bytes) => write_terminated(BYTES_CODE, bytes, buf),
            Element::String(text) => write_terminated(STRING_CODE, text.as_bytes(), buf),
            Element::Int(n) if *n < 0 => write_negative(n.unsigned_abs(), buf),
            Element::Int(n) => write_positive(n.unsigned_abs(), buf),
            Element::UInt(n) => write_positive(*n, buf),
            Element::Bool(true) => buf.push(TRUE_CODE),
            Element::Bool(false) => buf.push(FALSE_CODE),
            Element::Float(x) => {
                buf.push(FLOAT_CODE);
                buf.extend_from_slice(&order_bits_32(x.to_bits()).to_be_bytes());
            }
            Element::Double(x) => {
                buf.push(DOUBLE_CODE);
                buf.extend_from_slice(&order_bits_64(x.to_bits()).to_be_bytes());
            }
            Element::Tuple(nested) => {
                buf.push(NESTED_CODE);
                for item in nested.iter() {
                    match item {
                        // A bare 0x00 would read as the terminator.
                        Element::Null => buf.extend_from_slice(&[NULL_CODE, NULL_ESCAPE]),
                        other => other.pack_into(buf),
                    }
                }
                buf.push(TERMINATOR);
            }
        }
    }
}

/// Write `code`, then `payload` with every 0x00 escaped as 0x00 0xFF, then the terminator.
fn write_terminated(code: u8, payload: &[u8], buf: &mut Vec<u8>) {
    buf.reserve(payload.len() + 2);
    buf.push(code);
    for chunk in payload.split_inclusive(|&b| b == 0x00) {
        buf.extend_from_slice(chunk);
        if chunk.last() == Some(&0x00) {
            buf.push(NULL_ESCAPE);
        }
    }
    buf.push(TERMINATOR);
}

/// Bytes needed for a non-zero magnitude.
fn magnitude_len(n: u64) -> u8 {
    // n != 0, so at most 63 leading zeros.
    (8 - n.leading_zeros() / 8) as u8
}

fn write_positive(n: u64, buf: &mut Vec<u8>) {
    if n == 0 {
        buf.push(INT_ZERO_CODE);
        return;
    }
    let len = magnitude_len(n);
    buf.push(INT_ZERO_CODE + len);
    write_low_bytes(n, len, buf);
}

/// Negative values store the one's complement of the magnitude, so larger
/// magnitudes sort lower within the same length.
fn write_negative(magnitude: u64, buf: &mut Vec<u8>) {
    let len = magnitude_len(magnitude);
    buf.push(INT_ZERO_CODE - len);
    write_low_bytes(!magnitude, len, buf);
}

/// Write the low `len` bytes of `n`, most significant first.
fn write_low_bytes(n: u64, len: u8, buf: &mut Vec<u8>) {
    let bytes = n.to_be_bytes();
    buf.extend_from_slice(&bytes[bytes.len() - usize::from(len)..]);
}

/// Map IEEE-754 single bits to an unsigned value with the same order:
/// negatives flip every bit, non-negatives flip only the sign.
pub(super) fn order_bits_32(bits: u32) -> u32 {
    if bits >> 31 == 1 { !bits } else { bits | 1 << 31 }
}

/// Double-precision counterpart of [`order_bits_32`].
pub(super) fn order_bits_64(bits: u64) -> u64 {
    if bits >> 63 == 1 { !bits } else { bits | 1 << 63 }
}
