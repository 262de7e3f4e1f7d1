//! Controller numeric encodings.
//!
//! # Encoded number
//!
//! Positions, macro variables and real-typed diagnostics use an 8-byte
//! fixed-point encoding:
//!
//! | Byte | Field |
//! |------|-------|
//! | 0-3 | mantissa (i32 BE) |
//! | 4 | reserved |
//! | 5 | scale base (2 or 10) |
//! | 6 | flags |
//! | 7 | exponent |
//!
//! The value is `mantissa / base^exponent`. Bytes 6-7 equal to `FF FF` mark
//! "no value".
//!
//! # Example
//!
//! ```
//! use fanuc_focas::decode_number;
//!
//! let bytes = [0x00, 0x00, 0x03, 0xE8, 0x00, 0x0A, 0x00, 0x02];
//! assert_eq!(decode_number(&bytes, 0), Some(10.0));
//!
//! let empty = [0x00, 0x00, 0x03, 0xE8, 0x00, 0x0A, 0xFF, 0xFF];
//! assert_eq!(decode_number(&empty, 0), None);
//! ```

/// Size of one encoded number.
pub const ENCODED_NUMBER_SIZE: usize = 8;

/// The fields of an 8-byte encoded number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedNumber {
    /// Integer mantissa.
    pub mantissa: i32,
    /// Scale base; only 2 and 10 are valid.
    pub scale_base: u8,
    /// Flag byte; `0xFF` together with exponent `0xFF` means no value.
    pub flags: u8,
    /// Exponent applied to the scale base.
    pub exponent: u8,
}

impl EncodedNumber {
    /// Splits an 8-byte window into its fields.
    pub fn from_bytes(bytes: &[u8; ENCODED_NUMBER_SIZE]) -> Self {
        Self {
            mantissa: i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            scale_base: bytes[5],
            flags: bytes[6],
            exponent: bytes[7],
        }
    }

    /// Returns `true` for the controller's "no value" marker.
    pub fn is_empty(&self) -> bool {
        self.flags == 0xFF && self.exponent == 0xFF
    }

    /// Interprets the number, or `None` for the empty marker or an invalid base.
    pub fn value(&self) -> Option<f64> {
        if self.is_empty() || !matches!(self.scale_base, 2 | 10) {
            return None;
        }
        let divisor = f64::from(self.scale_base).powi(i32::from(self.exponent));
        Some(f64::from(self.mantissa) / divisor)
    }
}

/// Decodes the encoded number at `offset`; `None` if the window is short,
/// empty or has an invalid base.
pub fn decode_number(buf: &[u8], offset: usize) -> Option<f64> {
    let window: &[u8; ENCODED_NUMBER_SIZE] = buf.get(offset..offset + ENCODED_NUMBER_SIZE)?.try_into().ok()?;
    EncodedNumber::from_bytes(window).value()
}

/// Width of one per-axis element in parameter and diagnostic records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementWidth {
    /// 4-byte elements (parameters).
    Four,
    /// 8-byte elements (diagnostics).
    Eight,
}

impl ElementWidth {
    /// Element size in bytes.
    pub fn bytes(self) -> usize {
        match self {
            Self::Four => 4,
            Self::Eight => 8,
        }
    }
}

/// A typed parameter or diagnostic element.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FocasValue {
    /// Raw byte (type 0).
    Byte(u8),
    /// Eight flags, most significant bit first (type 1).
    Bits([bool; 8]),
    /// Signed 16-bit value (type 2, 4-byte elements).
    Short(i16),
    /// Signed 32-bit value (type 3, 4-byte elements).
    Int(i32),
    /// Encoded number (types 2-4, 8-byte elements); `None` is "no value".
    Real(Option<f64>),
}

impl FocasValue {
    /// Decodes one element by its wire type tag, `None` for unknown tags or
    /// a short element.
    pub fn decode(tag: u16, width: ElementWidth, element: &[u8]) -> Option<Self> {
        let size = width.bytes();
        if element.len() < size {
            return None;
        }
        let last = element[size - 1];
        match (width, tag) {
            (_, 0) => Some(Self::Byte(last)),
            (_, 1) => Some(Self::Bits(byte_to_bits(last))),
            (ElementWidth::Four, 2) => Some(Self::Short(i16::from_be_bytes([element[2], element[3]]))),
            (ElementWidth::Four, 3) => Some(Self::Int(i32::from_be_bytes([
                element[0], element[1], element[2], element[3],
            ]))),
            (ElementWidth::Eight, 2..=4) => Some(Self::Real(decode_number(element, 0))),
            _ => None,
        }
    }

    /// Returns the value as `f64` where that is meaningful.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Byte(v) => Some(f64::from(v)),
            Self::Bits(_) => None,
            Self::Short(v) => Some(f64::from(v)),
            Self::Int(v) => Some(f64::from(v)),
            Self::Real(v) => v,
        }
    }
}

/// Expands a byte into flags, bit 7 first.
fn byte_to_bits(byte: u8) -> [bool; 8] {
    let mut bits = [false; 8];
    for (i, bit) in bits.iter_mut().enumerate() {
        *bit = byte & (0x80 >> i) != 0;
    }
    bits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(mantissa: i32, base: u8, flags: u8, exponent: u8) -> [u8; 8] {
        let m = mantissa.to_be_bytes();
        [m[0], m[1], m[2], m[3], 0, base, flags, exponent]
    }

    #[test]
    fn test_decode_base_ten() {
        assert_eq!(decode_number(&encoded(1000, 10, 0, 2), 0), Some(10.0));
        assert_eq!(decode_number(&encoded(-12345, 10, 0, 3), 0), Some(-12.345));
        assert_eq!(decode_number(&encoded(7, 10, 0, 0), 0), Some(7.0));
    }

    #[test]
    fn test_decode_base_two() {
        assert_eq!(decode_number(&encoded(12, 2, 0, 2), 0), Some(3.0));
    }

    #[test]
    fn test_sentinel_regardless_of_mantissa() {
        for mantissa in [0, 1, -1, i32::MAX, i32::MIN] {
            for base in [2, 10, 0, 7] {
                assert_eq!(decode_number(&encoded(mantissa, base, 0xFF, 0xFF), 0), None);
            }
        }
    }

    #[test]
    fn test_invalid_base() {
        assert_eq!(decode_number(&encoded(1000, 0, 0, 2), 0), None);
        assert_eq!(decode_number(&encoded(1000, 16, 0, 2), 0), None);
    }

    #[test]
    fn test_decode_at_offset_and_short_window() {
        let mut buf = vec![0xEE, 0xEE];
        buf.extend_from_slice(&encoded(25, 10, 0, 1));
        assert_eq!(decode_number(&buf, 2), Some(2.5));
        assert_eq!(decode_number(&buf, 3), None);
        assert_eq!(decode_number(&[], 0), None);
    }

    #[test]
    fn test_encoded_number_fields() {
        let number = EncodedNumber::from_bytes(&encoded(-5, 10, 0x01, 0x04));
        assert_eq!(number.mantissa, -5);
        assert_eq!(number.scale_base, 10);
        assert_eq!(number.flags, 0x01);
        assert_eq!(number.exponent, 0x04);
        assert!(!number.is_empty());
    }

    #[test]
    fn test_value_four_byte_elements() {
        let element = [0x00, 0x00, 0xFF, 0x9C];
        assert_eq!(
            FocasValue::decode(0, ElementWidth::Four, &element),
            Some(FocasValue::Byte(0x9C))
        );
        assert_eq!(
            FocasValue::decode(2, ElementWidth::Four, &element),
            Some(FocasValue::Short(-100))
        );
        assert_eq!(
            FocasValue::decode(3, ElementWidth::Four, &element),
            Some(FocasValue::Int(0xFF9C))
        );
        assert_eq!(FocasValue::decode(4, ElementWidth::Four, &element), None);
    }

    #[test]
    fn test_value_bits_msb_first() {
        let element = [0, 0, 0, 0b1000_0001];
        let Some(FocasValue::Bits(bits)) = FocasValue::decode(1, ElementWidth::Four, &element) else {
            panic!("expected bits");
        };
        assert_eq!(bits, [true, false, false, false, false, false, false, true]);
    }

    #[test]
    fn test_value_eight_byte_elements() {
        let element = encoded(1500, 10, 0, 3);
        for tag in 2..=4 {
            assert_eq!(
                FocasValue::decode(tag, ElementWidth::Eight, &element),
                Some(FocasValue::Real(Some(1.5)))
            );
        }
        assert_eq!(
            FocasValue::decode(0, ElementWidth::Eight, &element),
            Some(FocasValue::Byte(3))
        );
        assert_eq!(FocasValue::decode(2, ElementWidth::Eight, &element[..4]), None);
    }

    #[test]
    fn test_as_f64() {
        assert_eq!(FocasValue::Short(-3).as_f64(), Some(-3.0));
        assert_eq!(FocasValue::Real(None).as_f64(), None);
        assert_eq!(FocasValue::Bits([false; 8]).as_f64(), None);
    }
}
