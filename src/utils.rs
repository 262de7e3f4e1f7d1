//! Utility functions for reading controller record fields.
//!
//! Controller records are fixed-layout big-endian structures with
//! NUL-terminated text fields. These helpers read them without panicking:
//! every reader returns `None` when the field runs past the buffer.
//!
//! # Example
//!
//! ```
//! use fanuc_focas::utils::{be_u16, latin1_until_nul, format_hex};
//!
//! let record = [0x00, 0x01, b'O', b'1', 0x00, b'x'];
//! assert_eq!(be_u16(&record, 0), Some(1));
//! assert_eq!(be_u16(&record, 5), None);
//! assert_eq!(latin1_until_nul(&record[2..]), "O1");
//! assert_eq!(format_hex(&record[..2]), "00 01");
//! ```

/// Reads a big-endian u16 at `offset`.
#[inline]
pub fn be_u16(buf: &[u8], offset: usize) -> Option<u16> {
    let bytes = buf.get(offset..offset + 2)?;
    Some(u16::from_be_bytes([bytes[0], bytes[1]]))
}

/// Reads a big-endian i16 at `offset`.
#[inline]
pub fn be_i16(buf: &[u8], offset: usize) -> Option<i16> {
    be_u16(buf, offset).map(|v| v as i16)
}

/// Reads a big-endian u32 at `offset`.
#[inline]
pub fn be_u32(buf: &[u8], offset: usize) -> Option<u32> {
    let bytes = buf.get(offset..offset + 4)?;
    Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Reads a big-endian i32 at `offset`.
#[inline]
pub fn be_i32(buf: &[u8], offset: usize) -> Option<i32> {
    be_u32(buf, offset).map(|v| v as i32)
}

/// Decodes Latin-1 text up to the first NUL (or the whole slice).
///
/// # Example
///
/// ```
/// use fanuc_focas::utils::latin1_until_nul;
///
/// assert_eq!(latin1_until_nul(b"CAF\xC9\0\0"), "CAFÉ");
/// ```
pub fn latin1_until_nul(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    bytes[..end].iter().map(|&b| char::from(b)).collect()
}

/// Decodes UTF-8 text before the first NUL.
///
/// Returns `None` if there is no NUL or the text before it is empty.
pub fn utf8_until_nul(bytes: &[u8]) -> Option<String> {
    match bytes.iter().position(|&b| b == 0) {
        Some(end) if end > 0 => Some(String::from_utf8_lossy(&bytes[..end]).into_owned()),
        _ => None,
    }
}

/// Decodes a fixed-width ASCII field, trimming padding.
pub fn ascii_field(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_matches(|c: char| c == '\0' || c.is_whitespace())
        .to_string()
}

/// Formats bytes as space-separated uppercase hex.
///
/// # Example
///
/// ```
/// use fanuc_focas::utils::format_hex;
///
/// assert_eq!(format_hex(&[0xA0, 0x0B]), "A0 0B");
/// assert_eq!(format_hex(&[]), "");
/// ```
pub fn format_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}
