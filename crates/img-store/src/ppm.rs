//! Binary PPM (`P6`) decoding.
//!
//! The accepted grammar is strict:
//!
//! ```text
//! "P6" WS+ width WS+ height WS+ max_n_colors WS pixels
//! ```
//!
//! where `WS` is one of space, tab, CR or LF, each number is a maximal run of
//! ASCII digits, `max_n_colors` is exactly 255 and `pixels` is exactly
//! `3 * width * height` bytes. Anything else is `BAD_FORMAT`.

use std::fmt;

use bytes::Bytes;

use crate::error::{ImgError, Result};

const PPM_MAGIC: &[u8] = b"P6";
const PPM_MAX_N_COLORS: u32 = 255;
const BYTES_PER_PIXEL: u64 = 3;

/// Structural description of a valid PPM image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PpmFormat {
    pub width: u32,
    pub height: u32,
    pub max_n_colors: u32,
    /// Offset of the first pixel byte.
    pub header_len: usize,
}

/// A decoded PPM image.
///
/// Immutable after construction. The source bytes are kept verbatim and
/// owned by this value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ppm {
    id: String,
    format: PpmFormat,
    bytes: Bytes,
}

impl Ppm {
    /// Decode `bytes` as a PPM image identified by `id`.
    pub fn decode(id: impl Into<String>, bytes: &[u8]) -> Result<Self> {
        let format = ppm_format(bytes).ok_or_else(|| ImgError::bad_format("bad image format"))?;
        Ok(Self {
            id: id.into(),
            format,
            bytes: Bytes::copy_from_slice(bytes),
        })
    }

    /// Independent copy of this image under a different id. No re-validation.
    pub fn with_id(&self, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            format: self.format,
            bytes: Bytes::copy_from_slice(&self.bytes),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn format(&self) -> PpmFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.format.width
    }

    pub fn height(&self) -> u32 {
        self.format.height
    }

    pub fn max_n_colors(&self) -> u32 {
        self.format.max_n_colors
    }

    pub fn header_len(&self) -> usize {
        self.format.header_len
    }

    /// All bytes of the image, header included, exactly as decoded.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn pixels(&self) -> &[u8] {
        &self.bytes[self.format.header_len..]
    }
}

impl fmt::Display for Ppm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ppm '{}': {}x{}", self.id, self.width(), self.height())
    }
}

/// Validate `bytes` as a PPM image and describe it, or `None` if invalid.
pub fn ppm_format(bytes: &[u8]) -> Option<PpmFormat> {
    let mut cursor = Cursor::new(bytes);
    if cursor.take(PPM_MAGIC.len())? != PPM_MAGIC {
        return None;
    }
    if !cursor.at_space() {
        return None;
    }
    let width = cursor.next_int()?;
    let height = cursor.next_int()?;
    let max_n_colors = cursor.next_int()?;
    if !cursor.at_space() {
        return None;
    }
    let header_len = cursor.index + 1;

    if width == 0 || height == 0 || max_n_colors != PPM_MAX_N_COLORS {
        return None;
    }
    let n_pixel_bytes = u64::from(width)
        .checked_mul(u64::from(height))?
        .checked_mul(BYTES_PER_PIXEL)?;
    let total = (header_len as u64).checked_add(n_pixel_bytes)?;
    if bytes.len() as u64 != total {
        return None;
    }

    Some(PpmFormat {
        width,
        height,
        max_n_colors,
        header_len,
    })
}

/// A byte buffer and a read position.
struct Cursor<'a> {
    buf: &'a [u8],
    index: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, index: 0 }
    }

    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let end = self.index.checked_add(n)?;
        let slice = self.buf.get(self.index..end)?;
        self.index = end;
        Some(slice)
    }

    fn at_space(&self) -> bool {
        self.buf.get(self.index).is_some_and(|b| is_space(*b))
    }

    /// Skip whitespace, then read a maximal run of digits.
    fn next_int(&mut self) -> Option<u32> {
        while self.at_space() {
            self.index += 1;
        }
        let start = self.index;
        while self.buf.get(self.index).is_some_and(u8::is_ascii_digit) {
            self.index += 1;
        }
        if start == self.index {
            return None;
        }
        // Digits are ASCII, so this slice is valid UTF-8.
        std::str::from_utf8(&self.buf[start..self.index])
            .ok()?
            .parse()
            .ok()
    }
}

fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn ppm_bytes(header: &str, n_pixel_bytes: usize) -> Vec<u8> {
        let mut bytes = header.as_bytes().to_vec();
        bytes.extend((0..n_pixel_bytes).map(|i| (i * 37 % 256) as u8));
        bytes
    }

    #[test]
    fn test_decode_minimal_image() {
        let bytes = ppm_bytes("P6 2 1 255 ", 6);
        assert_eq!(bytes.len(), 17);

        let ppm = Ppm::decode("g/n", &bytes).unwrap();
        assert_eq!(ppm.id(), "g/n");
        assert_eq!(ppm.width(), 2);
        assert_eq!(ppm.height(), 1);
        assert_eq!(ppm.max_n_colors(), 255);
        assert_eq!(ppm.header_len(), 11);
        assert_eq!(ppm.bytes(), &bytes[..]);
        assert_eq!(ppm.pixels(), &bytes[11..]);
        assert_eq!(ppm.to_string(), "ppm 'g/n': 2x1");
    }

    #[test]
    fn test_decode_mixed_whitespace_header() {
        let bytes = ppm_bytes("P6\n3\t\t2\r\n255\n", 18);
        let format = ppm_format(&bytes).unwrap();
        assert_eq!(format.width, 3);
        assert_eq!(format.height, 2);
        assert_eq!(format.header_len, 13);
        assert_eq!(bytes.len(), format.header_len + 3 * 3 * 2);
    }

    #[test]
    fn test_pixel_data_may_start_with_whitespace_byte() {
        // Only one separator byte belongs to the header.
        let mut bytes = b"P6 1 1 255\n".to_vec();
        bytes.extend_from_slice(b"\n\n\n");
        let format = ppm_format(&bytes).unwrap();
        assert_eq!(format.header_len, 11);
    }

    #[test]
    fn test_bad_magic() {
        assert!(ppm_format(&ppm_bytes("P3 2 1 255 ", 6)).is_none());
        assert!(ppm_format(&ppm_bytes("Q6 2 1 255 ", 6)).is_none());
        assert!(ppm_format(b"P").is_none());
        assert!(ppm_format(b"").is_none());

        let err = Ppm::decode("x", &ppm_bytes("XX 2 1 255 ", 6)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadFormat);
    }

    #[test]
    fn test_missing_whitespace_after_magic() {
        assert!(ppm_format(&ppm_bytes("P62 1 255 ", 6)).is_none());
    }

    #[test]
    fn test_truncated_and_trailing_payload() {
        assert!(ppm_format(&ppm_bytes("P6 2 1 255 ", 5)).is_none());
        assert!(ppm_format(&ppm_bytes("P6 2 1 255 ", 7)).is_none());
        assert!(ppm_format(&ppm_bytes("P6 2 1 255 ", 0)).is_none());
    }

    #[test]
    fn test_header_without_separator() {
        assert!(ppm_format(b"P6 2 1 255").is_none());
        assert!(ppm_format(&ppm_bytes("P6 1 1 255x", 3)).is_none());
    }

    #[test]
    fn test_rejects_other_color_depths() {
        assert!(ppm_format(&ppm_bytes("P6 1 1 65535 ", 3)).is_none());
        assert!(ppm_format(&ppm_bytes("P6 1 1 254 ", 3)).is_none());
        assert!(ppm_format(&ppm_bytes("P6 1 1 0255 ", 3)).is_some());
    }

    #[test]
    fn test_rejects_zero_dimensions() {
        assert!(ppm_format(&ppm_bytes("P6 0 1 255 ", 0)).is_none());
        assert!(ppm_format(&ppm_bytes("P6 1 0 255 ", 0)).is_none());
    }

    #[test]
    fn test_rejects_non_digit_fields() {
        assert!(ppm_format(&ppm_bytes("P6 -2 1 255 ", 6)).is_none());
        assert!(ppm_format(&ppm_bytes("P6 2 # 1 255 ", 6)).is_none());
        assert!(ppm_format(&ppm_bytes("P6 2x 1 255 ", 6)).is_none());
    }

    #[test]
    fn test_rejects_overflowing_dimensions() {
        assert!(ppm_format(&ppm_bytes("P6 99999999999 1 255 ", 3)).is_none());
        assert!(ppm_format(&ppm_bytes("P6 4294967295 4294967295 255 ", 3)).is_none());
    }

    #[test]
    fn test_with_id_is_independent_copy() {
        let bytes = ppm_bytes("P6 2 2 255 ", 12);
        let original = Ppm::decode("a/one", &bytes).unwrap();
        let copy = original.with_id("b/two");

        assert_eq!(copy.id(), "b/two");
        assert_eq!(original.id(), "a/one");
        assert_eq!(copy.format(), original.format());
        assert_eq!(copy.bytes(), original.bytes());
        assert_ne!(copy.bytes().as_ptr(), original.bytes().as_ptr());
    }

    #[test]
    fn test_decode_does_not_alias_source_buffer() {
        let mut bytes = ppm_bytes("P6 1 1 255 ", 3);
        let ppm = Ppm::decode("x", &bytes).unwrap();
        bytes[11] = bytes[11].wrapping_add(1);
        assert_ne!(ppm.pixels()[0], bytes[11]);
    }
}
