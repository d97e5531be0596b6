//! Text held in both the application encoding and the window-system encoding
//!
//! Rust strings are UTF-8; window systems in the Win32 family want
//! null-terminated UTF-16. [`NativeText`] owns both representations so they
//! are allocated and released together, and nothing ever hands the window
//! system a buffer that has not been converted.

use std::fmt;
use thiserror::Error;

/// Text conversion errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// The text contains a NUL that would truncate the null-terminated form
    #[error("text contains an interior NUL at byte {position}")]
    InteriorNul {
        /// Byte offset of the first NUL
        position: usize,
    },

    /// Input bytes are not valid UTF-8
    #[error("text is not valid UTF-8 (valid up to byte {valid_up_to})")]
    InvalidUtf8 {
        /// Length of the longest valid prefix
        valid_up_to: usize,
    },

    /// Input units are not valid UTF-16 (e.g. an unpaired surrogate)
    #[error("text is not valid UTF-16")]
    InvalidUtf16,

    /// A buffer could not be allocated
    #[error("out of memory while encoding text")]
    OutOfMemory,
}

/// Owned text with a cached, null-terminated UTF-16 view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeText {
    text: String,
    wide: Vec<u16>,
}

impl NativeText {
    /// Copy `text` and encode it for the window system
    pub fn new(text: &str) -> Result<Self, EncodingError> {
        if let Some(position) = text.find('\0') {
            return Err(EncodingError::InteriorNul { position });
        }

        let mut owned = String::new();
        owned
            .try_reserve_exact(text.len())
            .map_err(|_| EncodingError::OutOfMemory)?;
        owned.push_str(text);

        let wide = encode_wide(text)?;
        Ok(Self { text: owned, wide })
    }

    /// Build from raw application-encoded bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EncodingError> {
        let text = std::str::from_utf8(bytes).map_err(|e| EncodingError::InvalidUtf8 {
            valid_up_to: e.valid_up_to(),
        })?;
        Self::new(text)
    }

    /// Application-encoded text
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Window-system-encoded text, including the trailing NUL
    pub fn as_wide(&self) -> &[u16] {
        &self.wide
    }

    /// Pointer to the null-terminated UTF-16 buffer
    ///
    /// Valid for as long as `self` is alive and unmodified.
    pub fn as_wide_ptr(&self) -> *const u16 {
        self.wide.as_ptr()
    }

    /// Number of UTF-16 code units, excluding the terminator
    pub fn wide_len(&self) -> usize {
        self.wide.len() - 1
    }

    /// Whether the text is empty
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl fmt::Display for NativeText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Encode `text` as null-terminated UTF-16
pub fn encode_wide(text: &str) -> Result<Vec<u16>, EncodingError> {
    let units = text.encode_utf16().count() + 1;
    let mut wide = Vec::new();
    wide.try_reserve_exact(units)
        .map_err(|_| EncodingError::OutOfMemory)?;
    wide.extend(text.encode_utf16());
    wide.push(0);
    Ok(wide)
}

/// Decode UTF-16 back to a `String`, stopping at the first NUL if present
pub fn decode_wide(wide: &[u16]) -> Result<String, EncodingError> {
    let end = wide.iter().position(|&unit| unit == 0).unwrap_or(wide.len());
    String::from_utf16(&wide[..end]).map_err(|_| EncodingError::InvalidUtf16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_preserves_text() {
        for text in ["", "Hello", "Fenêtre principale", "窓", "rocket 🚀 launch"] {
            let native = NativeText::new(text).unwrap();
            assert_eq!(native.as_str(), text);
            assert_eq!(decode_wide(native.as_wide()).unwrap(), text);
        }
    }

    #[test]
    fn test_wide_buffer_is_null_terminated() {
        let native = NativeText::new("abc").unwrap();
        assert_eq!(native.as_wide(), &[97, 98, 99, 0]);
        assert_eq!(native.wide_len(), 3);

        let empty = NativeText::new("").unwrap();
        assert_eq!(empty.as_wide(), &[0]);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_surrogate_pairs_count_as_two_units() {
        let native = NativeText::new("🚀").unwrap();
        assert_eq!(native.wide_len(), 2);
    }

    #[test]
    fn test_interior_nul_is_rejected() {
        let err = NativeText::new("bad\0title").unwrap_err();
        assert_eq!(err, EncodingError::InteriorNul { position: 3 });
    }

    #[test]
    fn test_invalid_utf8_bytes_are_rejected() {
        let err = NativeText::from_bytes(&[b'o', b'k', 0xFF]).unwrap_err();
        assert_eq!(err, EncodingError::InvalidUtf8 { valid_up_to: 2 });
        assert_eq!(NativeText::from_bytes(b"fine").unwrap().as_str(), "fine");
    }

    #[test]
    fn test_unpaired_surrogate_fails_to_decode() {
        assert_eq!(decode_wide(&[0xD800, 0]), Err(EncodingError::InvalidUtf16));
    }

    #[test]
    fn test_decode_stops_at_terminator() {
        let wide = [104, 105, 0, 120];
        assert_eq!(decode_wide(&wide).unwrap(), "hi");
    }
}
