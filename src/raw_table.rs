//! Decoded line table for operator CSV payloads
//!
//! The regional operators publish their demand CSVs in legacy encodings
//! (Shift_JIS in every feed observed so far), so the payload cannot be
//! treated as UTF-8. [`RawTable::decode`] resolves the declared WHATWG
//! encoding label, decodes the bytes, and splits the text into lines on the
//! source's native line-ending convention (CRLF or LF).
//!
//! Decoding is strict: bytes that are not valid in the declared encoding
//! fail the cycle instead of being replaced, since a half-garbled table
//! would slice into nonsense rows downstream.

use encoding_rs::Encoding;

use crate::error::DecodeError;

/// A decoded CSV payload as an ordered list of text lines
///
/// Row offsets in a [`crate::layout::LayoutSpec`] index into this list.
#[derive(Debug, Clone)]
pub struct RawTable {
    lines: Vec<String>,
}

impl RawTable {
    /// Decode a byte payload in the declared encoding into a line table
    ///
    /// # Arguments
    ///
    /// * `bytes` - Raw payload as fetched from the operator
    /// * `encoding_label` - WHATWG encoding label (e.g. "shift_jis", "utf-8")
    ///
    /// # Returns
    ///
    /// * `Ok(RawTable)` - Decoded lines, in payload order
    /// * `Err(DecodeError::UnknownEncoding)` - Label is not recognized
    /// * `Err(DecodeError::Malformed)` - Bytes are invalid in the encoding
    ///
    /// # Examples
    ///
    /// ```
    /// use demandwatch::RawTable;
    ///
    /// let table = RawTable::decode(b"2024/1/1,0:00,3100\r\n2024/1/1,0:05,3080\n", "utf-8").unwrap();
    /// assert_eq!(table.len(), 2);
    /// assert_eq!(table.lines()[0], "2024/1/1,0:00,3100");
    /// ```
    pub fn decode(bytes: &[u8], encoding_label: &str) -> Result<RawTable, DecodeError> {
        let encoding = Encoding::for_label(encoding_label.as_bytes())
            .ok_or_else(|| DecodeError::UnknownEncoding(encoding_label.to_string()))?;

        let (text, _, had_errors) = encoding.decode(bytes);
        if had_errors {
            return Err(DecodeError::Malformed {
                encoding: encoding.name().to_string(),
            });
        }

        // str::lines splits on '\n' and strips a trailing '\r', which covers
        // both line-ending conventions seen in the feeds.
        let lines = text.lines().map(str::to_string).collect();
        Ok(RawTable { lines })
    }

    /// The decoded lines, in payload order
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Number of decoded lines
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// True when the payload decoded to no lines at all
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
