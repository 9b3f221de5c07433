//! Byte-to-text decoding with BOM detection and legacy-encoding fallback.
//!
//! Used by the text loader so credentials and templates saved by Windows
//! editors (UTF-16 with BOM, windows-1252) still come back as clean strings.

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};

const DEFAULT_SAMPLE_SIZE: usize = 8192;

/// Detect the encoding of a byte buffer.
///
/// Strategy:
/// 1. Check for BOM markers first (most reliable)
/// 2. Try strict UTF-8 decoding (fast path for most files)
/// 3. Fall back to chardetng for non-UTF-8 content
pub fn detect_encoding(bytes: &[u8]) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return encoding;
    }

    if std::str::from_utf8(bytes).is_ok() {
        return UTF_8;
    }

    let sample = &bytes[..bytes.len().min(DEFAULT_SAMPLE_SIZE)];
    let mut detector = EncodingDetector::new();
    detector.feed(sample, true);
    detector.guess(None, true)
}

/// Decode bytes into a `String`.
///
/// Any BOM is stripped. Invalid sequences are replaced rather than rejected.
///
/// # Returns
/// A tuple `(content, encoding_used)` where the label is lower-cased
pub fn decode_text(bytes: &[u8]) -> (String, String) {
    // Valid UTF-8 without a BOM needs no copy through the decoder
    if Encoding::for_bom(bytes).is_none() {
        if let Ok(text) = std::str::from_utf8(bytes) {
            return (text.to_string(), "utf-8".to_string());
        }
    }

    let encoding = detect_encoding(bytes);
    let (decoded, used, _had_errors) = encoding.decode(bytes);
    (decoded.into_owned(), used.name().to_lowercase())
}
