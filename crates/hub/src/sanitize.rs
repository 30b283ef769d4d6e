//! UTF-8 repair for raw log chunks
//!
//! The producer hands over whatever the log source wrote, and chunk
//! boundaries are not aligned with character boundaries. `sanitize` turns
//! such a chunk into valid text by dropping every invalid sequence, so the
//! output is never longer (in bytes) than the input.

use std::borrow::Cow;

/// Convert an arbitrary byte chunk into valid UTF-8 text
///
/// Each invalid unit is skipped by exactly the number of bytes a conformant
/// decoder consumes for it (the maximal invalid subpart, at least one byte),
/// then decoding resumes. A multi-byte character cut off at the end of the
/// chunk is dropped. Valid input is borrowed without copying.
pub fn sanitize(raw: &[u8]) -> Cow<'_, str> {
    if let Ok(text) = std::str::from_utf8(raw) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(raw.len());
    for chunk in raw.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    Cow::Owned(out)
}

#[cfg(test)]
#[path = "sanitize_test.rs"]
mod tests;
