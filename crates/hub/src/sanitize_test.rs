//! Tests for UTF-8 repair

use super::*;

/// Chunks mixing valid text with every flavour of broken sequence
fn samples() -> [&'static [u8]; 10] {
    [
        b"",
        b"plain ascii line",
        "h\u{e9}llo w\u{f6}rld \u{1f980}".as_bytes(),
        b"a\xffb",
        b"h\xc3",
        b"\xa9llo",
        b"\xe2\x82x",
        b"a\xed\xa0\x80b",
        b"\xf0\x9f\xa6",
        b"\xc0\xaf\xfe\xfe",
    ]
}

// ============================================================================
// Valid input
// ============================================================================

#[test]
fn test_valid_input_is_borrowed() {
    let result = sanitize(b"container started");
    assert!(matches!(result, Cow::Borrowed("container started")));
}

#[test]
fn test_empty_input() {
    assert_eq!(sanitize(b""), "");
}

#[test]
fn test_multibyte_text_preserved() {
    let text = "caf\u{e9} \u{65e5}\u{672c} \u{1f980}";
    assert_eq!(sanitize(text.as_bytes()), text);
}

#[test]
fn test_replacement_character_is_valid_text() {
    // U+FFFD written by the source itself is a real character, not an error
    let text = "bad \u{fffd} byte";
    assert_eq!(sanitize(text.as_bytes()), text);
}

// ============================================================================
// Invalid input
// ============================================================================

#[test]
fn test_lone_invalid_byte_dropped() {
    assert_eq!(sanitize(b"a\xffb"), "ab");
}

#[test]
fn test_truncated_char_at_end_dropped() {
    // "\u{e9}" is C3 A9; the chunk boundary cut it after C3
    assert_eq!(sanitize(b"h\xc3"), "h");
}

#[test]
fn test_truncated_char_at_start_dropped() {
    assert_eq!(sanitize(b"\xa9llo"), "llo");
}

#[test]
fn test_incomplete_sequence_skipped_as_one_unit() {
    // E2 82 is the start of a three byte character; the decoder consumes
    // both bytes as a single invalid unit and resumes at 'x'
    assert_eq!(sanitize(b"\xe2\x82x"), "x");
}

#[test]
fn test_surrogate_encoding_dropped() {
    assert_eq!(sanitize(b"a\xed\xa0\x80b"), "ab");
}

#[test]
fn test_overlong_encoding_dropped() {
    assert_eq!(sanitize(b"\xc0\xafok"), "ok");
}

#[test]
fn test_all_invalid_yields_empty() {
    assert_eq!(sanitize(b"\xff\xfe\xfd"), "");
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn test_never_longer_than_input() {
    for raw in samples() {
        assert!(sanitize(raw).len() <= raw.len(), "grew: {:?}", raw);
    }
}

#[test]
fn test_idempotent() {
    for raw in samples() {
        let once = sanitize(raw).into_owned();
        let twice = sanitize(once.as_bytes());
        assert_eq!(twice, once);
    }
}

#[test]
fn test_split_chunk_never_yields_more_chars_than_whole() {
    let whole = "tail \u{e9}\u{e9}\u{e9} \u{1f980} done".as_bytes();
    let whole_chars = sanitize(whole).chars().count();

    for cut in 0..=whole.len() {
        let (head, tail) = whole.split_at(cut);
        assert!(sanitize(head).chars().count() <= whole_chars);
        assert!(sanitize(tail).chars().count() <= whole_chars);
    }
}
