//! Character-safe string truncation.
//!
//! Byte slicing (`&s[..n]`) panics inside a multi-byte character, and stored
//! error strings are limited by character count, not bytes. These helpers
//! always cut on a char boundary.

/// Truncate `s` to at most `max_chars` characters.
///
/// Returns a borrowed prefix; no allocation happens.
///
/// ```
/// use chatlog_core::text::truncate_chars;
///
/// assert_eq!(truncate_chars("hello", 3), "hel");
/// assert_eq!(truncate_chars("ab—cd", 3), "ab—");
/// ```
#[inline]
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}

/// Trim surrounding whitespace, then truncate to `max_chars` characters.
pub fn trim_truncate(s: &str, max_chars: usize) -> &str {
    truncate_chars(s.trim(), max_chars)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
