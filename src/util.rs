//! Shared helpers

/// Longest prefix of `s` that fits in `max_bytes` without splitting a char.
///
/// Chat replies and journal text are user-written and often carry emoji or
/// Cyrillic, so byte slicing has to back off to a char boundary.
pub fn truncate_utf8_safe(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_input_unchanged() {
        assert_eq!(truncate_utf8_safe("📌 added.", 100), "📌 added.");
    }

    #[test]
    fn test_backs_off_to_char_boundary() {
        // Two bytes per Cyrillic letter
        assert_eq!(truncate_utf8_safe("привіт", 5), "пр");
        // The pin emoji is four bytes
        assert_eq!(truncate_utf8_safe("📌x", 3), "");
        assert_eq!(truncate_utf8_safe("ab📌", 4), "ab");
    }

    #[test]
    fn test_zero_budget() {
        assert_eq!(truncate_utf8_safe("hello", 0), "");
    }
}
