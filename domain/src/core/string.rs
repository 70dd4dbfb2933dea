//! String utilities for the domain layer.

/// Truncate a string to a maximum length with ellipsis (UTF-8 safe)
///
/// Uses byte length for `max_len` but cuts on a character boundary.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        let target = max_len.saturating_sub(3);
        let mut end = target.min(s.len());
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}

/// Short single-line excerpt of an answer, used in disagreement reports.
///
/// Collapses whitespace, keeps the first sentence when it is short enough,
/// otherwise truncates.
pub fn excerpt(s: &str, max_len: usize) -> String {
    let collapsed = s.split_whitespace().collect::<Vec<_>>().join(" ");
    let first_sentence = collapsed
        .find(". ")
        .map(|idx| &collapsed[..=idx])
        .unwrap_or(&collapsed);
    truncate(first_sentence, max_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_ascii() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 8), "hello...");
    }

    #[test]
    fn test_truncate_multibyte() {
        // 'é' spans bytes 1..3: a cut at 3 is on a boundary, a cut at 2 backs up
        assert_eq!(truncate("résumé résumé", 6), "ré...");
        assert_eq!(truncate("résumé résumé", 5), "r...");
        assert_eq!(truncate("naïve", 20), "naïve");
    }

    #[test]
    fn test_excerpt_first_sentence() {
        let text = "Revenue was $1,200 in March.   Orders grew by 4%.";
        assert_eq!(excerpt(text, 80), "Revenue was $1,200 in March.");
    }

    #[test]
    fn test_excerpt_truncates_long_sentence() {
        let text = "a ".repeat(100);
        let short = excerpt(&text, 20);
        assert!(short.len() <= 20);
        assert!(short.ends_with("..."));
    }
}
