// src/util.rs — Shared display helpers

/// Cut a string to at most `max_len` bytes on a char boundary.
pub fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// First non-blank line of model output, shortened for a progress line.
pub fn preview_line(text: &str, max_len: usize) -> String {
    let line = text.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("");
    let cut = truncate_str(line, max_len);
    if cut.len() < line.len() {
        format!("{}...", cut)
    } else {
        cut.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_multibyte_boundary() {
        assert_eq!(truncate_str("café", 4), "caf");
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello", 0), "");
    }

    #[test]
    fn test_preview_line() {
        assert_eq!(preview_line("\n  Handle empty list  \nmore", 40), "Handle empty list");
        assert_eq!(preview_line("Use a set for lookups", 9), "Use a set...");
        assert_eq!(preview_line("", 10), "");
    }
}
