// src/ingest/mod.rs
pub mod extract;
pub mod providers;
pub mod types;

/// Max characters of article text handed to the model.
pub const ARTICLE_MAX_CHARS: usize = 3000;

/// Keep the first `max` characters (not bytes).
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_counts_chars_not_bytes() {
        let s = "ééééé";
        assert_eq!(truncate_chars(s, 3), "ééé");
        assert_eq!(truncate_chars(s, 10), s);
        assert_eq!(truncate_chars("", 3), "");
    }
}
