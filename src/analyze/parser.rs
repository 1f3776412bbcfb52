//! Line-oriented parser for the model's `Summary:` / `<Entity>: <sentiment>` reply.
//!
//! The reply format is requested, never guaranteed, so parsing is total: any input
//! yields a (possibly empty) summary and a (possibly empty) list of pairs.

use serde::{Deserialize, Serialize};

/// Summary plus `(entity, sentiment)` pairs extracted from one model reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedInsight {
    pub summary: String,
    pub sentiments: Vec<(String, String)>,
}

impl ParsedInsight {
    pub fn is_empty(&self) -> bool {
        self.summary.is_empty() && self.sentiments.is_empty()
    }
}

/// Every character that ends a line: CR/LF, VT, FF, the file/group/record
/// separators, NEL and the Unicode line and paragraph separators.
fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\u{0B}' | '\u{0C}' | '\u{1C}'..='\u{1E}' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

pub fn parse_response(text: &str) -> ParsedInsight {
    let mut out = ParsedInsight::default();

    for line in text.split(is_line_break) {
        let lower = line.to_lowercase();
        if lower.contains("summary:") {
            if let Some((_, rest)) = line.split_once(':') {
                out.summary = rest.trim().to_string();
            }
        } else if !lower.starts_with("summary") {
            if let Some((entity, sentiment)) = line.split_once(':') {
                out.sentiments
                    .push((entity.trim().to_string(), sentiment.trim().to_lowercase()));
            }
        }
    }

    out
}
