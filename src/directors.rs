//! Splitting of multi-valued director credits.
//!
//! Co-directed campaigns arrive as one free-text cell: `"A, B & C"`,
//! `"A x B"`, `"A et B"`, `"A / B"`, `"A + B"`. Splitting yields the atomic
//! names used for the per-campaign director union and for explode counting.

use crate::harmonize::UNKNOWN;

const CHAR_SEPARATORS: &[char] = &[',', '/', '&'];

/// Word-level separators; only recognized between two name fragments so
/// trailing initials like "Malcolm X" survive.
const WORD_SEPARATORS: &[&str] = &["x", "et", "+"];

/// Splits a director cell into trimmed atomic names. Empty or all-sentinel
/// input yields the sentinel as the sole element. Duplicate names are kept;
/// callers deduplicate where attribution requires it.
pub fn split_values(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return vec![UNKNOWN.to_string()];
    }

    let mut names = Vec::new();
    for segment in trimmed.split(CHAR_SEPARATORS) {
        split_segment(segment, &mut names);
    }

    if names.is_empty() || names.iter().all(|name| name == UNKNOWN) {
        return vec![UNKNOWN.to_string()];
    }
    names
}

fn split_segment(segment: &str, out: &mut Vec<String>) {
    let words: Vec<&str> = segment.split_whitespace().collect();
    let mut current: Vec<&str> = Vec::new();
    for (idx, word) in words.iter().enumerate() {
        let lowered = word.to_lowercase();
        let is_separator = idx > 0
            && idx + 1 < words.len()
            && WORD_SEPARATORS.contains(&lowered.as_str());
        if is_separator {
            if !current.is_empty() {
                out.push(current.join(" "));
                current.clear();
            }
        } else {
            current.push(word);
        }
    }
    if !current.is_empty() {
        out.push(current.join(" "));
    }
}
