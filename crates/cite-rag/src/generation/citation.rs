//! Citation tags and marker extraction

use once_cell::sync::Lazy;
use regex::Regex;

static MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[S(\d+)\]").expect("Invalid regex"));

/// Tag identifying the chunk retrieved at `rank` (1-based)
pub fn citation_tag(rank: usize, doc_label: &str, chunk_id: &str) -> String {
    format!("S{}:{}:{}", rank, doc_label, chunk_id)
}

/// Hard-cut `text` to at most `max_chars` characters
pub fn truncate_snippet(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

/// Ranks referenced by `[S{n}]` markers in a generated answer, in first-seen
/// order and without repeats
pub fn cited_ranks(answer: &str) -> Vec<usize> {
    let mut ranks = Vec::new();
    for cap in MARKER.captures_iter(answer) {
        if let Some(rank) = cap.get(1).and_then(|m| m.as_str().parse::<usize>().ok()) {
            if !ranks.contains(&rank) {
                ranks.push(rank);
            }
        }
    }
    ranks
}
