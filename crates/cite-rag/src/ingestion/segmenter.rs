//! Whitespace normalization and sentence-aware windowed segmentation
//!
//! Text is walked in windows of `max_chars` characters. Each window is cut
//! just after its last period when that period lies far enough into the
//! window (`boundary_ratio`), otherwise at the window end. The final window,
//! which already reaches the end of the text, is taken whole.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::ChunkingConfig;
use crate::error::{Error, Result};
use crate::types::{Chunk, SourceText};

static LINE_ENDINGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r\n?").expect("Invalid regex"));
static HORIZONTAL_WS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\S\r\n]+").expect("Invalid regex"));
static BLANK_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").expect("Invalid regex"));

/// Normalize whitespace; applying it twice yields the same text as once
pub fn normalize_whitespace(text: &str) -> String {
    let text = LINE_ENDINGS.replace_all(text, "\n");
    let text = HORIZONTAL_WS.replace_all(&text, " ");
    let text = BLANK_RUNS.replace_all(&text, "\n\n");
    text.trim().to_string()
}

/// Half-open character range `[start, cut)` selected by one window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub cut: usize,
}

/// Splits documents into ordered chunks
#[derive(Debug, Clone)]
pub struct Segmenter {
    max_chars: usize,
    overlap: usize,
    boundary_ratio: f64,
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::from_config(&ChunkingConfig::default())
    }
}

impl Segmenter {
    /// Create a segmenter with the default boundary ratio
    pub fn new(max_chars: usize, overlap: usize) -> Self {
        Self {
            max_chars: max_chars.max(1),
            overlap,
            boundary_ratio: ChunkingConfig::default().boundary_ratio,
        }
    }

    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(config.max_chars, config.overlap).with_boundary_ratio(config.boundary_ratio)
    }

    pub fn with_boundary_ratio(mut self, ratio: f64) -> Self {
        self.boundary_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    /// Earliest offset inside a window at which a period may end a chunk
    fn min_boundary(&self) -> usize {
        (self.max_chars as f64 * self.boundary_ratio).floor() as usize
    }

    /// Compute the window spans over `chars`
    ///
    /// The next window starts at `max(cut - overlap, cut)`, which is always
    /// `cut`: the configured overlap never moves the window back.
    pub fn spans(&self, chars: &[char]) -> Vec<Span> {
        let n = chars.len();
        let min_boundary = self.min_boundary();
        let mut spans = Vec::new();
        let mut start = 0usize;

        while start < n {
            let end = n.min(start + self.max_chars);

            let cut = if end == n {
                end
            } else {
                chars[start..end]
                    .iter()
                    .rposition(|&c| c == '.')
                    .filter(|&offset| offset >= min_boundary)
                    .map(|offset| start + offset + 1)
                    .unwrap_or(end)
            };

            spans.push(Span { start, cut });

            let next = cut.saturating_sub(self.overlap).max(cut);
            debug_assert!(next > start, "segmenter window failed to advance");
            start = next;
        }

        spans
    }

    /// Split already-normalized text into trimmed, non-empty pieces
    pub fn split(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();

        self.spans(&chars)
            .into_iter()
            .filter_map(|span| {
                let piece: String = chars[span.start..span.cut].iter().collect();
                let piece = piece.trim();
                (!piece.is_empty()).then(|| piece.to_string())
            })
            .collect()
    }

    /// Normalize and segment one document
    pub fn segment_document(&self, doc_index: usize, doc_label: &str, raw_text: &str) -> Vec<Chunk> {
        let text = normalize_whitespace(raw_text);

        self.split(&text)
            .into_iter()
            .enumerate()
            .map(|(i, piece)| Chunk::new(doc_index, i + 1, doc_label, piece))
            .collect()
    }

    /// Segment every source, numbering documents from 1
    ///
    /// A source with no text contributes no chunks; if none contribute any,
    /// there is nothing to index and the result is an error.
    pub fn segment_all(&self, sources: &[SourceText]) -> Result<Vec<Chunk>> {
        let mut chunks = Vec::new();

        for (i, source) in sources.iter().enumerate() {
            let doc_chunks = self.segment_document(i + 1, &source.name, &source.text);
            if doc_chunks.is_empty() {
                tracing::warn!("{} produced no chunks", source.name);
            } else {
                tracing::debug!(
                    "{} ({}): {} chunks",
                    source.name,
                    source.file_type.display_name(),
                    doc_chunks.len()
                );
            }
            chunks.extend(doc_chunks);
        }

        if chunks.is_empty() {
            return Err(Error::EmptyChunkSet);
        }

        Ok(chunks)
    }
}
