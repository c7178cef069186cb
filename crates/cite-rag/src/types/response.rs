//! Answer and citation types

use serde::{Deserialize, Serialize};

use crate::generation::citation::{citation_tag, truncate_snippet};
use crate::types::Chunk;

/// One retrieved chunk, tagged for the prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    /// 1-based rank in the result list
    pub rank: usize,
    /// `S{rank}:{doc_label}:{chunk_id}`
    pub tag: String,
    /// Referenced chunk
    pub chunk_id: String,
    /// Referenced document
    pub doc_label: String,
    /// Cosine similarity to the question
    pub score: f32,
    /// Chunk text hard-cut to the snippet cap
    pub snippet: String,
}

impl Citation {
    /// Create a citation for `chunk` retrieved at `rank`
    pub fn from_chunk(rank: usize, chunk: &Chunk, score: f32, snippet_chars: usize) -> Self {
        Self {
            rank,
            tag: citation_tag(rank, &chunk.doc_label, &chunk.chunk_id),
            chunk_id: chunk.chunk_id.clone(),
            doc_label: chunk.doc_label.clone(),
            score,
            snippet: truncate_snippet(&chunk.text, snippet_chars),
        }
    }
}

/// Result of one question, as stored in `last_answer.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    /// Question as asked
    pub question: String,
    /// Citation tags in rank order
    pub citations: Vec<String>,
    /// Generator output, trimmed
    pub answer: String,
    /// Full citation records; not persisted
    #[serde(skip)]
    pub sources: Vec<Citation>,
}

impl Answer {
    /// Create an answer from the retrieved citations and generated text
    pub fn new(question: impl Into<String>, sources: Vec<Citation>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            citations: sources.iter().map(|c| c.tag.clone()).collect(),
            answer: answer.into(),
            sources,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_record_shape() {
        let chunk = Chunk::new(1, 2, "guide.txt", "Water boils at 100 C.");
        let citation = Citation::from_chunk(1, &chunk, 0.9, 1200);
        let answer = Answer::new("When does water boil?", vec![citation], "At 100 C. [S1]");

        let json = serde_json::to_value(&answer).unwrap();
        assert_eq!(json["question"], "When does water boil?");
        assert_eq!(json["citations"][0], "S1:guide.txt:D1-C2");
        assert_eq!(json["answer"], "At 100 C. [S1]");
        assert!(json.get("sources").is_none());
    }

    #[test]
    fn test_citation_tag() {
        let chunk = Chunk::new(2, 7, "a.md", "text");
        let citation = Citation::from_chunk(3, &chunk, 0.5, 10);
        assert_eq!(citation.rank, 3);
        assert_eq!(citation.tag, "S3:a.md:D2-C7");
    }
}
