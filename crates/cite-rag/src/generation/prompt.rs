//! Prompt templates for grounded generation

use crate::types::Citation;

/// Reply the generator is told to give when the context lacks the answer
pub const NOT_FOUND_SENTINEL: &str = "Not found in the provided sources.";

/// Question asked to produce a document's study notes
pub const SUMMARY_PROMPT: &str = "Summarize this document into concise, study-friendly notes. \
Use short headings and bullet points. Base only on the document. Keep 8–15 bullets.";

/// Prompt builder for grounded questions
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build the context block: one `{tag}: {snippet}` entry per citation,
    /// in rank order, separated by a blank line
    pub fn build_context(citations: &[Citation]) -> String {
        citations
            .iter()
            .map(|c| format!("{}: {}", c.tag, c.snippet))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Build the full prompt; an empty `context` still yields a valid prompt
    pub fn build_grounded_prompt(question: &str, context: &str) -> String {
        format!(
            "Answer using ONLY the provided context. If not present, say: '{sentinel}'\n\n\
             Context:\n{context}\n\n\
             Question: {question}\n\n\
             Return a concise answer (3–6 sentences) followed by citations like [S1], [S2].",
            sentinel = NOT_FOUND_SENTINEL,
            context = context,
            question = question,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Chunk;

    #[test]
    fn test_prompt_wording() {
        let prompt = PromptBuilder::build_grounded_prompt("What is X?", "S1:a.txt:D1-C1: X is Y.");

        assert_eq!(
            prompt,
            "Answer using ONLY the provided context. If not present, say: 'Not found in the provided sources.'\n\n\
             Context:\nS1:a.txt:D1-C1: X is Y.\n\n\
             Question: What is X?\n\n\
             Return a concise answer (3–6 sentences) followed by citations like [S1], [S2]."
        );
    }

    #[test]
    fn test_context_blocks_in_rank_order() {
        let first = Chunk::new(1, 1, "a.txt", "Alpha.");
        let second = Chunk::new(1, 4, "a.txt", "Delta.");
        let citations = vec![
            Citation::from_chunk(1, &second, 0.9, 1200),
            Citation::from_chunk(2, &first, 0.4, 1200),
        ];

        assert_eq!(
            PromptBuilder::build_context(&citations),
            "S1:a.txt:D1-C4: Delta.\n\nS2:a.txt:D1-C1: Alpha."
        );
    }

    #[test]
    fn test_empty_context() {
        assert_eq!(PromptBuilder::build_context(&[]), "");
        let prompt = PromptBuilder::build_grounded_prompt("Q?", "");
        assert!(prompt.contains("Context:\n\n\nQuestion: Q?"));
    }
}
