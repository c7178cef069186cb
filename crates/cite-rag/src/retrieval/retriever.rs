//! Question answering over one workspace's index

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::generation::{cited_ranks, PromptBuilder};
use crate::providers::{EmbeddingProvider, LlmProvider};
use crate::retrieval::FlatIpIndex;
use crate::types::{Answer, Chunk, Citation};

/// Default hard cap on snippet length in characters
const DEFAULT_SNIPPET_CHARS: usize = 1200;

/// Embeds a question, retrieves the closest chunks and asks the generator
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn LlmProvider>,
    snippet_chars: usize,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            embedder,
            llm,
            snippet_chars: DEFAULT_SNIPPET_CHARS,
        }
    }

    pub fn with_snippet_chars(mut self, snippet_chars: usize) -> Self {
        self.snippet_chars = snippet_chars.max(1);
        self
    }

    /// Retrieve up to `k` citations for `question`, in rank order
    pub async fn retrieve(
        &self,
        question: &str,
        index: &FlatIpIndex,
        chunks: &[Chunk],
        k: usize,
    ) -> Result<Vec<Citation>> {
        if chunks.len() != index.len() {
            return Err(Error::CountMismatch {
                chunks: chunks.len(),
                vectors: index.len(),
            });
        }

        let query = self.embedder.embed(question).await?;
        if query.len() != index.dimensions() {
            return Err(Error::DimensionMismatch {
                expected: index.dimensions(),
                got: query.len(),
            });
        }

        let hits = index.search(&query, k)?;
        tracing::debug!("Retrieved {} of {} chunks", hits.len(), chunks.len());

        Ok(hits
            .iter()
            .enumerate()
            .map(|(i, hit)| Citation::from_chunk(i + 1, &chunks[hit.position], hit.score, self.snippet_chars))
            .collect())
    }

    /// Answer `question` from the `k` best chunks
    ///
    /// The generator is called even when nothing was retrieved; it then sees
    /// an empty context and is expected to reply with the not-found sentence.
    pub async fn answer(
        &self,
        question: &str,
        index: &FlatIpIndex,
        chunks: &[Chunk],
        k: usize,
    ) -> Result<Answer> {
        let citations = self.retrieve(question, index, chunks, k).await?;

        let context = PromptBuilder::build_context(&citations);
        let prompt = PromptBuilder::build_grounded_prompt(question, &context);

        tracing::info!(
            "Generating answer with {} ({}) from {} sources",
            self.llm.name(),
            self.llm.model(),
            citations.len()
        );
        let generated = self.llm.generate(&prompt).await?;
        let text = generated.trim();

        let unknown: Vec<usize> = cited_ranks(text)
            .into_iter()
            .filter(|&rank| rank == 0 || rank > citations.len())
            .collect();
        if !unknown.is_empty() {
            tracing::warn!("Answer cites sources that were not retrieved: {:?}", unknown);
        }

        Ok(Answer::new(question, citations, text))
    }
}
