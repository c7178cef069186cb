//! Embedding provider trait for turning text into vectors

use async_trait::async_trait;
use crate::error::Result;

/// Trait for generating text embeddings
///
/// Implementations:
/// - `GeminiEmbedder`: Generative Language API (text-embedding-004)
/// - `OllamaEmbedder`: Local Ollama server (nomic-embed-text)
///
/// One call per text and no retry: a failure is returned to the caller,
/// which aborts the stage.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate the embedding for a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Dimension every returned vector must have
    fn dimensions(&self) -> usize;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
