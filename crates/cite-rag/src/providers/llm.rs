//! LLM provider trait for text generation

use async_trait::async_trait;
use crate::error::Result;

/// Trait for prompt-in, text-out generation
///
/// Implementations:
/// - `GeminiLlm`: Generative Language API (gemini-2.5-flash)
/// - `OllamaLlm`: Local Ollama server
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a completion for a fully assembled prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
