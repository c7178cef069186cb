//! Provider abstractions for embeddings and generation
//!
//! The pipeline only sees the two traits; the backend named in the
//! configuration decides which implementations are built.

pub mod embedding;
pub mod gemini;
pub mod llm;
pub mod ollama;

use std::sync::Arc;

use crate::config::{BackendProvider, Credentials, RagConfig};
use crate::error::{Error, Result};

pub use embedding::EmbeddingProvider;
pub use gemini::{GeminiClient, GeminiEmbedder, GeminiLlm};
pub use llm::LlmProvider;
pub use ollama::{OllamaClient, OllamaEmbedder, OllamaLlm};

/// Build the embedding and generation providers for the configured backend
pub fn build_providers(
    config: &RagConfig,
    credentials: &Credentials,
) -> Result<(Arc<dyn EmbeddingProvider>, Arc<dyn LlmProvider>)> {
    match config.backend {
        BackendProvider::Gemini => {
            let api_key = credentials
                .api_key
                .clone()
                .ok_or_else(|| Error::MissingCredential(config.llm.api_key_env.clone()))?;
            let client = Arc::new(GeminiClient::new(&config.llm, api_key)?);

            tracing::info!(
                "Using Gemini backend (embed: {}, generate: {})",
                config.embeddings.model,
                config.llm.generate_model
            );
            Ok((
                Arc::new(GeminiEmbedder::new(Arc::clone(&client), &config.embeddings)),
                Arc::new(GeminiLlm::new(client, &config.llm)),
            ))
        }
        BackendProvider::Ollama => {
            let client = Arc::new(OllamaClient::new(&config.llm)?);

            tracing::info!(
                "Using Ollama backend at {} (embed: {}, generate: {})",
                config.llm.ollama_base_url,
                config.embeddings.ollama_model,
                config.llm.ollama_model
            );
            Ok((
                Arc::new(OllamaEmbedder::new(Arc::clone(&client), &config.embeddings)),
                Arc::new(OllamaLlm::new(client, &config.llm)),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_without_key_fails() {
        let config = RagConfig::default();
        let result = build_providers(&config, &Credentials::default());
        assert!(matches!(result, Err(Error::MissingCredential(_))));
    }

    #[test]
    fn test_ollama_providers() {
        let config = RagConfig {
            backend: BackendProvider::Ollama,
            ..Default::default()
        };
        let (embedder, llm) = build_providers(&config, &Credentials::default()).unwrap();
        assert_eq!(embedder.name(), "ollama");
        assert_eq!(embedder.dimensions(), 768);
        assert_eq!(llm.model(), "llama3.2:3b");
    }
}
