//! Configuration for the retrieval pipeline
//!
//! Everything the pipeline needs is carried by [`RagConfig`] and threaded
//! through the entry points. The only environment access is
//! [`Credentials::from_env`], which the binary calls once at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Embedding/generation backend
    pub backend: BackendProvider,
    /// Where per-document workspaces live
    pub workspace: WorkspaceConfig,
    /// Segmentation settings
    pub chunking: ChunkingConfig,
    /// Embedding model settings
    pub embeddings: EmbeddingConfig,
    /// Generation settings
    pub llm: LlmConfig,
    /// Retrieval settings
    pub retrieval: RetrievalConfig,
    /// Source extraction settings
    pub ingest: IngestConfig,
}

impl RagConfig {
    /// Load configuration from a TOML file; missing keys take their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("cannot read config file {}: {}", path.display(), e))
        })?;
        let config: Self = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when given, otherwise use defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => {
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        let c = &self.chunking;
        if c.max_chars == 0 {
            return Err(Error::config("chunking.max_chars must be greater than 0"));
        }
        if c.overlap >= c.max_chars {
            return Err(Error::config(format!(
                "chunking.overlap ({}) must be smaller than chunking.max_chars ({})",
                c.overlap, c.max_chars
            )));
        }
        if !(c.boundary_ratio > 0.0 && c.boundary_ratio <= 1.0) {
            return Err(Error::config(format!(
                "chunking.boundary_ratio must be in (0, 1], got {}",
                c.boundary_ratio
            )));
        }
        if self.embeddings.dimensions == 0 {
            return Err(Error::config("embeddings.dimensions must be greater than 0"));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::config("retrieval.top_k must be at least 1"));
        }
        if self.retrieval.snippet_chars == 0 {
            return Err(Error::config("retrieval.snippet_chars must be greater than 0"));
        }
        Ok(())
    }
}

/// Backend provider selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendProvider {
    /// Google Generative Language API (requires an API key)
    #[default]
    Gemini,
    /// Local Ollama server
    Ollama,
}

/// Workspace layout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Directory holding one sub-directory per document
    pub root: PathBuf,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("artifacts"),
        }
    }
}

/// Text segmentation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Window size in characters
    pub max_chars: usize,
    /// Requested overlap between consecutive chunks in characters
    pub overlap: usize,
    /// A sentence boundary is only used when it lies at or beyond this
    /// fraction of the window
    pub boundary_ratio: f64,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chars: 1800,
            overlap: 150,
            boundary_ratio: 0.6,
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Gemini embedding model
    pub model: String,
    /// Ollama embedding model
    pub ollama_model: String,
    /// Vector dimension produced by the configured model
    pub dimensions: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "text-embedding-004".to_string(),
            ollama_model: "nomic-embed-text".to_string(),
            dimensions: 768,
        }
    }
}

/// Generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Generative Language API base URL
    pub gemini_base_url: String,
    /// Gemini generation model
    pub generate_model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Ollama base URL
    pub ollama_base_url: String,
    /// Ollama generation model
    pub ollama_model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            gemini_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            generate_model: "gemini-2.5-flash".to_string(),
            api_key_env: "GOOGLE_API_KEY".to_string(),
            ollama_base_url: "http://localhost:11434".to_string(),
            ollama_model: "llama3.2:3b".to_string(),
            temperature: 0.2,
            timeout_secs: 120,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of chunks placed in the prompt
    pub top_k: usize,
    /// Hard character cap on each context snippet
    pub snippet_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            snippet_chars: 1200,
        }
    }
}

/// Source extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Pages read from a PDF before extraction stops
    pub max_pdf_pages: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self { max_pdf_pages: 80 }
    }
}

/// Credentials resolved once at startup
#[derive(Clone, Default)]
pub struct Credentials {
    /// API key for the Gemini backend
    pub api_key: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Credentials {
    /// Resolve credentials through `lookup`; a backend that needs a key and
    /// has none is a fatal error
    pub fn resolve<F>(config: &RagConfig, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(&config.llm.api_key_env).filter(|k| !k.trim().is_empty());

        if config.backend == BackendProvider::Gemini && api_key.is_none() {
            return Err(Error::MissingCredential(config.llm.api_key_env.clone()));
        }

        Ok(Self { api_key })
    }

    /// Resolve credentials from the process environment
    pub fn from_env(config: &RagConfig) -> Result<Self> {
        Self::resolve(config, |name| std::env::var(name).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = RagConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunking.max_chars, 1800);
        assert_eq!(config.chunking.overlap, 150);
        assert_eq!(config.retrieval.top_k, 4);
        assert_eq!(config.retrieval.snippet_chars, 1200);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: RagConfig = toml::from_str(
            r#"
            backend = "ollama"

            [chunking]
            max_chars = 500
            "#,
        )
        .unwrap();

        assert_eq!(config.backend, BackendProvider::Ollama);
        assert_eq!(config.chunking.max_chars, 500);
        assert_eq!(config.chunking.overlap, 150);
        assert_eq!(config.embeddings.dimensions, 768);
    }

    #[test]
    fn test_overlap_must_be_smaller_than_window() {
        let mut config = RagConfig::default();
        config.chunking.max_chars = 100;
        config.chunking.overlap = 100;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_zero_top_k_rejected() {
        let mut config = RagConfig::default();
        config.retrieval.top_k = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_gemini_key_is_fatal() {
        let config = RagConfig::default();
        let err = Credentials::resolve(&config, |_| None).unwrap_err();
        assert!(matches!(err, Error::MissingCredential(ref v) if v == "GOOGLE_API_KEY"));
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let config = RagConfig::default();
        let err = Credentials::resolve(&config, |_| Some("  ".to_string())).unwrap_err();
        assert!(matches!(err, Error::MissingCredential(_)));
    }

    #[test]
    fn test_ollama_needs_no_key() {
        let config = RagConfig {
            backend: BackendProvider::Ollama,
            ..Default::default()
        };
        let creds = Credentials::resolve(&config, |_| None).unwrap();
        assert!(creds.api_key.is_none());
    }

    #[test]
    fn test_key_is_redacted_in_debug() {
        let config = RagConfig::default();
        let creds = Credentials::resolve(&config, |_| Some("secret".to_string())).unwrap();
        assert!(!format!("{:?}", creds).contains("secret"));
    }
}
