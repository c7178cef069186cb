//! Error types for the retrieval pipeline

use std::path::PathBuf;

use thiserror::Error;

use crate::storage::DocumentState;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline errors
///
/// Every variant is fatal for the operation that raised it; callers surface
/// the message and never substitute a default.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or inconsistent configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Credential required by the selected backend is absent
    #[error("Missing credential: environment variable {0} is not set")]
    MissingCredential(String),

    /// A pipeline stage needs an artifact that has not been produced
    #[error("Required artifact not found: {}", .0.display())]
    MissingArtifact(PathBuf),

    /// An artifact exists but cannot be decoded
    #[error("Invalid artifact {}: {message}", .path.display())]
    ArtifactFormat { path: PathBuf, message: String },

    /// Workspace has not reached the state a stage requires
    #[error("Document '{doc_id}' is {actual}; this step requires it to be {required} or later")]
    InvalidState {
        doc_id: String,
        actual: DocumentState,
        required: DocumentState,
    },

    /// Workspace directory does not exist
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    /// Chunk and vector collections disagree in length
    #[error("Mismatch: {chunks} chunks vs {vectors} embeddings")]
    CountMismatch { chunks: usize, vectors: usize },

    /// Vector dimension differs from the one the index or model expects
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Stored vector cannot be normalized
    #[error("Vector at position {0} has zero or non-finite norm; cosine similarity is undefined")]
    DegenerateVector(usize),

    /// Query vector cannot be normalized
    #[error("Query embedding has zero or non-finite norm")]
    DegenerateQuery,

    /// No ingestible source files
    #[error("No documents found in {}", .0.display())]
    NoDocuments(PathBuf),

    /// Every source produced zero chunks
    #[error("Nothing to index: every document produced zero chunks")]
    EmptyChunkSet,

    /// File parsing error
    #[error("Failed to parse file '{filename}': {message}")]
    FileParse { filename: String, message: String },

    /// Unsupported file type
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// Embedding error
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Generation error
    #[error("LLM error: {0}")]
    Llm(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML configuration error
    #[error("Config file error: {0}")]
    Toml(#[from] toml::de::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a file parse error
    pub fn file_parse(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FileParse {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an artifact format error
    pub fn artifact(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ArtifactFormat {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create an LLM error
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm(message.into())
    }
}
