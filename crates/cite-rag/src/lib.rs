//! cite-rag: per-document retrieval pipeline with citation-tagged answers
//!
//! Documents are split into chunks, embedded, indexed for exact cosine
//! search, and questions are answered by a generator that only sees the
//! top-ranked chunks, each tagged so the answer can cite it.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod processing;
pub mod providers;
pub mod retrieval;
pub mod storage;
pub mod types;

pub use config::{Credentials, RagConfig};
pub use error::{Error, Result};
pub use ingestion::Segmenter;
pub use processing::DocumentPipeline;
pub use retrieval::{EmbeddingMatrix, FlatIpIndex, Retriever, SearchHit};
pub use storage::{DocumentState, DocumentWorkspace};
pub use types::{Answer, Chunk, Citation};
