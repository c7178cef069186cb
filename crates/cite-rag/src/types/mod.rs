//! Core types for the retrieval pipeline

pub mod document;
pub mod response;

pub use document::{Chunk, DocumentMeta, FileType, SourceText};
pub use response::{Answer, Citation};
