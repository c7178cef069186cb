//! Embedding matrices, exact similarity search and question answering

mod index;
mod matrix;
mod retriever;

pub use index::{l2_normalize, FlatIpIndex, SearchHit};
pub use matrix::EmbeddingMatrix;
pub use retriever::Retriever;
