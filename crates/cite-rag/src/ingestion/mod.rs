//! Source extraction and segmentation

mod parser;
mod segmenter;

pub use parser::{discover_sources, FileParser};
pub use segmenter::{normalize_whitespace, Segmenter, Span};
