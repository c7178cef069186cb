//! Document processing stages

mod pipeline;

pub use pipeline::DocumentPipeline;
