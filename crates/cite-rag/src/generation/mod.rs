//! Grounded prompt assembly and citation handling

pub mod citation;
pub mod prompt;

pub use citation::{cited_ranks, citation_tag, truncate_snippet};
pub use prompt::{PromptBuilder, NOT_FOUND_SENTINEL, SUMMARY_PROMPT};
