//! Per-document workspaces and artifact formats

pub mod faiss;
pub mod npy;
mod workspace;

use serde::{Deserialize, Serialize};

pub use workspace::{list_indexed, slugify, DocumentWorkspace};

/// How far a workspace has progressed, derived from which artifacts exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentState {
    /// No chunks yet
    Uninitialized,
    /// `chunks.json` written
    Segmented,
    /// `embeddings.npy` written
    Embedded,
    /// `index.faiss` written; questions can be answered
    Indexed,
    /// `summary.md` written
    Ready,
}

impl DocumentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Segmented => "segmented",
            Self::Embedded => "embedded",
            Self::Indexed => "indexed",
            Self::Ready => "ready",
        }
    }
}

impl std::fmt::Display for DocumentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
