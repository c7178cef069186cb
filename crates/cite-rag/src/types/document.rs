//! Source document and chunk types

use serde::{Deserialize, Serialize};

/// Supported source file types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF document
    Pdf,
    /// Plain text file
    Txt,
    /// Markdown file
    Markdown,
    /// Anything else
    Unknown,
}

impl FileType {
    /// Detect file type from extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "txt" | "text" => Self::Txt,
            "md" | "markdown" => Self::Markdown,
            _ => Self::Unknown,
        }
    }

    /// Detect file type from a path's extension
    pub fn from_path(path: &std::path::Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::Unknown)
    }

    /// Check if text can be extracted from this type
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Get display name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Pdf => "PDF",
            Self::Txt => "Text File",
            Self::Markdown => "Markdown",
            Self::Unknown => "Unknown",
        }
    }
}

/// Raw text extracted from one source file
#[derive(Debug, Clone)]
pub struct SourceText {
    /// File name shown in citations
    pub name: String,
    /// Detected file type
    pub file_type: FileType,
    /// Extracted, not yet normalized, text
    pub text: String,
}

impl SourceText {
    pub fn new(name: impl Into<String>, file_type: FileType, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file_type,
            text: text.into(),
        }
    }
}

/// A unit of retrievable text, as stored in `chunks.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// `D{doc_index}-C{local_index}`, both 1-based
    pub chunk_id: String,
    /// Display name of the originating document
    #[serde(rename = "doc")]
    pub doc_label: String,
    /// Chunk text, never empty
    pub text: String,
}

impl Chunk {
    /// Create a chunk for the `local_index`-th piece of the `doc_index`-th document
    pub fn new(
        doc_index: usize,
        local_index: usize,
        doc_label: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            chunk_id: Self::format_id(doc_index, local_index),
            doc_label: doc_label.into(),
            text: text.into(),
        }
    }

    /// Format a chunk identifier
    pub fn format_id(doc_index: usize, local_index: usize) -> String {
        format!("D{}-C{}", doc_index, local_index)
    }
}

/// Workspace metadata, as stored in `meta.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMeta {
    /// File the workspace was created from
    pub source_file: String,
    /// Every source segmented into this workspace, in doc_index order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub docs: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_serializes_with_doc_key() {
        let chunk = Chunk::new(1, 3, "notes.md", "Some text.");
        let json = serde_json::to_value(&chunk).unwrap();

        assert_eq!(json["chunk_id"], "D1-C3");
        assert_eq!(json["doc"], "notes.md");
        assert_eq!(json["text"], "Some text.");
    }

    #[test]
    fn test_file_type_from_extension() {
        assert_eq!(FileType::from_extension("PDF"), FileType::Pdf);
        assert_eq!(FileType::from_extension("md"), FileType::Markdown);
        assert_eq!(FileType::from_extension("txt"), FileType::Txt);
        assert!(!FileType::from_extension("docx").is_supported());
    }

    #[test]
    fn test_meta_without_docs_list() {
        let meta: DocumentMeta = serde_json::from_str(r#"{"source_file": "a.pdf"}"#).unwrap();
        assert_eq!(meta.source_file, "a.pdf");
        assert!(meta.docs.is_empty());
    }
}
