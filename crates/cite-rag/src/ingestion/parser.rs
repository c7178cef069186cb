//! Source discovery and text extraction

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::types::{FileType, SourceText};

/// Replace ligatures and typographic glyphs PDF fonts commonly emit
fn cleanup_pdf_text(text: &str) -> String {
    text.replace('\0', "")
        .replace('\u{FB00}', "ff")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl")
        .replace(['\u{2010}', '\u{2011}'], "-")
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace('\u{00A0}', " ")
}

/// Text extractor for supported source files
pub struct FileParser;

impl FileParser {
    /// Read and extract the file at `path`
    pub fn extract(path: &Path, max_pdf_pages: usize) -> Result<SourceText> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document")
            .to_string();
        let data = std::fs::read(path)?;
        Self::parse(&name, &data, max_pdf_pages)
    }

    /// Extract text from in-memory file contents, dispatching on the name's extension
    pub fn parse(filename: &str, data: &[u8], max_pdf_pages: usize) -> Result<SourceText> {
        let file_type = FileType::from_path(Path::new(filename));

        let text = match file_type {
            FileType::Pdf => Self::parse_pdf(filename, data, max_pdf_pages)?,
            FileType::Txt | FileType::Markdown => String::from_utf8_lossy(data).into_owned(),
            FileType::Unknown => {
                return Err(Error::UnsupportedFileType(filename.to_string()));
            }
        };

        if text.trim().is_empty() {
            tracing::warn!("{} contains no extractable text", filename);
        }

        Ok(SourceText::new(filename, file_type, text))
    }

    /// Extract at most `max_pages` pages, falling back to pdf-extract when
    /// lopdf yields nothing
    fn parse_pdf(filename: &str, data: &[u8], max_pages: usize) -> Result<String> {
        match Self::extract_pages(data, max_pages) {
            Ok(text) if !text.trim().is_empty() => return Ok(cleanup_pdf_text(&text)),
            Ok(_) => tracing::debug!("{}: page extraction produced no text", filename),
            Err(e) => tracing::warn!("{}: page extraction failed: {}, trying fallback", filename, e),
        }

        let text = pdf_extract::extract_text_from_mem(data)
            .map_err(|e| Error::file_parse(filename, format!("Failed to extract PDF text: {}", e)))?;

        // pdf-extract separates pages with form feeds
        let capped: Vec<&str> = text.split('\u{000C}').take(max_pages).collect();
        Ok(cleanup_pdf_text(&capped.join("\n")))
    }

    fn extract_pages(data: &[u8], max_pages: usize) -> Result<String> {
        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| Error::file_parse("document.pdf", format!("Failed to load PDF: {}", e)))?;

        let pages = doc.get_pages();
        if pages.len() > max_pages {
            tracing::info!("PDF has {} pages, reading the first {}", pages.len(), max_pages);
        }

        let mut text = String::new();
        for page_number in pages.keys().take(max_pages) {
            match doc.extract_text(&[*page_number]) {
                Ok(page_text) => {
                    text.push_str(&page_text);
                    text.push('\n');
                }
                Err(e) => tracing::debug!("Could not extract page {}: {}", page_number, e),
            }
        }

        Ok(text)
    }
}

/// List the supported files directly inside `data_dir`, sorted by file name
///
/// The order is what fixes each document's index in chunk identifiers.
pub fn discover_sources(data_dir: &Path) -> Result<Vec<PathBuf>> {
    if !data_dir.is_dir() {
        return Err(Error::NoDocuments(data_dir.to_path_buf()));
    }

    let mut sources: Vec<PathBuf> = WalkDir::new(data_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| FileType::from_path(path).is_supported())
        .collect();

    sources.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    if sources.is_empty() {
        return Err(Error::NoDocuments(data_dir.to_path_buf()));
    }

    Ok(sources)
}
