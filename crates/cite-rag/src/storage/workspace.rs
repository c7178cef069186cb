//! Workspace directory layout and artifact I/O
//!
//! ```text
//! <root>/<doc_id>/
//!   data/                 source files
//!   artifacts/
//!     meta.json chunks.json embeddings.npy index.faiss
//!     last_answer.json summary.md
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;

use super::{faiss, npy, DocumentState};
use crate::error::{Error, Result};
use crate::retrieval::{EmbeddingMatrix, FlatIpIndex};
use crate::types::{Answer, Chunk, DocumentMeta};

pub const DATA_DIR: &str = "data";
pub const ARTIFACTS_DIR: &str = "artifacts";
pub const META_FILE: &str = "meta.json";
pub const CHUNKS_FILE: &str = "chunks.json";
pub const EMBEDDINGS_FILE: &str = "embeddings.npy";
pub const INDEX_FILE: &str = "index.faiss";
pub const ANSWER_FILE: &str = "last_answer.json";
pub const SUMMARY_FILE: &str = "summary.md";

/// Artifacts in the order the pipeline produces them, with the state each
/// one establishes
const STAGED_ARTIFACTS: [(&str, DocumentState); 5] = [
    (CHUNKS_FILE, DocumentState::Segmented),
    (EMBEDDINGS_FILE, DocumentState::Embedded),
    (INDEX_FILE, DocumentState::Indexed),
    (ANSWER_FILE, DocumentState::Indexed),
    (SUMMARY_FILE, DocumentState::Ready),
];

/// Derive a workspace id from a file name: the lowercased stem with every
/// character other than alphanumerics and `-_.` replaced by `-`
pub fn slugify(file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("");

    let slug: String = stem
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || "-_.".contains(c) { c } else { '-' })
        .collect();

    if slug.is_empty() {
        "document".to_string()
    } else {
        slug
    }
}

/// Ids of the workspaces under `root` that hold an index, sorted
pub fn list_indexed(root: &Path) -> Result<Vec<String>> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let mut ids = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        let path = entry.path();
        if path.join(ARTIFACTS_DIR).join(INDEX_FILE).is_file() {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                ids.push(name.to_string());
            }
        }
    }
    ids.sort();
    Ok(ids)
}

/// Write `bytes` to a sibling temporary file and rename it over `path`
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// One document's isolated directory of sources and artifacts
#[derive(Debug, Clone)]
pub struct DocumentWorkspace {
    doc_id: String,
    dir: PathBuf,
}

impl DocumentWorkspace {
    fn validate_id(doc_id: &str) -> Result<()> {
        let invalid = doc_id.is_empty()
            || doc_id == "."
            || doc_id == ".."
            || doc_id.contains(['/', '\\']);
        if invalid {
            return Err(Error::config(format!("invalid document id '{}'", doc_id)));
        }
        Ok(())
    }

    /// Open an existing workspace
    pub fn open(root: &Path, doc_id: &str) -> Result<Self> {
        Self::validate_id(doc_id)?;
        let dir = root.join(doc_id);
        if !dir.is_dir() {
            return Err(Error::DocumentNotFound(doc_id.to_string()));
        }
        Ok(Self {
            doc_id: doc_id.to_string(),
            dir,
        })
    }

    /// Open the workspace, creating its directories if needed
    pub fn create(root: &Path, doc_id: &str) -> Result<Self> {
        Self::validate_id(doc_id)?;
        let dir = root.join(doc_id);
        std::fs::create_dir_all(dir.join(DATA_DIR))?;
        std::fs::create_dir_all(dir.join(ARTIFACTS_DIR))?;
        Ok(Self {
            doc_id: doc_id.to_string(),
            dir,
        })
    }

    pub fn doc_id(&self) -> &str {
        &self.doc_id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn data_dir(&self) -> PathBuf {
        self.dir.join(DATA_DIR)
    }

    pub fn artifacts_dir(&self) -> PathBuf {
        self.dir.join(ARTIFACTS_DIR)
    }

    /// Path of the artifact called `name`
    pub fn artifact(&self, name: &str) -> PathBuf {
        self.artifacts_dir().join(name)
    }

    fn has(&self, name: &str) -> bool {
        self.artifact(name).is_file()
    }

    /// Current state, from the furthest stage whose artifact exists
    pub fn state(&self) -> DocumentState {
        if self.has(INDEX_FILE) {
            if self.has(SUMMARY_FILE) {
                DocumentState::Ready
            } else {
                DocumentState::Indexed
            }
        } else if self.has(EMBEDDINGS_FILE) {
            DocumentState::Embedded
        } else if self.has(CHUNKS_FILE) {
            DocumentState::Segmented
        } else {
            DocumentState::Uninitialized
        }
    }

    /// Fail unless the workspace has reached `required`
    pub fn require(&self, required: DocumentState) -> Result<()> {
        let actual = self.state();
        if actual < required {
            return Err(Error::InvalidState {
                doc_id: self.doc_id.clone(),
                actual,
                required,
            });
        }
        Ok(())
    }

    /// Delete every artifact produced by a stage after `state`
    pub fn invalidate_after(&self, state: DocumentState) -> Result<()> {
        for (name, produced) in STAGED_ARTIFACTS {
            if produced > state {
                let path = self.artifact(name);
                match std::fs::remove_file(&path) {
                    Ok(()) => tracing::debug!("Removed stale {}", path.display()),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
            }
        }
        Ok(())
    }

    /// Make `source` the only file in `data/` and record it in `meta.json`
    ///
    /// Other files already in `data/` are removed. A source that already is
    /// `data/<name>` is kept in place rather than copied onto itself.
    pub fn import_source(&self, source: &Path) -> Result<PathBuf> {
        let name = source
            .file_name()
            .ok_or_else(|| Error::file_parse(source.display().to_string(), "path has no file name"))?;
        let data_dir = self.data_dir();
        std::fs::create_dir_all(&data_dir)?;

        let target = data_dir.join(name);
        let source = source.canonicalize()?;
        let in_place = target
            .canonicalize()
            .map(|t| t == source)
            .unwrap_or(false);

        for entry in std::fs::read_dir(&data_dir)? {
            let path = entry?.path();
            if in_place && path.file_name() == Some(name) {
                continue;
            }
            if path.is_dir() {
                std::fs::remove_dir_all(&path)?;
            } else {
                std::fs::remove_file(&path)?;
            }
            tracing::debug!("Removed previous source {}", path.display());
        }

        if !in_place {
            std::fs::copy(&source, &target)?;
        }

        self.write_meta(&DocumentMeta {
            source_file: name.to_string_lossy().into_owned(),
            docs: Vec::new(),
        })?;

        Ok(target)
    }

    fn read_bytes(&self, name: &str) -> Result<(PathBuf, Vec<u8>)> {
        let path = self.artifact(name);
        match std::fs::read(&path) {
            Ok(bytes) => Ok((path, bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::MissingArtifact(path)),
            Err(e) => Err(e.into()),
        }
    }

    fn write_bytes(&self, name: &str, bytes: &[u8]) -> Result<()> {
        std::fs::create_dir_all(self.artifacts_dir())?;
        write_atomic(&self.artifact(name), bytes)
    }

    fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let (path, bytes) = self.read_bytes(name)?;
        serde_json::from_slice(&bytes).map_err(|e| Error::artifact(path, e.to_string()))
    }

    fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        self.write_bytes(name, &serde_json::to_vec_pretty(value)?)
    }

    pub fn read_meta(&self) -> Result<DocumentMeta> {
        self.read_json(META_FILE)
    }

    pub fn write_meta(&self, meta: &DocumentMeta) -> Result<()> {
        self.write_json(META_FILE, meta)
    }

    pub fn read_chunks(&self) -> Result<Vec<Chunk>> {
        self.read_json(CHUNKS_FILE)
    }

    pub fn write_chunks(&self, chunks: &[Chunk]) -> Result<()> {
        self.write_json(CHUNKS_FILE, &chunks)
    }

    pub fn read_embeddings(&self) -> Result<EmbeddingMatrix> {
        let (path, bytes) = self.read_bytes(EMBEDDINGS_FILE)?;
        npy::decode(&path, &bytes)
    }

    pub fn write_embeddings(&self, matrix: &EmbeddingMatrix) -> Result<()> {
        self.write_bytes(EMBEDDINGS_FILE, &npy::encode(matrix))
    }

    pub fn read_index(&self) -> Result<FlatIpIndex> {
        let (path, bytes) = self.read_bytes(INDEX_FILE)?;
        faiss::decode(&path, &bytes)
    }

    pub fn write_index(&self, index: &FlatIpIndex) -> Result<()> {
        self.write_bytes(INDEX_FILE, &faiss::encode(index))
    }

    pub fn read_answer(&self) -> Result<Answer> {
        self.read_json(ANSWER_FILE)
    }

    pub fn write_answer(&self, answer: &Answer) -> Result<()> {
        self.write_json(ANSWER_FILE, answer)
    }

    pub fn read_summary(&self) -> Result<String> {
        let (path, bytes) = self.read_bytes(SUMMARY_FILE)?;
        String::from_utf8(bytes).map_err(|e| Error::artifact(path, e.to_string()))
    }

    pub fn write_summary(&self, summary: &str) -> Result<()> {
        self.write_bytes(SUMMARY_FILE, summary.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("My Notes (v2).PDF"), "my-notes--v2-");
        assert_eq!(slugify("report_2024.final.txt"), "report_2024.final");
        assert_eq!(slugify("Ünïcode.md"), "ünïcode");
        assert_eq!(slugify(".pdf"), ".pdf");
        assert_eq!(slugify(""), "document");
    }

    #[test]
    fn test_invalid_ids_rejected() {
        let root = TempDir::new().unwrap();
        assert!(DocumentWorkspace::create(root.path(), "..").is_err());
        assert!(DocumentWorkspace::create(root.path(), "a/b").is_err());
        assert!(DocumentWorkspace::create(root.path(), "").is_err());
    }

    #[test]
    fn test_open_missing() {
        let root = TempDir::new().unwrap();
        assert!(matches!(
            DocumentWorkspace::open(root.path(), "nope"),
            Err(Error::DocumentNotFound(_))
        ));
    }

    #[test]
    fn test_state_follows_artifacts() {
        let root = TempDir::new().unwrap();
        let ws = DocumentWorkspace::create(root.path(), "doc").unwrap();
        assert_eq!(ws.state(), DocumentState::Uninitialized);

        ws.write_chunks(&[Chunk::new(1, 1, "a.txt", "Text.")]).unwrap();
        assert_eq!(ws.state(), DocumentState::Segmented);

        let matrix = EmbeddingMatrix::from_rows(&[vec![1.0, 0.0]], 2).unwrap();
        ws.write_embeddings(&matrix).unwrap();
        assert_eq!(ws.state(), DocumentState::Embedded);

        ws.write_index(&FlatIpIndex::build(&matrix, 1).unwrap()).unwrap();
        assert_eq!(ws.state(), DocumentState::Indexed);

        ws.write_summary("- notes").unwrap();
        assert_eq!(ws.state(), DocumentState::Ready);

        ws.invalidate_after(DocumentState::Segmented).unwrap();
        assert_eq!(ws.state(), DocumentState::Segmented);
        assert!(!ws.artifact(SUMMARY_FILE).exists());
    }

    #[test]
    fn test_require_reports_states() {
        let root = TempDir::new().unwrap();
        let ws = DocumentWorkspace::create(root.path(), "doc").unwrap();

        let err = ws.require(DocumentState::Indexed).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Document 'doc' is uninitialized; this step requires it to be indexed or later"
        );
        assert!(ws.require(DocumentState::Uninitialized).is_ok());
    }

    #[test]
    fn test_missing_artifact_names_path() {
        let root = TempDir::new().unwrap();
        let ws = DocumentWorkspace::create(root.path(), "doc").unwrap();
        match ws.read_chunks() {
            Err(Error::MissingArtifact(path)) => assert!(path.ends_with("artifacts/chunks.json")),
            other => panic!("unexpected: {:?}", other.map(|c| c.len())),
        }
    }

    #[test]
    fn test_import_and_list() {
        let root = TempDir::new().unwrap();
        let src_dir = TempDir::new().unwrap();
        let src = src_dir.path().join("Guide.txt");
        std::fs::write(&src, "Hello.").unwrap();

        let ws = DocumentWorkspace::create(root.path(), &slugify("Guide.txt")).unwrap();
        let copied = ws.import_source(&src).unwrap();
        assert_eq!(std::fs::read_to_string(copied).unwrap(), "Hello.");
        assert_eq!(ws.read_meta().unwrap().source_file, "Guide.txt");

        assert!(list_indexed(root.path()).unwrap().is_empty());
        let matrix = EmbeddingMatrix::from_rows(&[vec![1.0]], 1).unwrap();
        ws.write_index(&FlatIpIndex::build(&matrix, 1).unwrap()).unwrap();
        assert_eq!(list_indexed(root.path()).unwrap(), vec!["guide".to_string()]);
        assert!(list_indexed(&root.path().join("absent")).unwrap().is_empty());
    }

    #[test]
    fn test_import_in_place_keeps_contents() {
        let root = TempDir::new().unwrap();
        let src_dir = TempDir::new().unwrap();
        let src = src_dir.path().join("notes.txt");
        std::fs::write(&src, "Keep me.").unwrap();

        let ws = DocumentWorkspace::create(root.path(), "notes").unwrap();
        let copied = ws.import_source(&src).unwrap();
        let again = ws.import_source(&copied).unwrap();

        assert_eq!(again, copied);
        assert_eq!(std::fs::read_to_string(&copied).unwrap(), "Keep me.");
        assert_eq!(ws.read_meta().unwrap().source_file, "notes.txt");
    }

    #[test]
    fn test_import_replaces_previous_sources() {
        let root = TempDir::new().unwrap();
        let src_dir = TempDir::new().unwrap();
        let old = src_dir.path().join("Report.txt");
        let new = src_dir.path().join("report.md");
        std::fs::write(&old, "Old report.").unwrap();
        std::fs::write(&new, "New report.").unwrap();

        let ws = DocumentWorkspace::create(root.path(), "report").unwrap();
        ws.import_source(&old).unwrap();
        ws.import_source(&new).unwrap();

        let names: Vec<String> = std::fs::read_dir(ws.data_dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["report.md".to_string()]);
    }

    #[test]
    fn test_atomic_write_replaces() {
        let root = TempDir::new().unwrap();
        let ws = DocumentWorkspace::create(root.path(), "doc").unwrap();
        ws.write_summary("first").unwrap();
        ws.write_summary("second").unwrap();
        assert_eq!(ws.read_summary().unwrap(), "second");

        let leftovers = std::fs::read_dir(ws.artifacts_dir()).unwrap().count();
        assert_eq!(leftovers, 1);
    }
}
