//! Staged pipeline over per-document workspaces
//!
//! Each stage checks the workspace state it needs, deletes whatever later
//! stages produced, does its work and writes its artifact atomically. Stages
//! run strictly one after another; embedding calls are issued serially.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::generation::SUMMARY_PROMPT;
use crate::ingestion::{discover_sources, FileParser, Segmenter};
use crate::providers::{EmbeddingProvider, LlmProvider};
use crate::retrieval::{EmbeddingMatrix, FlatIpIndex, Retriever};
use crate::storage::{list_indexed, slugify, DocumentState, DocumentWorkspace};
use crate::types::{Answer, Chunk, DocumentMeta, FileType, SourceText};

/// Runs the segment, embed, index, answer and summarize stages
pub struct DocumentPipeline {
    config: RagConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn LlmProvider>,
}

impl DocumentPipeline {
    pub fn new(
        config: RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
    ) -> Self {
        Self {
            config,
            embedder,
            llm,
        }
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    pub fn root(&self) -> &Path {
        &self.config.workspace.root
    }

    /// Open an existing workspace
    pub fn workspace(&self, doc_id: &str) -> Result<DocumentWorkspace> {
        DocumentWorkspace::open(self.root(), doc_id)
    }

    /// Current state of a workspace
    pub fn status(&self, doc_id: &str) -> Result<DocumentState> {
        Ok(self.workspace(doc_id)?.state())
    }

    /// Ids of every workspace that can answer questions
    pub fn list(&self) -> Result<Vec<String>> {
        list_indexed(self.root())
    }

    /// Create (or reset) a workspace whose only source is `source`
    ///
    /// The workspace id defaults to the slug of the file name. Earlier
    /// sources and every artifact are discarded since the document changed.
    pub fn ingest_file(&self, source: &Path, doc_id: Option<&str>) -> Result<DocumentWorkspace> {
        let file_type = FileType::from_path(source);
        if !file_type.is_supported() {
            return Err(Error::UnsupportedFileType(source.display().to_string()));
        }
        if !source.is_file() {
            return Err(Error::file_parse(source.display().to_string(), "file not found"));
        }

        let doc_id = match doc_id {
            Some(id) => id.to_string(),
            None => slugify(&source.file_name().unwrap_or_default().to_string_lossy()),
        };

        let ws = DocumentWorkspace::create(self.root(), &doc_id)?;
        ws.invalidate_after(DocumentState::Uninitialized)?;
        ws.import_source(source)?;

        tracing::info!("Ingested {} ({}) into '{}'", source.display(), file_type.display_name(), doc_id);
        Ok(ws)
    }

    /// Extract every source in `data/` and write `chunks.json`
    pub async fn segment(&self, doc_id: &str) -> Result<Vec<Chunk>> {
        let ws = self.workspace(doc_id)?;
        ws.invalidate_after(DocumentState::Uninitialized)?;

        let paths = discover_sources(&ws.data_dir())?;
        let mut sources = Vec::with_capacity(paths.len());
        for path in paths {
            sources.push(self.extract(path).await?);
        }

        let segmenter = Segmenter::from_config(&self.config.chunking);
        let chunks = segmenter.segment_all(&sources)?;
        ws.write_chunks(&chunks)?;

        let mut meta = match ws.read_meta() {
            Ok(meta) => meta,
            Err(Error::MissingArtifact(_)) => DocumentMeta {
                source_file: sources[0].name.clone(),
                docs: Vec::new(),
            },
            Err(e) => return Err(e),
        };
        meta.docs = sources.iter().map(|s| s.name.clone()).collect();
        ws.write_meta(&meta)?;

        tracing::info!("Segmented '{}': {} documents, {} chunks", doc_id, sources.len(), chunks.len());
        Ok(chunks)
    }

    async fn extract(&self, path: PathBuf) -> Result<SourceText> {
        let max_pages = self.config.ingest.max_pdf_pages;
        let name = path.display().to_string();

        tokio::task::spawn_blocking(move || FileParser::extract(&path, max_pages))
            .await
            .map_err(|e| Error::file_parse(name, format!("extraction task failed: {}", e)))?
    }

    /// Embed every chunk, one call at a time, and write `embeddings.npy`
    ///
    /// Nothing is written unless every chunk was embedded.
    pub async fn embed(&self, doc_id: &str) -> Result<EmbeddingMatrix> {
        let ws = self.workspace(doc_id)?;
        ws.require(DocumentState::Segmented)?;
        let chunks = ws.read_chunks()?;
        ws.invalidate_after(DocumentState::Segmented)?;

        let dimensions = self.embedder.dimensions();
        let mut matrix = EmbeddingMatrix::with_dimensions(dimensions)?;

        tracing::info!(
            "Embedding {} chunks of '{}' with {}",
            chunks.len(),
            doc_id,
            self.embedder.name()
        );
        for (i, chunk) in chunks.iter().enumerate() {
            let vector = self.embedder.embed(&chunk.text).await?;
            matrix.push_row(&vector).map_err(|e| match e {
                Error::DimensionMismatch { expected, got } => Error::embedding(format!(
                    "chunk {} embedded to {} dimensions, expected {}",
                    chunk.chunk_id, got, expected
                )),
                other => other,
            })?;
            tracing::debug!("Embedded {}/{}", i + 1, chunks.len());
        }

        ws.write_embeddings(&matrix)?;
        Ok(matrix)
    }

    /// Normalize the embeddings into an index and write `index.faiss`
    pub async fn build_index(&self, doc_id: &str) -> Result<FlatIpIndex> {
        let ws = self.workspace(doc_id)?;
        ws.require(DocumentState::Embedded)?;
        let chunks = ws.read_chunks()?;
        let matrix = ws.read_embeddings()?;
        ws.invalidate_after(DocumentState::Embedded)?;

        let index = FlatIpIndex::build(&matrix, chunks.len())?;
        ws.write_index(&index)?;

        tracing::info!("Indexed '{}': {} vectors, dimension {}", doc_id, index.len(), index.dimensions());
        Ok(index)
    }

    /// Segment, embed and index in one go
    pub async fn build(&self, doc_id: &str) -> Result<FlatIpIndex> {
        self.segment(doc_id).await?;
        self.embed(doc_id).await?;
        self.build_index(doc_id).await
    }

    /// Answer `question` and overwrite `last_answer.json`
    pub async fn ask(&self, doc_id: &str, question: &str, k: Option<usize>) -> Result<Answer> {
        let ws = self.workspace(doc_id)?;
        ws.require(DocumentState::Indexed)?;
        let chunks = ws.read_chunks()?;
        let index = ws.read_index()?;

        let retriever = Retriever::new(Arc::clone(&self.embedder), Arc::clone(&self.llm))
            .with_snippet_chars(self.config.retrieval.snippet_chars);
        let k = k.unwrap_or(self.config.retrieval.top_k);

        let answer = retriever.answer(question, &index, &chunks, k).await?;
        ws.write_answer(&answer)?;
        Ok(answer)
    }

    /// Ask for study notes and write them to `summary.md`
    pub async fn summarize(&self, doc_id: &str) -> Result<String> {
        let answer = self.ask(doc_id, SUMMARY_PROMPT, None).await?;
        self.workspace(doc_id)?.write_summary(&answer.answer)?;

        tracing::info!("Summarized '{}'", doc_id);
        Ok(answer.answer)
    }
}
