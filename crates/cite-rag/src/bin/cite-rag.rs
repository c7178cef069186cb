//! cite-rag command line
//!
//! Run with: cargo run -p cite-rag -- <command>

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cite_rag::config::{Credentials, RagConfig};
use cite_rag::providers::build_providers;
use cite_rag::storage::{list_indexed, DocumentWorkspace};
use cite_rag::DocumentPipeline;

/// cite-rag - question answering over your documents, with citations
#[derive(Parser, Debug)]
#[command(name = "cite-rag")]
#[command(author, version, about = "Index documents and answer questions with cited sources")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Workspace root (overrides the configuration)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Copy a file into a new workspace and build its index
    Ingest {
        /// Source file (.pdf, .txt or .md)
        file: PathBuf,

        /// Workspace id (defaults to the file name slug)
        #[arg(long)]
        doc_id: Option<String>,

        /// Skip writing summary.md
        #[arg(long)]
        no_summary: bool,
    },

    /// Split the workspace sources into chunks
    Segment { doc_id: String },

    /// Embed the chunks
    Embed { doc_id: String },

    /// Build the similarity index from the embeddings
    Index { doc_id: String },

    /// Write study notes to summary.md
    Summarize { doc_id: String },

    /// Answer a question from the workspace
    Ask {
        doc_id: String,

        /// Question text
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,

        /// Number of chunks to retrieve
        #[arg(short, long)]
        k: Option<usize>,
    },

    /// Show how far a workspace has progressed
    Status { doc_id: String },

    /// List workspaces that can answer questions
    List,
}

fn pipeline(config: RagConfig) -> anyhow::Result<DocumentPipeline> {
    let credentials = Credentials::from_env(&config)?;
    let (embedder, llm) = build_providers(&config, &credentials)?;
    Ok(DocumentPipeline::new(config, embedder, llm))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cite_rag=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = RagConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(root) = cli.root {
        config.workspace.root = root;
    }
    tracing::debug!("Workspace root: {}", config.workspace.root.display());

    match cli.command {
        Commands::Ingest {
            file,
            doc_id,
            no_summary,
        } => {
            let pipeline = pipeline(config)?;
            let ws = pipeline
                .ingest_file(&file, doc_id.as_deref())
                .with_context(|| format!("Failed to ingest {}", file.display()))?;
            let doc_id = ws.doc_id().to_string();

            pipeline.build(&doc_id).await.context("Indexing failed")?;
            if !no_summary {
                pipeline.summarize(&doc_id).await.context("Summary failed")?;
            }
            println!("{}", doc_id);
        }
        Commands::Segment { doc_id } => {
            let chunks = pipeline(config)?.segment(&doc_id).await?;
            println!("Saved {} chunks", chunks.len());
        }
        Commands::Embed { doc_id } => {
            let matrix = pipeline(config)?.embed(&doc_id).await?;
            println!("Saved embeddings: ({}, {})", matrix.rows(), matrix.dimensions());
        }
        Commands::Index { doc_id } => {
            let index = pipeline(config)?.build_index(&doc_id).await?;
            println!("Index built with {} vectors", index.len());
        }
        Commands::Summarize { doc_id } => {
            let summary = pipeline(config)?.summarize(&doc_id).await?;
            println!("{}", summary);
        }
        Commands::Ask { doc_id, question, k } => {
            let question = question.join(" ");
            let answer = pipeline(config)?
                .ask(&doc_id, &question, k)
                .await
                .context("Failed to answer question")?;
            println!("{}", serde_json::to_string_pretty(&answer)?);
        }
        Commands::Status { doc_id } => {
            let ws = DocumentWorkspace::open(&config.workspace.root, &doc_id)?;
            println!("{}: {}", doc_id, ws.state());
        }
        Commands::List => {
            for doc_id in list_indexed(&config.workspace.root)? {
                println!("{}", doc_id);
            }
        }
    }

    Ok(())
}
