use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use regrag_assist::qa::{default_bias_rules, Question};
use regrag_assist::{answer_question, load_generator, review_document};
use regrag_core::config::Config;
use regrag_core::manifest::SourcesManifest;
use regrag_core::traits::{Capability, Embedder, VectorStore};
use regrag_core::types::SourceReport;
use regrag_process::RequirementTable;
use regrag_retrieve::ingest::{inspect, unreferenced_files};
use regrag_retrieve::{IndexBuilder, RetrievalRequest, Retriever};
use regrag_vector::LanceCollection;

#[derive(Parser)]
#[command(name = "regrag", about = "Regulatory passage index and document checklist tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build or refresh the passage index from the sources manifest.
    Ingest {
        /// Manifest to ingest instead of the configured one.
        #[arg(long)]
        manifest: Option<PathBuf>,
        #[arg(long)]
        no_progress: bool,
    },
    /// Report how each manifest entry resolves, without touching the index.
    Inspect {
        /// Also list corpus files that no manifest entry references.
        #[arg(long)]
        orphans: bool,
    },
    /// Retrieve passages for a query.
    Query {
        text: String,
        #[arg(long)]
        top_k: Option<usize>,
        #[arg(long)]
        pre_k: Option<usize>,
        #[arg(long = "scope")]
        scopes: Vec<String>,
        #[arg(long = "source-id")]
        source_ids: Vec<String>,
        #[arg(long)]
        no_rerank: bool,
    },
    /// Answer a question from retrieved passages.
    Ask {
        question: String,
        #[arg(long = "scope")]
        scopes: Vec<String>,
        #[arg(long, default_value_t = 5)]
        top_k: usize,
    },
    /// Review one document against passages for its type.
    Review {
        file: PathBuf,
        #[arg(long, default_value = "Employment Contract")]
        doc_type: String,
    },
    /// Infer the process from uploaded document labels and list missing documents.
    Checklist {
        #[arg(required = true)]
        labels: Vec<String>,
        /// JSON requirement table replacing the built-in one.
        #[arg(long)]
        table: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct InspectOutput {
    sources: Vec<SourceReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    unreferenced: Option<Vec<PathBuf>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load().context("loading configuration")?;
    let settings = config.settings()?;

    match cli.command {
        Command::Ingest { manifest, no_progress } => {
            let embedder: Capability<Arc<dyn Embedder>> =
                regrag_embed::load_embedder(&settings.embedding).map(Arc::from);
            let store: Arc<dyn VectorStore> = Arc::new(LanceCollection::from_settings(&settings).await?);
            let builder = IndexBuilder::from_settings(&settings, embedder, store)?.with_progress(!no_progress);
            let manifest_path = manifest.unwrap_or_else(|| settings.manifest_path());
            let report = builder.ingest_file(&manifest_path).await?;
            print_json(&report)?;
        }
        Command::Inspect { orphans } => {
            let root = settings.corpus_root();
            let manifest = SourcesManifest::load(&settings.manifest_path())?;
            let output = InspectOutput {
                sources: inspect(&root, &manifest),
                unreferenced: orphans.then(|| unreferenced_files(&root, &manifest)),
            };
            print_json(&output)?;
        }
        Command::Query { text, top_k, pre_k, scopes, source_ids, no_rerank } => {
            let retriever = Retriever::from_settings(&settings).await?;
            let mut req = RetrievalRequest::with_defaults(text, &settings.retrieval).scopes(scopes).source_ids(source_ids);
            if let Some(k) = top_k {
                req = req.top_k(k);
            }
            if let Some(k) = pre_k {
                req = req.pre_k(k);
            }
            if no_rerank {
                req = req.rerank(false);
            }
            print_json(&retriever.retrieve(&req).await?)?;
        }
        Command::Ask { question, scopes, top_k } => {
            let retriever = Retriever::from_settings(&settings).await?;
            let generator = load_generator(&settings.llm);
            let question = Question {
                scopes: (!scopes.is_empty()).then_some(scopes),
                top_k,
                ..Question::new(question)
            };
            let answer = answer_question(&retriever, &generator, &default_bias_rules(), &question).await;
            print_json(&answer)?;
        }
        Command::Review { file, doc_type } => {
            let text = regrag_core::extract::extract(&file);
            anyhow::ensure!(!text.trim().is_empty(), "no extractable text in {}", file.display());
            let retriever = Retriever::from_settings(&settings).await?;
            let generator = load_generator(&settings.llm);
            let name = file.file_name().map_or_else(|| file.display().to_string(), |n| n.to_string_lossy().to_string());
            print_json(&review_document(&retriever, &generator, &name, &doc_type, &text).await)?;
        }
        Command::Checklist { labels, table } => {
            let table = match table {
                Some(path) => RequirementTable::load(&path)?,
                None => RequirementTable::default(),
            };
            print_json(&table.evaluate(labels.as_slice()))?;
        }
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
