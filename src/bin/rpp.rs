//! RPP assistant CLI - main entry point.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rpp_assistant::{Config, MemoryKind, RppAgent};

#[derive(Parser)]
#[command(name = "rpp")]
#[command(about = "RPP lesson-plan generator with local RAG", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config.yml (defaults are used when absent)
    #[arg(long, env = "RPP_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest reference documents from a directory into the index
    Ingest {
        /// Directory containing .pdf/.docx/.txt documents
        dir: PathBuf,
    },

    /// Generate an RPP grounded in the ingested documents
    Generate {
        /// Request describing the lesson plan to generate
        query: String,

        /// Subject (mata pelajaran), used for feedback recall
        #[arg(short, long)]
        subject: Option<String>,

        /// Class/grade (kelas)
        #[arg(short, long)]
        grade: Option<String>,
    },

    /// Store feedback for a previously generated RPP
    Feedback {
        /// Id printed by the generate command
        rpp_id: String,

        /// Feedback text
        text: String,
    },

    /// Show index and memory statistics
    Stats,

    /// List models available on the Ollama server
    Models,

    /// Clear memory records, optionally only one type
    ClearMemory {
        /// Record type: document_processing, rpp_generation, or feedback
        #[arg(long)]
        kind: Option<String>,
    },

    /// Clear the similarity index (irreversible)
    ClearIndex,
}

fn parse_kind(raw: &str) -> Result<MemoryKind> {
    match raw {
        "document_processing" => Ok(MemoryKind::DocumentProcessing),
        "rpp_generation" => Ok(MemoryKind::RppGeneration),
        "feedback" => Ok(MemoryKind::Feedback),
        other => anyhow::bail!("unknown memory type: {other}"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::new(),
    };

    let mut agent = RppAgent::new(config)?;

    match cli.command {
        Commands::Ingest { dir } => {
            let result = agent.process_documents(&dir).await?;
            println!(
                "Processed {} file(s), {} chunk(s)",
                result.processed_files, result.total_chunks
            );
        }

        Commands::Generate {
            query,
            subject,
            grade,
        } => {
            if !agent.is_running().await {
                tracing::warn!("Ollama server is not reachable; generation will fail");
            }

            let mut context = serde_json::Map::new();
            if let Some(subject) = subject {
                context.insert("mata_pelajaran".to_string(), subject.into());
            }
            if let Some(grade) = grade {
                context.insert("kelas".to_string(), grade.into());
            }

            let result = agent.generate(&query, &context).await?;
            println!("{}", result.rpp);
            println!("\n--- id: {}", result.id);
            for source in &result.sources {
                if let Some(name) = source.get("filename").and_then(|v| v.as_str()) {
                    println!("--- source: {name}");
                }
            }
        }

        Commands::Feedback { rpp_id, text } => {
            let id = agent.store_feedback(&rpp_id, &text)?;
            println!("Feedback stored ({id})");
        }

        Commands::Stats => {
            let stats = agent.stats()?;
            println!("Index '{}':", stats.index.collection_name);
            println!("  entries:   {}", stats.index.count);
            if let Some(dim) = stats.index.dimension {
                println!("  dimension: {dim}");
            }
            println!("Memory:");
            println!("  total:               {}", stats.total_memories);
            println!(
                "  document_processing: {}",
                stats.document_processing_memories
            );
            println!("  rpp_generation:      {}", stats.rpp_generation_memories);
            println!("  feedback:            {}", stats.feedback_memories);
            println!("Models:");
            println!("  local:      {}", stats.local_model);
            println!("  embeddings: {}", stats.embedding_model);
        }

        Commands::Models => {
            for model in agent.list_models().await? {
                println!("{model}");
            }
        }

        Commands::ClearMemory { kind } => {
            let kind = kind.as_deref().map(parse_kind).transpose()?;
            agent.clear_memory(kind)?;
            println!("Memory cleared");
        }

        Commands::ClearIndex => {
            agent.clear_index()?;
            println!("Index cleared");
        }
    }

    Ok(())
}
