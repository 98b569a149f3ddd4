use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use repo_qa::config::Config;
use repo_qa::retrieval::Retriever;
use repo_qa::session::{repository_name, Answerer, LocalPathFetcher, Session};

#[derive(Parser)]
#[command(
    name = "repo-qa",
    version,
    about = "Hybrid BM25 + TF-IDF retrieval over a source repository",
    long_about = "Chunk a repository, rank its chunks against a question and show\n\
                  the context an LLM would receive.\n\n\
                  Tuning comes from REPO_QA_* environment variables.\n\n\
                  Examples:\n  \
                    repo-qa index .\n  \
                    repo-qa search . 'token refresh' -k 3\n  \
                    repo-qa prompt . 'How is auth handled?'"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Chunk and index a directory, then print what was found
    Index {
        path: PathBuf,
    },
    /// Rank chunks of a directory against a query
    Search {
        path: PathBuf,
        query: String,

        /// Number of chunks to return (default: REPO_QA_TOP_K or 5)
        #[arg(short, long)]
        k: Option<usize>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the prompt that would be sent for a question
    Prompt {
        path: PathBuf,
        question: String,

        /// Repository URL to show in the prompt instead of the local path
        #[arg(long)]
        url: Option<String>,
    },
}

/// Hands the prompt back unchanged; nothing here talks to a model.
struct EchoAnswerer;

impl Answerer for EchoAnswerer {
    fn generate(&self, prompt: &str) -> repo_qa::Result<String> {
        Ok(prompt.to_string())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();
    tracing::debug!("Configuration: {config:?}");

    match cli.command {
        Command::Index { path } => {
            let retriever = Retriever::new(config);
            let index = tokio::task::spawn_blocking(move || retriever.index(&path))
                .await?
                .context("indexing failed")?;

            println!(
                "{} chunks from {} documents",
                index.len(),
                index.document_count()
            );
            for (ext, count) in index.file_type_counts() {
                println!("  {ext:<14} {count}");
            }
        }
        Command::Search { path, query, k, json } => {
            let k = k.unwrap_or(config.ranking.top_k);
            let retriever = Retriever::new(config);
            let hits = tokio::task::spawn_blocking(move || {
                let index = retriever.index(&path)?;
                retriever.search_scored(&query, &index, k)
            })
            .await?
            .context("search failed")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&hits)?);
            } else {
                for (rank, hit) in hits.iter().enumerate() {
                    println!(
                        "{:>2}. {} [chunk {}] combined={:.4} bm25={:.4} tfidf={:.4}",
                        rank + 1,
                        hit.chunk.source_path,
                        hit.chunk.chunk_index,
                        hit.combined_score,
                        hit.lexical_score,
                        hit.vector_score
                    );
                    println!("    {}", preview(&hit.chunk.text, 160));
                }
            }
        }
        Command::Prompt { path, question, url } => {
            let location = path.to_string_lossy().into_owned();
            let context = tokio::task::spawn_blocking(move || {
                let session = Session::new(config, LocalPathFetcher, EchoAnswerer);
                session.process_repository(&location)?;
                session.prepare_prompt(&question)
            })
            .await?
            .context("prompt assembly failed")?;

            let mut context = context;
            if let Some(url) = url {
                context.repo_name = repository_name(&url);
                context.repo_url = url;
            }
            print!("{}", context.render());
        }
    }

    Ok(())
}

fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let cut: String = flat.chars().take(max_chars).collect();
    format!("{cut}…")
}
