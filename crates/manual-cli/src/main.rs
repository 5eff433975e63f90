//! manual-rag CLI - build and query the manual retrieval indices.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use manual_chunk::{group_by_page, load_elements, Chunker};
use manual_core::{ManualConfig, Result, RetryPolicy, VectorStore};
use manual_index::{
    Contextualizer, IndexBuilder, LexicalBundle, SqliteVectorStore, VECTOR_DB_FILE,
};
use manual_providers::{HttpEmbedder, HttpGenerator, HttpReranker};
use manual_query::{HybridRetriever, QueryPipeline};

/// Embedding width of the default remote model.
const EMBEDDING_DIMENSION: usize = 1024;

/// manual-rag - page-cited retrieval over technical operations manuals
#[derive(Parser)]
#[command(name = "manual-rag")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: search standard locations)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Index directory (overrides config)
    #[arg(short, long, global = true)]
    index_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chunk parsed document elements into the chunk set
    Chunk {
        /// Parsed elements JSON (from the document parser)
        elements: PathBuf,

        /// Output path for the chunk set
        #[arg(short, long)]
        out: PathBuf,
    },

    /// Add generated context to a chunk set
    Contextualize {
        /// Chunk set JSON
        chunks: PathBuf,

        /// Output path (defaults to rewriting in place)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Build the vector and lexical indices from a chunk set
    Build {
        /// Chunk set JSON
        chunks: PathBuf,
    },

    /// Hybrid search over the built indices
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short = 'k', long, default_value = "10")]
        top_k: usize,
    },

    /// Answer a question with page citations
    Ask {
        /// The question
        question: String,
    },

    /// Show index statistics
    Stats,
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn load_config(cli: &Cli) -> Result<ManualConfig> {
    let mut config = match &cli.config {
        Some(path) => ManualConfig::load(path)?,
        None => ManualConfig::load_default()?,
    };
    if let Some(dir) = &cli.index_dir {
        config.index.persist_dir = dir.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let config = load_config(&cli)?;

    match &cli.command {
        Commands::Chunk { elements, out } => chunk(&config, elements, out)?,
        Commands::Contextualize { chunks, out } => contextualize(&config, chunks, out.as_ref()).await?,
        Commands::Build { chunks } => build(&config, chunks).await?,
        Commands::Search { query, top_k } => search(&config, query, *top_k).await?,
        Commands::Ask { question } => ask(&config, question).await?,
        Commands::Stats => stats(&config).await?,
    }

    Ok(())
}

fn chunk(config: &ManualConfig, elements_path: &PathBuf, out: &PathBuf) -> Result<()> {
    let elements = load_elements(elements_path)?;
    let pages = group_by_page(&elements);

    let chunker = Chunker::from_config(&config.chunking)?;
    let chunks = chunker.chunk_pages(&pages);

    Chunker::save(&chunks, out)?;
    println!("Wrote {} chunks from {} pages to {:?}", chunks.len(), pages.len(), out);
    Ok(())
}

async fn contextualize(
    config: &ManualConfig,
    chunks_path: &PathBuf,
    out: Option<&PathBuf>,
) -> Result<()> {
    let mut chunks = Chunker::load(chunks_path)?;

    let generator = Arc::new(HttpGenerator::new(config.providers.generation.clone()));
    let contextualizer = Contextualizer::new(generator, RetryPolicy::default());
    contextualizer.add_context(&mut chunks).await;

    let out = out.unwrap_or(chunks_path);
    Chunker::save(&chunks, out)?;
    println!("Contextualized {} chunks -> {:?}", chunks.len(), out);
    Ok(())
}

async fn build(config: &ManualConfig, chunks_path: &PathBuf) -> Result<()> {
    let chunks = Chunker::load(chunks_path)?;

    let embedder = Arc::new(HttpEmbedder::new(
        config.providers.embedding.clone(),
        EMBEDDING_DIMENSION,
    ));
    let store = Arc::new(SqliteVectorStore::open(
        config.index.persist_dir.join(VECTOR_DB_FILE),
    )?);

    let builder = IndexBuilder::new(
        embedder,
        store,
        &config.index.persist_dir,
        config.index.embed_batch_size,
        config.index.upsert_batch_size,
    );
    builder.build_indices(&chunks).await?;

    println!(
        "Built indices for {} chunks in {:?}",
        chunks.len(),
        config.index.persist_dir
    );
    Ok(())
}

async fn search(config: &ManualConfig, query: &str, top_k: usize) -> Result<()> {
    let embedder = Arc::new(HttpEmbedder::new(
        config.providers.embedding.clone(),
        EMBEDDING_DIMENSION,
    ));
    let retriever = HybridRetriever::open(embedder, &config.index.persist_dir)?
        .with_rrf_k(config.retrieval.rrf_k);

    let results = retriever.search(query, top_k).await?;

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, result) in results.iter().enumerate() {
        println!(
            "{:2}. [{}] page {} (rrf {:.5})",
            i + 1,
            result.chunk_id,
            result.page_number,
            result.rrf_score
        );
        let preview: String = result.original_text.chars().take(120).collect();
        println!("    {}", preview);
    }
    Ok(())
}

async fn ask(config: &ManualConfig, question: &str) -> Result<()> {
    let embedder = Arc::new(HttpEmbedder::new(
        config.providers.embedding.clone(),
        EMBEDDING_DIMENSION,
    ));
    let retriever = HybridRetriever::open(embedder, &config.index.persist_dir)?
        .with_rrf_k(config.retrieval.rrf_k);
    let reranker = Arc::new(HttpReranker::new(config.providers.rerank.clone()));
    let generator = Arc::new(HttpGenerator::new(config.providers.generation.clone()));

    let pipeline = QueryPipeline::new(
        retriever,
        reranker,
        generator,
        config.retrieval.clone(),
    );

    let answer = pipeline.ask(question).await?;

    println!("{}", answer.text);
    if !answer.pages.is_empty() {
        let pages: Vec<String> = answer.pages.iter().map(|p| p.to_string()).collect();
        println!("\nPages: {}", pages.join(", "));
    }
    Ok(())
}

async fn stats(config: &ManualConfig) -> Result<()> {
    let bundle = LexicalBundle::load(&config.index.persist_dir)?;
    let store = SqliteVectorStore::open_existing(
        config.index.persist_dir.join(VECTOR_DB_FILE),
    )?;

    println!("Index directory: {:?}", config.index.persist_dir);
    println!("Lexical chunks:  {}", bundle.len());
    println!("Vector records:  {}", store.len().await?);
    Ok(())
}
