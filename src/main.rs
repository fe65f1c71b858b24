//! citeline - Main CLI Entry Point

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;

use citeline::citations::{build_context, citations_to_display_lines};
use citeline::cli::{Args, Commands};
use citeline::config::Config;
use citeline::embedding::OllamaEmbedder;
use citeline::ingest::{load_knowledge_base, Indexer};
use citeline::retrieval::{RetrievalEngine, RetrievalParams};
use citeline::store::QdrantStore;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load(args.config.clone())?;

    match &args.command {
        Commands::Index { kb_folder } => {
            run_index(&args, &config, kb_folder.clone()).await?;
        }
        Commands::Ask {
            question,
            top_k,
            min_score,
            final_top_k,
        } => {
            run_ask(&config, question, *top_k, *min_score, *final_top_k).await?;
        }
        Commands::Doctor => {
            run_doctor(&config).await?;
        }
        Commands::Config => {
            show_config(&config)?;
        }
    }

    Ok(())
}

fn build_embedder(config: &Config) -> Arc<OllamaEmbedder> {
    Arc::new(OllamaEmbedder::new(
        config.ollama_url(),
        config.ollama.embed_model.clone(),
        config.ollama.embed_dimension,
    ))
}

async fn connect_store(config: &Config) -> Result<Arc<QdrantStore>> {
    let store = QdrantStore::connect(
        &config.qdrant.url,
        &config.qdrant.collection,
        config.ollama.embed_dimension as u64,
    )
    .await?;
    Ok(Arc::new(store))
}

async fn run_index(args: &Args, config: &Config, kb_folder: Option<PathBuf>) -> Result<()> {
    let folder = kb_folder.unwrap_or_else(|| config.kb_folder());

    let pages = load_knowledge_base(
        &folder,
        &config.ingest.doc_type,
        config.ingest.min_page_chars,
    )?;
    println!("Pages loaded: {}", pages.len());

    let embedder = build_embedder(config);
    let store = connect_store(config).await?;
    let indexer = Indexer::new(embedder, store, config.ingest.batch_size);

    let progress = if args.verbosity().show_progress() {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} chunks")
                .unwrap(),
        );
        Some(pb)
    } else {
        None
    };

    let report = indexer
        .index_pages(&pages, &config.chunking, progress.as_ref())
        .await?;

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    println!("Chunks created: {}", report.chunks);
    println!(
        "{} Indexed {} pages into collection '{}'",
        "✓".green(),
        report.pages,
        config.qdrant.collection
    );

    Ok(())
}

async fn run_ask(
    config: &Config,
    question: &str,
    top_k: Option<usize>,
    min_score: Option<f32>,
    final_top_k: Option<usize>,
) -> Result<()> {
    let embedder = build_embedder(config);
    let store = connect_store(config).await?;

    let mut params = RetrievalParams::from(&config.retrieval);
    if let Some(k) = top_k {
        params.top_k = k;
    }
    if let Some(score) = min_score {
        params.min_score = score;
    }
    if let Some(k) = final_top_k {
        params.final_top_k = k;
    }

    let engine = RetrievalEngine::with_params(embedder, store, params);
    let evidence = engine.retrieve(question).await?;

    if evidence.len() < config.retrieval.min_evidence {
        eprintln!(
            "{}: not enough reliable evidence in the knowledge base to ground this question ({} of {} required items).",
            "Insufficient evidence".yellow(),
            evidence.len(),
            config.retrieval.min_evidence
        );
        std::process::exit(1);
    }

    let (context_block, citations) = build_context(&evidence, config.retrieval.max_snippet_chars);

    println!("{}", "=== CONTEXT ===".bold());
    println!("{}", context_block);
    println!();
    println!("{}", "=== CITATIONS ===".bold());
    for line in citations_to_display_lines(&citations) {
        println!("{}", line);
    }

    Ok(())
}

async fn run_doctor(config: &Config) -> Result<()> {
    println!("Checking services...\n");
    let mut healthy = true;

    let embedder = build_embedder(config);
    match embedder.health().await {
        Ok(()) => println!("{} Ollama reachable at {}", "✓".green(), config.ollama_url()),
        Err(e) => {
            println!("{} Ollama: {}", "✗".red(), e);
            healthy = false;
        }
    }

    match connect_store(config).await {
        Ok(store) => match store.point_count().await {
            Ok(count) => println!(
                "{} Qdrant collection '{}' ({} points)",
                "✓".green(),
                config.qdrant.collection,
                count
            ),
            Err(e) => {
                println!("{} Qdrant collection info: {}", "✗".red(), e);
                healthy = false;
            }
        },
        Err(e) => {
            println!("{} Qdrant: {}", "✗".red(), e);
            healthy = false;
        }
    }

    std::process::exit(if healthy { 0 } else { 1 });
}

fn show_config(config: &Config) -> Result<()> {
    println!("citeline configuration\n");

    println!("Ollama:");
    println!("  URL:       {}", config.ollama_url());
    println!("  Model:     {}", config.ollama.embed_model);
    println!("  Dimension: {}", config.ollama.embed_dimension);
    println!();

    println!("Qdrant:");
    println!("  URL:        {}", config.qdrant.url);
    println!("  Collection: {}", config.qdrant.collection);
    println!();

    println!("Chunking:");
    println!("  chunk_size:      {}", config.chunking.chunk_size);
    println!("  overlap:         {}", config.chunking.overlap);
    println!("  min_chunk_chars: {}", config.chunking.min_chunk_chars);
    println!();

    println!("Retrieval:");
    println!("  top_k:              {}", config.retrieval.top_k);
    println!("  min_score:          {}", config.retrieval.min_score);
    println!("  final_top_k:        {}", config.retrieval.final_top_k);
    println!("  max_context_chars:  {}", config.retrieval.max_context_chars);
    println!("  per_chunk_char_cap: {}", config.retrieval.per_chunk_char_cap);
    println!("  max_snippet_chars:  {}", config.retrieval.max_snippet_chars);
    println!("  min_evidence:       {}", config.retrieval.min_evidence);
    println!();

    println!("Ingest:");
    println!("  kb_folder:      {}", config.ingest.kb_folder);
    println!("  doc_type:       {}", config.ingest.doc_type);
    println!("  min_page_chars: {}", config.ingest.min_page_chars);
    println!("  batch_size:     {}", config.ingest.batch_size);

    Ok(())
}
