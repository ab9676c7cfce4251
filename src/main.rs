use std::sync::Arc;

use serde::Serialize;
use tradesearch::cli::{Cli, Commands, ConfigAction};
use tradesearch::config::{read_api_key, Config, ConfigValidator};
use tradesearch::error::{Result, TradeSearchError};
use tradesearch::format::render_outcome;
use tradesearch::pipeline::{SearchOptions, SearchOutcome, SearchPipeline};
use tradesearch::rerank::RerankAllocator;
use tradesearch::retrieval::FanOutRetriever;
use tradesearch::services::{HttpRerankClient, OpenAiEmbeddingClient, QdrantVectorStore, RerankClient};
use tradesearch::transform::OpenAiTransformer;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    init_logging(cli.verbose);

    match cli.command {
        Commands::Search {
            question,
            limit,
            top_k,
            strategy,
            no_rerank,
            json,
        } => {
            cmd_search(cli.config, &question, limit, top_k, strategy, no_rerank, json).await?;
        }
        Commands::Config { action } => {
            cmd_config(cli.config, action)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose {
        "tradesearch=debug"
    } else {
        "tradesearch=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt().with_env_filter(filter).with_target(false).init();
}

#[derive(Serialize)]
struct JsonPassage<'a> {
    rank: usize,
    text: &'a str,
    source: &'a str,
    score: f32,
    query: &'a str,
}

#[allow(clippy::too_many_arguments)]
async fn cmd_search(
    config_path: Option<std::path::PathBuf>,
    question: &str,
    limit: Option<usize>,
    top_k: Option<usize>,
    strategy: Option<String>,
    no_rerank: bool,
    json: bool,
) -> Result<()> {
    let config = load_config(config_path)?;

    let mut options = SearchOptions::from_config(&config.pipeline);
    if let Some(limit) = limit {
        options.fetch_limit = limit;
    }
    if let Some(top_k) = top_k {
        options.total_k = top_k;
    }
    if let Some(strategy) = strategy {
        options.strategy = strategy.parse().map_err(TradeSearchError::InvalidRequest)?;
    }

    let pipeline = build_pipeline(&config, no_rerank)?;
    let outcome = pipeline.search(question, &options).await?;

    if json {
        let passages: Vec<JsonPassage> = outcome
            .passages()
            .iter()
            .enumerate()
            .map(|(i, p)| JsonPassage {
                rank: i + 1,
                text: &p.candidate.text,
                source: &p.candidate.source_tag,
                score: p.score,
                query: &p.origin_query,
            })
            .collect();
        let rendered =
            serde_json::to_string_pretty(&passages).map_err(|e| TradeSearchError::Json {
                source: e,
                context: "Failed to serialize results".to_string(),
            })?;
        println!("{rendered}");
    } else {
        if let SearchOutcome::Found { plan, passages } = &outcome {
            println!("Query: {}", plan.rewritten);
            if !plan.sub_queries.is_empty() {
                println!("Sub-queries: {}", plan.sub_queries.join(" | "));
            }
            println!("Passages: {}\n", passages.len());
        }
        println!("{}", render_outcome(&outcome, config.pipeline.excerpt_max_chars));
    }

    Ok(())
}

fn build_pipeline(config: &Config, no_rerank: bool) -> Result<SearchPipeline> {
    let transformer = OpenAiTransformer::new(
        &config.transformer,
        read_api_key(&config.transformer.api_key_env)?,
    )?;

    let embeddings = OpenAiEmbeddingClient::new(
        &config.embedding,
        read_api_key(&config.embedding.api_key_env)?,
    )
    .map_err(|e| TradeSearchError::Config(format!("Failed to build embedding client: {e}")))?;

    let vector_api_key = config
        .vector_store
        .api_key_env
        .as_deref()
        .and_then(|env| std::env::var(env).ok());
    let vectors = QdrantVectorStore::new(&config.vector_store, vector_api_key)
        .map_err(|e| TradeSearchError::Config(format!("Failed to build vector client: {e}")))?;

    let reranker: Option<Arc<dyn RerankClient>> = if config.reranker.enabled && !no_rerank {
        let client = HttpRerankClient::new(&config.reranker)
            .map_err(|e| TradeSearchError::Config(format!("Failed to build rerank client: {e}")))?;
        Some(Arc::new(client))
    } else {
        None
    };

    Ok(SearchPipeline::new(
        Arc::new(transformer),
        FanOutRetriever::new(Arc::new(embeddings), Arc::new(vectors)),
        RerankAllocator::new(reranker),
    ))
}

fn cmd_config(config_path: Option<std::path::PathBuf>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(config_path)?;
            let json =
                serde_json::to_string_pretty(&config).map_err(|e| TradeSearchError::Json {
                    source: e,
                    context: "Failed to serialize config".to_string(),
                })?;
            println!("{json}");
        }
        ConfigAction::Init { force } => {
            let path = match config_path {
                Some(path) => path,
                None => Config::default_path()?,
            };

            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| TradeSearchError::Io {
                    source: e,
                    context: format!("Failed to create config directory: {:?}", parent),
                })?;
            }

            let config = Config::default();
            config.save(&path)?;

            println!("✓ Configuration initialized at: {}", path.display());
        }
        ConfigAction::Validate { file } => {
            let path = match file.or(config_path) {
                Some(path) => path,
                None => Config::default_path()?,
            };
            let config = Config::load(&path)?;
            ConfigValidator::validate(&config)?;
            println!("✓ Configuration is valid");
            println!("  Schema version: {}", config.meta.schema_version);
        }
    }

    Ok(())
}

fn load_config(config_path: Option<std::path::PathBuf>) -> Result<Config> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_path()?,
    };

    if !path.exists() {
        tracing::warn!(
            "Config file not found, using defaults. Run 'tradesearch config init' to create one."
        );
        return Ok(Config::default());
    }

    Config::load(&path)
}
