mod config;
mod llm;
mod output;
mod parse;
mod prompt;

use clap::Parser;
use pairrank_core::constants::SHORT_CIRCUIT_THRESHOLD;
use pairrank_core::{pair_count, Candidate, ComparatorClient, RankingConfig, RankingEngine};
use reqwest::Client;
use serde::Deserialize;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::time::Duration;

use crate::llm::{LlmConfig, LlmJudge};

pub fn bail(msg: impl std::fmt::Display) -> ! {
    eprintln!("Error: {msg}");
    std::process::exit(1);
}

#[derive(Parser)]
#[command(name = "pairrank", version, about = "Rank documents by relevance using LLM pairwise comparisons")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Rank candidate documents against a question
    Rank(RankArgs),
    /// Create a default config file at ~/.config/pairrank/config.toml
    Init,
}

#[derive(Parser)]
struct RankArgs {
    /// The question candidates are judged against
    #[arg(long)]
    query: String,

    /// JSON array or JSON Lines file of candidates (default: stdin)
    #[arg(long)]
    candidates: Option<PathBuf>,

    /// How many top candidates to return
    #[arg(long)]
    top_k: Option<usize>,

    /// Max concurrent judge requests
    #[arg(long)]
    concurrency: Option<usize>,

    /// OpenAI-compatible base URL (e.g. http://localhost:8000)
    #[arg(long)]
    endpoint: Option<String>,

    /// Bearer token for the API (also reads OPENAI_API_KEY env var)
    #[arg(long)]
    api_key: Option<String>,

    /// Model ID for the API
    #[arg(long)]
    model: Option<String>,

    /// Judge sampling temperature. Default: 0.3.
    #[arg(long)]
    temperature: Option<f64>,

    /// Max retries per comparison on network errors, 429 and 5xx. Default: 3.
    #[arg(long)]
    retries: Option<usize>,

    /// Abort the run after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Seed for the coin flips that settle failed comparisons
    #[arg(long)]
    seed: Option<u64>,

    /// Path to config file (default: ~/.config/pairrank/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output JSON instead of table
    #[arg(long)]
    json: bool,

    /// Show progress during execution
    #[arg(short, long)]
    verbose: bool,
}

/// A candidate as it appears in input files. Field names follow common
/// literature-search exports, so `abstract`, `entry_id` and `pdf_url` work too.
#[derive(Deserialize)]
struct CandidateInput {
    #[serde(default, alias = "entry_id")]
    id: Option<String>,
    title: String,
    #[serde(default, alias = "abstract")]
    summary: String,
    #[serde(default)]
    authors: Vec<String>,
    #[serde(default)]
    published: Option<String>,
    #[serde(default, alias = "pdf_url")]
    url: Option<String>,
}

impl CandidateInput {
    fn into_candidate(self, position: usize) -> Candidate {
        Candidate {
            id: self.id.unwrap_or_else(|| position.to_string()),
            title: self.title,
            summary: self.summary,
            authors: self.authors,
            published: self.published,
            url: self.url,
        }
    }
}

/// Parse a string as either a JSON array of candidates or JSON Lines (one object per line).
fn parse_candidates_from_str(content: &str) -> Result<Vec<Candidate>, String> {
    let trimmed = content.trim();
    let inputs: Vec<CandidateInput> = if trimmed.starts_with('[') {
        serde_json::from_str(trimmed).map_err(|e| format!("Input looks like a JSON array but failed to parse: {e}"))?
    } else {
        trimmed
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(n, line)| {
                serde_json::from_str(line).map_err(|e| format!("Invalid candidate on line {}: {e}", n + 1))
            })
            .collect::<Result<_, _>>()?
    };

    Ok(inputs
        .into_iter()
        .enumerate()
        .map(|(i, input)| input.into_candidate(i))
        .collect())
}

/// Load candidates from --candidates or stdin.
fn load_candidates(args: &RankArgs) -> Vec<Candidate> {
    let content = match args.candidates {
        Some(ref path) => std::fs::read_to_string(path)
            .unwrap_or_else(|e| bail(format!("Failed to read candidates file {}: {e}", path.display()))),
        None => {
            let mut stdin = io::stdin();
            if stdin.is_terminal() {
                bail("No candidates provided. Use --candidates <file> or pipe JSON via stdin.");
            }
            let mut content = String::new();
            stdin
                .read_to_string(&mut content)
                .unwrap_or_else(|e| bail(format!("Failed to read from stdin: {e}")));
            content
        }
    };

    let candidates = parse_candidates_from_str(&content).unwrap_or_else(|e| bail(e));
    if candidates.is_empty() {
        bail("No candidates supplied.");
    }
    candidates
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

/// Resolves on Ctrl-C. Never resolves if the signal handler can't be installed.
async fn ctrl_c() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Rank(args) => run_rank(args).await,
        Commands::Init => {
            let path = config::config_path();
            config::create_default_config(&path).unwrap_or_else(|e| bail(e));
            println!("Created config at {}", path.display());
            println!("Edit it to set your default endpoint, model, concurrency, etc.");
        }
    }
}

async fn run_rank(args: RankArgs) {
    init_logging(args.verbose);

    // Load config file, merge with CLI args (CLI wins)
    let config_path = args.config.clone().unwrap_or_else(config::config_path);
    let cfg = config::load_config(&config_path);

    let endpoint = args.endpoint.clone()
        .or(cfg.endpoint)
        .unwrap_or_else(|| {
            bail(format!("No endpoint specified. Pass --endpoint or set it in {}", config_path.display()));
        });
    let model = args.model.clone()
        .or(cfg.model)
        .unwrap_or_else(|| {
            bail(format!("No model specified. Pass --model or set it in {}", config_path.display()));
        });
    let concurrency = args.concurrency
        .or(cfg.concurrency)
        .unwrap_or_else(|| {
            bail(format!("No concurrency limit specified. Pass --concurrency or set it in {}", config_path.display()));
        });

    let top_k = args.top_k.or(cfg.top_k).unwrap_or(pairrank_core::constants::DEFAULT_TOP_K);
    let temperature = args.temperature.or(cfg.temperature).unwrap_or(0.3);
    let max_retries = args.retries.or(cfg.retries).unwrap_or(3);
    let timeout = args.timeout_secs.or(cfg.timeout_secs).map(Duration::from_secs);

    let api_key = args
        .api_key
        .clone()
        .or_else(|| std::env::var("OPENAI_API_KEY").ok());

    let candidates = load_candidates(&args);

    let mut ranking_config = RankingConfig::new(concurrency)
        .unwrap_or_else(|e| bail(e))
        .with_top_k(top_k);
    if let Some(limit) = timeout {
        ranking_config = ranking_config.with_timeout(limit);
    }

    let judge = LlmJudge::new(
        Client::new(),
        LlmConfig {
            endpoint: endpoint.clone(),
            model: model.clone(),
            api_key,
            temperature,
            max_retries,
            retry_delay: Duration::from_secs(1),
        },
    );
    let comparator = match args.seed {
        Some(seed) => ComparatorClient::with_seed(judge, seed),
        None => ComparatorClient::new(judge),
    };
    let engine = RankingEngine::new(comparator, ranking_config).unwrap_or_else(|e| bail(e));

    if args.verbose {
        let planned = if candidates.len() > SHORT_CIRCUIT_THRESHOLD { pair_count(candidates.len()) } else { 0 };
        eprintln!(
            "Ranking {} candidates ({} comparisons planned, concurrency {})",
            candidates.len(),
            planned,
            concurrency,
        );
        eprintln!("Query: \"{}\"", args.query);
        eprintln!("Endpoint: {} | Model: {}", endpoint, model);
    }

    let result = engine
        .rank_with_cancel(&candidates, &args.query, ctrl_c())
        .await
        .unwrap_or_else(|e| bail(e));

    if args.verbose && result.fallbacks > 0 {
        eprintln!(
            "{} of {} comparisons failed and were settled by coin flip",
            result.fallbacks, result.comparisons,
        );
    }

    if args.json {
        let json = output::format_json(&result, &args.query)
            .unwrap_or_else(|e| bail(format!("Failed to serialize results: {e}")));
        println!("{json}");
    } else {
        output::print_table(&result);
    }
}
