//! paperscout - research paper discovery pipeline
//!
//! Turns a free-form research request into a search query, retrieves recent papers
//! from Semantic Scholar, ranks them for relevance with an LLM and surfaces the
//! ones most likely to become influential.
//!
//! ## Usage
//!
//! ### CLI Mode
//! ```bash
//! paperscout scan "Generative AI" --seen seen.txt --output scan.csv
//! paperscout plan "Generative AI" --combiner combiner.json --forest forest.json \
//!     --specialist-url http://localhost:9000/predict
//! ```
//!
//! ### HTTP Server Mode
//! ```bash
//! paperscout serve --port 3000
//! ```

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use clap::{Args, Parser, Subcommand};
use paperscout::{
    config::{self, Config},
    estimator::Estimator,
    llm::{LanguageModel, OpenAiChat},
    notifier::{LogNotifier, Notifier, WebhookNotifier},
    planner::Planner,
    retriever::Retriever,
    selector::Selector,
    semanticscholar::SemanticScholarClient,
    Paper, YearRange,
};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// Research paper discovery pipeline
#[derive(Parser)]
#[command(name = "paperscout")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Commands,
}

/// Pipeline settings shared by every subcommand
#[derive(Args)]
struct Settings {
    // === LLM ===
    /// OpenAI-compatible API base URL
    #[arg(long, global = true, env = "LLM_BASE_URL", default_value = config::DEFAULT_LLM_BASE_URL)]
    llm_base_url: String,

    /// LLM API key
    #[arg(long, global = true, env = "OPENAI_API_KEY", hide_env_values = true)]
    llm_key: Option<String>,

    /// LLM model name
    #[arg(long, global = true, env = "LLM_MODEL", default_value = config::DEFAULT_LLM_MODEL)]
    llm_model: String,

    /// LLM request timeout in seconds
    #[arg(long, global = true, default_value = "60")]
    llm_timeout: u64,

    // === Search ===
    /// Semantic Scholar API key
    #[arg(long, global = true, env = "SEMANTIC_SCHOLAR_API_KEY", hide_env_values = true)]
    s2_key: Option<String>,

    /// Semantic Scholar graph API base URL
    #[arg(long, global = true, env = "SEMANTIC_SCHOLAR_API_URL", default_value = config::DEFAULT_GRAPH_API)]
    s2_url: String,

    /// Publication years (e.g., "2024", "2020-2024", "2020-"); defaults to the current year
    #[arg(long, global = true)]
    year: Option<String>,

    /// Papers fetched per scan
    #[arg(long, global = true, default_value = "50")]
    limit: u32,

    /// Seconds to wait before retrying a rate-limited search
    #[arg(long, global = true, default_value = "30")]
    rate_limit_backoff: u64,

    // === Selection ===
    /// Papers the LLM is asked to select
    #[arg(long, global = true, default_value = "20")]
    top_k: usize,

    /// Fail when the LLM returns papers that are not exact candidate copies
    #[arg(long, global = true)]
    strict_echo: bool,

    // === Estimation ===
    /// Fine-tuned specialist model endpoint
    #[arg(long, global = true, env = "PAPERSCOUT_SPECIALIST_URL")]
    specialist_url: Option<String>,

    /// Reference papers (JSON array) for the frontier model
    #[arg(long, global = true, env = "PAPERSCOUT_REFERENCES")]
    references: Option<PathBuf>,

    /// Random forest artifact (JSON)
    #[arg(long, global = true, env = "PAPERSCOUT_FOREST")]
    forest: Option<PathBuf>,

    /// Linear combiner artifact (JSON)
    #[arg(long, global = true, env = "PAPERSCOUT_COMBINER")]
    combiner: Option<PathBuf>,

    /// Papers surfaced by `plan`
    #[arg(long, global = true, default_value = "5")]
    top_n: usize,

    /// Parallel influence estimates
    #[arg(long, global = true, default_value = "1")]
    concurrency: usize,

    // === Notification ===
    /// Webhook receiving surfaced papers
    #[arg(long, global = true, env = "PAPERSCOUT_WEBHOOK_URL")]
    webhook_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Turn a research request into a search query
    Query {
        /// Free-form research request
        request: String,
    },

    /// Run a raw search query against Semantic Scholar
    Fetch {
        /// Search keywords
        query: String,

        /// Zero-based page index
        #[arg(long, default_value = "0")]
        page: u32,

        /// Output CSV path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Retrieve and rank papers for a research request
    Scan {
        /// Free-form research request
        request: String,

        /// File of already surfaced URLs, one per line
        #[arg(long)]
        seen: Option<PathBuf>,

        /// Output CSV path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Rank, estimate influence and surface the top papers
    Plan {
        /// Free-form research request
        request: String,

        /// File of already surfaced URLs, one per line (surfaced papers are appended)
        #[arg(long)]
        seen: Option<PathBuf>,

        /// Output CSV path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run as HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    if cli.json_logs {
        fmt().json().with_env_filter(filter).with_target(true).init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .init();
    }

    let config = build_config(&cli.settings)?;

    match cli.command {
        Commands::Query { request } => run_query(&config, &request).await,
        Commands::Fetch {
            query,
            page,
            output,
        } => run_fetch(&config, &query, page, output.as_deref()).await,
        Commands::Scan {
            request,
            seen,
            output,
        } => run_scan(&config, &request, seen.as_deref(), output.as_deref()).await,
        Commands::Plan {
            request,
            seen,
            output,
        } => run_plan(&config, &request, seen.as_deref(), output.as_deref()).await,
        Commands::Serve { port, host } => run_server(config, host, port).await,
    }
}

fn build_config(settings: &Settings) -> Result<Config> {
    let year_range = match &settings.year {
        Some(spec) => spec.parse::<YearRange>().context("Invalid --year format")?,
        None => YearRange::current_year(),
    };

    let mut config = Config::default();
    config.llm.base_url = settings.llm_base_url.clone();
    config.llm.api_key = settings.llm_key.clone().unwrap_or_default();
    config.llm.model = settings.llm_model.clone();
    config.llm.timeout = Duration::from_secs(settings.llm_timeout);

    config.search.graph_api_url = settings.s2_url.clone();
    config.search.api_key = settings.s2_key.clone();
    config.search.fetch_limit = settings.limit;
    config.search.year_range = year_range;
    config.search.rate_limit_backoff = Duration::from_secs(settings.rate_limit_backoff);

    config.selector.top_k = settings.top_k;
    config.selector.strict_echo = settings.strict_echo;

    config.estimator.specialist_url = settings.specialist_url.clone();
    config.estimator.reference_papers = settings.references.clone();
    config.estimator.forest_path = settings.forest.clone();
    config.estimator.combiner_path = settings.combiner.clone();

    config.planner.top_n = settings.top_n;
    config.planner.estimate_concurrency = settings.concurrency;

    config.notifier.webhook_url = settings.webhook_url.clone();
    Ok(config)
}

// ============================================================================
// Pipeline Assembly
// ============================================================================

/// Everything the configured credentials and artifacts allow us to run
enum Pipeline {
    ScanOnly(Selector),
    Full(Planner),
}

impl Pipeline {
    fn selector(&self) -> &Selector {
        match self {
            Pipeline::ScanOnly(selector) => selector,
            Pipeline::Full(planner) => planner.selector(),
        }
    }

    fn planner(&self) -> Option<&Planner> {
        match self {
            Pipeline::ScanOnly(_) => None,
            Pipeline::Full(planner) => Some(planner),
        }
    }
}

fn build_llm(config: &Config) -> Result<Arc<OpenAiChat>> {
    config.llm.validate().context("Invalid LLM settings")?;
    Ok(Arc::new(
        OpenAiChat::new(&config.llm).context("Failed to create LLM client")?,
    ))
}

fn build_selector(config: &Config, llm: Arc<dyn LanguageModel>) -> Result<Selector> {
    let source = Arc::new(
        SemanticScholarClient::new(&config.search).context("Failed to create search client")?,
    );
    Ok(Selector::new(
        Retriever::new(llm.clone(), source),
        llm,
        config.selector.clone(),
        config.search.fetch_limit,
        config.search.year_range,
    ))
}

fn build_notifier(config: &Config) -> Result<Arc<dyn Notifier>> {
    let notifier: Arc<dyn Notifier> = match &config.notifier.webhook_url {
        Some(url) => Arc::new(WebhookNotifier::new(url).context("Failed to create webhook notifier")?),
        None => Arc::new(LogNotifier),
    };
    Ok(notifier)
}

fn build_pipeline(config: &Config, llm: Arc<dyn LanguageModel>) -> Result<Pipeline> {
    let selector = build_selector(config, llm.clone())?;
    if !config.estimator.is_configured() {
        info!("Estimator artifacts not configured, influence planning disabled");
        return Ok(Pipeline::ScanOnly(selector));
    }

    let estimator =
        Estimator::from_config(&config.estimator, llm).context("Failed to load estimator")?;
    Ok(Pipeline::Full(Planner::new(
        selector,
        estimator,
        build_notifier(config)?,
        config.planner.clone(),
    )))
}

fn print_usage(llm: &OpenAiChat) {
    let usage = llm.usage();
    println!(
        "Token usage ({}): prompt {}, completion {}, total {}",
        llm.model(),
        usage.prompt_tokens,
        usage.completion_tokens,
        usage.total_tokens
    );
}

// ============================================================================
// Commands
// ============================================================================

async fn run_query(config: &Config, request: &str) -> Result<()> {
    let llm = build_llm(config)?;
    let source = Arc::new(SemanticScholarClient::new(&config.search)?);
    let retriever = Retriever::new(llm.clone(), source);

    let query = retriever.generate_query(request).await?;
    println!("{}", query);
    print_usage(&llm);
    Ok(())
}

async fn run_fetch(config: &Config, query: &str, page: u32, output: Option<&Path>) -> Result<()> {
    config.search.validate().context("Invalid search settings")?;
    let client = SemanticScholarClient::new(&config.search)?;

    let papers = client
        .try_fetch(query, page, config.search.fetch_limit, &config.search.year_range)
        .await
        .context("Search request failed")?;

    println!("Found {} papers for \"{}\".", papers.len(), query);
    print_papers(&papers);
    if let Some(path) = output {
        save_csv(path, &papers)?;
    }
    Ok(())
}

async fn run_scan(
    config: &Config,
    request: &str,
    seen: Option<&Path>,
    output: Option<&Path>,
) -> Result<()> {
    config.validate().context("Invalid configuration")?;
    let llm = build_llm(config)?;
    let selector = build_selector(config, llm.clone())?;
    let memory = load_memory(seen)?;

    match selector.scan(&memory, request).await? {
        Some(selection) => {
            println!("Selected {} papers.", selection.len());
            print_papers(&selection.papers);
            if let Some(path) = output {
                save_csv(path, &selection.papers)?;
            }
        }
        None => println!("No new papers to rank."),
    }

    print_usage(&llm);
    Ok(())
}

async fn run_plan(
    config: &Config,
    request: &str,
    seen: Option<&Path>,
    output: Option<&Path>,
) -> Result<()> {
    config.validate().context("Invalid configuration")?;
    let llm = build_llm(config)?;
    let Pipeline::Full(planner) = build_pipeline(config, llm.clone())? else {
        anyhow::bail!("plan needs --specialist-url, --forest and --combiner");
    };
    let memory = load_memory(seen)?;

    match planner.plan(&memory, request).await? {
        Some(best) => {
            println!("Top {} papers by predicted influence:", best.len());
            print_papers(&best);
            if let Some(path) = output {
                save_csv(path, &best)?;
            }
            if let Some(path) = seen {
                remember(path, &best)?;
            }
        }
        None => println!("No new papers to rank."),
    }

    print_usage(&llm);
    Ok(())
}

// ============================================================================
// Memory and Output
// ============================================================================

/// Read surfaced URLs; a missing file means an empty memory.
fn load_memory(path: Option<&Path>) -> Result<Vec<String>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read seen file {:?}", path))?;
    let memory: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect();

    info!(path = ?path, count = memory.len(), "Loaded seen papers");
    Ok(memory)
}

/// Append surfaced URLs to the seen file.
fn remember(path: &Path, papers: &[Paper]) -> Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open seen file {:?}", path))?;

    for paper in papers.iter().filter(|p| !p.url.is_empty()) {
        writeln!(file, "{}", paper.url).context("Failed to update seen file")?;
    }
    Ok(())
}

fn print_papers(papers: &[Paper]) {
    for (i, paper) in papers.iter().enumerate() {
        let citations = paper
            .observed_citation_count
            .map(|c| c.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        let mut line = format!("{:>3}. {} [{} citations]", i + 1, paper.title, citations);
        if let Some(score) = paper.relevance_score {
            line.push_str(&format!(" relevance {:.2}", score));
        }
        if let Some(score) = paper.predicted_influence_score {
            line.push_str(&format!(" influence {:.2}", score));
        }
        println!("{}", line);
        println!("     {}", paper.url);
    }
}

/// Flat CSV row for a paper
#[derive(Debug, Serialize)]
struct PaperRow<'a> {
    rank: usize,
    title: &'a str,
    authors: String,
    published: &'a str,
    url: &'a str,
    paper_id: &'a str,
    observed_citation_count: Option<i64>,
    relevance_score: Option<f64>,
    predicted_influence_score: Option<f64>,
    abstract_text: &'a str,
}

impl<'a> PaperRow<'a> {
    fn new(rank: usize, paper: &'a Paper) -> Self {
        Self {
            rank,
            title: &paper.title,
            authors: paper.authors.join("; "),
            published: paper.published.as_deref().unwrap_or_default(),
            url: &paper.url,
            paper_id: paper.paper_id.as_deref().unwrap_or_default(),
            observed_citation_count: paper.observed_citation_count,
            relevance_score: paper.relevance_score,
            predicted_influence_score: paper.predicted_influence_score,
            abstract_text: &paper.abstract_text,
        }
    }
}

/// Save papers to CSV file
fn save_csv(path: &Path, papers: &[Paper]) -> Result<()> {
    if papers.is_empty() {
        println!("No data to save to {:?}", path);
        return Ok(());
    }

    let mut wtr = csv::WriterBuilder::new()
        .has_headers(true)
        .from_path(path)
        .context("Failed to create CSV writer")?;

    for (i, paper) in papers.iter().enumerate() {
        wtr.serialize(PaperRow::new(i + 1, paper))
            .context("Failed to write CSV record")?;
    }

    wtr.flush().context("Failed to flush CSV")?;
    println!("Saved: {:?}", path);
    Ok(())
}

// ============================================================================
// HTTP Server
// ============================================================================

async fn run_server(config: Config, host: String, port: u16) -> Result<()> {
    config.validate().context("Invalid configuration")?;
    info!(host = %host, port = port, "Starting HTTP server");

    let llm = build_llm(&config)?;
    let pipeline = build_pipeline(&config, llm)?;
    let app_state = Arc::new(AppState { pipeline });

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/scan", post(scan_handler))
        .route("/plan", post(plan_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .context("Invalid host:port")?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    println!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}

struct AppState {
    pipeline: Pipeline,
}

/// Health check endpoint
async fn health_handler() -> &'static str {
    "OK"
}

/// Scan/plan request body
#[derive(Debug, Deserialize)]
struct PipelineRequest {
    request: String,
    #[serde(default)]
    memory: Vec<String>,
}

/// Scan/plan response
#[derive(Debug, Serialize)]
struct PipelineResponse {
    status: String,
    count: usize,
    results: Vec<Paper>,
}

impl PipelineResponse {
    fn success(results: Vec<Paper>) -> (StatusCode, Json<Self>) {
        (
            StatusCode::OK,
            Json(Self {
                status: "success".to_string(),
                count: results.len(),
                results,
            }),
        )
    }

    fn error(code: StatusCode, message: impl std::fmt::Display) -> (StatusCode, Json<Self>) {
        (
            code,
            Json(Self {
                status: format!("error: {}", message),
                count: 0,
                results: vec![],
            }),
        )
    }
}

/// Scan endpoint handler
async fn scan_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PipelineRequest>,
) -> (StatusCode, Json<PipelineResponse>) {
    info!(request = %req.request, memory = req.memory.len(), "Scan request");

    match state.pipeline.selector().scan(&req.memory, &req.request).await {
        Ok(selection) => PipelineResponse::success(selection.map(|s| s.papers).unwrap_or_default()),
        Err(e) => {
            error!(error = %e, "Scan failed");
            PipelineResponse::error(StatusCode::BAD_GATEWAY, e)
        }
    }
}

/// Plan endpoint handler
async fn plan_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PipelineRequest>,
) -> (StatusCode, Json<PipelineResponse>) {
    info!(request = %req.request, memory = req.memory.len(), "Plan request");

    let Some(planner) = state.pipeline.planner() else {
        warn!("Plan requested but the estimator is not configured");
        return PipelineResponse::error(
            StatusCode::SERVICE_UNAVAILABLE,
            "influence estimator is not configured",
        );
    };

    match planner.plan(&req.memory, &req.request).await {
        Ok(best) => PipelineResponse::success(best.unwrap_or_default()),
        Err(e) => {
            error!(error = %e, "Plan failed");
            PipelineResponse::error(StatusCode::BAD_GATEWAY, e)
        }
    }
}
