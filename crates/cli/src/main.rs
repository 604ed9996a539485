mod dispatch;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rmab_core::config::{Config, FlagBonusProvider, SourceProvider};
use rmab_core::orchestrator::{OrchestratorConfig, SearchOrchestrator};
use rmab_core::ranking::RequestContext;
use rmab_core::request::{MemoryRequestStore, RequestProcessor, RequestRecord, RequestStore};
use rmab_core::resilience::RetryPolicy;
use rmab_core::searcher::{
    group_indexers_by_categories, ContentType, HttpRuntimeLookup, ProwlarrSearcher,
};
use rmab_core::{load_config, metrics, validate_config, SanitizedConfig};

use dispatch::LoggingDispatcher;

#[derive(Debug, Parser)]
#[command(name = "rmab", version, about = "Audiobook and ebook release search and ranking")]
struct Cli {
    /// Path to the configuration file (defaults to $RMAB_CONFIG, then config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Search all configured indexers and rank the results.
    Search(SearchArgs),
    /// Show how indexers are grouped for a content type.
    Groups {
        /// Group by ebook categories instead of audiobook categories.
        #[arg(long)]
        ebook: bool,
    },
    /// Validate the configuration and print it with secrets redacted.
    CheckConfig,
}

#[derive(Debug, Args)]
struct SearchArgs {
    title: String,

    #[arg(long, default_value = "")]
    author: String,

    #[arg(long)]
    narrator: Option<String>,

    /// Known runtime in minutes.
    #[arg(long)]
    runtime: Option<u32>,

    /// Catalog identifier used for runtime lookup.
    #[arg(long)]
    asin: Option<String>,

    /// Search for an ebook instead of an audiobook.
    #[arg(long)]
    ebook: bool,

    /// Ebook format to prefer.
    #[arg(long)]
    format: Option<String>,

    /// Do not require the author to appear in release titles.
    #[arg(long)]
    interactive: bool,

    /// Print Prometheus metrics to stderr when done.
    #[arg(long)]
    metrics: bool,
}

impl SearchArgs {
    fn content_type(&self) -> ContentType {
        if self.ebook {
            ContentType::Text
        } else {
            ContentType::Audio
        }
    }

    fn context(&self) -> RequestContext {
        RequestContext {
            narrator: self.narrator.clone(),
            identifier: self.asin.clone(),
            runtime_minutes: self.runtime,
            preferred_format: self.format.clone(),
            ..RequestContext::new(&self.title, &self.author)
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.json_logs);

    if let Err(e) = run(cli).await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli
        .config
        .or_else(|| std::env::var("RMAB_CONFIG").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;

    match cli.command {
        Command::Search(args) => search(Arc::new(config), args).await,
        Command::Groups { ebook } => {
            let content_type = if ebook {
                ContentType::Text
            } else {
                ContentType::Audio
            };
            let grouping = group_indexers_by_categories(&config.sources(), content_type);
            print_json(&grouping)
        }
        Command::CheckConfig => {
            info!("Configuration is valid");
            print_json(&SanitizedConfig::from(&config))
        }
    }
}

async fn search(config: Arc<Config>, args: SearchArgs) -> Result<()> {
    let Some(prowlarr) = config.prowlarr.clone() else {
        bail!("[prowlarr] must be configured to search");
    };

    let transport = ProwlarrSearcher::new(prowlarr, RetryPolicy::from_pacing(&config.pacing))
        .context("Failed to create Prowlarr searcher")?;
    let sources: Arc<dyn SourceProvider> = config.clone();
    let mut orchestrator = SearchOrchestrator::new(
        OrchestratorConfig::from_config(&config),
        Arc::new(transport),
        sources,
    );
    if let Some(lookup) = &config.runtime_lookup {
        let lookup = HttpRuntimeLookup::new(lookup).context("Failed to create runtime lookup")?;
        orchestrator = orchestrator.with_runtime_lookup(Arc::new(lookup));
    }

    let store = Arc::new(MemoryRequestStore::new());
    let flag_bonuses: Arc<dyn FlagBonusProvider> = config.clone();
    let processor = RequestProcessor::new(
        Arc::new(orchestrator),
        store.clone(),
        Arc::new(LoggingDispatcher),
        flag_bonuses,
        config.ranking.clone(),
    )
    .with_require_author(!args.interactive);

    let content_type = args.content_type();
    let request_id = format!("cli-{}", Utc::now().timestamp_millis());
    store.insert(RequestRecord::new(&request_id, content_type))?;

    let report = processor
        .search_and_rank(&request_id, content_type, &args.context())
        .await?;
    print_json(&report)?;

    if args.metrics {
        eprintln!("{}", render_metrics()?);
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn render_metrics() -> Result<String> {
    use prometheus::{Encoder, Registry, TextEncoder};

    let registry = Registry::new();
    for collector in metrics::all_metrics() {
        registry.register(collector)?;
    }
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
