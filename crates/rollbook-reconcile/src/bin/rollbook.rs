//! rollbook: command-line access to the catalog, matchers and reconciler.
//!
//! Output is JSON on stdout (except `tree`); logs go to stderr.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rollbook_core::{
    EventBus, ExtractionPayload, Perspective, RollbookConfig, TechniqueCategory,
};
use rollbook_core::logging::{POSITION_COUNT, SUBSYSTEM, TECHNIQUE_COUNT};
use rollbook_reconcile::Reconciler;
use rollbook_search::EntityMatchers;
use rollbook_store::{CatalogMutator, CatalogStore};

#[derive(Parser)]
#[command(name = "rollbook")]
#[command(author, version, about = "Position and technique catalog with fuzzy reconciliation")]
#[command(propagate_version = true)]
struct Cli {
    /// Config file (default: ~/.config/rollbook/rollbook.toml, else environment)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// System catalog JSON (overrides config)
    #[arg(long, global = true, env = "ROLLBOOK_SYSTEM_CATALOG")]
    catalog: Option<PathBuf>,

    /// Overlay JSON (overrides config)
    #[arg(long, global = true, env = "ROLLBOOK_OVERLAY_PATH")]
    overlay: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the position tree with technique counts
    Tree,

    /// Report structural problems in the merged catalog
    Doctor,

    /// Fuzzy-match a position name
    MatchPosition {
        query: String,

        /// Return up to this many ranked candidates instead of the best one
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Fuzzy-match a technique name
    MatchTechnique {
        query: String,

        /// Prefer techniques owned by this position id
        #[arg(long)]
        context: Option<String>,

        /// Return up to this many ranked candidates instead of the best one
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Reconcile an extraction payload (JSON file, or `-` for stdin)
    Reconcile {
        input: PathBuf,

        /// Print only the names that failed to match
        #[arg(long)]
        unmatched: bool,
    },

    /// Add a custom position to the overlay
    AddPosition {
        name: String,

        /// Parent position id
        #[arg(long)]
        parent: Option<String>,

        /// top, bottom or neutral (default: parent's)
        #[arg(long)]
        perspective: Option<Perspective>,
    },

    /// Add a custom technique to the overlay
    AddTechnique {
        name: String,

        /// submission, sweep, pass, escape, takedown, transition, control, defense
        #[arg(long)]
        category: TechniqueCategory,

        /// Owning position id
        #[arg(long)]
        from: String,

        /// Destination position id
        #[arg(long)]
        to: Option<String>,
    },
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let _log_guard = init_logging();

    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Logging configuration:
///   LOG_FORMAT - "json" or "text" (default: "text")
///   LOG_FILE   - path to log file (optional, daily rotation)
///   RUST_LOG   - standard env filter (default: "warn")
fn init_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();

    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into());
    let registry = tracing_subscriber::registry().with(env_filter);

    if let Some(ref path) = log_file {
        let path = Path::new(path);
        let file_dir = path.parent().unwrap_or(Path::new("."));
        let file_name = path
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("rollbook.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false),
                )
                .init();
        }
        Some(guard)
    } else {
        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        } else {
            registry
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
        None
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<RollbookConfig> {
    let mut config = match &cli.config {
        Some(path) => RollbookConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => RollbookConfig::load().context("loading config")?,
    };
    if let Some(path) = &cli.catalog {
        config.catalog.system_catalog_path = Some(path.clone());
    }
    if let Some(path) = &cli.overlay {
        config.catalog.overlay_path = Some(path.clone());
    }
    Ok(config)
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = load_config(&cli)?;
    let store = Arc::new(CatalogStore::from_config(&config.catalog, EventBus::default())?);
    let index = store.index();

    info!(
        { SUBSYSTEM } = "cli",
        { POSITION_COUNT } = index.position_count(),
        { TECHNIQUE_COUNT } = index.technique_count(),
        "Catalog loaded"
    );

    match cli.command {
        Commands::Tree => {
            for position in index.pre_order() {
                let depth = index.depth(&position.id)?;
                println!(
                    "{}{} [{}] ({} techniques){}",
                    "  ".repeat(depth),
                    position.name,
                    position.perspective,
                    index.techniques_owned_by(&position.id).len(),
                    if position.is_custom { " *" } else { "" }
                );
            }
        }
        Commands::Doctor => {
            let issues = index.diagnostics();
            for issue in &issues {
                println!("{}", issue);
            }
            if !issues.is_empty() {
                eprintln!("{} issue(s) found", issues.len());
                return Ok(ExitCode::FAILURE);
            }
            println!("catalog ok");
        }
        Commands::MatchPosition { query, limit } => {
            let matchers = EntityMatchers::build(&index, &config.matching);
            let output = match limit {
                Some(limit) => serde_json::to_value(matchers.search_positions(&query, limit))?,
                None => serde_json::to_value(matchers.match_position(&query))?,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::MatchTechnique {
            query,
            context,
            limit,
        } => {
            let matchers = EntityMatchers::build(&index, &config.matching);
            let output = match limit {
                Some(limit) => serde_json::to_value(matchers.search_techniques(&query, limit))?,
                None => serde_json::to_value(matchers.match_technique(&query, context.as_deref()))?,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Reconcile { input, unmatched } => {
            let raw = read_input(&input)?;
            let payload = ExtractionPayload::from_json(&raw).context("parsing extraction payload")?;
            let matched = Reconciler::new(&index, &config.matching).reconcile(&payload);
            let output = if unmatched {
                serde_json::to_string_pretty(&matched.unmatched())?
            } else {
                serde_json::to_string_pretty(&matched)?
            };
            println!("{}", output);
        }
        Commands::AddPosition {
            name,
            parent,
            perspective,
        } => {
            let mutator = CatalogMutator::new(store.clone());
            let Some(position) =
                mutator.create_position(&index, &name, parent.as_deref(), perspective)?
            else {
                bail!("position not created: name is blank or parent is unknown");
            };
            println!("{}", serde_json::to_string_pretty(&position)?);
        }
        Commands::AddTechnique {
            name,
            category,
            from,
            to,
        } => {
            let mutator = CatalogMutator::new(store.clone());
            let Some(technique) =
                mutator.create_technique(&index, &name, category, &from, to.as_deref())?
            else {
                bail!("technique not created: name is blank or a position id is unknown");
            };
            println!("{}", serde_json::to_string_pretty(&technique)?);
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn read_input(input: &Path) -> anyhow::Result<String> {
    if input == Path::new("-") {
        let mut raw = String::new();
        std::io::stdin().read_to_string(&mut raw)?;
        return Ok(raw);
    }
    std::fs::read_to_string(input).with_context(|| format!("reading {}", input.display()))
}
