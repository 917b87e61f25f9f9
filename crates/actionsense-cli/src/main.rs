//! CLI entry point for actionsense.
//!
//! This binary provides the `actionsense` command with subcommands for
//! listing the action catalog, resolving a single input, and an interactive
//! resolution REPL.

mod http_resolver;
mod output;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use actionsense_core::{CatalogConfig, ResolutionEngine};

use crate::http_resolver::HttpResolver;

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

/// actionsense — resolve free-form text into assistant actions.
#[derive(Parser)]
#[command(
    name = "actionsense",
    version,
    about = "Resolve free-form text into assistant actions",
    long_about = "Matches input against an action catalog using slash commands and keywords, \
                  optionally falling back to an external semantic resolver over HTTP."
)]
struct Cli {
    /// Path to the TOML action catalog.
    #[arg(
        long,
        short,
        global = true,
        env = "ACTIONSENSE_CONFIG",
        default_value = "config/actions.toml"
    )]
    config: PathBuf,

    /// Semantic resolver endpoint (overrides `semantic.endpoint`).
    #[arg(long, global = true, env = "ACTIONSENSE_SEMANTIC_URL")]
    semantic_url: Option<String>,

    /// Bearer token sent to the semantic resolver.
    #[arg(long, global = true, env = "ACTIONSENSE_SEMANTIC_TOKEN", hide_env_values = true)]
    semantic_token: Option<String>,

    /// Stage 2 timeout in milliseconds (overrides `engine.semantic_timeout_ms`).
    #[arg(long, global = true, env = "ACTIONSENSE_SEMANTIC_TIMEOUT_MS")]
    timeout_ms: Option<u64>,

    /// Default log level when `RUST_LOG` is not set.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every action in the catalog.
    List,

    /// Resolve a single input and print the matched actions.
    Resolve {
        /// The input text.  Multiple words are joined with spaces.
        #[arg(required = true, num_args = 1..)]
        input: Vec<String>,

        /// Print the full resolution as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Read inputs line by line and resolve each one.
    Repl,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_tracing(&cli.log_level);

    let engine = build_engine(&cli)?;

    match cli.command {
        Commands::List => {
            output::print_catalog(engine.registry());
            Ok(())
        }
        Commands::Resolve { ref input, json } => {
            cmd_resolve(&engine, &input.join(" "), json).await
        }
        Commands::Repl => cmd_repl(&engine).await,
    }
}

/// Load the catalog, apply overrides, and wire up the resolution engine.
fn build_engine(cli: &Cli) -> Result<ResolutionEngine> {
    let mut catalog = CatalogConfig::load(&cli.config)
        .with_context(|| format!("failed to load catalog {}", cli.config.display()))?;

    if let Some(ms) = cli.timeout_ms {
        anyhow::ensure!(ms > 0, "--timeout-ms must be greater than zero");
        catalog.engine.semantic_timeout = Duration::from_millis(ms);
    }
    if let Some(url) = &cli.semantic_url {
        catalog.semantic.endpoint = Some(url.clone());
    }

    let engine_config = catalog.engine;
    let endpoint = catalog.semantic.endpoint.clone();
    let registry = Arc::new(
        catalog
            .into_registry()
            .context("invalid action catalog")?,
    );

    let engine = match endpoint {
        Some(endpoint) => {
            let mut resolver =
                HttpResolver::new(&endpoint).context("invalid semantic resolver endpoint")?;
            if let Some(token) = &cli.semantic_token {
                resolver = resolver.with_bearer_token(token.clone());
            }
            info!(endpoint = %resolver.endpoint(), "semantic resolver enabled");
            ResolutionEngine::with_semantic(registry, Arc::new(resolver))
        }
        None => {
            info!("no semantic resolver configured, using local matching only");
            ResolutionEngine::new(registry)
        }
    };

    Ok(engine.with_config(engine_config))
}

// ---------------------------------------------------------------------------
// Subcommand: resolve
// ---------------------------------------------------------------------------

async fn cmd_resolve(engine: &ResolutionEngine, input: &str, json: bool) -> Result<()> {
    let resolution = engine.resolve_detailed(input).await;

    if json {
        let text =
            serde_json::to_string_pretty(&resolution).context("failed to serialize resolution")?;
        println!("{text}");
    } else {
        output::print_resolution(engine.registry(), &resolution);
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Subcommand: repl
// ---------------------------------------------------------------------------

async fn cmd_repl(engine: &ResolutionEngine) -> Result<()> {
    println!();
    println!("  actionsense v{}", env!("CARGO_PKG_VERSION"));
    println!(
        "  {} actions loaded. Type some text, or 'quit' to exit.",
        engine.registry().len()
    );
    println!();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush().context("failed to flush stdout")?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line.context("failed to read input")?;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }
        if trimmed == "quit" || trimmed == "exit" {
            debug!("user requested exit");
            break;
        }

        let resolution = engine.resolve_detailed(trimmed).await;
        output::print_resolution(engine.registry(), &resolution);
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tracing
// ---------------------------------------------------------------------------

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
