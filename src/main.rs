//! # Legislación PBA CLI (`lpba`)
//!
//! Natural-language search over the Buenos Aires provincial legal-norm
//! dataset.
//!
//! ## Usage
//!
//! ```bash
//! lpba --config ./config/lpba.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `lpba parse "<text>"` | Show the structured intent for a request |
//! | `lpba search "<text>"` | Search the corpus |
//! | `lpba compare "<text>" <a> <b>` | Compare two results of a search |
//! | `lpba ask "<text>"` | Search, or compare the top two when asked to |
//! | `lpba fetch` | Acquire the corpus and report resolved fields |
//! | `lpba columns` | List source columns and their canonical fields |
//! | `lpba serve` | Start the JSON HTTP API |
//!
//! ## Examples
//!
//! ```bash
//! lpba search "leyes vigentes sobre adopción desde 2010"
//! lpba search "decreto 1234/2019" --json
//! lpba compare "adopción" 1 2
//! lpba ask "comparar leyes de adopción"
//! ```
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `warn`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use legislacion_pba::{config, provider, search, server, session, sources};

/// Legislación PBA: query the provincial legal-norm corpus in plain Spanish.
///
/// Commands other than `parse` read a TOML configuration file. When the
/// file does not exist, built-in defaults are used (CKAN source).
#[derive(Parser)]
#[command(
    name = "lpba",
    about = "Natural-language search over Buenos Aires provincial legislation",
    version
)]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, global = true, default_value = "./config/lpba.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a request into a query intent without loading data.
    Parse { text: String },

    /// Search the corpus.
    Search {
        text: String,

        /// Number of results (overrides any limit in the text). Values
        /// below the configured default are raised to it.
        #[arg(long)]
        limit: Option<i64>,

        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Search, then compare results `a` and `b` (1-based).
    Compare {
        text: String,
        a: usize,
        b: usize,

        #[arg(long)]
        json: bool,
    },

    /// Answer a request: search, or compare the top two results.
    Ask {
        text: String,

        #[arg(long)]
        json: bool,
    },

    /// Acquire the corpus and report its size and resolved fields.
    Fetch {
        #[arg(long)]
        json: bool,
    },

    /// List source columns and the canonical field each one serves.
    Columns,

    /// Start the JSON HTTP API.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    // Commands that don't require config
    if let Commands::Parse { text } = &cli.command {
        return search::run_parse(text);
    }

    let cfg = if cli.config.exists() {
        config::load_config(&cli.config)?
    } else {
        tracing::info!(path = %cli.config.display(), "config file not found, using defaults");
        config::Config::minimal()
    };

    let provider = provider::create_provider(&cfg)?;
    let session = Arc::new(session::Session::new(
        Arc::from(provider),
        cfg.search_params(),
    ));

    match cli.command {
        Commands::Parse { .. } => unreachable!("handled above"),
        Commands::Search { text, limit, json } => {
            search::run_search(&session, &text, limit, json).await?;
        }
        Commands::Compare { text, a, b, json } => {
            search::run_compare(&session, &text, a, b, json).await?;
        }
        Commands::Ask { text, json } => {
            search::run_ask(&session, &text, json).await?;
        }
        Commands::Fetch { json } => {
            sources::run_fetch(&session, json).await?;
        }
        Commands::Columns => {
            sources::run_columns(&session).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg, session).await?;
        }
    }

    Ok(())
}
