//! # kproof CLI
//!
//! ## Usage
//!
//! ```bash
//! kproof --config ./config/kproof.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `kproof check <file>` | Review a document and export flagged sentences |
//! | `kproof sentence "<text>"` | Run one sentence through the checkers |
//! | `kproof checkers` | List checkers and their status |
//!
//! Logging goes to stderr and is controlled with `RUST_LOG`
//! (default `kproof=info`).

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use kproof::config::{self, Config};
use kproof::inspect;
use kproof::review::{self, ReviewRequest};

const DEFAULT_CONFIG: &str = "./config/kproof.toml";

/// Korean text-quality review: spelling, spacing and style checks over
/// documents.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/kproof.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "kproof",
    about = "Korean text-quality review for PDF, DOCX, PPTX and text documents",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/kproof.toml`; built-in defaults are used when
    /// that file does not exist.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Review a document.
    ///
    /// Extracts page text, splits it into sentences, runs every active
    /// checker and writes the flagged sentences as a JSON report.
    Check {
        /// Document to review (.pdf, .docx, .pptx, .txt).
        file: PathBuf,

        /// Comma-separated checkers to run, replacing the config's
        /// enabled set (hanspell, spacing, rule, languagetool).
        #[arg(long, value_delimiter = ',')]
        checkers: Option<Vec<String>>,

        /// Write the report here instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,

        /// Concurrent sentence workers (overrides `review.workers`).
        #[arg(long)]
        workers: Option<usize>,
    },

    /// Check a single sentence and print each checker's verdict.
    Sentence {
        text: String,

        #[arg(long, value_delimiter = ',')]
        checkers: Option<Vec<String>>,
    },

    /// List the built-in checkers and whether they are usable.
    Checkers,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("kproof=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load(path: &Path) -> Result<Config> {
    if path == Path::new(DEFAULT_CONFIG) && !path.exists() {
        tracing::debug!("no config at {}, using built-in defaults", path.display());
        let config = Config::minimal();
        config::validate(&config)?;
        return Ok(config);
    }
    config::load_config(path)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let cfg = load(&cli.config)?;

    match cli.command {
        Commands::Check {
            file,
            checkers,
            out,
            workers,
        } => {
            let request = ReviewRequest { checkers, workers };
            review::run_review(&cfg, &file, &request, out.as_deref()).await?;
        }
        Commands::Sentence { text, checkers } => {
            inspect::run_sentence(&cfg, &text, checkers.as_deref()).await?;
        }
        Commands::Checkers => {
            inspect::list_checkers(&cfg)?;
        }
    }

    Ok(())
}
