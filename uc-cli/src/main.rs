//! `uc`: command-line harness over the `uc-core` context compression
//! engine.
//!
//! # Usage
//!
//! ```bash
//! uc classify turn.txt
//! uc compress conversation.json --token-budget 2000 --out-dir ./out
//! uc expand out/compressed.json out/verbatim.json
//! uc search out/compressed.json out/verbatim.json "retry limit"
//! uc estimate-tokens conversation.json
//! ```

use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use uc_cli::commands::{self, CompressArgs};
use uc_cli::output;
use uc_cli::OutputFormat;

#[derive(Parser)]
#[command(name = "uc")]
#[command(about = "Conversation context compression engine", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human")]
    format: OutputFormatArg,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormatArg {
    Human,
    Json,
    Plain,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => OutputFormat::Human,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Plain => OutputFormat::Plain,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a content file into a preservation tier
    Classify {
        /// Path to the content file
        path: PathBuf,
    },

    /// Compress a JSON array of messages
    Compress {
        /// Path to a JSON array of messages
        path: PathBuf,

        /// Tail length (in messages) never compressed
        #[arg(long)]
        recency_window: Option<usize>,

        /// Binary-search recency_window to fit this many estimated tokens
        #[arg(long)]
        token_budget: Option<u32>,

        /// Lower bound for the token-budget search
        #[arg(long)]
        min_recency_window: Option<usize>,

        /// Disable exact deduplication
        #[arg(long)]
        no_dedup: bool,

        /// Enable fuzzy (near-duplicate) deduplication
        #[arg(long)]
        fuzzy_dedup: bool,

        /// Jaccard similarity threshold for fuzzy dedup
        #[arg(long)]
        fuzzy_threshold: Option<f64>,

        /// Directory to write compressed.json and verbatim.json into
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Restore original messages from a compressed/verbatim pair
    Expand {
        /// Path to the compressed messages JSON
        compressed: PathBuf,

        /// Path to the verbatim store JSON
        verbatim: PathBuf,

        /// Repeat expansion until no provenance remains
        #[arg(long)]
        recursive: bool,
    },

    /// Regex-search a verbatim store, linked back to its summaries
    Search {
        /// Path to the compressed messages JSON
        compressed: PathBuf,

        /// Path to the verbatim store JSON
        verbatim: PathBuf,

        /// Regex pattern
        pattern: String,
    },

    /// Estimate token counts for a JSON array of messages
    EstimateTokens {
        /// Path to a JSON array of messages
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let format = OutputFormat::from(cli.format);
    if let Err(e) = run(cli, format).await {
        output::error(format, format_args!("{e:#}"));
        process::exit(1);
    }
}

async fn run(cli: Cli, format: OutputFormat) -> Result<()> {
    init_logging(cli.verbose);

    match cli.command {
        Commands::Classify { path } => commands::classify_file(&path, format)?,

        Commands::Compress {
            path,
            recency_window,
            token_budget,
            min_recency_window,
            no_dedup,
            fuzzy_dedup,
            fuzzy_threshold,
            out_dir,
        } => {
            let args = CompressArgs {
                recency_window,
                token_budget,
                min_recency_window,
                dedup: !no_dedup,
                fuzzy_dedup,
                fuzzy_threshold,
                out_dir,
            };
            commands::compress_file(&path, args, format)?
        }

        Commands::Expand {
            compressed,
            verbatim,
            recursive,
        } => commands::expand_files(&compressed, &verbatim, recursive, format)?,

        Commands::Search {
            compressed,
            verbatim,
            pattern,
        } => commands::search_files(&compressed, &verbatim, &pattern, format)?,

        Commands::EstimateTokens { path } => commands::estimate_tokens_file(&path, format)?,
    }

    Ok(())
}

/// Initialize logging based on verbosity level.
fn init_logging(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("uc_core=debug,uc_cli=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("uc_core=info,uc_cli=info,warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}
