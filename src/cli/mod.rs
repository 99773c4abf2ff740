//! CLI adapter for docsplit
//!
//! Thin command-line front end over `core::loader`. Commands parse
//! arguments, build a [`Config`](crate::core::config::Config), call
//! the pipeline and render the result.
//!
//! # Architecture
//!
//! ```text
//! +------------------+
//! |     core/        |
//! |  (domain logic)  |
//! +--------+---------+
//!          |
//!          v
//! +------------------+
//! |      cli/        |
//! | (clap adapter)   |
//! +------------------+
//! ```

pub mod commands;
pub mod output;
pub mod progress;

use clap::{Parser, Subcommand};

/// Docsplit - document ingestion and adaptive chunking
///
/// Walks a directory, classifies and decodes every file, and splits
/// the contents into overlapping chunks with language-aware splitters.
#[derive(Parser, Debug)]
#[command(name = "docsplit")]
#[command(version)]
#[command(about = "Document ingestion and adaptive chunking", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(long, global = true, default_value = "human")]
    pub format: OutputFormat,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output for scripting
    Json,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Walk, parse and split a directory (or a single file)
    Ingest(commands::IngestArgs),

    /// Classify files without parsing them
    Detect(commands::DetectArgs),

    /// Show current configuration
    #[command(name = "show-config")]
    ShowConfig(commands::ConfigArgs),

    /// Generate shell completion scripts
    ///
    /// Output completion script to stdout. To install:
    ///
    ///   bash:  docsplit completions bash > ~/.local/share/bash-completion/completions/docsplit
    ///   zsh:   docsplit completions zsh > ~/.zfunc/_docsplit
    ///   fish:  docsplit completions fish > ~/.config/fish/completions/docsplit.fish
    Completions(commands::CompletionsArgs),
}

/// Run the CLI with the provided arguments
pub fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    use crate::core::config::Config;

    // Completions don't need configuration
    if let Commands::Completions(args) = cli.command {
        return commands::completions::execute(args);
    }

    let config = Config::load()?;

    match cli.command {
        Commands::Ingest(args) => commands::ingest::execute(args, config, cli.format),
        Commands::Detect(args) => commands::detect::execute(args, config, cli.format),
        Commands::ShowConfig(args) => commands::config::execute(args, &config, cli.format),
        Commands::Completions(_) => unreachable!(), // Handled above
    }
}
