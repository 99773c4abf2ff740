//! Docsplit CLI - walk, classify and chunk documents
//!
//! # Examples
//!
//! ```bash
//! # Chunk a directory and write the chunks as JSON lines
//! docsplit ingest ./docs --emit-chunks chunks.jsonl
//!
//! # See how files would be classified
//! docsplit detect ./src
//!
//! # Show configuration
//! docsplit show-config
//! ```

use clap::Parser;
use docsplit::cli::output::print_error;
use docsplit::cli::{run, Cli};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the tracing subscriber on stderr
///
/// `DOCSPLIT_LOG` takes precedence over `RUST_LOG`.
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_env("DOCSPLIT_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| "docsplit=info".into());

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

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    if let Err(e) = run(cli) {
        print_error(&e.to_string());
        std::process::exit(1);
    }
}
