//! Docsplit - document ingestion and adaptive chunking
//!
//! Walks a directory tree, classifies every file by extension and
//! content, decodes it with encoding detection, parses it into
//! documents and splits those into overlapping chunks with a
//! language-aware splitter.
//!
//! # Architecture
//!
//! - **core**: Domain logic
//!   - config, error, types, xdg
//!   - loader (walker, sniffer, parsers, splitters, executor)
//!
//! - **cli**: Command-line adapter (depends on core)
//!
//! # Example
//!
//! ```no_run
//! use docsplit::{ingest, Config};
//!
//! let output = ingest("./docs", &Config::default())?;
//! for chunk in &output.chunks {
//!     println!("{} #{}", chunk.metadata.source, chunk.chunk_index);
//! }
//! # Ok::<(), docsplit::DocsplitError>(())
//! ```

// Core domain logic
pub mod core;

// Command-line adapter
pub mod cli;

// Re-export commonly used types for convenience
pub use core::config::Config;
pub use core::error::{DocsplitError, Result};
pub use core::loader::{ingest, ingest_with_progress, CancelToken, IngestPipeline, ProgressSink};
pub use core::types::*;
