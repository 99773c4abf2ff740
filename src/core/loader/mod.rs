//! Document loading and chunking pipeline
//!
//! This module turns a directory tree into overlapping text chunks:
//! - Path discovery with glob filters and hidden-path pruning
//! - Content type and encoding detection
//! - Parser dispatch (source text, PDF pages)
//! - Language-aware splitting with a per-run splitter cache
//! - Parallel batch execution with progress and cancellation

pub mod blob;
pub mod cache;
pub mod encoding;
pub mod executor;
pub mod languages;
pub mod parser;
pub mod pipeline;
pub mod progress;
pub mod segment;
pub mod sniffer;
pub mod splitter;
pub mod walker;

pub use blob::{Blob, DecodeOptions};
pub use cache::SplitterCache;
pub use encoding::{EncodingProbe, FileEncoding, Ranker};
pub use executor::{CancelToken, ParallelBatchExecutor};
pub use parser::{BlobParser, ParserRegistry, SourceParser};
pub use pipeline::{ingest, ingest_with_progress, IngestPipeline};
pub use progress::{NoopProgress, ProgressSink, TracingProgress};
pub use sniffer::TypeSniffer;
pub use splitter::{build_splitter, Splitter};
pub use walker::{PathWalker, WalkError};
