//! Core domain logic
//!
//! # Architecture
//!
//! - **config**: Configuration loading (TOML + environment)
//! - **error**: Error types and Result alias
//! - **types**: Domain data structures
//! - **xdg**: XDG directory handling
//! - **loader**: Walking, classification, parsing and splitting

pub mod config;
pub mod error;
pub mod loader;
pub mod types;
pub mod xdg;

// Re-export key types for convenience
pub use config::Config;
pub use error::{DocsplitError, Result};
pub use loader::{ingest, IngestPipeline};
