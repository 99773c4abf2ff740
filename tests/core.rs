//! Core module integration tests
//!
//! End-to-end behaviour of the loading pipeline:
//! - Walking: enumeration, pruning and counting
//! - Encoding: declared, detected and rejected encodings
//! - Failures: per-file and per-document isolation
//! - Scenarios: small directory trees through `ingest`

mod common;

// Core submodules - tests/core/ directory
mod core {
    pub mod loader;
}
