//! Per-run splitter cache keyed by language tag.

use dashmap::DashMap;
use std::sync::Arc;

use crate::core::config::SplittingConfig;
use crate::core::error::{DocsplitError, Result};
use crate::core::loader::splitter::{build_splitter, Splitter};

/// At most one splitter per language for the lifetime of the cache
///
/// Lookups from several worker threads are safe. When two threads
/// miss on the same language at once, the first insert wins and the
/// other thread receives the winner's instance.
#[derive(Debug)]
pub struct SplitterCache {
    chunk_size: usize,
    overlap: usize,
    splitters: DashMap<String, Arc<dyn Splitter>>,
}

impl SplitterCache {
    /// Create an empty cache for the given chunk size and overlap
    /// (both in characters)
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(DocsplitError::ConfigError(
                "Chunk size must be non-zero".to_string(),
            ));
        }
        if overlap >= chunk_size {
            return Err(DocsplitError::ConfigError(
                "Overlap must be less than chunk size".to_string(),
            ));
        }

        Ok(Self {
            chunk_size,
            overlap,
            splitters: DashMap::new(),
        })
    }

    pub fn from_config(config: &SplittingConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.overlap)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Cached splitter for `lang`, built on first request
    pub fn get_splitter(&self, lang: &str) -> Arc<dyn Splitter> {
        let (chunk_size, overlap) = (self.chunk_size, self.overlap);
        self.get_or_insert_with(lang, || build_splitter(lang, chunk_size, overlap))
    }

    /// Cached splitter for `lang`, or the one built by `build`
    ///
    /// `build` runs at most once per language.
    pub fn get_or_insert_with<F>(&self, lang: &str, build: F) -> Arc<dyn Splitter>
    where
        F: FnOnce() -> Arc<dyn Splitter>,
    {
        if let Some(existing) = self.splitters.get(lang) {
            return Arc::clone(existing.value());
        }

        let entry = self.splitters.entry(lang.to_string()).or_insert_with(|| {
            tracing::debug!("Building splitter for {}", lang);
            build()
        });
        Arc::clone(entry.value())
    }

    /// Languages with a cached splitter, sorted
    pub fn languages(&self) -> Vec<String> {
        let mut langs: Vec<String> = self.splitters.iter().map(|e| e.key().clone()).collect();
        langs.sort();
        langs
    }

    pub fn len(&self) -> usize {
        self.splitters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.splitters.is_empty()
    }
}
