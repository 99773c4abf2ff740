//! Configuration management for the docsplit pipeline.
//!
//! This module handles loading configuration from TOML files and
//! environment variables, with sensible defaults for all settings.

use crate::core::error::{DocsplitError, Result};
use crate::core::xdg::XdgDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub walk: WalkConfig,
    #[serde(default)]
    pub parsing: ParsingConfig,
    #[serde(default)]
    pub splitting: SplittingConfig,
    #[serde(default)]
    pub workers: WorkerConfig,
}

/// Path discovery configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WalkConfig {
    /// File patterns to include (glob syntax)
    #[serde(default = "default_include_patterns")]
    pub include_patterns: Vec<String>,

    /// File patterns to exclude (glob syntax)
    #[serde(default = "default_exclude_patterns")]
    pub exclude_patterns: Vec<String>,

    /// Extension allow-list (e.g. ".rs"); empty accepts all
    #[serde(default)]
    pub suffixes: Vec<String>,

    /// Load files and directories whose name starts with '.'
    #[serde(default)]
    pub load_hidden: bool,

    /// Maximum file size in MB (skip larger files)
    #[serde(default = "default_max_file_size")]
    pub max_file_size_mb: usize,

    /// MIME prefixes accepted by file detection
    #[serde(default = "default_mime_prefixes")]
    pub mime_prefixes: Vec<String>,
}

/// Classification and parsing configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ParsingConfig {
    /// Fall back to ranked encoding detection when UTF-8 fails
    #[serde(default = "default_detect_encoding")]
    pub detect_encoding: bool,

    /// Budget for one encoding detection, in milliseconds
    #[serde(default = "default_encoding_timeout_ms")]
    pub encoding_timeout_ms: u64,

    /// Bytes read when sniffing content
    #[serde(default = "default_probe_bytes")]
    pub probe_bytes: usize,

    /// Minimum line count before source files are segmented into
    /// functions and classes
    #[serde(default = "default_segment_threshold")]
    pub segment_threshold: usize,
}

/// Chunking configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SplittingConfig {
    /// Characters per chunk (not bytes!)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Character overlap between consecutive chunks
    #[serde(default = "default_overlap")]
    pub overlap: usize,
}

/// Worker pool configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkerConfig {
    /// Chunking threads
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Documents per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

// Default value functions
fn default_include_patterns() -> Vec<String> {
    vec!["**/*".to_string()]
}

fn default_exclude_patterns() -> Vec<String> {
    vec![
        // Build artifacts and dependencies
        "**/node_modules/**".to_string(),
        "**/target/**".to_string(),
        "**/.git/**".to_string(),
        "**/__pycache__/**".to_string(),
        "**/dist/**".to_string(),
        "**/.venv/**".to_string(),
        // Images
        "**/*.jpg".to_string(),
        "**/*.jpeg".to_string(),
        "**/*.png".to_string(),
        "**/*.gif".to_string(),
        "**/*.ico".to_string(),
        "**/*.webp".to_string(),
        // Audio and video
        "**/*.mp3".to_string(),
        "**/*.wav".to_string(),
        "**/*.mp4".to_string(),
        "**/*.mov".to_string(),
        // Archives
        "**/*.zip".to_string(),
        "**/*.tar".to_string(),
        "**/*.gz".to_string(),
        "**/*.7z".to_string(),
        // Executables and binaries
        "**/*.exe".to_string(),
        "**/*.dll".to_string(),
        "**/*.so".to_string(),
        "**/*.dylib".to_string(),
        "**/*.o".to_string(),
        "**/*.pyc".to_string(),
    ]
}

fn default_max_file_size() -> usize {
    10
}

fn default_mime_prefixes() -> Vec<String> {
    vec!["text/".to_string(), "application/pdf".to_string()]
}

fn default_detect_encoding() -> bool {
    true
}

fn default_encoding_timeout_ms() -> u64 {
    5_000
}

fn default_probe_bytes() -> usize {
    8 * 1024
}

fn default_segment_threshold() -> usize {
    100
}

fn default_chunk_size() -> usize {
    4000
}

fn default_overlap() -> usize {
    200
}

/// One core fewer than the host has, leaving room for the
/// coordinating thread
pub fn default_max_workers() -> usize {
    num_cpus::get().saturating_sub(1).max(1)
}

fn default_batch_size() -> usize {
    100
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            include_patterns: default_include_patterns(),
            exclude_patterns: default_exclude_patterns(),
            suffixes: Vec::new(),
            load_hidden: false,
            max_file_size_mb: default_max_file_size(),
            mime_prefixes: default_mime_prefixes(),
        }
    }
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            detect_encoding: default_detect_encoding(),
            encoding_timeout_ms: default_encoding_timeout_ms(),
            probe_bytes: default_probe_bytes(),
            segment_threshold: default_segment_threshold(),
        }
    }
}

impl ParsingConfig {
    pub fn encoding_timeout(&self) -> Duration {
        Duration::from_millis(self.encoding_timeout_ms)
    }
}

impl Default for SplittingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            overlap: default_overlap(),
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            batch_size: default_batch_size(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| DocsplitError::ConfigError(format!("Failed to read config file: {e}")))?;

        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load config with priority: env vars > TOML > defaults
    pub fn load() -> Result<Self> {
        let xdg = XdgDirs::new();
        Self::load_with_xdg(&xdg)
    }

    /// Load config with explicit XDG directories
    ///
    /// Priority order:
    /// 1. DOCSPLIT_CONFIG env var
    /// 2. XDG config file (~/.config/docsplit/config.toml)
    /// 3. ./docsplit.toml
    /// 4. Defaults
    pub fn load_with_xdg(xdg: &XdgDirs) -> Result<Self> {
        let mut config = if let Ok(config_path) = env::var("DOCSPLIT_CONFIG") {
            Self::from_file(config_path)?
        } else {
            let xdg_config = xdg.config_file();
            if xdg_config.exists() {
                Self::from_file(xdg_config)?
            } else if Path::new("docsplit.toml").exists() {
                Self::from_file("docsplit.toml")?
            } else {
                Self::default()
            }
        };

        config.merge_env();
        config.validate()?;

        Ok(config)
    }

    /// Merge configuration with environment variables
    pub fn merge_env(&mut self) {
        // Walk configuration
        if let Ok(hidden) = env::var("DOCSPLIT_LOAD_HIDDEN") {
            if let Ok(h) = hidden.parse() {
                self.walk.load_hidden = h;
            }
        }
        if let Ok(max_size) = env::var("DOCSPLIT_MAX_FILE_SIZE_MB") {
            if let Ok(size) = max_size.parse() {
                self.walk.max_file_size_mb = size;
            }
        }

        // Parsing configuration
        if let Ok(detect) = env::var("DOCSPLIT_DETECT_ENCODING") {
            if let Ok(d) = detect.parse() {
                self.parsing.detect_encoding = d;
            }
        }
        if let Ok(timeout) = env::var("DOCSPLIT_ENCODING_TIMEOUT_MS") {
            if let Ok(t) = timeout.parse() {
                self.parsing.encoding_timeout_ms = t;
            }
        }

        // Splitting configuration
        if let Ok(chunk_size) = env::var("DOCSPLIT_CHUNK_SIZE") {
            if let Ok(size) = chunk_size.parse() {
                self.splitting.chunk_size = size;
            }
        }
        if let Ok(overlap) = env::var("DOCSPLIT_OVERLAP") {
            if let Ok(o) = overlap.parse() {
                self.splitting.overlap = o;
            }
        }

        // Worker configuration
        if let Ok(workers) = env::var("DOCSPLIT_MAX_WORKERS") {
            if let Ok(w) = workers.parse() {
                self.workers.max_workers = w;
            }
        }
        if let Ok(batch) = env::var("DOCSPLIT_BATCH_SIZE") {
            if let Ok(b) = batch.parse() {
                self.workers.batch_size = b;
            }
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.splitting.chunk_size == 0 {
            return Err(DocsplitError::ConfigError(
                "Chunk size must be non-zero".to_string(),
            ));
        }

        if self.splitting.overlap >= self.splitting.chunk_size {
            return Err(DocsplitError::ConfigError(
                "Overlap must be less than chunk size".to_string(),
            ));
        }

        if self.workers.max_workers == 0 {
            return Err(DocsplitError::ConfigError(
                "max_workers must be at least 1".to_string(),
            ));
        }

        if self.workers.batch_size == 0 {
            return Err(DocsplitError::ConfigError(
                "Batch size must be at least 1".to_string(),
            ));
        }

        if self.parsing.encoding_timeout_ms == 0 {
            return Err(DocsplitError::ConfigError(
                "Encoding timeout must be non-zero".to_string(),
            ));
        }

        if self.parsing.probe_bytes == 0 {
            return Err(DocsplitError::ConfigError(
                "Probe size must be non-zero".to_string(),
            ));
        }

        if self.walk.max_file_size_mb == 0 {
            return Err(DocsplitError::ConfigError(
                "Max file size must be non-zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Log configuration
    pub fn log_config(&self) {
        tracing::info!("Configuration loaded:");
        tracing::info!(
            "  Include patterns: {} patterns",
            self.walk.include_patterns.len()
        );
        tracing::info!(
            "  Exclude patterns: {} patterns",
            self.walk.exclude_patterns.len()
        );
        tracing::info!("  Load hidden: {}", self.walk.load_hidden);
        tracing::info!("  Max file size: {} MB", self.walk.max_file_size_mb);
        tracing::info!("  Detect encoding: {}", self.parsing.detect_encoding);
        tracing::info!(
            "  Encoding timeout: {}ms",
            self.parsing.encoding_timeout_ms
        );
        tracing::info!("  Chunk size: {} chars", self.splitting.chunk_size);
        tracing::info!("  Overlap: {} chars", self.splitting.overlap);
        tracing::info!("  Max workers: {}", self.workers.max_workers);
        tracing::info!("  Batch size: {}", self.workers.batch_size);
    }
}
