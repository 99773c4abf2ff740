//! Path discovery with glob and visibility filtering.
//!
//! The walker is restartable: every call to [`PathWalker::walk`]
//! re-enumerates the tree from scratch, so the same walker can count
//! paths first and yield them afterwards.

use glob::Pattern;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

use crate::core::config::WalkConfig;
use crate::core::error::{DocsplitError, Result};

/// An entry that could not be read during traversal
#[derive(Debug, Clone, Error)]
#[error("{location}: {message}")]
pub struct WalkError {
    /// Offending path, when walkdir knows it
    pub path: Option<PathBuf>,
    location: String,
    message: String,
}

impl WalkError {
    fn new(path: Option<&Path>, fallback: &Path, message: impl Into<String>) -> Self {
        Self {
            path: path.map(Path::to_path_buf),
            location: path.unwrap_or(fallback).display().to_string(),
            message: message.into(),
        }
    }
}

impl From<WalkError> for DocsplitError {
    fn from(err: WalkError) -> Self {
        DocsplitError::Walk(err.to_string())
    }
}

/// File system walker with pattern-based filtering
#[derive(Debug, Clone)]
pub struct PathWalker {
    /// Patterns to include (e.g., "*.rs", "**/*.md")
    include_patterns: Vec<Pattern>,

    /// Patterns to exclude (e.g., "**/target/**")
    exclude_patterns: Vec<Pattern>,

    /// Lowercase extensions with leading dot; empty accepts all
    suffixes: Vec<String>,

    load_hidden: bool,

    /// Maximum file size in bytes (skip larger files)
    max_file_size_bytes: u64,
}

fn compile_patterns(patterns: &[String], kind: &str) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p)
                .map_err(|e| DocsplitError::ConfigError(format!("Invalid {kind} pattern '{p}': {e}")))
        })
        .collect()
}

fn normalize_suffix(suffix: &str) -> String {
    let suffix = suffix.trim().to_lowercase();
    if suffix.starts_with('.') {
        suffix
    } else {
        format!(".{suffix}")
    }
}

/// Root-relative path with `/` separators, empty for the root itself
fn relative_str(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// True when no component below `root` starts with '.'
pub fn path_is_visible(root: &Path, path: &Path) -> bool {
    let relative = path.strip_prefix(root).unwrap_or(path);
    !relative.components().any(|c| match c {
        Component::Normal(part) => part.to_string_lossy().starts_with('.'),
        _ => false,
    })
}

impl PathWalker {
    /// Create a new path walker
    ///
    /// # Arguments
    ///
    /// * `include_patterns` - Glob patterns for files to include
    /// * `exclude_patterns` - Glob patterns for files and directories to exclude
    /// * `suffixes` - Extension allow-list (empty accepts every extension)
    /// * `load_hidden` - Descend into hidden directories and yield hidden files
    /// * `max_file_size_mb` - Maximum file size in megabytes
    ///
    /// # Returns
    ///
    /// A new `PathWalker` or a `ConfigError` if a pattern is invalid
    pub fn new(
        include_patterns: Vec<String>,
        exclude_patterns: Vec<String>,
        suffixes: Vec<String>,
        load_hidden: bool,
        max_file_size_mb: usize,
    ) -> Result<Self> {
        Ok(Self {
            include_patterns: compile_patterns(&include_patterns, "include")?,
            exclude_patterns: compile_patterns(&exclude_patterns, "exclude")?,
            suffixes: suffixes.iter().map(|s| normalize_suffix(s)).collect(),
            load_hidden,
            max_file_size_bytes: (max_file_size_mb as u64) * 1024 * 1024,
        })
    }

    pub fn from_config(config: &WalkConfig) -> Result<Self> {
        Self::new(
            config.include_patterns.clone(),
            config.exclude_patterns.clone(),
            config.suffixes.clone(),
            config.load_hidden,
            config.max_file_size_mb,
        )
    }

    /// Enumerate matching paths under `root`
    ///
    /// Lazy; traversal problems (permission denied, vanished entries)
    /// come through as `Err(WalkError)` items and do not end the
    /// iteration.
    pub fn walk<'a>(
        &'a self,
        root: &'a Path,
    ) -> impl Iterator<Item = std::result::Result<PathBuf, WalkError>> + 'a {
        WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(move |e| self.should_descend(e, root))
            .filter_map(move |entry| match entry {
                Ok(entry) => self.accept(entry, root).transpose(),
                Err(e) => Some(Err(WalkError::new(e.path(), root, e.to_string()))),
            })
    }

    /// Matching paths with walk errors logged and dropped
    pub fn yield_paths<'a>(&'a self, root: &'a Path) -> impl Iterator<Item = PathBuf> + 'a {
        self.walk(root).filter_map(|item| match item {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!("{}", e);
                None
            }
        })
    }

    /// Number of paths [`yield_paths`](Self::yield_paths) would produce
    pub fn count_matching_paths(&self, root: &Path) -> usize {
        self.walk(root).filter(|item| item.is_ok()).count()
    }

    /// Prune hidden and excluded directories before descending
    fn should_descend(&self, entry: &DirEntry, root: &Path) -> bool {
        // Never filter the root itself
        if entry.depth() == 0 {
            return true;
        }

        let path = entry.path();

        if !self.load_hidden && !path_is_visible(root, path) {
            return false;
        }

        if entry.file_type().is_dir() {
            let rel = relative_str(root, path);
            let rel_dir = format!("{rel}/");
            for pattern in &self.exclude_patterns {
                if pattern.matches(&rel) || pattern.matches(&rel_dir) {
                    tracing::debug!("Skipping excluded directory: {:?}", path);
                    return false;
                }
            }
        }

        true
    }

    /// Decide whether a non-pruned entry is yielded
    fn accept(
        &self,
        entry: DirEntry,
        root: &Path,
    ) -> std::result::Result<Option<PathBuf>, WalkError> {
        if !entry.file_type().is_file() {
            return Ok(None);
        }

        let path = entry.path();

        if !self.matches_patterns(root, path) || !self.matches_suffix(path) {
            return Ok(None);
        }

        let metadata = entry
            .metadata()
            .map_err(|e| WalkError::new(Some(path), root, e.to_string()))?;
        if metadata.len() > self.max_file_size_bytes {
            tracing::debug!(
                "Skipping large file: {:?} ({} bytes)",
                path,
                metadata.len()
            );
            return Ok(None);
        }

        Ok(Some(entry.into_path()))
    }

    fn matches_patterns(&self, root: &Path, path: &Path) -> bool {
        let rel = relative_str(root, path);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        // A single-file root has an empty relative path
        let rel = if rel.is_empty() { name.clone() } else { rel };

        let matches_include = self.include_patterns.is_empty()
            || self
                .include_patterns
                .iter()
                .any(|p| p.matches(&rel) || p.matches(&name));

        if !matches_include {
            return false;
        }

        !self
            .exclude_patterns
            .iter()
            .any(|p| p.matches(&rel))
    }

    fn matches_suffix(&self, path: &Path) -> bool {
        if self.suffixes.is_empty() {
            return true;
        }
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => self.suffixes.contains(&format!(".{}", ext.to_lowercase())),
            None => false,
        }
    }
}
