//! Core data types for the docsplit pipeline.
//!
//! This module defines the records that flow through one ingestion
//! run: sources, classification results, parsed documents, chunks,
//! skip records and the final output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Component, Path, PathBuf};

use crate::core::error::DocsplitError;

/// Identifier of one input file for the duration of a run
///
/// Holds the path relative to the ingestion root with `/`
/// separators. A single-file root uses the file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Source(String);

impl Source {
    pub fn new(source: impl Into<String>) -> Self {
        Self(source.into())
    }

    /// Build the source identifier of `path` under `root`
    pub fn from_path(root: &Path, path: &Path) -> Self {
        let relative = path.strip_prefix(root).unwrap_or(path);

        let parts: Vec<String> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();

        if parts.is_empty() {
            // Root is the file itself
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            return Self(name);
        }

        Self(parts.join("/"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Source {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Source {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Source {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Raw result of type sniffing for one path
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileType {
    /// MIME type (e.g. "text/x-python")
    pub mime: Option<String>,

    /// Lowercase extension with leading dot (e.g. ".py")
    pub ext: Option<String>,

    /// Declared or evident encoding of the content prefix
    pub encoding: Option<String>,
}

impl FileType {
    /// Both extension and MIME are unknown
    pub fn is_unresolved(&self) -> bool {
        self.ext.is_none() && self.mime.is_none()
    }
}

/// Splitting strategy attached to a classified file
///
/// Describes which splitter family handles the file's language. The
/// splitter instance itself lives in the run's splitter cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitterKind {
    /// Recursive separator-based splitting (source code, structured text)
    Recursive,
    /// Unicode-aware prose splitting (plain text, PDF pages)
    Prose,
    /// Markdown-aware splitting
    Markdown,
}

impl SplitterKind {
    pub fn for_lang(lang: &str) -> Self {
        match lang {
            "text" | "pdf" => SplitterKind::Prose,
            "markdown" => SplitterKind::Markdown,
            _ => SplitterKind::Recursive,
        }
    }
}

/// Classification of one source
///
/// Computed once per source and carried with every document parsed
/// from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub ext: Option<String>,
    pub mime: Option<String>,
    pub encoding: Option<String>,

    /// Language tag, spoken or programming (e.g. "python", "text")
    pub lang: String,

    pub splitter: SplitterKind,
}

impl FileInfo {
    pub fn new(file_type: FileType, lang: impl Into<String>) -> Self {
        let lang = lang.into();
        Self {
            ext: file_type.ext,
            mime: file_type.mime,
            encoding: file_type.encoding,
            splitter: SplitterKind::for_lang(&lang),
            lang,
        }
    }
}

/// Mapping from source to its classification
pub type MetadataIndex = HashMap<Source, FileInfo>;

/// What part of a file a document holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    /// Whole file as prose or unsegmented code
    Text,
    /// One top-level function or class
    FunctionsClasses,
    /// Top-level code with definitions replaced by placeholders
    SimplifiedCode,
    /// One page of a paginated document
    Page,
}

/// Metadata shared by a document and all chunks split from it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub source: Source,
    pub language: String,

    /// Encoding actually used to decode the content
    pub encoding: Option<String>,

    pub content_type: ContentType,

    /// Parser-specific fields (page numbers, segment names, ...)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, serde_json::Value>,
}

/// Normalized text produced by parsing one blob
#[derive(Debug, Clone)]
pub struct Document {
    pub content: String,
    pub metadata: DocumentMetadata,

    /// Classification of the source this document came from
    pub file_info: FileInfo,
}

impl Document {
    pub fn new(
        content: String,
        source: Source,
        file_info: &FileInfo,
        encoding: Option<String>,
        content_type: ContentType,
    ) -> Self {
        Self {
            content,
            metadata: DocumentMetadata {
                source,
                language: file_info.lang.clone(),
                encoding,
                content_type,
                fields: BTreeMap::new(),
            },
            file_info: file_info.clone(),
        }
    }

    /// Attach a parser-specific metadata field
    pub fn with_field(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn source(&self) -> &Source {
        &self.metadata.source
    }
}

/// A bounded-size slice of a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// The actual text content
    pub text: String,

    /// Copy of the parent document's metadata
    pub metadata: DocumentMetadata,

    /// Sequential chunk number within the document
    pub chunk_index: usize,

    /// Byte offset where the chunk starts in the document content
    pub start_offset: usize,

    /// Byte offset where the chunk ends in the document content
    pub end_offset: usize,
}

/// Why a file was left out of the output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Walk,
    Unsupported,
    Classification,
    Encoding,
    Timeout,
    Parse,
    Split,
    BatchFailed,
    /// Parsed, but the run was cancelled before it was split
    Cancelled,
}

impl SkipReason {
    pub fn from_error(err: &DocsplitError) -> Self {
        match err {
            DocsplitError::Walk(_) => SkipReason::Walk,
            DocsplitError::Classification(_) => SkipReason::Classification,
            DocsplitError::Encoding(_) => SkipReason::Encoding,
            DocsplitError::Timeout(_) => SkipReason::Timeout,
            DocsplitError::Split(_) => SkipReason::Split,
            DocsplitError::BatchFailed(_) => SkipReason::BatchFailed,
            _ => SkipReason::Parse,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::Walk => "walk",
            SkipReason::Unsupported => "unsupported",
            SkipReason::Classification => "classification",
            SkipReason::Encoding => "encoding",
            SkipReason::Timeout => "timeout",
            SkipReason::Parse => "parse",
            SkipReason::Split => "split",
            SkipReason::BatchFailed => "batch_failed",
            SkipReason::Cancelled => "cancelled",
        }
    }
}

/// A file that produced no (or incomplete) output, and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub source: Source,
    pub reason: SkipReason,
    pub message: String,
}

impl SkippedFile {
    pub fn new(source: Source, reason: SkipReason, message: impl Into<String>) -> Self {
        Self {
            source,
            reason,
            message: message.into(),
        }
    }

    pub fn from_error(source: Source, err: &DocsplitError) -> Self {
        Self::new(source, SkipReason::from_error(err), err.message())
    }
}

/// Statistics from an ingestion run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestStats {
    /// Paths matched by the walker
    pub files_matched: usize,

    /// Files that produced at least one document
    pub files_parsed: usize,

    /// Files recorded in the skip list
    pub files_skipped: usize,

    pub documents: usize,
    pub chunks_created: usize,
    pub batches: usize,
    pub batches_failed: usize,

    /// Sources per detected language
    pub languages: BTreeMap<String, usize>,

    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,

    /// Run stopped early on a cancellation request
    pub cancelled: bool,
}

impl IngestStats {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            files_matched: 0,
            files_parsed: 0,
            files_skipped: 0,
            documents: 0,
            chunks_created: 0,
            batches: 0,
            batches_failed: 0,
            languages: BTreeMap::new(),
            started_at,
            duration_ms: 0,
            cancelled: false,
        }
    }
}

/// Everything one ingestion run hands back to its caller
#[derive(Debug, Clone)]
pub struct IngestOutput {
    /// Canonical root the sources are relative to
    pub root: PathBuf,
    pub chunks: Vec<Chunk>,
    pub metadata_index: MetadataIndex,
    pub skipped: Vec<SkippedFile>,
    pub stats: IngestStats,
}

impl IngestOutput {
    /// Split into the `(chunks, metadata_index)` pair consumed by
    /// storage backends
    pub fn into_parts(self) -> (Vec<Chunk>, MetadataIndex) {
        (self.chunks, self.metadata_index)
    }

    pub fn is_skipped(&self, source: &str) -> bool {
        self.skipped.iter().any(|s| s.source.as_str() == source)
    }
}

/// Group sources by language
pub fn sources_by_lang(index: &MetadataIndex) -> BTreeMap<String, Vec<Source>> {
    let mut by_lang: BTreeMap<String, Vec<Source>> = BTreeMap::new();
    for (source, info) in index {
        by_lang
            .entry(info.lang.clone())
            .or_default()
            .push(source.clone());
    }
    for sources in by_lang.values_mut() {
        sources.sort();
    }
    by_lang
}

/// Count sources per language
pub fn count_by_lang(index: &MetadataIndex) -> BTreeMap<String, usize> {
    sources_by_lang(index)
        .into_iter()
        .map(|(lang, sources)| (lang, sources.len()))
        .collect()
}
