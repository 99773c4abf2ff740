//! Ingestion pipeline orchestration.
//!
//! Coordinates one run end to end:
//! 1. Count matching paths (sizes the progress bar)
//! 2. Classify and parse each path into documents
//! 3. Split the documents in parallel batches
//! 4. Return chunks, the metadata index and the skip list

use chrono::Utc;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::core::config::Config;
use crate::core::error::{DocsplitError, Result};
use crate::core::loader::blob::{Blob, DecodeOptions};
use crate::core::loader::cache::SplitterCache;
use crate::core::loader::executor::{CancelToken, ParallelBatchExecutor};
use crate::core::loader::parser::{BlobParser, ParserRegistry};
use crate::core::loader::progress::{NoopProgress, ProgressSink};
use crate::core::loader::sniffer::TypeSniffer;
use crate::core::loader::walker::PathWalker;
use crate::core::types::{
    count_by_lang, Document, FileInfo, IngestOutput, IngestStats, SkipReason, SkippedFile, Source,
};

/// Run one ingestion of `root` with `config`
///
/// Convenience wrapper around [`IngestPipeline`] without progress
/// reporting or cancellation.
pub fn ingest(root: impl AsRef<Path>, config: &Config) -> Result<IngestOutput> {
    IngestPipeline::new(config)?.run(root.as_ref())
}

/// [`ingest`] reporting to `progress`
pub fn ingest_with_progress(
    root: impl AsRef<Path>,
    config: &Config,
    progress: Arc<dyn ProgressSink>,
) -> Result<IngestOutput> {
    IngestPipeline::new(config)?
        .with_progress(progress)
        .run(root.as_ref())
}

/// Orchestrates walking, classification, parsing and splitting
pub struct IngestPipeline {
    config: Config,
    walker: PathWalker,
    sniffer: TypeSniffer,
    registry: ParserRegistry,
    decode: DecodeOptions,
    executor: ParallelBatchExecutor,
    progress: Arc<dyn ProgressSink>,
    cancel: CancelToken,
}

impl IngestPipeline {
    /// Create a pipeline from a validated configuration
    ///
    /// # Errors
    ///
    /// `ConfigError` for invalid settings (zero workers, overlap not
    /// below chunk size, bad glob patterns)
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            walker: PathWalker::from_config(&config.walk)?,
            sniffer: TypeSniffer::new(config.parsing.probe_bytes),
            registry: ParserRegistry::new(config.parsing.segment_threshold),
            decode: DecodeOptions::from_config(&config.parsing),
            executor: ParallelBatchExecutor::new(
                config.workers.max_workers,
                config.workers.batch_size,
            )?,
            progress: Arc::new(NoopProgress),
            cancel: CancelToken::new(),
            config: config.clone(),
        })
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Replace the decoding options derived from `parsing`
    pub fn with_decode_options(mut self, decode: DecodeOptions) -> Self {
        self.decode = decode;
        self
    }

    /// Route files with extension `ext` to `parser`
    pub fn with_parser(mut self, ext: &str, parser: Arc<dyn BlobParser>) -> Self {
        self.registry.register(ext, parser);
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Ingest `root` (a directory or a single file)
    ///
    /// Per-file failures end up in `IngestOutput::skipped`; only an
    /// invalid root is returned as an error.
    pub fn run(&self, root: &Path) -> Result<IngestOutput> {
        let start = Instant::now();
        let mut stats = IngestStats::new(Utc::now());
        let root = resolve_root(root)?;
        let progress = self.progress.as_ref();

        tracing::info!("Starting ingestion from {:?}", root);

        // Step 1: Count
        progress.set_message("counting files");
        let total = self.walker.count_matching_paths(&root);
        progress.set_total(total as u64);
        tracing::info!("Found {} files to ingest", total);

        // Step 2: Classify and parse
        progress.set_message(&format!("parsing {total} files"));
        let mut skipped: Vec<SkippedFile> = Vec::new();
        let mut documents: Vec<Document> = Vec::new();

        for item in self.walker.walk(&root) {
            if self.cancel.is_cancelled() {
                tracing::info!("Cancelled during parsing");
                stats.cancelled = true;
                break;
            }

            let path = match item {
                Ok(path) => path,
                Err(e) => {
                    tracing::warn!("{}", e);
                    let path = e.path.as_deref().unwrap_or(root.as_path());
                    let source = Source::from_path(&root, path);
                    skipped.push(SkippedFile::from_error(source, &e.into()));
                    continue;
                }
            };

            stats.files_matched += 1;
            let source = Source::from_path(&root, &path);

            match self.load_file(&path, source) {
                Ok(docs) => {
                    tracing::debug!("Parsed {:?} ({} documents)", path, docs.len());
                    if !docs.is_empty() {
                        stats.files_parsed += 1;
                    }
                    documents.extend(docs);
                }
                Err(skip) => {
                    if skip.reason == SkipReason::Unsupported {
                        tracing::debug!("Skipping {}: {}", skip.source, skip.message);
                    } else {
                        tracing::warn!("Skipping {}: {}", skip.source, skip.message);
                    }
                    skipped.push(skip);
                }
            }

            progress.advance(1);
        }

        // Step 3: Split
        let doc_count = documents.len();
        progress.set_message(&format!("splitting {doc_count} documents"));
        progress.set_total(doc_count as u64);

        let cache = Arc::new(SplitterCache::from_config(&self.config.splitting)?);
        let execution = self.executor.run(documents, &cache, progress, &self.cancel);

        skipped.extend(execution.skipped);

        stats.documents = doc_count;
        stats.chunks_created = execution.chunks.len();
        stats.batches = execution.batches;
        stats.batches_failed = execution.batches_failed;
        stats.cancelled |= execution.cancelled;
        stats.languages = count_by_lang(&execution.metadata_index);
        stats.files_skipped = skipped
            .iter()
            .map(|s| &s.source)
            .collect::<BTreeSet<_>>()
            .len();
        stats.duration_ms = start.elapsed().as_millis() as u64;

        tracing::info!("Detected languages: {:?}", stats.languages);
        tracing::info!(
            "Ingestion complete: {} files parsed, {} skipped, {} documents, \
             {} chunks created in {}ms",
            stats.files_parsed,
            stats.files_skipped,
            stats.documents,
            stats.chunks_created,
            stats.duration_ms
        );

        Ok(IngestOutput {
            root,
            chunks: execution.chunks,
            metadata_index: execution.metadata_index,
            skipped,
            stats,
        })
    }

    /// Classify every matched path without parsing
    ///
    /// Only files whose MIME type starts with one of the configured
    /// `mime_prefixes` are returned (all classified files when the
    /// list is empty). Sorted by source.
    pub fn detect_files(&self, root: &Path) -> Result<Vec<(Source, FileInfo)>> {
        let root = resolve_root(root)?;
        let prefixes = &self.config.walk.mime_prefixes;

        let mut detected: Vec<(Source, FileInfo)> = self
            .walker
            .yield_paths(&root)
            .filter_map(|path| {
                let info = match self.sniffer.classify(&path, false) {
                    Ok(Some(info)) => info,
                    Ok(None) => return None,
                    Err(e) => {
                        tracing::debug!("Could not classify {:?}: {}", path, e);
                        return None;
                    }
                };

                let accepted = prefixes.is_empty()
                    || info
                        .mime
                        .as_deref()
                        .map(|mime| prefixes.iter().any(|p| mime.starts_with(p.as_str())))
                        .unwrap_or(false);

                accepted.then(|| (Source::from_path(&root, &path), info))
            })
            .collect();

        detected.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(detected)
    }

    /// Classify and parse one file
    fn load_file(
        &self,
        path: &Path,
        source: Source,
    ) -> std::result::Result<Vec<Document>, SkippedFile> {
        let info = match self.sniffer.classify(path, true) {
            Ok(Some(info)) => info,
            Ok(None) => {
                return Err(SkippedFile::new(
                    source,
                    SkipReason::Unsupported,
                    "no language for this content type",
                ))
            }
            Err(e) => return Err(SkippedFile::from_error(source, &e)),
        };

        let mut blob = Blob::from_path(path, source.clone()).with_options(self.decode.clone());
        if let Some(label) = info.encoding.as_deref() {
            blob = blob.with_encoding_label(label);
        }

        let parser = self.registry.get_parser(&info);
        tracing::debug!("Parsing {} with {} parser", source, parser.name());

        match parser.parse(blob, &info) {
            Ok(docs) => Ok(docs.collect()),
            Err(e) => Err(SkippedFile::from_error(source, &e)),
        }
    }
}

/// Canonical form of an existing root
fn resolve_root(root: &Path) -> Result<PathBuf> {
    if !root.exists() {
        return Err(DocsplitError::InvalidPath(format!(
            "{} does not exist",
            root.display()
        )));
    }
    root.canonicalize()
        .map_err(|e| DocsplitError::InvalidPath(format!("{}: {e}", root.display())))
}
