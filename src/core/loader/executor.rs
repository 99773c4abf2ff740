//! Parallel chunking of document batches.
//!
//! Documents are grouped into fixed-size batches and each batch is
//! split on a worker thread by [`split_batch`], a function of its
//! input batch and the shared splitter cache only. Results are
//! collected in completion order.

use crossbeam::channel::{self, Sender};
use std::any::Any;
use std::collections::hash_map::Entry;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::core::error::{DocsplitError, Result};
use crate::core::loader::cache::SplitterCache;
use crate::core::loader::progress::ProgressSink;
use crate::core::types::{Chunk, Document, MetadataIndex, SkipReason, SkippedFile, Source};

/// Cooperative cancellation flag shared with the caller
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; work already submitted still finishes
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Result of splitting one batch
#[derive(Debug, Default)]
pub struct BatchOutput {
    pub chunks: Vec<Chunk>,

    /// Classification of every source with at least one split document
    pub file_infos: MetadataIndex,

    /// Documents that failed to split
    pub failures: Vec<SkippedFile>,

    pub documents: usize,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Split every document of a batch
///
/// A failing document (error or panic) is recorded in `failures`;
/// the remaining documents are still split.
pub fn split_batch(documents: Vec<Document>, cache: &SplitterCache) -> BatchOutput {
    let mut output = BatchOutput {
        documents: documents.len(),
        ..BatchOutput::default()
    };

    for doc in documents {
        let splitter = cache.get_splitter(&doc.file_info.lang);
        let result = panic::catch_unwind(AssertUnwindSafe(|| splitter.split(&doc)));

        match result {
            Ok(Ok(chunks)) => {
                output
                    .file_infos
                    .entry(doc.metadata.source.clone())
                    .or_insert_with(|| doc.file_info.clone());
                output.chunks.extend(chunks);
            }
            Ok(Err(e)) => {
                tracing::warn!("Failed to split {}: {}", doc.source(), e);
                output
                    .failures
                    .push(SkippedFile::from_error(doc.source().clone(), &e));
            }
            Err(payload) => {
                let err = DocsplitError::Split(format!(
                    "{}: splitter panicked: {}",
                    doc.source(),
                    panic_message(payload.as_ref())
                ));
                tracing::warn!("{}", err);
                output
                    .failures
                    .push(SkippedFile::from_error(doc.source().clone(), &err));
            }
        }
    }

    output
}

/// Aggregated result of one executor run
#[derive(Debug, Default)]
pub struct ExecutionOutput {
    pub chunks: Vec<Chunk>,
    pub metadata_index: MetadataIndex,
    pub skipped: Vec<SkippedFile>,
    pub documents: usize,
    pub batches: usize,
    pub batches_failed: usize,

    /// Cancellation stopped submission before all documents were
    /// batched
    pub cancelled: bool,
}

impl ExecutionOutput {
    /// Record every source left in `remaining` as cancelled
    fn skip_unsubmitted(&mut self, remaining: impl Iterator<Item = Document>) {
        let mut sources: Vec<Source> = Vec::new();
        for doc in remaining {
            if !sources.contains(doc.source()) {
                sources.push(doc.source().clone());
            }
        }
        tracing::info!("{} sources left unsplit", sources.len());

        self.skipped.extend(sources.into_iter().map(|source| {
            SkippedFile::new(source, SkipReason::Cancelled, "run cancelled before splitting")
        }));
    }

    /// Drop chunks and classification of every source with a failed or
    /// unsubmitted batch, including documents split by other batches
    fn purge_incomplete(&mut self) {
        let incomplete = |reason: SkipReason| {
            matches!(reason, SkipReason::BatchFailed | SkipReason::Cancelled)
        };
        let dropped: HashSet<Source> = self
            .skipped
            .iter()
            .filter(|s| incomplete(s.reason))
            .map(|s| s.source.clone())
            .collect();
        if dropped.is_empty() {
            return;
        }

        self.chunks.retain(|c| !dropped.contains(&c.metadata.source));
        self.metadata_index.retain(|source, _| !dropped.contains(source));
        // One entry per dropped source, the first batch-level reason wins
        let mut seen = HashSet::new();
        self.skipped.retain(|s| {
            !dropped.contains(&s.source) || (incomplete(s.reason) && seen.insert(s.source.clone()))
        });
    }

    fn merge(&mut self, batch: BatchOutput) {
        self.chunks.extend(batch.chunks);
        self.skipped.extend(batch.failures);
        self.documents += batch.documents;

        for (source, info) in batch.file_infos {
            match self.metadata_index.entry(source) {
                Entry::Occupied(existing) => {
                    if existing.get() != &info {
                        tracing::warn!(
                            "Conflicting classification for {}, keeping the first",
                            existing.key()
                        );
                    }
                }
                Entry::Vacant(slot) => {
                    slot.insert(info);
                }
            }
        }
    }
}

type BatchFn = fn(Vec<Document>, &SplitterCache) -> BatchOutput;

struct BatchMessage {
    sources: Vec<Source>,
    size: usize,
    result: std::result::Result<BatchOutput, String>,
}

/// Splits documents on a fixed-size worker pool
pub struct ParallelBatchExecutor {
    pool: rayon::ThreadPool,
    max_workers: usize,
    batch_size: usize,
}

impl std::fmt::Debug for ParallelBatchExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParallelBatchExecutor")
            .field("max_workers", &self.max_workers)
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl ParallelBatchExecutor {
    /// Create an executor with `max_workers` threads
    ///
    /// # Errors
    ///
    /// `ConfigError` when `max_workers` or `batch_size` is zero, or the
    /// pool cannot be built
    pub fn new(max_workers: usize, batch_size: usize) -> Result<Self> {
        if max_workers == 0 {
            return Err(DocsplitError::ConfigError(
                "max_workers must be at least 1".to_string(),
            ));
        }
        if batch_size == 0 {
            return Err(DocsplitError::ConfigError(
                "Batch size must be at least 1".to_string(),
            ));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(max_workers)
            .thread_name(|i| format!("docsplit-worker-{i}"))
            .build()
            .map_err(|e| DocsplitError::ConfigError(format!("Failed to build worker pool: {e}")))?;

        Ok(Self {
            pool,
            max_workers,
            batch_size,
        })
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Split all `documents` and aggregate the results
    ///
    /// At most `max_workers` batches are in flight; cancellation is
    /// checked before each batch is submitted, and sources never
    /// submitted are reported as [`SkipReason::Cancelled`]. Progress
    /// advances by the batch size as each batch completes.
    pub fn run<I>(
        &self,
        documents: I,
        cache: &Arc<SplitterCache>,
        progress: &dyn ProgressSink,
        cancel: &CancelToken,
    ) -> ExecutionOutput
    where
        I: IntoIterator<Item = Document>,
    {
        self.run_with(documents, cache, progress, cancel, split_batch)
    }

    fn run_with<I>(
        &self,
        documents: I,
        cache: &Arc<SplitterCache>,
        progress: &dyn ProgressSink,
        cancel: &CancelToken,
        work: BatchFn,
    ) -> ExecutionOutput
    where
        I: IntoIterator<Item = Document>,
    {
        let (tx, rx) = channel::unbounded::<BatchMessage>();
        let mut output = ExecutionOutput::default();
        let mut documents = documents.into_iter().peekable();
        let mut submitted = 0usize;
        let mut in_flight = 0usize;

        loop {
            // At most one queued batch per worker
            while in_flight >= self.max_workers {
                if let Ok(message) = rx.recv() {
                    in_flight -= 1;
                    Self::collect(&mut output, message, progress);
                }
            }
            if documents.peek().is_none() {
                break;
            }
            if cancel.is_cancelled() {
                tracing::info!("Cancelled after submitting {} batches", submitted);
                output.cancelled = true;
                output.skip_unsubmitted(documents.by_ref());
                break;
            }

            let batch: Vec<Document> = documents.by_ref().take(self.batch_size).collect();
            self.submit(batch, cache, tx.clone(), work);
            submitted += 1;
            in_flight += 1;

            // Aggregate whatever already finished
            while let Ok(message) = rx.try_recv() {
                in_flight -= 1;
                Self::collect(&mut output, message, progress);
            }
        }

        drop(tx);
        for message in rx {
            Self::collect(&mut output, message, progress);
        }
        output.purge_incomplete();

        tracing::debug!(
            "Split {} documents into {} chunks ({} batches, {} failed)",
            output.documents,
            output.chunks.len(),
            output.batches,
            output.batches_failed
        );

        output
    }

    fn submit(
        &self,
        batch: Vec<Document>,
        cache: &Arc<SplitterCache>,
        tx: Sender<BatchMessage>,
        work: BatchFn,
    ) {
        let mut sources: Vec<Source> = Vec::new();
        for doc in &batch {
            if !sources.contains(doc.source()) {
                sources.push(doc.source().clone());
            }
        }
        let size = batch.len();
        let cache = Arc::clone(cache);

        self.pool.spawn(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(|| work(batch, &cache)))
                .map_err(|payload| panic_message(payload.as_ref()));
            // Receiver outlives every batch
            let _ = tx.send(BatchMessage {
                sources,
                size,
                result,
            });
        });
    }

    fn collect(output: &mut ExecutionOutput, message: BatchMessage, progress: &dyn ProgressSink) {
        output.batches += 1;

        match message.result {
            Ok(batch) => output.merge(batch),
            Err(reason) => {
                output.batches_failed += 1;
                output.documents += message.size;
                tracing::warn!(
                    "Batch of {} documents failed, dropping its results: {}",
                    message.size,
                    reason
                );
                for source in message.sources {
                    output.skipped.push(SkippedFile::new(
                        source,
                        SkipReason::BatchFailed,
                        format!("batch failed: {reason}"),
                    ));
                }
            }
        }

        progress.advance(message.size as u64);
    }
}
