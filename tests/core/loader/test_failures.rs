// Failure isolation: one bad input never costs the others

use crate::common::{assert_valid_output, test_config, TestRepo};
use docsplit::core::error::{DocsplitError, Result};
use docsplit::core::loader::executor::split_batch;
use docsplit::core::loader::{CancelToken, ParallelBatchExecutor, Splitter, SplitterCache};
use docsplit::core::loader::progress::NoopProgress;
use docsplit::core::loader::{IngestPipeline, ProgressSink};
use docsplit::{ingest, ContentType, Document, FileInfo, FileType, SkipReason, Source};
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Rejects any text mentioning "poison"
#[derive(Debug)]
struct Picky;

impl Splitter for Picky {
    fn lang(&self) -> &str {
        "picky"
    }

    fn split_text(&self, text: &str) -> Result<Vec<Range<usize>>> {
        if text.contains("poison") {
            return Err(DocsplitError::Split("refusing poisoned text".to_string()));
        }
        Ok(vec![0..text.len()])
    }
}

fn picky_cache() -> Arc<SplitterCache> {
    let cache = Arc::new(SplitterCache::new(1000, 0).unwrap());
    cache.get_or_insert_with("picky", || Arc::new(Picky));
    cache
}

/// Ten documents; the fifth is poisoned
fn ten_documents() -> Vec<Document> {
    let info = FileInfo::new(
        FileType {
            mime: Some("text/plain".to_string()),
            ext: Some(".txt".to_string()),
            encoding: Some("utf-8".to_string()),
        },
        "picky",
    );

    (1..=10)
        .map(|i| {
            let content = if i == 5 {
                "poison".to_string()
            } else {
                format!("document {i}")
            };
            Document::new(
                content,
                Source::from(format!("doc_{i}.txt")),
                &info,
                Some("UTF-8".to_string()),
                ContentType::Text,
            )
        })
        .collect()
}

#[test]
fn test_split_batch_keeps_the_other_nine() {
    let output = split_batch(ten_documents(), &picky_cache());

    assert_eq!(output.documents, 10);
    assert_eq!(output.chunks.len(), 9);
    assert_eq!(output.file_infos.len(), 9);
    assert_eq!(output.failures.len(), 1);
    assert_eq!(output.failures[0].source.as_str(), "doc_5.txt");
    assert_eq!(output.failures[0].reason, SkipReason::Split);
}

#[test]
fn test_executor_keeps_the_other_nine() {
    let executor = ParallelBatchExecutor::new(3, 3).unwrap();

    let output = executor.run(
        ten_documents(),
        &picky_cache(),
        &NoopProgress,
        &CancelToken::new(),
    );

    assert_eq!(output.documents, 10);
    assert_eq!(output.chunks.len(), 9);
    assert_eq!(output.metadata_index.len(), 9);
    assert!(!output.metadata_index.contains_key("doc_5.txt"));
    assert_eq!(output.skipped.len(), 1);
    assert_eq!(output.batches, 4);
    assert_eq!(output.batches_failed, 0);
}

#[test]
fn test_undecodable_file_among_ten() {
    let mut files: Vec<(String, Vec<u8>)> = (1..=10)
        .map(|i| (format!("file_{i:02}.txt"), format!("file number {i}").into_bytes()))
        .collect();
    // Invalid UTF-8 that detection is not allowed to rescue
    files[4].1 = vec![b'o', b'k', 0xE9, 0xFF, 0xFE, b'!'];

    let specs: Vec<(&str, &[u8])> = files
        .iter()
        .map(|(name, bytes)| (name.as_str(), bytes.as_slice()))
        .collect();
    let repo = TestRepo::with_bytes(&specs);

    let mut config = test_config();
    config.parsing.detect_encoding = false;
    let output = ingest(repo.path(), &config).unwrap();
    assert_valid_output(&output);

    assert_eq!(output.stats.files_matched, 10);
    assert_eq!(output.metadata_index.len(), 9);
    assert_eq!(output.chunks.len(), 9);
    assert_eq!(output.skipped.len(), 1);
    assert_eq!(output.skipped[0].source.as_str(), "file_05.txt");
    assert_eq!(output.stats.files_skipped, 1);
}

#[test]
fn test_invalid_root_is_an_error() {
    let err = ingest("/no/such/ingest/root", &test_config()).unwrap_err();
    assert!(matches!(err, DocsplitError::InvalidPath(_)));
    assert!(!err.is_recoverable());
}

#[test]
fn test_cancel_before_splitting() {
    let cancel = CancelToken::new();
    cancel.cancel();

    let executor = ParallelBatchExecutor::new(2, 2).unwrap();
    let output = executor.run(ten_documents(), &picky_cache(), &NoopProgress, &cancel);

    assert!(output.cancelled);
    assert!(output.chunks.is_empty());
    assert_eq!(output.batches, 0);
    assert_eq!(output.skipped.len(), 10);
    assert!(output
        .skipped
        .iter()
        .all(|s| s.reason == SkipReason::Cancelled));
}

/// Cancels the run once the first batch has been split
struct CancelAfterFirstBatch {
    cancel: CancelToken,
    phases: AtomicUsize,
}

impl ProgressSink for CancelAfterFirstBatch {
    fn set_total(&self, _total: u64) {
        self.phases.fetch_add(1, Ordering::SeqCst);
    }

    fn advance(&self, _n: u64) {
        // Second phase is splitting
        if self.phases.load(Ordering::SeqCst) >= 2 {
            self.cancel.cancel();
        }
    }

    fn set_message(&self, _message: &str) {}
}

#[test]
fn test_cancel_after_first_batch() {
    let files: Vec<(String, String)> = (1..=6)
        .map(|i| (format!("file_{i}.txt"), format!("file number {i}")))
        .collect();
    let specs: Vec<(&str, &str)> = files
        .iter()
        .map(|(name, text)| (name.as_str(), text.as_str()))
        .collect();
    let repo = TestRepo::with_files(&specs);

    let mut config = test_config();
    config.workers.max_workers = 1;
    config.workers.batch_size = 1;

    let cancel = CancelToken::new();
    let progress = Arc::new(CancelAfterFirstBatch {
        cancel: cancel.clone(),
        phases: AtomicUsize::new(0),
    });
    let output = IngestPipeline::new(&config)
        .unwrap()
        .with_progress(progress)
        .with_cancel(cancel)
        .run(repo.path())
        .unwrap();

    assert!(output.stats.cancelled);
    assert_eq!(output.stats.documents, 6);

    // The batch already running finished and kept its output
    assert_eq!(output.stats.batches, 1);
    assert_eq!(output.chunks.len(), 1);
    assert_eq!(output.metadata_index.len(), 1);

    // Everything else was parsed but never split
    assert_eq!(output.skipped.len(), 5);
    for skip in &output.skipped {
        assert_eq!(skip.reason, SkipReason::Cancelled);
        assert!(!output.metadata_index.contains_key(&skip.source));
    }
    assert_eq!(output.stats.files_skipped, 5);
}

#[cfg(unix)]
#[test]
fn test_unreadable_directory_is_skipped() {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    let repo = TestRepo::with_files(&[("ok.txt", "readable text"), ("locked/notes.txt", "secret")]);
    let locked = repo.path().join("locked");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Permission bits do not bind a privileged user
    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let output = ingest(repo.path(), &test_config());
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
    let output = output.unwrap();
    assert_valid_output(&output);

    assert!(output
        .skipped
        .iter()
        .any(|s| s.reason == SkipReason::Walk && s.source.as_str().starts_with("locked")));
    assert!(output.metadata_index.contains_key("ok.txt"));
    assert_eq!(output.chunks.len(), 1);
}
