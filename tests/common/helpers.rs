// Test helper functions

use docsplit::core::config::Config;
use docsplit::core::types::IngestOutput;
use docsplit::ingest;
use std::path::Path;

/// Default configuration with a small worker pool
#[allow(dead_code)]
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.workers.max_workers = 2;
    config.workers.batch_size = 4;
    config
}

/// Ingest `path` with [`test_config`]
#[allow(dead_code)]
pub fn ingest_repo(path: &Path) -> IngestOutput {
    ingest(path, &test_config()).expect("ingestion failed")
}

/// Assert the invariants every completed run satisfies
#[allow(dead_code)]
pub fn assert_valid_output(output: &IngestOutput) {
    assert!(!output.stats.cancelled, "run was cancelled");

    for chunk in &output.chunks {
        assert!(
            output.metadata_index.contains_key(&chunk.metadata.source),
            "chunk from {} has no metadata entry",
            chunk.metadata.source
        );
        assert!(
            chunk.start_offset <= chunk.end_offset,
            "inverted offsets in {}",
            chunk.metadata.source
        );
        assert!(!chunk.text.is_empty(), "empty chunk in {}", chunk.metadata.source);
    }

    for skip in &output.skipped {
        assert!(
            !output.metadata_index.contains_key(&skip.source),
            "{} is both indexed and skipped",
            skip.source
        );
    }

    assert_eq!(output.stats.chunks_created, output.chunks.len());
}
