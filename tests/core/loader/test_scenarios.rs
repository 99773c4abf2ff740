// End-to-end ingestion of small trees

use crate::common::{assert_valid_output, ingest_repo, long_python_function, TestRepo};
use docsplit::{ContentType, SkipReason};

#[test]
fn test_single_text_file() {
    let repo = TestRepo::with_files(&[("a.txt", "hello world")]);

    let output = ingest_repo(repo.path());
    assert_valid_output(&output);

    assert_eq!(output.chunks.len(), 1);
    assert_eq!(output.chunks[0].text, "hello world");
    assert_eq!(output.chunks[0].metadata.language, "text");
    assert_eq!(output.metadata_index["a.txt"].ext.as_deref(), Some(".txt"));
    assert_eq!(output.metadata_index["a.txt"].lang, "text");
    assert!(output.skipped.is_empty());
}

#[test]
fn test_long_python_function_splits() {
    let repo = TestRepo::with_files(&[("b.py", &long_python_function(500))]);

    let output = ingest_repo(repo.path());
    assert_valid_output(&output);

    assert!(output.chunks.len() > 1, "got {} chunks", output.chunks.len());
    assert!(output.chunks.iter().all(|c| c.metadata.language == "python"));
    assert_eq!(output.metadata_index["b.py"].lang, "python");

    // The function body and the placeholder module are separate documents
    assert!(output
        .chunks
        .iter()
        .any(|c| c.metadata.content_type == ContentType::FunctionsClasses));
    assert!(output
        .chunks
        .iter()
        .any(|c| c.metadata.content_type == ContentType::SimplifiedCode));
}

#[test]
fn test_nul_file_does_not_stop_the_run() {
    let nul = vec![0u8; 2 * 1024 * 1024];
    let repo = TestRepo::with_bytes(&[
        ("zeros.txt", &nul),
        ("a.txt", b"hello world"),
        ("c.md", b"# Title\n\nBody text."),
    ]);

    let output = ingest_repo(repo.path());
    assert_valid_output(&output);

    assert!(output.is_skipped("zeros.txt"));
    assert!(!output.metadata_index.contains_key("zeros.txt"));
    assert!(output.metadata_index.contains_key("a.txt"));
    assert!(output.metadata_index.contains_key("c.md"));
    assert_eq!(output.stats.files_matched, 3);
}

#[test]
fn test_small_repo_languages() {
    let repo = TestRepo::small();

    let output = ingest_repo(repo.path());
    assert_valid_output(&output);

    let index = &output.metadata_index;
    assert_eq!(index.len(), 8);
    assert_eq!(index["src/main.rs"].lang, "rust");
    assert_eq!(index["app/server.py"].lang, "python");
    assert_eq!(index["web/index.js"].lang, "javascript");
    assert_eq!(index["README.md"].lang, "markdown");
    assert_eq!(index["config.yaml"].lang, "yaml");
    assert_eq!(index["scripts/run.sh"].lang, "bash");
    assert_eq!(output.stats.languages["rust"], 2);
}

#[test]
fn test_binary_without_extension_is_unsupported() {
    let mut png = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    png.extend_from_slice(&[0u8; 64]);
    let repo = TestRepo::with_bytes(&[("logo", &png), ("a.txt", b"hello")]);

    let output = ingest_repo(repo.path());
    assert_valid_output(&output);

    let skip = output
        .skipped
        .iter()
        .find(|s| s.source.as_str() == "logo")
        .expect("logo should be skipped");
    assert_eq!(skip.reason, SkipReason::Unsupported);
}

#[test]
fn test_extensionless_script_uses_shebang() {
    let repo = TestRepo::with_files(&[("tool", "#!/usr/bin/env python3\nprint('hi')\n")]);

    let output = ingest_repo(repo.path());
    assert_valid_output(&output);

    let info = &output.metadata_index["tool"];
    assert_eq!(info.lang, "python");
    assert_eq!(info.ext.as_deref(), Some(".py"));
}

#[test]
fn test_hidden_directories_are_ignored() {
    let repo = TestRepo::with_files(&[
        (".git/config", "[core]\n"),
        (".env", "SECRET=1"),
        ("visible.txt", "shown"),
    ]);

    let output = ingest_repo(repo.path());

    assert_eq!(output.metadata_index.len(), 1);
    assert!(output.metadata_index.contains_key("visible.txt"));
}

#[test]
fn test_chunks_point_into_their_document() {
    let body = "Paragraph one.\n\n".repeat(600);
    let repo = TestRepo::with_files(&[("long.txt", &body)]);

    let output = ingest_repo(repo.path());
    assert_valid_output(&output);

    assert!(output.chunks.len() > 1);
    for chunk in &output.chunks {
        assert_eq!(&body[chunk.start_offset..chunk.end_offset], chunk.text);
    }
    let indexes: Vec<usize> = output.chunks.iter().map(|c| c.chunk_index).collect();
    let expected: Vec<usize> = (0..output.chunks.len()).collect();
    assert_eq!(indexes, expected);
}

#[test]
fn test_into_parts() {
    let repo = TestRepo::with_files(&[("a.txt", "hello world")]);

    let (chunks, index) = ingest_repo(repo.path()).into_parts();

    assert_eq!(chunks.len(), 1);
    assert_eq!(index.len(), 1);
}
