// Encoding handling through the full pipeline

use crate::common::{assert_valid_output, test_config, TestRepo};
use docsplit::core::loader::encoding::rank_encodings;
use docsplit::core::loader::{DecodeOptions, EncodingProbe, FileEncoding, IngestPipeline};
use docsplit::{ingest, SkipReason};
use std::thread;
use std::time::Duration;

/// French prose encoded as ISO-8859-1
fn latin1_bytes() -> Vec<u8> {
    let text = "Le café est très bon. Nous étions à la gare à midi, \
                près du théâtre où la fenêtre était ouverte. \
                Voilà une idée: déjeuner à côté de l'église.\n";
    // Every character above is in U+0000..U+00FF
    text.repeat(4).chars().map(|c| c as u32 as u8).collect()
}

#[test]
fn test_latin1_is_detected() {
    let repo = TestRepo::with_bytes(&[("latin.txt", &latin1_bytes()), ("ok.txt", b"plain")]);

    let output = ingest(repo.path(), &test_config()).unwrap();
    assert_valid_output(&output);

    assert!(output.metadata_index.contains_key("latin.txt"));
    let chunk = output
        .chunks
        .iter()
        .find(|c| c.metadata.source.as_str() == "latin.txt")
        .expect("latin.txt should be chunked");
    assert!(chunk.text.starts_with("Le caf"));
    assert!(!chunk.text.contains('\u{FFFD}'));
    assert!(chunk.metadata.encoding.is_some());
}

#[test]
fn test_latin1_without_detection_is_skipped() {
    let repo = TestRepo::with_bytes(&[("latin.txt", &latin1_bytes()), ("ok.txt", b"plain")]);
    let mut config = test_config();
    config.parsing.detect_encoding = false;

    let output = ingest(repo.path(), &config).unwrap();
    assert_valid_output(&output);

    let skip = output
        .skipped
        .iter()
        .find(|s| s.source.as_str() == "latin.txt")
        .expect("latin.txt should be skipped");
    assert_eq!(skip.reason, SkipReason::Encoding);
    assert!(skip.message.contains("latin.txt"));

    // The rest of the run is unaffected
    assert!(output.metadata_index.contains_key("ok.txt"));
}

#[test]
fn test_utf16_with_bom() {
    let mut bytes = vec![0xFF, 0xFE];
    for unit in "hello from utf-16".encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    let repo = TestRepo::with_bytes(&[("wide.txt", &bytes)]);

    let output = ingest(repo.path(), &test_config()).unwrap();
    assert_valid_output(&output);

    assert_eq!(output.chunks.len(), 1);
    assert_eq!(output.chunks[0].text, "hello from utf-16");
    assert_eq!(
        output.metadata_index["wide.txt"].encoding.as_deref(),
        Some("utf-16le")
    );
}

#[test]
fn test_utf8_multibyte_content() {
    let repo = TestRepo::with_files(&[(
        "mixed.rs",
        "// 🚀 Launch function - 启动函数\nfn main() {\n    println!(\"Hello 世界! 🌍\");\n}\n",
    )]);

    let output = ingest(repo.path(), &test_config()).unwrap();
    assert_valid_output(&output);

    assert_eq!(output.chunks.len(), 1);
    assert!(output.chunks[0].text.contains("世界"));
    assert_eq!(
        output.metadata_index["mixed.rs"].encoding.as_deref(),
        Some("utf-8")
    );
}

fn stalled_ranker(bytes: &[u8]) -> Vec<FileEncoding> {
    thread::sleep(Duration::from_millis(500));
    rank_encodings(bytes)
}

#[test]
fn test_detection_timeout_skips_only_that_file() {
    let repo = TestRepo::with_bytes(&[("latin.txt", &latin1_bytes()), ("ok.txt", b"plain")]);
    let decode = DecodeOptions {
        probe: EncodingProbe::new(Duration::from_millis(20)).with_ranker(stalled_ranker),
        ..DecodeOptions::default()
    };

    let output = IngestPipeline::new(&test_config())
        .unwrap()
        .with_decode_options(decode)
        .run(repo.path())
        .unwrap();
    assert_valid_output(&output);

    assert_eq!(output.skipped.len(), 1);
    assert_eq!(output.skipped[0].source.as_str(), "latin.txt");
    assert_eq!(output.skipped[0].reason, SkipReason::Timeout);
    assert!(output.metadata_index.contains_key("ok.txt"));
    assert_eq!(output.chunks.len(), 1);
}
