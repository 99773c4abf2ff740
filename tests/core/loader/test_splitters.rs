// Splitter cache identity and splitting behaviour

use crate::common::long_python_function;
use docsplit::core::loader::{build_splitter, SplitterCache};
use std::sync::Arc;
use std::thread;

#[test]
fn test_cache_returns_identical_instances() {
    let cache = SplitterCache::new(4000, 200).unwrap();

    let first = cache.get_splitter("python");
    let second = cache.get_splitter("python");
    let other = cache.get_splitter("markdown");

    assert!(Arc::ptr_eq(&first, &second));
    assert!(!Arc::ptr_eq(&first, &other));
    assert_eq!(first.lang(), "python");
}

#[test]
fn test_cache_identity_across_threads() {
    let cache = Arc::new(SplitterCache::new(500, 50).unwrap());

    let splitters: Vec<_> = (0..6)
        .map(|_| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || cache.get_splitter("rust"))
        })
        .collect::<Vec<_>>()
        .into_iter()
        .map(|h| h.join().unwrap())
        .collect();

    for splitter in &splitters[1..] {
        assert!(Arc::ptr_eq(&splitters[0], splitter));
    }
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_splitting_is_deterministic() {
    let source = long_python_function(300);

    for lang in ["python", "text", "markdown", "unknown-lang"] {
        let a = build_splitter(lang, 800, 100).split_text(&source).unwrap();
        let b = build_splitter(lang, 800, 100).split_text(&source).unwrap();
        assert_eq!(a, b, "{lang} splits differ");
        assert!(a.len() > 1, "{lang} produced {} chunks", a.len());
    }
}

#[test]
fn test_chunks_respect_size() {
    let source = long_python_function(200);
    let splitter = build_splitter("python", 600, 60);

    for range in splitter.split_text(&source).unwrap() {
        let chars = source[range].chars().count();
        assert!(chars <= 600, "chunk of {chars} characters");
    }
}

#[test]
fn test_multibyte_boundaries() {
    let text = "🦀 Rust 中文 Привет мир ".repeat(300);

    for lang in ["rust", "text"] {
        let ranges = build_splitter(lang, 100, 10).split_text(&text).unwrap();
        assert!(!ranges.is_empty());
        for range in ranges {
            assert!(text.is_char_boundary(range.start));
            assert!(text.is_char_boundary(range.end));
        }
    }
}

#[test]
fn test_short_text_is_one_chunk() {
    for lang in ["python", "text", "markdown", "go"] {
        let ranges = build_splitter(lang, 4000, 200)
            .split_text("hello world")
            .unwrap();
        assert_eq!(ranges, vec![0..11], "{lang}");
    }
}

#[test]
fn test_empty_text_has_no_chunks() {
    let ranges = build_splitter("text", 100, 0).split_text("   \n  ").unwrap();
    assert!(ranges.is_empty());
}
