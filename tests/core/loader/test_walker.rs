// Path discovery over real directory trees

use crate::common::{test_config, TestRepo};
use docsplit::core::config::WalkConfig;
use docsplit::core::loader::PathWalker;
use docsplit::ingest;
use std::collections::BTreeSet;

fn repo() -> TestRepo {
    TestRepo::with_files(&[
        ("src/main.rs", "fn main() {}"),
        ("src/util/mod.rs", "pub mod x;"),
        ("docs/intro.md", "# Intro"),
        ("docs/notes.txt", "notes"),
        ("node_modules/pkg/index.js", "module.exports = 1;"),
        ("target/debug/build.rs", "fn main() {}"),
        (".hidden/secret.txt", "secret"),
        ("src/.cache.txt", "cached"),
        ("LICENSE", "MIT"),
    ])
}

fn relative(repo: &TestRepo, walker: &PathWalker) -> BTreeSet<String> {
    walker
        .yield_paths(repo.path())
        .map(|p| {
            p.strip_prefix(repo.path())
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect()
}

#[test]
fn test_count_matches_yield() {
    let repo = repo();
    let walker = PathWalker::from_config(&WalkConfig::default()).unwrap();

    let yielded = walker.yield_paths(repo.path()).count();
    assert_eq!(walker.count_matching_paths(repo.path()), yielded);
    assert_eq!(yielded, 5);
}

#[test]
fn test_count_matches_yield_with_filters() {
    let repo = repo();
    let walker = PathWalker::new(
        vec!["**/*.rs".to_string(), "**/*.md".to_string()],
        vec!["**/util/**".to_string()],
        vec![],
        true,
        10,
    )
    .unwrap();

    let paths = relative(&repo, &walker);
    assert_eq!(walker.count_matching_paths(repo.path()), paths.len());
    assert!(paths.contains("src/main.rs"));
    assert!(paths.contains("docs/intro.md"));
    assert!(!paths.contains("src/util/mod.rs"));
}

#[test]
fn test_default_walk_prunes_hidden_and_excluded() {
    let repo = repo();
    let walker = PathWalker::from_config(&WalkConfig::default()).unwrap();

    let expected: BTreeSet<String> = [
        "LICENSE",
        "docs/intro.md",
        "docs/notes.txt",
        "src/main.rs",
        "src/util/mod.rs",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    assert_eq!(relative(&repo, &walker), expected);
}

#[test]
fn test_load_hidden() {
    let repo = repo();
    let config = WalkConfig {
        load_hidden: true,
        ..WalkConfig::default()
    };
    let walker = PathWalker::from_config(&config).unwrap();

    let paths = relative(&repo, &walker);
    assert!(paths.contains(".hidden/secret.txt"));
    assert!(paths.contains("src/.cache.txt"));
}

#[test]
fn test_suffix_filter() {
    let repo = repo();
    let config = WalkConfig {
        suffixes: vec![".txt".to_string()],
        ..WalkConfig::default()
    };
    let walker = PathWalker::from_config(&config).unwrap();

    let paths = relative(&repo, &walker);
    assert_eq!(paths.len(), 1);
    assert!(paths.contains("docs/notes.txt"));
}

#[test]
fn test_walk_is_restartable() {
    let repo = repo();
    let walker = PathWalker::from_config(&WalkConfig::default()).unwrap();

    let first = relative(&repo, &walker);
    let second = relative(&repo, &walker);
    assert_eq!(first, second);
}

#[test]
fn test_invalid_pattern() {
    let result = PathWalker::new(vec!["[".to_string()], vec![], vec![], false, 10);
    assert!(result.is_err());
}

#[test]
fn test_excluded_name_above_root_is_ignored() {
    let repo = TestRepo::with_files(&[
        ("target/docs/a.txt", "hello world"),
        ("target/docs/node_modules/dep.js", "module.exports = 1;"),
    ]);
    let root = repo.path().join("target/docs");
    let walker = PathWalker::from_config(&WalkConfig::default()).unwrap();

    assert_eq!(walker.count_matching_paths(&root), 1);

    let output = ingest(&root, &test_config()).unwrap();
    assert_eq!(output.chunks.len(), 1);
    assert!(output.metadata_index.contains_key("a.txt"));
    assert!(output.skipped.is_empty());
}
