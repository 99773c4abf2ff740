// Test fixtures for integration testing

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Synthetic directory tree in a temporary directory
#[allow(dead_code)]
pub struct TestRepo {
    pub dir: TempDir,
    pub files: Vec<PathBuf>,
}

impl TestRepo {
    /// A small mixed-language tree (8 files)
    #[allow(dead_code)]
    pub fn small() -> Self {
        Self::with_files(&[
            ("src/main.rs", "fn main() { println!(\"Hello\"); }"),
            ("src/lib.rs", "pub fn helper() -> u32 { 42 }"),
            ("app/server.py", "def serve():\n    return 'ok'\n"),
            ("web/index.js", "export function greet() { return 'hi'; }"),
            ("README.md", "# Test Project\n\nThis is a test."),
            ("docs/guide.txt", "Read the guide before you start."),
            ("config.yaml", "name: test\nversion: 1\n"),
            ("scripts/run.sh", "#!/bin/sh\necho run\n"),
        ])
    }

    /// Create with text files
    pub fn with_files(files: &[(&str, &str)]) -> Self {
        let specs: Vec<(&str, &[u8])> = files
            .iter()
            .map(|(path, content)| (*path, content.as_bytes()))
            .collect();
        Self::with_bytes(&specs)
    }

    /// Create with raw file contents
    pub fn with_bytes(files: &[(&str, &[u8])]) -> Self {
        let dir = TempDir::new().unwrap();
        let mut paths = Vec::new();

        for (path, content) in files {
            let full_path = dir.path().join(path);
            std::fs::create_dir_all(full_path.parent().unwrap()).unwrap();
            std::fs::write(&full_path, content).unwrap();
            paths.push(full_path);
        }

        Self { dir, files: paths }
    }

    /// Get path to the repository
    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Python module holding one function of `lines` body lines
#[allow(dead_code)]
pub fn long_python_function(lines: usize) -> String {
    let mut source = String::from("import math\n\n\ndef long_function(values):\n    total = 0\n");
    for i in 0..lines {
        source.push_str(&format!(
            "    total += math.sqrt(values[{i}] * {i}) + {i}  # step {i}\n"
        ));
    }
    source.push_str("    return total\n");
    source
}
