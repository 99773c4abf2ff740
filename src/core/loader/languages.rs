//! Extension to language tag table.

/// Language tag for an extension (lowercase, leading dot)
pub fn lang_for_ext(ext: &str) -> Option<&'static str> {
    let lang = match ext {
        ".py" | ".pyi" | ".pyw" => "python",
        ".js" | ".mjs" | ".cjs" | ".jsx" => "javascript",
        ".ts" | ".tsx" | ".mts" | ".cts" => "typescript",
        ".c" | ".h" => "c",
        ".cpp" | ".cc" | ".cxx" | ".hpp" | ".hh" | ".hxx" => "cpp",
        ".cs" => "csharp",
        ".java" => "java",
        ".kt" | ".kts" => "kotlin",
        ".scala" | ".sc" => "scala",
        ".rs" => "rust",
        ".go" => "go",
        ".rb" => "ruby",
        ".php" => "php",
        ".swift" => "swift",
        ".lua" => "lua",
        ".html" | ".htm" => "html",
        ".css" | ".scss" => "css",
        ".json" | ".ipynb" => "json",
        ".xml" => "xml",
        ".yaml" | ".yml" => "yaml",
        ".toml" => "toml",
        ".sh" | ".bash" | ".zsh" | ".fish" => "bash",
        ".md" | ".markdown" => "markdown",
        ".tex" => "tex",
        ".rst" | ".txt" | ".text" | ".log" => "text",
        ".pdf" => "pdf",
        _ => return None,
    };
    Some(lang)
}

/// Extension for a shebang interpreter, used when a script has none
pub fn ext_for_interpreter(interpreter: &str) -> Option<&'static str> {
    let ext = match interpreter {
        "python" | "python2" | "python3" => ".py",
        "node" | "nodejs" | "deno" => ".js",
        "sh" | "bash" | "zsh" | "fish" | "dash" | "ksh" => ".sh",
        "ruby" => ".rb",
        "php" => ".php",
        "lua" => ".lua",
        _ => return None,
    };
    Some(ext)
}

/// MIME type reported for a shebang interpreter
pub fn mime_for_interpreter(interpreter: &str) -> Option<&'static str> {
    let mime = match ext_for_interpreter(interpreter)? {
        ".py" => "text/x-python",
        ".js" => "text/javascript",
        ".sh" => "text/x-shellscript",
        ".rb" => "text/x-ruby",
        ".php" => "text/x-php",
        ".lua" => "text/x-lua",
        _ => return None,
    };
    Some(mime)
}

/// Preferred extension for MIME types whose registry entry lists
/// several candidates
pub fn preferred_ext_for_mime(mime: &str) -> Option<&'static str> {
    let ext = match mime {
        "text/plain" => ".txt",
        "text/markdown" => ".md",
        "text/html" => ".html",
        "text/css" => ".css",
        "text/csv" => ".csv",
        "text/xml" | "application/xml" => ".xml",
        "application/json" => ".json",
        "application/pdf" => ".pdf",
        "text/x-python" => ".py",
        "text/javascript" | "application/javascript" => ".js",
        "text/x-shellscript" => ".sh",
        "text/x-ruby" => ".rb",
        "text/x-php" => ".php",
        "text/x-lua" => ".lua",
        _ => return None,
    };
    Some(ext)
}
