//! Top-level definition segmentation for source files.
//!
//! Splits a source file into one segment per top-level function or
//! class plus the remaining top-level code, where every extracted
//! definition is replaced by a one-line `Code for:` placeholder.
//! Detection is line based: a definition starts at column 0 and runs
//! until the next non-blank column-0 line that is not a closing
//! bracket.

/// One extracted top-level definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeSegment {
    /// First line of the definition, trimmed
    pub signature: String,

    pub text: String,

    /// 1-based line number of the first line (decorators included)
    pub start_line: usize,
}

/// Result of segmenting one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segmentation {
    pub segments: Vec<CodeSegment>,

    /// Top-level code with definitions replaced by placeholders
    pub simplified: String,
}

/// Languages with a known top-level definition grammar
pub fn supports(lang: &str) -> bool {
    matches!(lang, "python" | "javascript" | "typescript" | "rust" | "go")
}

fn comment_prefix(lang: &str) -> &'static str {
    match lang {
        "python" => "#",
        _ => "//",
    }
}

fn strip_any<'a>(line: &'a str, prefixes: &[&str]) -> &'a str {
    let mut rest = line;
    loop {
        let before = rest;
        for prefix in prefixes {
            if let Some(stripped) = rest.strip_prefix(prefix) {
                rest = stripped;
            }
        }
        if rest == before {
            return rest;
        }
    }
}

fn is_definition(lang: &str, line: &str) -> bool {
    match lang {
        "python" => {
            let rest = strip_any(line, &["async "]);
            rest.starts_with("def ") || rest.starts_with("class ")
        }
        "javascript" | "typescript" => {
            let rest = strip_any(line, &["export ", "default ", "declare ", "abstract ", "async "]);
            rest.starts_with("function ")
                || rest.starts_with("function*")
                || rest.starts_with("class ")
                || (lang == "typescript"
                    && (rest.starts_with("interface ") || rest.starts_with("enum ")))
        }
        "rust" => {
            let rest = strip_any(
                line,
                &[
                    "pub(crate) ",
                    "pub(super) ",
                    "pub ",
                    "async ",
                    "const ",
                    "unsafe ",
                    "extern \"C\" ",
                ],
            );
            rest.starts_with("fn ")
                || rest.starts_with("struct ")
                || rest.starts_with("enum ")
                || rest.starts_with("trait ")
                || rest.starts_with("impl ")
                || rest.starts_with("impl<")
                || (rest.starts_with("mod ") && line.trim_end().ends_with('{'))
        }
        "go" => line.starts_with("func ") || line.starts_with("type "),
        _ => false,
    }
}

/// Lines that attach to the definition below them
fn is_prefix_line(lang: &str, line: &str) -> bool {
    match lang {
        "python" | "javascript" | "typescript" => line.starts_with('@'),
        "rust" => line.starts_with("#[") || line.starts_with("///"),
        _ => false,
    }
}

fn ends_segment(line: &str) -> bool {
    let starts_indented = line.starts_with(|c: char| c.is_whitespace());
    !line.trim().is_empty()
        && !starts_indented
        && !line.starts_with('}')
        && !line.starts_with(')')
        && !line.starts_with(']')
}

/// Segment `content` written in `lang`
///
/// Returns `None` for unsupported languages and for files without
/// any top-level definition.
pub fn segment(lang: &str, content: &str) -> Option<Segmentation> {
    if !supports(lang) {
        return None;
    }

    let lines: Vec<&str> = content.split_inclusive('\n').collect();
    let comment = comment_prefix(lang);

    let mut segments = Vec::new();
    let mut simplified = String::with_capacity(content.len() / 4);
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];

        if is_prefix_line(lang, line) || is_definition(lang, line) {
            let start = i;
            let mut def_line = i;
            while def_line < lines.len() && is_prefix_line(lang, lines[def_line]) {
                def_line += 1;
            }

            if def_line < lines.len() && is_definition(lang, lines[def_line]) {
                let mut end = def_line + 1;
                while end < lines.len() && !ends_segment(lines[end]) {
                    end += 1;
                }
                // Trailing blank lines stay with the surrounding code
                let mut body_end = end;
                while body_end > def_line + 1 && lines[body_end - 1].trim().is_empty() {
                    body_end -= 1;
                }

                let signature = lines[def_line].trim().to_string();
                segments.push(CodeSegment {
                    text: lines[start..body_end].concat(),
                    signature: signature.clone(),
                    start_line: start + 1,
                });
                simplified.push_str(&format!("{comment} Code for: {signature}\n"));
                for blank in &lines[body_end..end] {
                    simplified.push_str(blank);
                }

                i = end;
                continue;
            }
        }

        simplified.push_str(line);
        i += 1;
    }

    if segments.is_empty() {
        return None;
    }

    Some(Segmentation {
        segments,
        simplified,
    })
}
