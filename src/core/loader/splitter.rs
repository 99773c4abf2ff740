//! Language-aware text splitters.
//!
//! All sizes are measured in **characters**, not bytes. Chunk
//! boundaries always fall on character boundaries, so multi-byte
//! UTF-8 content never panics. Offsets are byte offsets into the
//! document content.
//!
//! Two families:
//!
//! - [`RecursiveSplitter`]: tries a language's separators from
//!   coarsest (top-level definitions) to finest (single characters)
//!   and merges the pieces back into windows with overlap
//! - [`ProseSplitter`]: unicode-aware sentence and paragraph
//!   splitting from `text-splitter`, with a markdown variant

use std::collections::VecDeque;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use text_splitter::{Characters, ChunkConfig, MarkdownSplitter, TextSplitter};

use crate::core::error::{DocsplitError, Result};
use crate::core::types::{Chunk, Document, SplitterKind};

/// Turns documents into chunks
///
/// Implementations are stateless with respect to their input and
/// shared read-only between worker threads.
pub trait Splitter: Send + Sync + fmt::Debug {
    /// Language tag this splitter was built for
    fn lang(&self) -> &str;

    /// Byte ranges of the chunks of `text`, in order
    fn split_text(&self, text: &str) -> Result<Vec<Range<usize>>>;

    /// Split a document, copying its metadata onto every chunk
    fn split(&self, doc: &Document) -> Result<Vec<Chunk>> {
        let ranges = self.split_text(&doc.content)?;
        let mut chunks = Vec::with_capacity(ranges.len());

        for (chunk_index, range) in ranges.into_iter().enumerate() {
            let text = doc.content.get(range.clone()).ok_or_else(|| {
                DocsplitError::Split(format!(
                    "{}: range {:?} is not on character boundaries",
                    doc.source(),
                    range
                ))
            })?;

            chunks.push(Chunk {
                text: text.to_string(),
                metadata: doc.metadata.clone(),
                chunk_index,
                start_offset: range.start,
                end_offset: range.end,
            });
        }

        Ok(chunks)
    }
}

const GENERIC: &[&str] = &["\n\n", "\n", " ", ""];

const PYTHON: &[&str] = &["\nclass ", "\ndef ", "\n\tdef ", "\n\n", "\n", " ", ""];

const JAVASCRIPT: &[&str] = &[
    "\nfunction ", "\nconst ", "\nlet ", "\nvar ", "\nclass ", "\nif ", "\nfor ", "\nwhile ",
    "\nswitch ", "\ncase ", "\ndefault ", "\n\n", "\n", " ", "",
];

const TYPESCRIPT: &[&str] = &[
    "\nenum ", "\ninterface ", "\nnamespace ", "\ntype ", "\nclass ", "\nfunction ",
    "\nconst ", "\nlet ", "\nvar ", "\nif ", "\nfor ", "\nwhile ", "\nswitch ", "\ncase ",
    "\ndefault ", "\n\n", "\n", " ", "",
];

const RUST: &[&str] = &[
    "\nfn ", "\nconst ", "\nlet ", "\nif ", "\nwhile ", "\nfor ", "\nloop ", "\nmatch ",
    "\n\n", "\n", " ", "",
];

const GO: &[&str] = &[
    "\nfunc ", "\nvar ", "\nconst ", "\ntype ", "\nif ", "\nfor ", "\nswitch ", "\ncase ",
    "\n\n", "\n", " ", "",
];

const JAVA: &[&str] = &[
    "\nclass ", "\npublic ", "\nprotected ", "\nprivate ", "\nstatic ", "\nif ", "\nfor ",
    "\nwhile ", "\nswitch ", "\ncase ", "\n\n", "\n", " ", "",
];

const C_LIKE: &[&str] = &[
    "\nclass ", "\nvoid ", "\nint ", "\nfloat ", "\ndouble ", "\nif ", "\nfor ", "\nwhile ",
    "\nswitch ", "\ncase ", "\n\n", "\n", " ", "",
];

const CSHARP: &[&str] = &[
    "\ninterface ", "\nenum ", "\nimplements ", "\ndelegate ", "\nevent ", "\nclass ",
    "\nabstract ", "\npublic ", "\nprotected ", "\nprivate ", "\nstatic ", "\nreturn ",
    "\nif ", "\ncontinue ", "\nfor ", "\nforeach ", "\nwhile ", "\nswitch ", "\nbreak ",
    "\ncase ", "\nelse ", "\ntry ", "\nthrow ", "\nfinally ", "\ncatch ", "\n\n", "\n", " ",
    "",
];

const PHP: &[&str] = &[
    "\nfunction ", "\nclass ", "\nif ", "\nforeach ", "\nwhile ", "\ndo ", "\nswitch ",
    "\ncase ", "\n\n", "\n", " ", "",
];

const RUBY: &[&str] = &[
    "\ndef ", "\nclass ", "\nif ", "\nunless ", "\nwhile ", "\nfor ", "\ndo ", "\nbegin ",
    "\nrescue ", "\n\n", "\n", " ", "",
];

const KOTLIN: &[&str] = &[
    "\nclass ", "\npublic ", "\nprotected ", "\nprivate ", "\ninternal ", "\ncompanion ",
    "\nfun ", "\nval ", "\nvar ", "\nif ", "\nfor ", "\nwhile ", "\nwhen ", "\ncase ",
    "\nelse ", "\n\n", "\n", " ", "",
];

const SCALA: &[&str] = &[
    "\nclass ", "\nobject ", "\ndef ", "\nval ", "\nvar ", "\nif ", "\nfor ", "\nwhile ",
    "\nmatch ", "\ncase ", "\n\n", "\n", " ", "",
];

const SWIFT: &[&str] = &[
    "\nfunc ", "\nclass ", "\nstruct ", "\nenum ", "\nif ", "\nfor ", "\nwhile ", "\ndo ",
    "\nswitch ", "\ncase ", "\n\n", "\n", " ", "",
];

const LUA: &[&str] = &[
    "\nlocal ", "\nfunction ", "\nif ", "\nfor ", "\nwhile ", "\nrepeat ", "\n\n", "\n", " ",
    "",
];

const HTML: &[&str] = &[
    "<body", "<div", "<p", "<br", "<li", "<h1", "<h2", "<h3", "<h4", "<h5", "<h6", "<span",
    "<table", "<tr", "<td", "<th", "<ul", "<ol", "<header", "<footer", "<nav", "<head",
    "<style", "<script", "<meta", "<title", "",
];

const TEX: &[&str] = &[
    "\n\\chapter{", "\n\\section{", "\n\\subsection{", "\n\\subsubsection{",
    "\n\\begin{enumerate}", "\n\\begin{itemize}", "\n\\begin{description}",
    "\n\\begin{list}", "\n\\begin{quote}", "\n\\begin{quotation}", "\n\\begin{verse}",
    "\n\\begin{verbatim}", "\n\\begin{align}", "$$", "$", " ", "",
];

/// Separator list for a language with a dedicated strategy
pub fn separators_for(lang: &str) -> Option<&'static [&'static str]> {
    let separators = match lang {
        "python" => PYTHON,
        "javascript" => JAVASCRIPT,
        "typescript" => TYPESCRIPT,
        "rust" => RUST,
        "go" => GO,
        "java" => JAVA,
        "c" | "cpp" => C_LIKE,
        "csharp" => CSHARP,
        "php" => PHP,
        "ruby" => RUBY,
        "kotlin" => KOTLIN,
        "scala" => SCALA,
        "swift" => SWIFT,
        "lua" => LUA,
        "html" => HTML,
        "tex" => TEX,
        _ => return None,
    };
    Some(separators)
}

fn char_len(text: &str, range: &Range<usize>) -> usize {
    text[range.clone()].chars().count()
}

/// Shrink `range` to exclude surrounding whitespace
fn trim_range(text: &str, range: Range<usize>) -> Option<Range<usize>> {
    let slice = &text[range.clone()];
    let trimmed = slice.trim();
    if trimmed.is_empty() {
        return None;
    }
    let start = range.start + (slice.len() - slice.trim_start().len());
    Some(start..start + trimmed.len())
}

/// Contiguous pieces of `range`; each separator occurrence starts a
/// new piece
fn split_on(text: &str, range: Range<usize>, separator: &str) -> Vec<Range<usize>> {
    let slice = &text[range.clone()];

    if separator.is_empty() {
        return slice
            .char_indices()
            .map(|(i, c)| range.start + i..range.start + i + c.len_utf8())
            .collect();
    }

    let mut pieces = Vec::new();
    let mut start = range.start;
    for (pos, _) in slice.match_indices(separator) {
        let at = range.start + pos;
        if at > start {
            pieces.push(start..at);
        }
        start = at;
    }
    if start < range.end {
        pieces.push(start..range.end);
    }
    pieces
}

/// Separator-driven recursive splitter
#[derive(Debug, Clone)]
pub struct RecursiveSplitter {
    lang: String,
    separators: &'static [&'static str],
    chunk_size: usize,
    overlap: usize,
}

impl RecursiveSplitter {
    pub fn new(
        lang: impl Into<String>,
        separators: &'static [&'static str],
        chunk_size: usize,
        overlap: usize,
    ) -> Self {
        Self {
            lang: lang.into(),
            separators,
            chunk_size: chunk_size.max(1),
            overlap: overlap.min(chunk_size.saturating_sub(1)),
        }
    }

    /// Language strategy when one exists, generic separators otherwise
    pub fn for_language(lang: &str, chunk_size: usize, overlap: usize) -> Self {
        let separators = separators_for(lang).unwrap_or(GENERIC);
        Self::new(lang, separators, chunk_size, overlap)
    }

    /// Paragraph, line, word, character
    pub fn generic(lang: &str, chunk_size: usize, overlap: usize) -> Self {
        Self::new(lang, GENERIC, chunk_size, overlap)
    }

    pub fn separators(&self) -> &'static [&'static str] {
        self.separators
    }

    fn split_range(
        &self,
        text: &str,
        range: Range<usize>,
        separators: &[&str],
        out: &mut Vec<Range<usize>>,
    ) {
        let slice = &text[range.clone()];
        let Some(idx) = separators
            .iter()
            .position(|s| s.is_empty() || slice.contains(s))
        else {
            out.extend(trim_range(text, range));
            return;
        };

        let remaining = &separators[idx + 1..];
        let mut good: Vec<Range<usize>> = Vec::new();

        for piece in split_on(text, range, separators[idx]) {
            if char_len(text, &piece) < self.chunk_size {
                good.push(piece);
                continue;
            }

            if !good.is_empty() {
                self.merge(text, &good, out);
                good.clear();
            }
            if remaining.is_empty() {
                out.extend(trim_range(text, piece));
            } else {
                self.split_range(text, piece, remaining, out);
            }
        }

        if !good.is_empty() {
            self.merge(text, &good, out);
        }
    }

    /// Merge small contiguous pieces into windows of at most
    /// `chunk_size` characters, keeping up to `overlap` characters
    /// of the previous window
    fn merge(&self, text: &str, pieces: &[Range<usize>], out: &mut Vec<Range<usize>>) {
        let mut window: VecDeque<(Range<usize>, usize)> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(text, piece);

            if total + len > self.chunk_size {
                if let (Some(first), Some(last)) = (window.front(), window.back()) {
                    out.extend(trim_range(text, first.0.start..last.0.end));
                }
                while total > self.overlap || (total + len > self.chunk_size && total > 0) {
                    match window.pop_front() {
                        Some((_, dropped)) => total -= dropped,
                        None => break,
                    }
                }
            }

            window.push_back((piece.clone(), len));
            total += len;
        }

        if let (Some(first), Some(last)) = (window.front(), window.back()) {
            out.extend(trim_range(text, first.0.start..last.0.end));
        }
    }
}

impl Splitter for RecursiveSplitter {
    fn lang(&self) -> &str {
        &self.lang
    }

    fn split_text(&self, text: &str) -> Result<Vec<Range<usize>>> {
        let mut out = Vec::new();
        if !text.is_empty() {
            self.split_range(text, 0..text.len(), self.separators, &mut out);
        }
        Ok(out)
    }
}

enum ProseEngine {
    Text(TextSplitter<Characters>),
    Markdown(MarkdownSplitter<Characters>),
}

/// Unicode-aware prose splitter backed by `text-splitter`
pub struct ProseSplitter {
    lang: String,
    engine: ProseEngine,
}

impl fmt::Debug for ProseSplitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let engine = match self.engine {
            ProseEngine::Text(_) => "text",
            ProseEngine::Markdown(_) => "markdown",
        };
        f.debug_struct("ProseSplitter")
            .field("lang", &self.lang)
            .field("engine", &engine)
            .finish()
    }
}

fn chunk_config(chunk_size: usize, overlap: usize) -> Result<ChunkConfig<Characters>> {
    ChunkConfig::new(chunk_size)
        .with_overlap(overlap)
        .map_err(|e| DocsplitError::ConfigError(format!("invalid chunk overlap: {e}")))
}

impl ProseSplitter {
    /// Sentence and paragraph aware splitting for plain text
    pub fn text(lang: &str, chunk_size: usize, overlap: usize) -> Result<Self> {
        Ok(Self {
            lang: lang.to_string(),
            engine: ProseEngine::Text(TextSplitter::new(chunk_config(chunk_size, overlap)?)),
        })
    }

    /// Heading and block aware splitting for markdown
    pub fn markdown(lang: &str, chunk_size: usize, overlap: usize) -> Result<Self> {
        Ok(Self {
            lang: lang.to_string(),
            engine: ProseEngine::Markdown(MarkdownSplitter::new(chunk_config(
                chunk_size, overlap,
            )?)),
        })
    }
}

impl Splitter for ProseSplitter {
    fn lang(&self) -> &str {
        &self.lang
    }

    fn split_text(&self, text: &str) -> Result<Vec<Range<usize>>> {
        let ranges = match &self.engine {
            ProseEngine::Text(splitter) => splitter
                .chunk_indices(text)
                .map(|(offset, chunk)| offset..offset + chunk.len())
                .collect::<Vec<_>>(),
            ProseEngine::Markdown(splitter) => splitter
                .chunk_indices(text)
                .map(|(offset, chunk)| offset..offset + chunk.len())
                .collect::<Vec<_>>(),
        };

        Ok(ranges
            .into_iter()
            .filter_map(|range| trim_range(text, range))
            .collect())
    }
}

/// Build the splitter for `lang`
///
/// Prose and markdown languages get a `ProseSplitter`; everything else
/// a `RecursiveSplitter` with the language's separators (or generic
/// ones).
pub fn build_splitter(lang: &str, chunk_size: usize, overlap: usize) -> Arc<dyn Splitter> {
    let prose = match SplitterKind::for_lang(lang) {
        SplitterKind::Prose => ProseSplitter::text(lang, chunk_size, overlap),
        SplitterKind::Markdown => ProseSplitter::markdown(lang, chunk_size, overlap),
        SplitterKind::Recursive => {
            return Arc::new(RecursiveSplitter::for_language(lang, chunk_size, overlap))
        }
    };

    match prose {
        Ok(splitter) => Arc::new(splitter),
        Err(e) => {
            tracing::warn!("{}, using generic splitter for {}", e, lang);
            Arc::new(RecursiveSplitter::generic(lang, chunk_size, overlap))
        }
    }
}
