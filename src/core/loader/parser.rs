//! Blob parsers and the extension-keyed parser registry.
//!
//! A parser turns one [`Blob`] into a lazy sequence of documents.
//! The registry maps extensions to parsers and falls back to the
//! generic [`SourceParser`] for everything else.

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::error::Result;
use crate::core::loader::blob::Blob;
use crate::core::loader::segment;
use crate::core::types::{ContentType, Document, FileInfo};

/// Lazy sequence of documents produced by one parse call
pub type Documents = Box<dyn Iterator<Item = Document> + Send>;

/// Default minimum line count for code segmentation
pub const DEFAULT_SEGMENT_THRESHOLD: usize = 100;

/// Parses raw blobs into documents
pub trait BlobParser: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Parse `blob`, classified as `file_info`
    ///
    /// Errors are per-file: the caller records them and moves on.
    fn parse(&self, blob: Blob, file_info: &FileInfo) -> Result<Documents>;
}

/// Generic parser for text and source code
///
/// Large files in languages with a known definition grammar are
/// segmented into one document per top-level definition plus one
/// document for the remaining code.
#[derive(Debug, Clone)]
pub struct SourceParser {
    segment_threshold: usize,
}

impl Default for SourceParser {
    fn default() -> Self {
        Self::new(DEFAULT_SEGMENT_THRESHOLD)
    }
}

impl SourceParser {
    pub fn new(segment_threshold: usize) -> Self {
        Self { segment_threshold }
    }

    fn segmented(
        &self,
        content: &str,
        blob: &Blob,
        file_info: &FileInfo,
        encoding: &str,
    ) -> Option<Vec<Document>> {
        if !segment::supports(&file_info.lang) {
            return None;
        }
        if content.lines().count() < self.segment_threshold {
            return None;
        }

        let segmentation = segment::segment(&file_info.lang, content)?;
        let mut docs = Vec::with_capacity(segmentation.segments.len() + 1);

        for seg in segmentation.segments {
            docs.push(
                Document::new(
                    seg.text,
                    blob.source().clone(),
                    file_info,
                    Some(encoding.to_string()),
                    ContentType::FunctionsClasses,
                )
                .with_field("segment", seg.signature)
                .with_field("start_line", seg.start_line),
            );
        }

        docs.push(Document::new(
            segmentation.simplified,
            blob.source().clone(),
            file_info,
            Some(encoding.to_string()),
            ContentType::SimplifiedCode,
        ));

        Some(docs)
    }
}

impl BlobParser for SourceParser {
    fn name(&self) -> &'static str {
        "source"
    }

    fn parse(&self, blob: Blob, file_info: &FileInfo) -> Result<Documents> {
        let (content, encoding) = blob.decode()?;

        if let Some(docs) = self.segmented(&content, &blob, file_info, encoding) {
            tracing::debug!(
                "Segmented {} into {} documents",
                blob.source(),
                docs.len()
            );
            return Ok(Box::new(docs.into_iter()));
        }

        let doc = Document::new(
            content,
            blob.source().clone(),
            file_info,
            Some(encoding.to_string()),
            ContentType::Text,
        );
        Ok(Box::new(std::iter::once(doc)))
    }
}

/// One document per non-empty PDF page
#[cfg(feature = "pdf")]
#[derive(Debug, Clone, Default)]
pub struct PdfParser;

#[cfg(feature = "pdf")]
impl BlobParser for PdfParser {
    fn name(&self) -> &'static str {
        "pdf"
    }

    fn parse(&self, blob: Blob, file_info: &FileInfo) -> Result<Documents> {
        use crate::core::error::DocsplitError;

        let bytes = blob.as_bytes()?;
        let pdf = lopdf::Document::load_mem(&bytes)
            .map_err(|e| DocsplitError::Parse(format!("{}: failed to load PDF: {e}", blob.source())))?;

        let page_numbers: Vec<u32> = pdf.get_pages().keys().copied().collect();
        let total_pages = page_numbers.len();
        let source = blob.source().clone();
        let file_info = file_info.clone();

        tracing::debug!("{} has {} pages", source, total_pages);

        // Pages are extracted as the iterator is consumed
        let pages = page_numbers.into_iter().filter_map(move |page| {
            match pdf.extract_text(&[page]) {
                Ok(text) if !text.trim().is_empty() => Some(
                    Document::new(text, source.clone(), &file_info, None, ContentType::Page)
                        .with_field("page", page)
                        .with_field("total_pages", total_pages),
                ),
                Ok(_) => None,
                Err(e) => {
                    tracing::debug!("No text on page {} of {}: {}", page, source, e);
                    None
                }
            }
        });

        Ok(Box::new(pages))
    }
}

/// Extension-keyed parser lookup with a generic fallback
#[derive(Clone)]
pub struct ParserRegistry {
    parsers: HashMap<String, Arc<dyn BlobParser>>,
    fallback: Arc<dyn BlobParser>,
}

impl std::fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut exts: Vec<&String> = self.parsers.keys().collect();
        exts.sort();
        f.debug_struct("ParserRegistry")
            .field("parsers", &exts)
            .field("fallback", &self.fallback.name())
            .finish()
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_SEGMENT_THRESHOLD)
    }
}

fn normalize_ext(ext: &str) -> String {
    let ext = ext.to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{ext}")
    }
}

impl ParserRegistry {
    /// Registry with the built-in parsers
    pub fn new(segment_threshold: usize) -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::with_fallback(Arc::new(SourceParser::new(segment_threshold)));

        #[cfg(feature = "pdf")]
        registry.register(".pdf", Arc::new(PdfParser));

        registry
    }

    /// Empty registry using `fallback` for every extension
    pub fn with_fallback(fallback: Arc<dyn BlobParser>) -> Self {
        Self {
            parsers: HashMap::new(),
            fallback,
        }
    }

    /// Route `ext` (with or without leading dot) to `parser`
    pub fn register(&mut self, ext: &str, parser: Arc<dyn BlobParser>) {
        self.parsers.insert(normalize_ext(ext), parser);
    }

    pub fn get_parser(&self, file_info: &FileInfo) -> Arc<dyn BlobParser> {
        file_info
            .ext
            .as_deref()
            .and_then(|ext| self.parsers.get(ext))
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.fallback))
    }
}
