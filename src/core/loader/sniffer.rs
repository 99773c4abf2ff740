//! Content type and language detection.
//!
//! Classification is extension first: an extension known to the MIME
//! registry wins over anything found in the content. Files without a
//! usable extension are sniffed from a bounded prefix (magic numbers,
//! shebang line, text heuristic).

use once_cell::sync::Lazy;
use regex::Regex;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::core::error::{DocsplitError, Result};
use crate::core::loader::languages::{
    ext_for_interpreter, lang_for_ext, mime_for_interpreter, preferred_ext_for_mime,
};
use crate::core::types::{FileInfo, FileType};

/// Default number of bytes read when sniffing content
pub const DEFAULT_PROBE_BYTES: usize = 8 * 1024;

static SHEBANG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#!\s*(?:\S*/)?(?:env\s+(?:-\S+\s+)*)?([A-Za-z][A-Za-z0-9_+-]*)").unwrap()
});

/// Lowercase extension of `path` with a leading dot
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(|e| format!(".{}", e.to_lowercase()))
}

/// MIME type registered for an extension (with leading dot)
pub fn mime_for_ext(ext: &str) -> Option<String> {
    mime_guess::from_ext(ext.trim_start_matches('.'))
        .first()
        .map(|m| m.essence_str().to_string())
}

/// Extension for a MIME type, preferring the common one
pub fn ext_for_mime(mime: &str) -> Option<String> {
    if let Some(ext) = preferred_ext_for_mime(mime) {
        return Some(ext.to_string());
    }
    mime_guess::get_mime_extensions_str(mime)
        .and_then(|exts| exts.first())
        .map(|e| format!(".{e}"))
}

/// True when `buf` is UTF-8, allowing a character cut off by the
/// probe boundary when `truncated`
fn is_utf8_prefix(buf: &[u8], truncated: bool) -> bool {
    match std::str::from_utf8(buf) {
        Ok(_) => true,
        Err(e) => truncated && e.error_len().is_none(),
    }
}

/// Encoding evident from a content prefix
///
/// A byte-order mark wins; otherwise a NUL-free valid UTF-8 prefix
/// reports "utf-8".
pub fn prefix_encoding(buf: &[u8], truncated: bool) -> Option<String> {
    if let Some((encoding, _)) = encoding_rs::Encoding::for_bom(buf) {
        return Some(encoding.name().to_lowercase());
    }
    if !buf.contains(&0) && is_utf8_prefix(buf, truncated) {
        return Some("utf-8".to_string());
    }
    None
}

fn shebang_interpreter(buf: &[u8]) -> Option<String> {
    let first_line = buf.split(|b| *b == b'\n').next()?;
    let line = std::str::from_utf8(first_line).ok()?;
    let caps = SHEBANG.captures(line)?;
    let name = caps.get(1)?.as_str();
    Some(name.to_string())
}

/// Sniff a MIME type (and matching extension) from a content prefix
pub fn sniff_bytes(buf: &[u8], truncated: bool) -> (String, Option<String>) {
    if buf.is_empty() {
        return ("application/x-empty".to_string(), None);
    }

    // A shebang is more specific than the generic script magic
    if let Some(interpreter) = shebang_interpreter(buf) {
        if let Some(mime) = mime_for_interpreter(&interpreter) {
            let ext = ext_for_interpreter(&interpreter).map(str::to_string);
            return (mime.to_string(), ext);
        }
    }

    if let Some(kind) = infer::get(buf) {
        return (
            kind.mime_type().to_string(),
            Some(format!(".{}", kind.extension())),
        );
    }

    if !buf.contains(&0) && is_utf8_prefix(buf, truncated) {
        return ("text/plain".to_string(), None);
    }

    ("application/octet-stream".to_string(), None)
}

/// Classifies files by extension, MIME type and content
#[derive(Debug, Clone)]
pub struct TypeSniffer {
    probe_bytes: usize,
}

impl Default for TypeSniffer {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_BYTES)
    }
}

impl TypeSniffer {
    pub fn new(probe_bytes: usize) -> Self {
        Self {
            probe_bytes: probe_bytes.max(1),
        }
    }

    fn read_prefix(&self, path: &Path) -> std::io::Result<(Vec<u8>, bool)> {
        let file = File::open(path)?;
        let mut buf = Vec::with_capacity(self.probe_bytes);
        file.take(self.probe_bytes as u64).read_to_end(&mut buf)?;
        let truncated = buf.len() == self.probe_bytes;
        Ok((buf, truncated))
    }

    /// Detect MIME type, extension and prefix encoding of `path`
    ///
    /// # Arguments
    ///
    /// * `path` - File to inspect
    /// * `raise_err` - Return `Classification` instead of an empty
    ///   `FileType` when nothing can be determined
    pub fn detect_filetype(&self, path: &Path, raise_err: bool) -> Result<FileType> {
        let ext = extension_of(path);
        let registered = ext.as_deref().and_then(mime_for_ext);

        let (prefix, truncated) = match self.read_prefix(path) {
            Ok(read) => read,
            Err(e) => {
                if registered.is_some() {
                    tracing::debug!("Could not read prefix of {:?}: {}", path, e);
                    return Ok(FileType {
                        mime: registered,
                        ext,
                        encoding: None,
                    });
                }
                if raise_err {
                    return Err(DocsplitError::Classification(format!(
                        "{}: {e}",
                        path.display()
                    )));
                }
                return Ok(FileType::default());
            }
        };

        let encoding = prefix_encoding(&prefix, truncated);

        if registered.is_some() {
            return Ok(FileType {
                mime: registered,
                ext,
                encoding,
            });
        }

        let (mime, sniffed_ext) = sniff_bytes(&prefix, truncated);
        let ext = ext
            .or(sniffed_ext)
            .or_else(|| ext_for_mime(&mime));

        tracing::debug!("Sniffed {:?} as {} ({:?})", path, mime, ext);

        Ok(FileType {
            mime: Some(mime),
            ext,
            encoding,
        })
    }

    /// Classify `path` and assign its language
    ///
    /// Returns `Ok(None)` when the file type is known but no language
    /// applies (binary or unsupported content).
    pub fn classify(&self, path: &Path, raise_err: bool) -> Result<Option<FileInfo>> {
        let file_type = self.detect_filetype(path, raise_err)?;
        if file_type.is_unresolved() {
            return Ok(None);
        }

        let lang = file_type
            .ext
            .as_deref()
            .and_then(lang_for_ext)
            .or_else(|| {
                file_type
                    .mime
                    .as_deref()
                    .filter(|m| m.starts_with("text/"))
                    .map(|_| "text")
            });

        Ok(lang.map(|lang| FileInfo::new(file_type, lang)))
    }
}
