//! Raw file content with deferred reading and decoding.

use encoding_rs::{Encoding, UTF_8};
use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::config::ParsingConfig;
use crate::core::error::{DocsplitError, Result};
use crate::core::loader::encoding::{decode_strict, looks_binary, EncodingProbe};
use crate::core::loader::sniffer::DEFAULT_PROBE_BYTES;
use crate::core::types::Source;

/// How a blob turns its bytes into text
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Fall back to ranked detection when the declared encoding fails
    pub detect_encoding: bool,

    pub probe: EncodingProbe,

    /// Prefix length inspected for binary content
    pub probe_bytes: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            detect_encoding: true,
            probe: EncodingProbe::default(),
            probe_bytes: DEFAULT_PROBE_BYTES,
        }
    }
}

impl DecodeOptions {
    pub fn from_config(config: &ParsingConfig) -> Self {
        Self {
            detect_encoding: config.detect_encoding,
            probe: EncodingProbe::new(config.encoding_timeout()),
            probe_bytes: config.probe_bytes,
        }
    }
}

#[derive(Debug, Clone)]
enum BlobData {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

/// Bytes of one source, read on demand
///
/// Consumed by exactly one parser call.
#[derive(Debug, Clone)]
pub struct Blob {
    data: BlobData,
    source: Source,

    /// Declared encoding, tried first
    encoding: &'static Encoding,

    options: DecodeOptions,
}

impl Blob {
    /// Blob backed by a file that is read on first use
    pub fn from_path(path: impl Into<PathBuf>, source: Source) -> Self {
        Self {
            data: BlobData::Path(path.into()),
            source,
            encoding: UTF_8,
            options: DecodeOptions::default(),
        }
    }

    /// Blob backed by bytes already in memory
    pub fn from_bytes(bytes: impl Into<Vec<u8>>, source: Source) -> Self {
        Self {
            data: BlobData::Bytes(bytes.into()),
            source,
            encoding: UTF_8,
            options: DecodeOptions::default(),
        }
    }

    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Declare the encoding by label ("utf-16le", "latin1", ...);
    /// unknown labels keep the current one
    pub fn with_encoding_label(mut self, label: &str) -> Self {
        if let Some(encoding) = Encoding::for_label(label.as_bytes()) {
            self.encoding = encoding;
        }
        self
    }

    pub fn with_options(mut self, options: DecodeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_detect_encoding(mut self, detect: bool) -> Self {
        self.options.detect_encoding = detect;
        self
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.data {
            BlobData::Path(path) => Some(path),
            BlobData::Bytes(_) => None,
        }
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// Raw bytes; reads the file for path-backed blobs
    pub fn as_bytes(&self) -> Result<Cow<'_, [u8]>> {
        match &self.data {
            BlobData::Bytes(bytes) => Ok(Cow::Borrowed(bytes)),
            BlobData::Path(path) => fs::read(path)
                .map(Cow::Owned)
                .map_err(|e| DocsplitError::Parse(format!("{}: {e}", path.display()))),
        }
    }

    /// Decode the content to text
    ///
    /// Tries the declared encoding strictly, then (when enabled)
    /// ranked detection. Returns the text and the name of the
    /// encoding that decoded it.
    ///
    /// # Errors
    ///
    /// * `Encoding` for binary content or when no encoding fits
    /// * `Timeout` when detection exceeds its budget
    pub fn decode(&self) -> Result<(String, &'static str)> {
        let bytes = self.as_bytes()?;

        let prefix = &bytes[..bytes.len().min(self.options.probe_bytes)];
        if looks_binary(prefix) {
            return Err(DocsplitError::Encoding(format!(
                "{}: binary content",
                self.source
            )));
        }

        if let Some(text) = decode_strict(&bytes, self.encoding) {
            return Ok((text, self.encoding.name()));
        }

        if !self.options.detect_encoding {
            return Err(DocsplitError::Encoding(format!(
                "{}: not valid {}",
                self.source,
                self.encoding.name()
            )));
        }

        tracing::debug!(
            "{} is not valid {}, detecting encoding",
            self.source,
            self.encoding.name()
        );

        match self.options.probe.decode(&bytes) {
            Ok((text, encoding)) => Ok((text, encoding.name())),
            Err(DocsplitError::Timeout(msg)) => {
                Err(DocsplitError::Timeout(format!("{}: {msg}", self.source)))
            }
            Err(DocsplitError::Encoding(msg)) => {
                Err(DocsplitError::Encoding(format!("{}: {msg}", self.source)))
            }
            Err(e) => Err(e),
        }
    }
}
