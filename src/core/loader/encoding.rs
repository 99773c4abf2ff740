//! Ranked encoding detection under a time budget.
//!
//! Detection runs on a helper thread and the caller waits at most
//! `timeout` for the ranking. A detector that overruns is abandoned
//! (threads cannot be killed); its result is discarded when it
//! eventually finishes.

use crossbeam::channel::{self, RecvTimeoutError};
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, WINDOWS_1252};
use std::borrow::Cow;
use std::thread;
use std::time::Duration;

use crate::core::error::{DocsplitError, Result};

/// Default budget for one detection
pub const DEFAULT_ENCODING_TIMEOUT: Duration = Duration::from_secs(5);

/// One candidate encoding with its confidence in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FileEncoding {
    pub encoding: &'static Encoding,
    pub confidence: f32,
}

impl FileEncoding {
    pub fn name(&self) -> &'static str {
        self.encoding.name()
    }
}

/// Content that starts with NUL bytes and carries no UTF-16 BOM is
/// treated as binary
pub fn looks_binary(prefix: &[u8]) -> bool {
    if !prefix.contains(&0) {
        return false;
    }
    !matches!(
        Encoding::for_bom(prefix),
        Some((enc, _)) if enc == UTF_16LE || enc == UTF_16BE
    )
}

/// Strict decode: malformed input fails instead of being replaced
///
/// A BOM matching `encoding` is stripped first.
pub fn decode_strict(bytes: &[u8], encoding: &'static Encoding) -> Option<String> {
    let body = match Encoding::for_bom(bytes) {
        Some((bom_enc, len)) if bom_enc == encoding => &bytes[len..],
        _ => bytes,
    };
    encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .map(Cow::into_owned)
}

/// Rank candidate encodings for `bytes`, most likely first
pub fn rank_encodings(bytes: &[u8]) -> Vec<FileEncoding> {
    let mut candidates = Vec::with_capacity(5);

    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        candidates.push(FileEncoding {
            encoding,
            confidence: 1.0,
        });
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(bytes, true);
    candidates.push(FileEncoding {
        encoding: detector.guess(None, true),
        confidence: 0.9,
    });

    candidates.push(FileEncoding {
        encoding: WINDOWS_1252,
        confidence: 0.3,
    });
    candidates.push(FileEncoding {
        encoding: UTF_16LE,
        confidence: 0.1,
    });
    candidates.push(FileEncoding {
        encoding: UTF_16BE,
        confidence: 0.1,
    });

    // Keep the highest-ranked entry per encoding
    let mut ranked: Vec<FileEncoding> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if !ranked.iter().any(|c| c.encoding == candidate.encoding) {
            ranked.push(candidate);
        }
    }
    ranked.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    ranked
}

/// Ranking function run by an [`EncodingProbe`]
pub type Ranker = fn(&[u8]) -> Vec<FileEncoding>;

/// Detects encodings on a helper thread with a timeout
#[derive(Clone)]
pub struct EncodingProbe {
    timeout: Duration,
    ranker: Ranker,
}

impl std::fmt::Debug for EncodingProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncodingProbe")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Default for EncodingProbe {
    fn default() -> Self {
        Self::new(DEFAULT_ENCODING_TIMEOUT)
    }
}

impl EncodingProbe {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            ranker: rank_encodings,
        }
    }

    /// Replace the ranking function (defaults to [`rank_encodings`])
    pub fn with_ranker(mut self, ranker: Ranker) -> Self {
        self.ranker = ranker;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Ranked candidate encodings for `bytes`
    ///
    /// # Errors
    ///
    /// `Timeout` when ranking takes longer than the configured budget
    pub fn detect_encodings(&self, bytes: &[u8]) -> Result<Vec<FileEncoding>> {
        let data = bytes.to_vec();
        let ranker = self.ranker;
        self.run_with_timeout("encoding detection", move || ranker(&data))
    }

    /// Decode `bytes` with the first candidate that decodes strictly
    ///
    /// Returns the text and the encoding that produced it.
    pub fn decode(&self, bytes: &[u8]) -> Result<(String, &'static Encoding)> {
        let candidates = self.detect_encodings(bytes)?;

        for candidate in &candidates {
            if let Some(text) = decode_strict(bytes, candidate.encoding) {
                tracing::debug!(
                    "Decoded with {} (confidence {:.1})",
                    candidate.name(),
                    candidate.confidence
                );
                return Ok((text, candidate.encoding));
            }
        }

        let tried: Vec<&str> = candidates.iter().map(|c| c.name()).collect();
        Err(DocsplitError::Encoding(format!(
            "no candidate encoding decodes the content (tried {})",
            tried.join(", ")
        )))
    }

    fn run_with_timeout<T, F>(&self, what: &str, work: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (tx, rx) = channel::bounded(1);

        thread::Builder::new()
            .name("docsplit-encoding".to_string())
            .spawn(move || {
                // Receiver may be gone after a timeout
                let _ = tx.send(work());
            })?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => Ok(result),
            Err(RecvTimeoutError::Timeout) => Err(DocsplitError::Timeout(format!(
                "{what} exceeded {}ms",
                self.timeout.as_millis()
            ))),
            Err(RecvTimeoutError::Disconnected) => Err(DocsplitError::Encoding(format!(
                "{what} thread exited without a result"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_sorted_descending() {
        let ranked = rank_encodings(b"plain ascii text");
        assert!(!ranked.is_empty());
        for pair in ranked.windows(2) {
            assert!(pair[0].confidence >= pair[1].confidence);
        }
    }

    #[test]
    fn test_rank_bom_first() {
        let ranked = rank_encodings(&[0xFF, 0xFE, b'h', 0, b'i', 0]);
        assert_eq!(ranked[0].encoding, UTF_16LE);
        assert_eq!(ranked[0].confidence, 1.0);
    }

    #[test]
    fn test_rank_no_duplicates() {
        let ranked = rank_encodings(b"caf\xe9 cr\xe8me br\xfbl\xe9e");
        for (i, a) in ranked.iter().enumerate() {
            for b in &ranked[i + 1..] {
                assert_ne!(a.encoding, b.encoding);
            }
        }
    }

    #[test]
    fn test_decode_latin1() {
        let probe = EncodingProbe::default();
        let bytes = b"Le caf\xe9 de la r\xe9union \xe9tait tr\xe8s appr\xe9ci\xe9 par l'\xe9quipe.";
        let (text, _) = probe.decode(bytes).unwrap();
        assert!(text.starts_with("Le café"));
        assert!(!text.contains('\u{FFFD}'));
    }

    #[test]
    fn test_decode_utf16_with_bom() {
        let probe = EncodingProbe::default();
        let (text, encoding) = probe.decode(&[0xFF, 0xFE, b'h', 0, b'i', 0]).unwrap();
        assert_eq!(text, "hi");
        assert_eq!(encoding, UTF_16LE);
    }

    #[test]
    fn test_decode_strict_rejects_malformed() {
        assert!(decode_strict(b"caf\xe9", encoding_rs::UTF_8).is_none());
        assert_eq!(decode_strict(b"caf\xc3\xa9", encoding_rs::UTF_8).unwrap(), "café");
    }

    #[test]
    fn test_looks_binary() {
        assert!(looks_binary(&[0u8; 64]));
        assert!(looks_binary(b"ELF\0\0\0"));
        assert!(!looks_binary(b"hello"));
        assert!(!looks_binary(&[0xFF, 0xFE, b'h', 0]));
    }

    #[test]
    fn test_timeout() {
        let probe = EncodingProbe::new(Duration::from_millis(20));
        let result = probe.run_with_timeout("slow detection", || {
            thread::sleep(Duration::from_millis(500));
            Vec::<FileEncoding>::new()
        });
        assert!(matches!(result, Err(DocsplitError::Timeout(_))));
    }

    fn slow_ranker(bytes: &[u8]) -> Vec<FileEncoding> {
        thread::sleep(Duration::from_millis(500));
        rank_encodings(bytes)
    }

    #[test]
    fn test_slow_ranker_times_out() {
        let probe = EncodingProbe::new(Duration::from_millis(20)).with_ranker(slow_ranker);
        let result = probe.decode(b"caf\xe9");
        assert!(matches!(result, Err(DocsplitError::Timeout(_))));
    }

    #[test]
    fn test_within_budget() {
        let probe = EncodingProbe::new(Duration::from_secs(5));
        let ranked = probe.detect_encodings(b"hello").unwrap();
        assert!(!ranked.is_empty());
    }
}
