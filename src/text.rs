//! Decoding raw text files into logical lines.
//!
//! Detection runs in a fixed order:
//! 1. an explicit override chosen by the caller
//! 2. a byte-order mark (UTF-8, UTF-16LE, UTF-16BE)
//! 3. strict UTF-8
//! 4. the designated legacy fallback (GBK by default). By default every
//!    byte must decode; [`DecodeOptions::with_min_confidence`] accepts a
//!    share of malformed sequences instead
//!
//! When nothing fits, [`EncodingError`] carries `chardetng`'s best guess so
//! the host can offer it as an override.
//!
//! Leading blank lines are kept so that line indices match the line numbers
//! of the source file.

use std::borrow::Cow;
use std::path::Path;

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, GBK, UTF_8};
use log::{debug, warn};
use memchr::memchr2_iter;
use serde::Serialize;

use crate::error::{EncodingError, Result};

/// One logical line of the normalized input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Line {
    /// 0-based position in the document. Dense and stable.
    pub index: usize,
    /// Line content without terminator or trailing whitespace.
    pub text: String,
}

impl Line {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }

    /// True when the line holds nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// How [`normalize`] picks an encoding.
#[derive(Debug, Clone, Copy)]
pub struct DecodeOptions {
    /// Skip detection and decode with this encoding.
    pub encoding_override: Option<&'static Encoding>,
    /// Legacy encoding tried when the input is not UTF-8.
    pub fallback: &'static Encoding,
    /// Minimum share of cleanly decoded characters for the fallback.
    /// `1.0` (the default) rejects any malformed sequence.
    pub min_confidence: f32,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            encoding_override: None,
            fallback: GBK,
            min_confidence: 1.0,
        }
    }
}

impl DecodeOptions {
    pub fn with_override(mut self, encoding: &'static Encoding) -> Self {
        self.encoding_override = Some(encoding);
        self
    }

    pub fn with_fallback(mut self, encoding: &'static Encoding) -> Self {
        self.fallback = encoding;
        self
    }

    pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = min_confidence;
        self
    }
}

/// Decoded document.
#[derive(Debug, Clone)]
pub struct NormalizedText {
    /// Encoding the bytes were decoded with.
    pub encoding: &'static Encoding,
    pub lines: Vec<Line>,
}

impl NormalizedText {
    pub fn encoding_name(&self) -> &'static str {
        self.encoding.name()
    }
}

/// Decode raw bytes and split them into lines.
///
/// Strips a leading byte-order mark, accepts `\r\n`, `\r` and `\n` as line
/// terminators, trims trailing whitespace on every line and drops blank lines
/// at the very end. Interior and leading blank lines are kept.
pub fn normalize(bytes: &[u8], options: &DecodeOptions) -> std::result::Result<NormalizedText, EncodingError> {
    let (text, encoding) = decode(bytes, options)?;
    let lines = split_lines(&text);
    debug!("decoded {} bytes as {} into {} lines", bytes.len(), encoding.name(), lines.len());
    Ok(NormalizedText { encoding, lines })
}

/// Split already-decoded text into lines, with the same rules as [`normalize`].
pub fn normalize_str(text: &str) -> Vec<Line> {
    split_lines(text.strip_prefix('\u{feff}').unwrap_or(text))
}

/// Read a file from disk and normalize it.
pub fn read_text_file<P: AsRef<Path>>(path: P, options: &DecodeOptions) -> Result<NormalizedText> {
    let bytes = std::fs::read(path)?;
    Ok(normalize(&bytes, options)?)
}

fn decode<'a>(
    bytes: &'a [u8],
    options: &DecodeOptions,
) -> std::result::Result<(Cow<'a, str>, &'static Encoding), EncodingError> {
    if let Some(encoding) = options.encoding_override {
        let (body, bom_len) = match Encoding::for_bom(bytes) {
            Some((bom_encoding, len)) if bom_encoding == encoding => (&bytes[len..], len),
            _ => (bytes, 0),
        };
        let (text, malformed) = encoding.decode_without_bom_handling(body);
        if malformed {
            warn!("input is not clean {}; malformed sequences were replaced", encoding.name());
        }
        debug!("decoding with override {} (bom {} bytes)", encoding.name(), bom_len);
        return Ok((strip_bom_char(text), encoding));
    }

    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, malformed) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        if malformed {
            warn!("{} input carries malformed sequences", encoding.name());
        }
        return Ok((text, encoding));
    }

    if let Some(text) = UTF_8.decode_without_bom_handling_and_without_replacement(bytes) {
        return Ok((text, UTF_8));
    }

    let fallback = options.fallback;
    let (text, _) = fallback.decode_without_bom_handling(bytes);
    let confidence = clean_share(&text);
    if confidence >= options.min_confidence {
        warn!(
            "input is not UTF-8; decoded as {} (confidence {:.3})",
            fallback.name(),
            confidence
        );
        return Ok((strip_bom_char(text), fallback));
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let (guess, _) = detector.guess_assess(None, false);
    Err(EncodingError {
        guess: guess.name(),
        confidence,
    })
}

/// Share of characters that are not replacement characters.
fn clean_share(text: &str) -> f32 {
    let mut total = 0usize;
    let mut replaced = 0usize;
    for c in text.chars() {
        total += 1;
        if c == char::REPLACEMENT_CHARACTER {
            replaced += 1;
        }
    }
    if total == 0 {
        return 1.0;
    }
    1.0 - replaced as f32 / total as f32
}

fn strip_bom_char(text: Cow<'_, str>) -> Cow<'_, str> {
    match text {
        Cow::Borrowed(s) => Cow::Borrowed(s.strip_prefix('\u{feff}').unwrap_or(s)),
        Cow::Owned(s) => match s.strip_prefix('\u{feff}') {
            Some(rest) => Cow::Owned(rest.to_string()),
            None => Cow::Owned(s),
        },
    }
}

fn split_lines(text: &str) -> Vec<Line> {
    let bytes = text.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    let mut pending_lf = None;

    // \r and \n are ASCII, so every split point is a char boundary.
    for pos in memchr2_iter(b'\r', b'\n', bytes) {
        if pending_lf == Some(pos) {
            start = pos + 1;
            continue;
        }
        lines.push(Line::new(lines.len(), text[start..pos].trim_end()));
        if bytes[pos] == b'\r' && bytes.get(pos + 1) == Some(&b'\n') {
            pending_lf = Some(pos + 1);
        }
        start = pos + 1;
    }
    lines.push(Line::new(lines.len(), text[start..].trim_end()));

    while lines.last().is_some_and(|line| line.text.is_empty()) {
        lines.pop();
    }
    lines
}
