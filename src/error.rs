//! Error types for novelbind operations.

use thiserror::Error;

/// The byte stream could not be decoded with enough confidence.
///
/// Recovery requires the caller to pick an encoding explicitly
/// (see [`DecodeOptions::encoding_override`](crate::DecodeOptions)).
#[derive(Error, Debug, Clone, PartialEq)]
#[error("cannot determine text encoding (best guess {guess}, confidence {confidence:.3})")]
pub struct EncodingError {
    /// Name of the statistically most likely encoding.
    pub guess: &'static str,
    /// Share of characters the fallback encoding decoded cleanly.
    pub confidence: f32,
}

/// What went wrong with a single rule.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternFault {
    #[error("regex: {0}")]
    Regex(String),

    #[error("replacement: {0}")]
    Template(String),
}

/// A rule failed to compile. Compilation is all-or-nothing, so one of these
/// invalidates the whole rule set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid rule {position} in level {level} ({level_name}): {fault} [{rule}]")]
pub struct InvalidPatternError {
    /// 1-based level number.
    pub level: usize,
    pub level_name: String,
    /// 1-based position of the rule within its level.
    pub position: usize,
    /// The rule text as written.
    pub rule: String,
    pub fault: PatternFault,
}

/// Caller violated a contract of the core. Not recoverable; fix the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreconditionError {
    #[error("line index {index} out of range (document has {len} lines)")]
    LineOutOfRange { index: usize, len: usize },

    #[error("line indices must be dense from 0: expected {expected}, found {found}")]
    NonDenseLines { expected: usize, found: usize },
}

/// Errors that can occur while converting a text file to a book.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    InvalidPattern(#[from] InvalidPatternError),

    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    #[error(transparent)]
    Edit(#[from] crate::toc::EditError),

    #[error("invalid rules file: {0}")]
    Config(#[from] toml::de::Error),

    #[error("cannot serialize rules: {0}")]
    ConfigWrite(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
