use thiserror::Error;

use crate::object::ObjectId;

/// The single error type that crosses the crate boundary.
///
/// Every failure that can be attributed to a specific object, page, or
/// stream is caught and downgraded internally (logged via `log::warn!` or
/// `log::error!`) rather than propagated here. This variant only fires when
/// the input cannot be treated as a PDF at all.
#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("not a readable PDF document: {0}")]
    UnreadableDocument(String),
}

/// Internal parse-level failures. Never escapes `Document::parse`.
#[derive(Error, Debug, Clone)]
pub(crate) enum ParseError {
    #[error("invalid file header")]
    InvalidFileHeader,
    #[error("invalid object while parsing offset {0}")]
    InvalidObject(usize),
    #[error("invalid dictionary")]
    InvalidDictionary,
    #[error("invalid stream")]
    InvalidStream,
    #[error("invalid xref table")]
    InvalidXref,
    #[error("maximum nesting depth exceeded")]
    DepthExceeded,
    #[error("offset {0} out of bounds")]
    OutOfBounds(usize),
}

/// Internal xref-resolution failures. Never escapes `Document::parse`.
#[derive(Error, Debug, Clone)]
pub(crate) enum XrefError {
    #[error("could not locate startxref")]
    Start,
    #[error("could not locate previous xref section")]
    PrevStart,
    #[error("could not locate hybrid xref stream")]
    StreamStart,
    #[error("xref table is malformed")]
    Malformed,
    #[error("no usable trailer dictionary found")]
    NoTrailer,
    #[error("no /Root catalog reachable from trailer")]
    NoRoot,
}

/// Internal per-object failures, produced while resolving/decoding a
/// specific object. Callers downgrade these to a skipped object and a log
/// line; they never reach `Document::parse`/`Document::extract` callers.
#[derive(Error, Debug, Clone)]
pub(crate) enum ObjectError {
    #[error("reference cycle detected resolving object {0:?}")]
    ReferenceCycle(ObjectId),
    #[error("no xref entry for object {0:?}")]
    MissingXrefEntry(ObjectId),
    #[error("object {0:?} is not of the expected type")]
    TypeMismatch(ObjectId),
    #[error("object {0:?} offset out of bounds")]
    InvalidOffset(ObjectId),
    #[error("stream for object {0:?} is missing its /Length entry")]
    MissingLength(ObjectId),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Xref(#[from] XrefError),
}

pub(crate) type PResult<T> = std::result::Result<T, ParseError>;
pub(crate) type OResult<T> = std::result::Result<T, ObjectError>;
pub type Result<T> = std::result::Result<T, Error>;
