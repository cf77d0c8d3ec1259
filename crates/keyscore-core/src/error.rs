//! Error types for the extraction and scoring pipeline.
//!
//! Heuristic misses inside the extractor are deliberately absent here: a
//! field or answer grid that cannot be found degrades to a placeholder and is
//! logged, never raised.

use thiserror::Error;

/// Errors that can occur while fetching an answer-key page.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The URL could not be parsed or uses an unsupported scheme.
    #[error("invalid answer key URL: {0}")]
    InvalidUrl(String),

    /// More redirects than the cap were returned.
    #[error("too many redirects ({0}) when fetching answer key")]
    TooManyRedirects(usize),

    /// A redirect response arrived without a `Location` header.
    #[error("redirect response (HTTP {status}) without location header")]
    MissingLocation { status: u16 },

    /// The final response was not successful.
    #[error("failed to fetch answer key: HTTP {status} {reason}")]
    Status { status: u16, reason: String },

    /// The overall fetch deadline elapsed.
    #[error("fetching answer key timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    Network(String),
}

/// Errors caused by the caller's submission rather than by the pipeline.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("Please provide either an answer key URL or upload a PDF file.")]
    MissingSource,

    #[error("answer key URL is empty")]
    EmptyUrl,

    #[error("Please enter a valid URL or type 'demo' to test")]
    InvalidUrl,

    #[error("PDF parsing not implemented yet. Please use URL for now.")]
    DocumentUnsupported,

    #[error("{0} is required")]
    MissingField(&'static str),
}

/// Errors raised by a population store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing snapshot could not be read or written.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing snapshot is not valid JSON.
    #[error("store snapshot is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// A write referenced an entity that does not exist.
    #[error("{kind} not found: {id}")]
    MissingReference { kind: &'static str, id: String },
}

/// Errors that fail a whole submission.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from a result lookup. The two "not found" cases stay distinct so a
/// caller can tell a missing candidate from a missing result.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Candidate not found")]
    CandidateNotFound,

    #[error("Results not found")]
    ResultNotFound,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SubmitError {
    /// Returns `true` if the caller should fix the request rather than retry.
    pub fn is_input_error(&self) -> bool {
        matches!(self, SubmitError::Input(_))
    }
}
