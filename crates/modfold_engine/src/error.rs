//! Fatal error types for engine initialization.
//!
//! Almost everything in this crate degrades through the advisory
//! [`ErrorSink`](crate::diag::ErrorSink) instead of returning errors. The
//! variants here cover the only conditions that short-circuit a session:
//! the file-system backend cannot be constructed, or the session
//! configuration itself is unusable.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort session construction.
#[derive(Error, Debug)]
pub enum Error {
    /// No factory registered under the requested backend key.
    #[error("unknown file-system backend `{0}`")]
    UnknownBackend(String),

    /// A registered backend factory failed to construct its file system.
    #[error("backend `{key}` failed to construct: {reason}")]
    BackendConstruction { key: String, reason: String },

    /// A merge-rule pattern is not a valid glob.
    #[error("invalid merge rule pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}
