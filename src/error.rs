//! Error types for the intention scheduler crate

use thiserror::Error;

/// Main error type for the intention scheduler crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid decision from agent {agent}: {reason}")]
    InvalidDecision { agent: usize, reason: String },

    #[error("invalid forest '{forest}': {reason}")]
    InvalidForest { forest: String, reason: String },

    #[error("unknown node id {id}")]
    UnknownNode { id: usize },

    #[error("node {id} is not a {expected} node")]
    UnexpectedNodeKind { id: usize, expected: &'static str },

    #[error("invalid condition '{input}' (expected a literal name, optionally prefixed by '!' or '~')")]
    InvalidCondition { input: String },

    #[error("invalid match configuration: {message}")]
    InvalidMatch { message: String },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("scheduler '{scheduler}' was asked for a decision before load_match_details")]
    UnboundScheduler { scheduler: String },

    #[error("invalid scheduler kind '{input}'. Expected one of: {expected}")]
    ParseSchedulerKind { input: String, expected: String },

    #[error("invalid vision type '{input}'. Expected one of: {expected}")]
    ParseVisionType { input: String, expected: String },

    #[error("invalid alliance type '{input}'. Expected one of: {expected}")]
    ParseAllianceType { input: String, expected: String },

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("progress bar template error: {message}")]
    ProgressBarTemplate { message: String },
}

/// Convenience type alias for Results using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io {
            operation: "IO operation".to_string(),
            source,
        }
    }
}

impl Error {
    /// Wrap an IO error with a description of the failed operation.
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Error::Io {
            operation: operation.into(),
            source,
        }
    }
}
