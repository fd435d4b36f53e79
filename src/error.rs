//! Error types.
//!
//! Assertion failures are not errors: they are recorded as failed
//! [`AssertionResult`](crate::testing::AssertionResult)s. The types here cover
//! what stops a single scenario (`ExecutionError`), what stops the CLI before a
//! run (`SuiteError`) and what can go wrong while publishing (`ReportError`).

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Coarse classification of a scenario-level failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Template,
    Http,
    Timeout,
}

/// Failure raised by the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Invalid header `{name}`: {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("Request timed out: {0}")]
    TimedOut(String),

    #[error("Request failed: {0}")]
    Failed(String),
}

/// Why a scenario could not produce a response capture.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error("missing path parameter `{key}` in `{template}`")]
    Template { template: String, key: String },

    #[error("unresolved variable `{variable}` in `{value}`")]
    UnresolvedVariable { variable: String, value: String },

    #[error("malformed placeholder in `{template}`: {reason}")]
    MalformedTemplate { template: String, reason: String },

    #[error("Invalid URL `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("{}", http_message(.status, .message))]
    Http { status: Option<u16>, message: String },

    #[error("Timeout: {0}")]
    Timeout(String),
}

fn http_message(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(status) => format!("HTTP {status}: {message}"),
        None => message.to_string(),
    }
}

impl ExecutionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExecutionError::Template { .. }
            | ExecutionError::UnresolvedVariable { .. }
            | ExecutionError::MalformedTemplate { .. }
            | ExecutionError::InvalidUrl { .. } => ErrorKind::Template,
            ExecutionError::Http { .. } => ErrorKind::Http,
            ExecutionError::Timeout(_) => ErrorKind::Timeout,
        }
    }
}

impl From<TransportError> for ExecutionError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::TimedOut(message) => ExecutionError::Timeout(message),
            other => ExecutionError::Http {
                status: None,
                message: other.to_string(),
            },
        }
    }
}

/// Failure while loading or validating a suite document.
#[derive(Debug, Error)]
pub enum SuiteError {
    #[error("Failed to read suite file `{}`: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse suite document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unknown environment `{0}`")]
    UnknownEnvironment(String),

    #[error("Invalid variable override `{0}`, expected KEY=VALUE")]
    InvalidVariable(String),

    #[error("Invalid suite: {0}")]
    Invalid(String),
}

/// Failure while publishing a suite result.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}
