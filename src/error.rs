//! Error types for the LLM council

use std::time::Duration;

use thiserror::Error;

/// Problems with the council configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid router type: {0}. Must be 'openrouter' or 'ollama'")]
    InvalidRouter(String),

    #[error("No API key configured for {0}")]
    MissingApiKey(String),

    #[error("Council has no members")]
    EmptyCouncil,

    #[error("Model {0} appears more than once in the council")]
    DuplicateModel(String),

    #[error("Invalid timeout for {name}: {value}")]
    InvalidTimeout { name: &'static str, value: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Failure category of a single model query, used for diagnostics only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Connectivity,
    Protocol,
    Timeout,
    Decode,
    Unclassified,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Connectivity => "connectivity",
            FailureKind::Protocol => "protocol",
            FailureKind::Timeout => "timeout",
            FailureKind::Decode => "decode",
            FailureKind::Unclassified => "unclassified",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why one model failed to answer.
///
/// Never surfaces to the dispatcher's caller: clients hand it to their
/// [`QueryObserver`](crate::llm::QueryObserver) and return `None`.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("cannot connect to {endpoint}: {message}")]
    Connectivity { endpoint: String, message: String },

    #[error("status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request took longer than {}s", .timeout.as_secs_f64())]
    Timeout { timeout: Duration },

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("unexpected error: {0}")]
    Unclassified(String),
}

impl QueryError {
    pub fn kind(&self) -> FailureKind {
        match self {
            QueryError::Connectivity { .. } => FailureKind::Connectivity,
            QueryError::Status { .. } => FailureKind::Protocol,
            QueryError::Timeout { .. } => FailureKind::Timeout,
            QueryError::Decode(_) => FailureKind::Decode,
            QueryError::Unclassified(_) => FailureKind::Unclassified,
        }
    }

    /// Classify a transport error from reqwest.
    ///
    /// Timeout is checked first: a connect timeout reports as both.
    pub fn from_transport(err: reqwest::Error, endpoint: &str, timeout: Duration) -> Self {
        if err.is_timeout() {
            QueryError::Timeout { timeout }
        } else if err.is_connect() {
            QueryError::Connectivity {
                endpoint: endpoint.to_string(),
                message: err.to_string(),
            }
        } else if err.is_decode() || err.is_body() {
            QueryError::Decode(err.to_string())
        } else {
            QueryError::Unclassified(err.to_string())
        }
    }
}
