//! Error types for configuration loading and queries.

use std::fmt;

/// What an out-of-range index was pointing at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    /// A server index.
    Server,
    /// A partition (vbucket) id.
    Vbucket,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKind::Server => write!(f, "server"),
            IndexKind::Vbucket => write!(f, "vbucket"),
        }
    }
}

/// Errors that can occur while filling or querying a [`Config`](crate::Config).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The document is not a parseable JSON object.
    #[error("malformed json: {0}")]
    MalformedJson(String),

    /// The document parsed, but does not describe a valid cluster.
    #[error("malformed config: {0}")]
    MalformedConfig(String),

    /// Generator called with impossible dimensions.
    #[error("invalid generator arguments: {0}")]
    InvalidGeneratorArgs(String),

    /// An index outside the valid range for the config.
    #[error("{kind} index {index} out of range (have {len})")]
    IndexOutOfRange {
        kind: IndexKind,
        index: usize,
        len: usize,
    },
}

impl ConfigError {
    /// Returns true if this error came from reading a config document.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            ConfigError::MalformedJson(_) | ConfigError::MalformedConfig(_)
        )
    }

    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        ConfigError::MalformedConfig(msg.into())
    }

    pub(crate) fn server_out_of_range(index: usize, len: usize) -> Self {
        ConfigError::IndexOutOfRange {
            kind: IndexKind::Server,
            index,
            len,
        }
    }
}
