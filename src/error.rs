// src/error.rs
use reqwest::StatusCode;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("secret key is not valid base64: {source}")]
    InvalidCredentialFormat {
        #[from]
        source: base64::DecodeError,
    },

    #[error("failed to fetch {url}: {reason}")]
    ResourceFetch {
        url: String,
        status: Option<StatusCode>,
        reason: String,
    },

    #[error("response field `{field}` {problem}")]
    SchemaMismatch {
        field: &'static str,
        problem: SchemaProblem,
    },

    #[error("failed to publish points: {reason}")]
    Publish { reason: String },

    #[error("configuration error: {reason}")]
    Configuration { reason: String },
}

/// Why a response field could not be projected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaProblem {
    Missing,
    WrongType { expected: &'static str, found: String },
}

impl std::fmt::Display for SchemaProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaProblem::Missing => f.write_str("is missing"),
            SchemaProblem::WrongType { expected, found } => {
                write!(f, "has wrong type: expected {expected}, found {found}")
            }
        }
    }
}

impl Error {
    pub(crate) fn fetch(url: &str, reason: impl std::fmt::Display) -> Self {
        Error::ResourceFetch {
            url: url.to_string(),
            status: None,
            reason: reason.to_string(),
        }
    }

    pub(crate) fn publish(reason: impl std::fmt::Display) -> Self {
        Error::Publish {
            reason: reason.to_string(),
        }
    }

    pub(crate) fn config(reason: impl std::fmt::Display) -> Self {
        Error::Configuration {
            reason: reason.to_string(),
        }
    }

    /// Name of the offending response field, for schema mismatches.
    pub fn schema_field(&self) -> Option<&'static str> {
        match self {
            Error::SchemaMismatch { field, .. } => Some(field),
            _ => None,
        }
    }
}
