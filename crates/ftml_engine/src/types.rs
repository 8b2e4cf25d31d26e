use std::fmt;
use std::path::PathBuf;

use ftml_core::MetadataError;

use crate::content::ContentError;
use crate::decode::DecodeError;

/// Input-structure failures: the export on disk is not what the converter expects.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("cannot read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot decode {path:?}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },
    #[error("malformed topic {path:?}: {source}")]
    Content {
        path: PathBuf,
        #[source]
        source: ContentError,
    },
    #[error("bad metadata in {path:?}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: MetadataError,
    },
    #[error("{path:?} has no `{key}` meta")]
    MissingMeta { path: PathBuf, key: String },
    #[error("invalid selector `{0}`")]
    Selector(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct PublishError {
    pub kind: PublishFailure,
    pub message: String,
}

impl PublishError {
    pub(crate) fn new(kind: PublishFailure, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishFailure {
    InvalidUrl,
    LoginRejected(u16),
    Unauthorized(u16),
    SourceNotFound,
    HttpStatus(u16),
    Timeout,
    Network,
    Io,
    InvalidResponse,
}

impl fmt::Display for PublishFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishFailure::InvalidUrl => write!(f, "invalid portal url"),
            PublishFailure::LoginRejected(code) => write!(f, "login rejected (http {code})"),
            PublishFailure::Unauthorized(code) => {
                write!(f, "credentials rejected as unauthorized (http {code})")
            }
            PublishFailure::SourceNotFound => write!(f, "portal instance or api not found"),
            PublishFailure::HttpStatus(code) => write!(f, "http status {code}"),
            PublishFailure::Timeout => write!(f, "timeout"),
            PublishFailure::Network => write!(f, "network error"),
            PublishFailure::Io => write!(f, "io error"),
            PublishFailure::InvalidResponse => write!(f, "invalid response body"),
        }
    }
}
