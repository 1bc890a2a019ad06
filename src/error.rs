//! Error taxonomy for the mirror engine
//!
//! Setup-class errors abort the whole run. Everything else is scoped to a single
//! repository and is caught by the sync engine, which logs it and moves on.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MirrorError>;

#[derive(Error, Debug)]
pub enum MirrorError {
    /// Missing credentials, unresolvable namespace, unknown filter target
    #[error("setup failed: {0}")]
    Setup(String),

    /// The source host refused the first page of the repository listing
    #[error("cannot list source repositories: HTTP {status}: {body}")]
    SourceListing { status: u16, body: String },

    /// Any non-2xx from a destination API other than a lookup 404
    #[error("{provider} API error {status}: {body}")]
    ProviderApi {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("git {operation} failed: {detail}")]
    Git {
        operation: &'static str,
        detail: String,
    },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid URL: {0}")]
    Url(String),
}

impl MirrorError {
    /// Whether this error must abort the run rather than skip one repository
    pub fn is_fatal(&self) -> bool {
        matches!(self, MirrorError::Setup(_) | MirrorError::SourceListing { .. })
    }

    pub(crate) fn setup(message: impl Into<String>) -> Self {
        MirrorError::Setup(message.into())
    }
}

impl From<url::ParseError> for MirrorError {
    fn from(err: url::ParseError) -> Self {
        MirrorError::Url(err.to_string())
    }
}
