use thiserror::Error;
use tokio::io;

/// Errors surfaced by the worker.
///
/// Only [`Error::InvalidResource`] is scoped to a single resource: it is logged and the resource dropped while the batch goes on.
/// Every other variant is fatal to a run and is reported before any worker gets started.
#[derive(Debug, Error)]
pub enum Error {
    /// A resource is missing required fields or has ill-typed ones. Never retried.
    #[error("invalid resource body: {0}")]
    InvalidResource(#[source] serde_json::Error),
    /// The input source could not be reached or answered with a non-success status.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The input source answered with something else than a list of records.
    #[error("malformed resource list: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("unsupported input scheme `{0}`")]
    UnsupportedScheme(String),
}

impl Error {
    /// Whether this error only concerns the resource at hand rather than the whole run.
    #[inline]
    pub fn is_invalid_resource(&self) -> bool {
        matches!(self, Self::InvalidResource(_))
    }
}
