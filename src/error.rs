use thiserror::Error;

/// Cadence's crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Cadence's crate-wide error type.
///
/// This is intentionally decoupled from `anyhow` so downstream libraries aren't forced to
/// adopt `anyhow` in their own public APIs. Adapter implementations are free to build their
/// `pull`/`reset` errors out of anything that converts into [`anyhow::Error`]; the orchestrator
/// only ever surfaces them wrapped in [`Error::AdapterPull`].
#[derive(Debug, Error)]
pub enum Error {
    /// `Adapter::pull` failed. Propagated verbatim; the orchestrator does not retry.
    #[error("adapter pull failed: {0}")]
    AdapterPull(#[source] anyhow::Error),

    /// A timeline or scene record could not be decoded (bad base64, missing field, ...).
    ///
    /// Carries a description of the offending record so callers (notably the `replay` binary)
    /// can name the bad entry in their error output.
    #[error("malformed timeline record: {0}")]
    Encoding(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn adapter_pull(err: impl Into<anyhow::Error>) -> Self {
        Self::AdapterPull(err.into())
    }
}
