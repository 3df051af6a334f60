/// Failures raised by identity providers, candidate sources and configuration.
///
/// These are the raw failures; [`AuthError`](crate::session::AuthError) is the
/// classified form handed to the presentation layer.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("{operation} rejected (status {status:?}, code {code:?}): {detail}")]
    Rejected {
        operation: &'static str,
        status: Option<u16>,
        code: Option<String>,
        detail: String,
    },
    #[cfg(feature = "http")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Provider unreachable: {0}")]
    Unreachable(String),
    #[error("Malformed provider response: {0}")]
    Decode(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Machine-readable error code reported by the provider, if any.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Rejected { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}
