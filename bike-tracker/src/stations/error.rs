//! Station feed error types.

use std::fmt;

/// What went wrong with a single upstream request.
#[derive(Debug, thiserror::Error)]
pub enum FetchErrorKind {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    /// Request did not complete within the timeout
    #[error("request timed out")]
    Timeout,

    /// Upstream returned an error status
    #[error("upstream error {status}: {body}")]
    Status { status: u16, body: String },

    /// Body was not a JSON array of stations
    #[error("JSON parse error: {message}")]
    Json { message: String },

    /// Single-shot feed returned nothing
    #[error("empty response")]
    EmptyResponse,
}

/// A failed fetch, naming the source and page it came from.
///
/// Every fetch failure is retryable: nothing about it is cached.
#[derive(Debug)]
pub struct FetchError {
    pub url: String,
    pub page: Option<u32>,
    pub kind: FetchErrorKind,
}

impl FetchError {
    pub fn new(url: impl Into<String>, page: Option<u32>, kind: FetchErrorKind) -> Self {
        Self {
            url: url.into(),
            page,
            kind,
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fetch from {}", self.url)?;
        if let Some(page) = self.page {
            write!(f, " (page {page})")?;
        }
        write!(f, " failed: {}", self.kind)
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}
