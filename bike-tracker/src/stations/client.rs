//! Upstream station feed client.

use std::future::Future;
use std::time::Duration;

use crate::config::{RefreshConfig, Source};

use super::error::{FetchError, FetchErrorKind};
use super::record::StationRecord;

/// Longest upstream error body kept in a [`FetchErrorKind::Status`].
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Fetches one batch of station records from a source.
///
/// Implementations are stateless: no caching, no merging.
pub trait StationFetcher: Send + Sync + 'static {
    /// Fetch one page of a paginated source (`page` is zero-based), or the
    /// whole of a single-shot source (`page` is ignored).
    ///
    /// An empty result from a paginated source means there is no more data.
    /// A single-shot source never yields an empty result; that is reported
    /// as [`FetchErrorKind::EmptyResponse`].
    fn fetch(
        &self,
        source: &Source,
        page: Option<u32>,
    ) -> impl Future<Output = Result<Vec<StationRecord>, FetchError>> + Send;
}

/// Configuration for the HTTP fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcherConfig {
    /// Request timeout
    pub timeout: Duration,
    /// Records requested per page
    pub page_size: u32,
}

impl HttpFetcherConfig {
    pub fn new(timeout: Duration, page_size: u32) -> Self {
        Self { timeout, page_size }
    }

    pub fn from_refresh(refresh: &RefreshConfig) -> Self {
        Self::new(refresh.request_timeout(), refresh.page_size)
    }
}

/// Fetcher for the public JSON station feeds.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: reqwest::Client,
    page_size: u32,
}

impl HttpFetcher {
    pub fn new(config: HttpFetcherConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http,
            page_size: config.page_size,
        })
    }
}

impl StationFetcher for HttpFetcher {
    async fn fetch(
        &self,
        source: &Source,
        page: Option<u32>,
    ) -> Result<Vec<StationRecord>, FetchError> {
        let url = source.url();
        let page = page.filter(|_| source.is_paginated());
        let fail = |kind: FetchErrorKind| FetchError::new(url, page, kind);

        let mut request = self.http.get(url);
        if let Some(page) = page {
            request = request.query(&[("page", page), ("size", self.page_size)]);
        }

        let response = request.send().await.map_err(|e| fail(classify(e)))?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(fail(FetchErrorKind::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            }));
        }

        let body = response.text().await.map_err(|e| fail(classify(e)))?;
        if body.trim().is_empty() && !source.is_paginated() {
            return Err(fail(FetchErrorKind::EmptyResponse));
        }

        match parse_stations(&body) {
            Ok(Some(records)) if !records.is_empty() => Ok(records),
            Ok(_) if !source.is_paginated() => Err(fail(FetchErrorKind::EmptyResponse)),
            // `[]` and `null` both end pagination
            Ok(Some(records)) => Ok(records),
            Ok(None) => Ok(Vec::new()),
            Err(message) => Err(fail(FetchErrorKind::Json { message })),
        }
    }
}

fn classify(err: reqwest::Error) -> FetchErrorKind {
    if err.is_timeout() {
        FetchErrorKind::Timeout
    } else {
        FetchErrorKind::Http(err)
    }
}

/// Parse a feed body. `Ok(None)` is a JSON `null`; a blank body is malformed.
fn parse_stations(body: &str) -> Result<Option<Vec<StationRecord>>, String> {
    if body.trim().is_empty() {
        return Err("empty body".to_string());
    }
    serde_json::from_str(body).map_err(|e| e.to_string())
}
