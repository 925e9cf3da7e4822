//! Scripted station fetcher for tests.
//!
//! Responses are queued per `(url, page)`. The last queued response for a
//! key is sticky, so a source keeps answering the same way across passes.
//! Unscripted paginated pages are empty (end of data); unscripted
//! single-shot sources fail with an empty response.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::config::Source;

use super::client::StationFetcher;
use super::error::{FetchError, FetchErrorKind};
use super::record::StationRecord;

type Key = (String, Option<u32>);

#[derive(Clone)]
enum Scripted {
    Records(Vec<StationRecord>),
    Timeout,
    Empty,
}

#[derive(Default)]
pub struct ScriptedFetcher {
    responses: Mutex<HashMap<Key, VecDeque<Scripted>>>,
    calls: Mutex<Vec<Key>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, url: &str, page: Option<u32>, response: Scripted) {
        self.responses
            .lock()
            .unwrap()
            .entry((url.to_string(), page))
            .or_default()
            .push_back(response);
    }

    /// Queue a batch of records.
    pub fn push_records(&self, url: &str, page: Option<u32>, records: Vec<StationRecord>) {
        self.push(url, page, Scripted::Records(records));
    }

    /// Queue a timeout failure.
    pub fn push_timeout(&self, url: &str, page: Option<u32>) {
        self.push(url, page, Scripted::Timeout);
    }

    /// Queue an empty-response failure.
    pub fn push_empty(&self, url: &str, page: Option<u32>) {
        self.push(url, page, Scripted::Empty);
    }

    /// Every `(url, page)` requested so far, in order.
    pub fn calls(&self) -> Vec<(String, Option<u32>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Requests made to one url.
    pub fn calls_to(&self, url: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(u, _)| u == url)
            .count()
    }

    fn next(&self, key: &Key) -> Option<Scripted> {
        let mut responses = self.responses.lock().unwrap();
        let queue = responses.get_mut(key)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

impl StationFetcher for ScriptedFetcher {
    async fn fetch(
        &self,
        source: &Source,
        page: Option<u32>,
    ) -> Result<Vec<StationRecord>, FetchError> {
        let page = page.filter(|_| source.is_paginated());
        let key = (source.url().to_string(), page);
        self.calls.lock().unwrap().push(key.clone());

        let fail = |kind: FetchErrorKind| -> Result<Vec<StationRecord>, FetchError> {
            Err(FetchError::new(source.url(), page, kind))
        };
        match self.next(&key) {
            Some(Scripted::Records(records)) if records.is_empty() && !source.is_paginated() => {
                fail(FetchErrorKind::EmptyResponse)
            }
            Some(Scripted::Records(records)) => Ok(records),
            Some(Scripted::Timeout) => fail(FetchErrorKind::Timeout),
            Some(Scripted::Empty) => fail(FetchErrorKind::EmptyResponse),
            None if source.is_paginated() => Ok(Vec::new()),
            None => fail(FetchErrorKind::EmptyResponse),
        }
    }
}
