//! Paginated traversal of resource collections.
//!
//! The API paginates list responses with an opaque continuation token.
//! [`Pager`] hides the token bookkeeping: `next()` yields one item at a time
//! and fetches fresh pages as the in-memory page drains, `all()` drains the
//! collection into a Vec. A pager is single-pass; restart by constructing a
//! new one.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

use crate::error::ClientError;

/// Optional listing filters.
///
/// `limit` caps the page size requested per round-trip, not the total result
/// count. Label predicates are exact key/value equalities, ANDed together.
/// The default means no filtering and the server's default page size.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub limit: Option<u32>,
    pub labels: BTreeMap<String, String>,
}

impl ListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Encode as query parameters; filtering happens server-side.
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(limit) = self.limit {
            query.push(("limit".to_string(), limit.to_string()));
        }
        for (key, value) in &self.labels {
            query.push((format!("label.{key}"), value.clone()));
        }
        query
    }
}

/// One page of a listed collection. `next_token` is absent on the last page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

/// One page-fetch round-trip. Scope and filters are bound at construction;
/// only the continuation token varies between calls.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    type Item: Send;

    async fn fetch_page(&self, token: Option<&str>) -> Result<Page<Self::Item>, ClientError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PagerState {
    Fresh,
    PageLoaded,
    Exhausted,
    Errored,
}

/// Single-pass iterator over a server-paginated collection.
///
/// Items come back in the order the server emits them across pages. After a
/// fetch error the pager is terminal: the error is surfaced at the `next()`
/// that triggered it, items already yielded remain valid, and subsequent
/// calls yield no further items.
pub struct Pager<F: PageFetcher> {
    fetcher: F,
    buffer: VecDeque<F::Item>,
    next_token: Option<String>,
    state: PagerState,
}

impl<F: PageFetcher> Pager<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            buffer: VecDeque::new(),
            next_token: None,
            state: PagerState::Fresh,
        }
    }

    /// Next item, crossing page boundaries transparently. `Ok(None)` means
    /// the collection is exhausted and keeps being returned on further calls.
    pub async fn next(&mut self) -> Result<Option<F::Item>, ClientError> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                return Ok(Some(item));
            }
            let token = match self.state {
                PagerState::Exhausted | PagerState::Errored => return Ok(None),
                PagerState::Fresh => None,
                PagerState::PageLoaded => match self.next_token.take() {
                    Some(token) => Some(token),
                    None => {
                        self.state = PagerState::Exhausted;
                        return Ok(None);
                    }
                },
            };
            match self.fetcher.fetch_page(token.as_deref()).await {
                Ok(page) => {
                    self.buffer = page.items.into();
                    self.next_token = page.next_token;
                    self.state = PagerState::PageLoaded;
                }
                Err(e) => {
                    self.state = PagerState::Errored;
                    return Err(e);
                }
            }
        }
    }

    /// Drain to completion, in server order.
    pub async fn all(mut self) -> Result<Vec<F::Item>, ClientError> {
        let mut items = Vec::new();
        while let Some(item) = self.next().await? {
            items.push(item);
        }
        Ok(items)
    }
}
