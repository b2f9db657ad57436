//! Fetch-once news feed shown on the dashboard.
//!
//! A cached digest (if any) is shown immediately; the live fetch then
//! replaces it and refreshes the cache. A failed fetch keeps whatever was
//! already on screen.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::payload::{Article, NewsDigest};
use crate::storage::SharedStorage;

pub const DASHBOARD_CACHE_KEY: &str = "dashboard_cache_v4_news";

/// Most cards shown on the dashboard
pub const MAX_CARDS: usize = 20;
/// Summary length on a collapsed card
pub const CARD_SUMMARY_CHARS: usize = 140;
/// Key points shown on an expanded card
pub const CARD_KEY_POINTS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub enum FeedState {
    Loading,
    Ready(NewsDigest),
    /// Nothing to show: the fetch failed or returned no articles
    Empty,
}

#[derive(Serialize, Deserialize, Default)]
struct DashboardCache {
    #[serde(default)]
    news: Option<NewsDigest>,
}

pub struct DashboardFeed {
    storage: SharedStorage,
    state: FeedState,
}

impl DashboardFeed {
    pub fn new(storage: SharedStorage) -> Self {
        let cached = storage
            .get(DASHBOARD_CACHE_KEY)
            .and_then(|raw| serde_json::from_str::<DashboardCache>(&raw).ok())
            .and_then(|c| c.news);

        let state = match cached {
            Some(news) => settle(news),
            None => FeedState::Loading,
        };
        Self { storage, state }
    }

    pub fn state(&self) -> &FeedState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == FeedState::Loading
    }

    pub fn digest(&self) -> Option<&NewsDigest> {
        match &self.state {
            FeedState::Ready(digest) => Some(digest),
            _ => None,
        }
    }

    /// Cards to render, capped at [`MAX_CARDS`]
    pub fn articles(&self) -> &[Article] {
        match self.digest() {
            Some(digest) => &digest.articles[..digest.articles.len().min(MAX_CARDS)],
            None => &[],
        }
    }

    /// Apply the result of the live fetch
    pub fn apply(&mut self, outcome: Result<NewsDigest, ApiError>) {
        match outcome {
            Ok(news) => {
                info!(articles = news.articles.len(), "dashboard feed loaded");
                self.persist(&news);
                self.state = settle(news);
            }
            Err(e) => {
                warn!(error = %e, "dashboard fetch failed");
                if self.state == FeedState::Loading {
                    self.state = FeedState::Empty;
                }
            }
        }
    }

    fn persist(&self, news: &NewsDigest) {
        let cache = DashboardCache {
            news: Some(news.clone()),
        };
        let result = serde_json::to_string(&cache)
            .map_err(anyhow::Error::from)
            .and_then(|json| self.storage.set(DASHBOARD_CACHE_KEY, &json));
        if let Err(e) = result {
            warn!(error = %e, "could not cache dashboard feed");
        }
    }
}

fn settle(news: NewsDigest) -> FeedState {
    if news.articles.is_empty() {
        FeedState::Empty
    } else {
        FeedState::Ready(news)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, SessionStorage};
    use std::sync::Arc;

    fn digest(count: usize) -> NewsDigest {
        NewsDigest {
            topic: Some("solar".into()),
            articles: (0..count)
                .map(|i| Article {
                    url: format!("https://example.com/{}", i),
                    title: format!("Story {}", i),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_starts_loading_without_cache() {
        let feed = DashboardFeed::new(Arc::new(MemoryStorage::new()));
        assert!(feed.is_loading());
        assert!(feed.articles().is_empty());
    }

    #[test]
    fn test_fetch_result_is_shown_and_cached() {
        let storage = Arc::new(MemoryStorage::new());
        let mut feed = DashboardFeed::new(storage.clone());
        feed.apply(Ok(digest(25)));

        assert_eq!(feed.articles().len(), MAX_CARDS);
        assert!(storage.get(DASHBOARD_CACHE_KEY).is_some());

        // Next start shows the cached digest right away
        let reloaded = DashboardFeed::new(storage);
        assert!(!reloaded.is_loading());
        assert_eq!(reloaded.articles()[0].title, "Story 0");
    }

    #[test]
    fn test_failure_keeps_cached_view() {
        let storage = Arc::new(MemoryStorage::new());
        DashboardFeed::new(storage.clone()).apply(Ok(digest(2)));

        let mut feed = DashboardFeed::new(storage);
        feed.apply(Err(ApiError::Status {
            status: 503,
            detail: None,
        }));
        assert_eq!(feed.articles().len(), 2);
    }

    #[test]
    fn test_failure_without_cache_is_empty() {
        let mut feed = DashboardFeed::new(Arc::new(MemoryStorage::new()));
        feed.apply(Err(ApiError::Aborted("gone".into())));
        assert_eq!(feed.state(), &FeedState::Empty);
    }

    #[test]
    fn test_digest_without_articles_is_empty() {
        let mut feed = DashboardFeed::new(Arc::new(MemoryStorage::new()));
        feed.apply(Ok(digest(0)));
        assert_eq!(feed.state(), &FeedState::Empty);
    }
}
