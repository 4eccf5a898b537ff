//! Mock listing source for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::crawler::{CrawlError, ListingSource, PAGE_PARAM};

/// Mock implementation of the ListingSource trait.
///
/// Pages are keyed by the page query parameter. Pages that were never set
/// come back as an empty body, like a listing past its last page.
///
/// # Example
///
/// ```rust,ignore
/// let source = MockListingSource::new();
/// source.set_page(1, fixtures::listing_page(&["1234567"])).await;
/// source.fail_page(2).await;
///
/// let report = ListingCrawler::new(source.clone(), &config).crawl(url).await?;
/// assert_eq!(source.requested_pages().await, vec![1, 2]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockListingSource {
    /// Page bodies by page number.
    pages: Arc<RwLock<HashMap<u32, String>>>,
    /// Pages that fail with a connection error.
    failing: Arc<RwLock<HashSet<u32>>>,
    /// Requested URLs, in order.
    requests: Arc<RwLock<Vec<String>>>,
}

impl MockListingSource {
    /// Create a new mock listing source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the body returned for a page.
    pub async fn set_page(&self, page: u32, body: String) {
        self.pages.write().await.insert(page, body);
    }

    /// Make a page fail.
    pub async fn fail_page(&self, page: u32) {
        self.failing.write().await.insert(page);
    }

    /// Every URL requested so far.
    pub async fn requested_urls(&self) -> Vec<String> {
        self.requests.read().await.clone()
    }

    /// Page numbers requested so far.
    pub async fn requested_pages(&self) -> Vec<u32> {
        self.requests
            .read()
            .await
            .iter()
            .map(|url| page_of(url))
            .collect()
    }
}

/// Page number from a URL's page parameter, 1 when absent.
fn page_of(url: &str) -> u32 {
    url::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.query_pairs()
                .find(|(k, _)| k == PAGE_PARAM)
                .and_then(|(_, v)| v.parse().ok())
        })
        .unwrap_or(1)
}

#[async_trait]
impl ListingSource for MockListingSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_page(&self, url: &str) -> Result<String, CrawlError> {
        self.requests.write().await.push(url.to_string());

        let page = page_of(url);
        if self.failing.read().await.contains(&page) {
            return Err(CrawlError::ConnectionFailed(format!(
                "mock failure on page {}",
                page
            )));
        }

        Ok(self
            .pages
            .read()
            .await
            .get(&page)
            .cloned()
            .unwrap_or_default())
    }
}
