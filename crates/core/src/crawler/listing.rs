//! Paginated listing crawl with streak-based termination.

use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::catalog::ItemId;
use crate::config::CrawlerConfig;

use super::extract::{detect_app_id, detect_app_name, extract_item_ids, looks_exhausted, page_url};
use super::{CrawlError, CrawlReport, ListingScope, ListingSource, StopReason};

/// Consecutive pages without new ids that end a crawl.
const NO_NEW_STREAK_LIMIT: u32 = 2;

/// Walks a paginated listing one page at a time.
pub struct ListingCrawler<S> {
    source: S,
    max_pages: u32,
    page_delay: Duration,
}

impl<S: ListingSource> ListingCrawler<S> {
    pub fn new(source: S, config: &CrawlerConfig) -> Self {
        Self {
            source,
            max_pages: config.max_pages,
            page_delay: Duration::from_millis(config.page_delay_ms),
        }
    }

    /// Crawl `listing_url` starting at page 1.
    ///
    /// Only a malformed URL is an error. A failed page ends the crawl with
    /// whatever has been collected so far.
    pub async fn crawl(&self, listing_url: &str) -> Result<CrawlReport, CrawlError> {
        let mut seen: BTreeSet<ItemId> = BTreeSet::new();
        let mut streak = 0u32;
        let mut page = 1u32;
        let mut pages_fetched = 0u32;

        let stop = loop {
            let url = page_url(listing_url, page)?;
            debug!(source = self.source.name(), page, url = %url, "Fetching listing page");

            let html = match self.source.fetch_page(&url).await {
                Ok(html) => html,
                Err(e) => {
                    warn!(page, error = %e, "Listing page failed, stopping crawl");
                    break StopReason::PageFailed {
                        page,
                        error: e.to_string(),
                    };
                }
            };
            pages_fetched += 1;

            let before = seen.len();
            seen.extend(extract_item_ids(&html));
            let added = seen.len() - before;

            if added > 0 {
                streak = 0;
                info!(page, added, total = seen.len(), "Listing page");
            } else {
                streak += 1;
                info!(page, streak, "Listing page had no new items");
            }

            if looks_exhausted(&html) {
                info!(page, "Listing exhausted");
                break StopReason::Exhausted { page };
            }
            if streak >= NO_NEW_STREAK_LIMIT {
                info!(page, "No new items on consecutive pages, listing exhausted");
                break StopReason::NoNewItems { page };
            }
            if self.max_pages > 0 && page >= self.max_pages {
                info!(max_pages = self.max_pages, "Reached configured page limit");
                break StopReason::MaxPages { page };
            }

            page += 1;
            if !self.page_delay.is_zero() {
                tokio::time::sleep(self.page_delay).await;
            }
        };

        Ok(CrawlReport {
            ids: seen,
            pages_fetched,
            stop,
        })
    }

    /// Read app id and display name from the listing's first page.
    ///
    /// A failed request degrades to whatever the URL alone reveals.
    pub async fn detect_scope(&self, listing_url: &str) -> ListingScope {
        let first_page = match page_url(listing_url, 1) {
            Ok(url) => match self.source.fetch_page(&url).await {
                Ok(html) => Some(html),
                Err(e) => {
                    warn!(error = %e, "Could not fetch first page for scope detection");
                    None
                }
            },
            Err(_) => None,
        };

        ListingScope {
            app_id: detect_app_id(listing_url, first_page.as_deref()),
            app_name: first_page.as_deref().and_then(detect_app_name),
        }
    }
}
