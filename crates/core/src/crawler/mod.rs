//! Remote Workshop listing crawler.
//!
//! A `ListingSource` fetches raw page HTML; `ListingCrawler` walks the pages
//! of one listing, collecting item ids until the listing is exhausted.

mod cookies;
mod extract;
mod http;
mod listing;
mod types;

pub use cookies::{load_cookie_jar, CookieFormat, LoadedCookies};
pub use extract::{
    detect_app_id, detect_app_name, extract_item_ids, is_listing_url, looks_exhausted, page_url,
    sanitize_name, PAGE_PARAM,
};
pub use http::HttpListingSource;
pub use listing::ListingCrawler;
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while crawling.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Invalid listing URL: {0}")]
    InvalidUrl(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Request timeout")]
    Timeout,

    #[error("Cookie file error: {0}")]
    Cookies(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for CrawlError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            CrawlError::Timeout
        } else if e.is_connect() {
            CrawlError::ConnectionFailed(e.to_string())
        } else if let Some(status) = e.status() {
            CrawlError::HttpStatus {
                status: status.as_u16(),
                url: e.url().map(|u| u.to_string()).unwrap_or_default(),
            }
        } else {
            CrawlError::Internal(e.to_string())
        }
    }
}

/// Source of listing page bodies.
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Source name for logging.
    fn name(&self) -> &str;

    /// Fetch one page and return its body.
    async fn fetch_page(&self, url: &str) -> Result<String, CrawlError>;
}
