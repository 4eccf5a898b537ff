//! Types for the listing crawler.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::catalog::ItemId;

/// Why a crawl stopped requesting pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum StopReason {
    /// The page carried an empty/private/login-required marker.
    Exhausted { page: u32 },
    /// Two consecutive pages contributed no new ids.
    NoNewItems { page: u32 },
    /// The configured page limit was reached.
    MaxPages { page: u32 },
    /// A page request failed; results so far are kept.
    PageFailed { page: u32, error: String },
}

impl StopReason {
    /// Whether the listing was walked to its end rather than cut short.
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Exhausted { .. } | Self::NoNewItems { .. })
    }
}

/// Outcome of crawling one listing.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    /// Every id discovered, deduplicated across pages.
    pub ids: BTreeSet<ItemId>,
    /// Pages successfully fetched.
    pub pages_fetched: u32,
    pub stop: StopReason,
}

/// App scope information read from a listing's first page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListingScope {
    pub app_id: Option<String>,
    pub app_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_reason_completeness() {
        assert!(StopReason::Exhausted { page: 3 }.is_complete());
        assert!(StopReason::NoNewItems { page: 5 }.is_complete());
        assert!(!StopReason::MaxPages { page: 2 }.is_complete());
        assert!(!StopReason::PageFailed {
            page: 1,
            error: "timeout".to_string()
        }
        .is_complete());
    }

    #[test]
    fn test_stop_reason_serialization() {
        let json = serde_json::to_string(&StopReason::NoNewItems { page: 4 }).unwrap();
        assert_eq!(json, r#"{"reason":"no_new_items","page":4}"#);
    }
}
