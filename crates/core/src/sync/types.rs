//! Types for the sync engine.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

use crate::crawler::{CrawlReport, ListingScope};
use crate::fetch::{FetchRun, Verification};
use crate::reconcile::FetchPlan;
use crate::workspace::ListPaths;

/// Errors that abort a sync operation.
///
/// Network trouble never shows up here: failed pages and batches are part
/// of the reports instead.
#[derive(Debug, Error)]
pub enum SyncError {
    /// App id missing or not numeric.
    #[error("invalid app id: {0:?}")]
    InvalidAppId(String),

    /// Listing crawl could not start.
    #[error("crawl error: {0}")]
    Crawl(#[from] crate::crawler::CrawlError),

    /// Catalog or list file error.
    #[error("catalog error: {0}")]
    Catalog(#[from] crate::catalog::CatalogError),

    /// Fetch tool error.
    #[error("fetch error: {0}")]
    Fetch(#[from] crate::fetch::FetchError),

    /// Output folder error.
    #[error("workspace error: {0}")]
    Workspace(#[from] crate::workspace::WorkspaceError),
}

/// Result of crawling a listing into a scope folder.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlOutcome {
    pub scope: ListingScope,
    pub scope_dir: PathBuf,
    pub report: CrawlReport,
    /// Lists written; `None` when the crawl found nothing.
    pub lists: Option<ListPaths>,
    /// Archive folder the previous lists were moved to.
    pub archived_to: Option<PathBuf>,
    /// Items that got a title from the details endpoint.
    pub titled: usize,
}

/// Result of a full sync run.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub app_id: String,
    pub plan: FetchPlan,
    /// `None` when the fetch set was empty and the tool was not started.
    pub run: Option<FetchRun>,
    pub verification: Verification,
    /// Failure list location, if one was written.
    pub failures_file: Option<PathBuf>,
}

impl SyncReport {
    pub fn fetched(&self) -> bool {
        self.run.is_some()
    }
}
