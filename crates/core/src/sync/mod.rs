//! Sync engine: crawl a listing into a catalog, or reconcile a catalog
//! against a SteamCMD install and fetch what is missing or outdated.

mod engine;
mod types;

pub use engine::SyncEngine;
pub use types::{CrawlOutcome, SyncError, SyncReport};
