pub mod catalog;
pub mod config;
pub mod crawler;
pub mod details;
pub mod fetch;
pub mod presence;
pub mod reconcile;
pub mod state;
pub mod sync;
pub mod testing;
pub mod workspace;

pub use catalog::{Catalog, CatalogError, ItemId};
pub use config::{
    load_config, load_config_from_str, load_config_or_default, validate_config, Config,
    ConfigError,
};
pub use crawler::{CrawlError, CrawlReport, HttpListingSource, ListingCrawler, StopReason};
pub use details::{DetailsFetcher, RemoteLookup, SteamDetailsClient};
pub use fetch::{Credentials, FetchError, SteamCmd, Verification};
pub use reconcile::FetchPlan;
pub use sync::{CrawlOutcome, SyncEngine, SyncError, SyncReport};
