//! Remote metadata lookups against the published file details endpoint.
//!
//! The endpoint accepts at most 100 ids per call. `DetailsFetcher` splits a
//! request into batches, throttles between them, and folds each batch
//! failure into the result instead of returning an error.

mod fetcher;
mod steam;
mod types;

pub use fetcher::DetailsFetcher;
pub use steam::SteamDetailsClient;
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

use crate::catalog::ItemId;

/// Errors from a single details call.
#[derive(Debug, Error)]
pub enum DetailsError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Batch exceeds the endpoint limit.
    #[error("Batch of {0} ids exceeds the endpoint limit")]
    BatchTooLarge(usize),
}

/// One call to the details endpoint.
#[async_trait]
pub trait DetailsApi: Send + Sync {
    /// Fetch details for one batch of ids (at most 100).
    async fn query_batch(
        &self,
        ids: &[ItemId],
    ) -> Result<Vec<PublishedFileDetails>, DetailsError>;
}
