//! Batched, throttled metadata lookups.

use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

use crate::catalog::ItemId;
use crate::config::{DetailsConfig, MAX_DETAILS_BATCH};

use super::{BatchOutcome, DetailsApi, PublishedFileDetails, RemoteLookup};

/// Splits lookups into endpoint-sized batches and issues them in sequence.
pub struct DetailsFetcher<A> {
    api: A,
    batch_size: usize,
    batch_delay: Duration,
}

impl<A: DetailsApi> DetailsFetcher<A> {
    pub fn new(api: A, config: &DetailsConfig) -> Self {
        Self {
            api,
            batch_size: config.batch_size.clamp(1, MAX_DETAILS_BATCH),
            batch_delay: Duration::from_millis(config.batch_delay_ms),
        }
    }

    /// Remote `time_updated` per id. Ids the endpoint returns without a
    /// usable timestamp map to 0.
    pub async fn time_updated(&self, ids: &[ItemId]) -> RemoteLookup<u64> {
        self.lookup(ids, "time_updated", |details| {
            details.item_id().map(|id| (id, details.time_updated))
        })
        .await
    }

    /// Display titles of items the endpoint reports as found.
    pub async fn titles(&self, ids: &[ItemId]) -> RemoteLookup<String> {
        self.lookup(ids, "title", |details| {
            if !details.is_ok() {
                return None;
            }
            details
                .item_id()
                .map(|id| (id, details.title.trim().to_string()))
        })
        .await
    }

    async fn lookup<T, F>(&self, ids: &[ItemId], field: &str, extract: F) -> RemoteLookup<T>
    where
        F: Fn(&PublishedFileDetails) -> Option<(ItemId, T)>,
    {
        if ids.is_empty() {
            return RemoteLookup::NotAttempted;
        }

        let mut values = HashMap::new();
        let mut batches = Vec::new();
        let total = ids.len().div_ceil(self.batch_size);

        for (index, chunk) in ids.chunks(self.batch_size).enumerate() {
            if index > 0 && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }

            match self.api.query_batch(chunk).await {
                Ok(records) => {
                    let returned = records.len();
                    values.extend(records.iter().filter_map(&extract));
                    debug!(batch = index + 1, total, returned, field, "Details batch");
                    batches.push(BatchOutcome::Fetched {
                        requested: chunk.len(),
                        returned,
                    });
                }
                Err(e) => {
                    warn!(
                        batch = index + 1,
                        total,
                        requested = chunk.len(),
                        field,
                        error = %e,
                        "Details batch failed"
                    );
                    batches.push(BatchOutcome::Failed {
                        requested: chunk.len(),
                        error: e.to_string(),
                    });
                }
            }
        }

        RemoteLookup::Completed { values, batches }
    }
}
