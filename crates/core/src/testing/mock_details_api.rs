//! Mock details endpoint for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::catalog::ItemId;
use crate::details::{DetailsApi, DetailsError, PublishedFileDetails, RESULT_OK};

/// Result code the endpoint uses for an item it could not find.
const RESULT_NOT_FOUND: i64 = 9;

/// Mock implementation of the DetailsApi trait.
///
/// Holds one record per configured id and returns the records for whichever
/// requested ids it knows; unknown ids are left out of the response, as the
/// real endpoint sometimes does.
///
/// # Example
///
/// ```rust,ignore
/// let api = MockDetailsApi::new();
/// api.set_time_updated(&id, 1_700_000_000).await;
/// api.fail_call(1).await; // second batch fails
///
/// let lookup = DetailsFetcher::new(api.clone(), &config).time_updated(&ids).await;
/// assert_eq!(api.call_sizes().await, vec![100, 20]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockDetailsApi {
    /// Records by id.
    records: Arc<RwLock<HashMap<ItemId, PublishedFileDetails>>>,
    /// Zero-based call indices that fail.
    failing_calls: Arc<RwLock<HashSet<usize>>>,
    /// Requested batches, in order.
    calls: Arc<RwLock<Vec<Vec<ItemId>>>>,
}

impl MockDetailsApi {
    /// Create a new mock details API.
    pub fn new() -> Self {
        Self::default()
    }

    async fn upsert(&self, id: &ItemId, update: impl FnOnce(&mut PublishedFileDetails)) {
        let mut records = self.records.write().await;
        let record = records
            .entry(id.clone())
            .or_insert_with(|| PublishedFileDetails {
                publishedfileid: id.to_string(),
                result: RESULT_OK,
                ..PublishedFileDetails::default()
            });
        update(record);
    }

    /// Report a found item with this update time.
    pub async fn set_time_updated(&self, id: &ItemId, time_updated: u64) {
        self.upsert(id, |r| {
            r.result = RESULT_OK;
            r.time_updated = time_updated;
        })
        .await;
    }

    /// Report a found item with this title.
    pub async fn set_title(&self, id: &ItemId, title: &str) {
        self.upsert(id, |r| {
            r.result = RESULT_OK;
            r.title = title.to_string();
        })
        .await;
    }

    /// Return a record for this id with a not-found result code.
    pub async fn set_missing(&self, id: &ItemId) {
        self.upsert(id, |r| {
            r.result = RESULT_NOT_FOUND;
            r.title.clear();
            r.time_updated = 0;
        })
        .await;
    }

    /// Make the `index`-th call (zero-based) fail.
    pub async fn fail_call(&self, index: usize) {
        self.failing_calls.write().await.insert(index);
    }

    /// Batches requested so far.
    pub async fn recorded_calls(&self) -> Vec<Vec<ItemId>> {
        self.calls.read().await.clone()
    }

    /// Size of each batch requested so far.
    pub async fn call_sizes(&self) -> Vec<usize> {
        self.calls.read().await.iter().map(Vec::len).collect()
    }

    /// Total number of ids requested across all calls.
    pub async fn requested_count(&self) -> usize {
        self.calls.read().await.iter().map(Vec::len).sum()
    }
}

#[async_trait]
impl DetailsApi for MockDetailsApi {
    async fn query_batch(
        &self,
        ids: &[ItemId],
    ) -> Result<Vec<PublishedFileDetails>, DetailsError> {
        let index = {
            let mut calls = self.calls.write().await;
            calls.push(ids.to_vec());
            calls.len() - 1
        };

        if self.failing_calls.read().await.contains(&index) {
            return Err(DetailsError::ApiError {
                status: 503,
                message: format!("mock failure on call {}", index),
            });
        }

        let records = self.records.read().await;
        Ok(ids.iter().filter_map(|id| records.get(id).cloned()).collect())
    }
}
