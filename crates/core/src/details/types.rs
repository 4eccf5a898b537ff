//! Types for published file details lookups.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::catalog::ItemId;

/// Result code the details endpoint uses for a found item.
pub const RESULT_OK: i64 = 1;

/// One record from the details endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct PublishedFileDetails {
    #[serde(default, deserialize_with = "lenient_string")]
    pub publishedfileid: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub result: i64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub time_updated: u64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
}

impl PublishedFileDetails {
    pub fn item_id(&self) -> Option<ItemId> {
        ItemId::parse(&self.publishedfileid)
    }

    pub fn is_ok(&self) -> bool {
        self.result == RESULT_OK
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct DetailsEnvelope {
    #[serde(default)]
    pub response: DetailsResponse,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DetailsResponse {
    #[serde(default)]
    pub publishedfiledetails: Vec<PublishedFileDetails>,
}

/// How one batch call went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchOutcome {
    Fetched { requested: usize, returned: usize },
    Failed { requested: usize, error: String },
}

impl BatchOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Result of a batched metadata lookup.
///
/// `NotAttempted` means no request was made (nothing to ask about);
/// `Completed` means every batch was tried, with per-batch outcomes. Ids
/// missing from `values` are unknown, whether their batch failed or the
/// endpoint simply did not return them.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteLookup<T> {
    NotAttempted,
    Completed {
        values: HashMap<ItemId, T>,
        batches: Vec<BatchOutcome>,
    },
}

impl<T> RemoteLookup<T> {
    pub fn get(&self, id: &ItemId) -> Option<&T> {
        match self {
            Self::NotAttempted => None,
            Self::Completed { values, .. } => values.get(id),
        }
    }

    pub fn was_attempted(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    /// Number of batches that failed.
    pub fn failed_batches(&self) -> usize {
        match self {
            Self::NotAttempted => 0,
            Self::Completed { batches, .. } => batches.iter().filter(|b| b.is_failed()).count(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::NotAttempted => 0,
            Self::Completed { values, .. } => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lenient_u64<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

fn lenient_i64<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(match value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}
