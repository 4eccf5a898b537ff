//! Steam `GetPublishedFileDetails` client.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::catalog::ItemId;
use crate::config::{DetailsConfig, MAX_DETAILS_BATCH};

use super::types::{DetailsEnvelope, PublishedFileDetails};
use super::{DetailsApi, DetailsError};

/// Form-encoded POST client for the details endpoint.
pub struct SteamDetailsClient {
    client: Client,
    url: String,
}

impl SteamDetailsClient {
    pub fn new(config: &DetailsConfig) -> Result<Self, DetailsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }

    /// `itemcount` plus one `publishedfileids[i]` field per id.
    fn form_fields(ids: &[ItemId]) -> Vec<(String, String)> {
        let mut fields = Vec::with_capacity(ids.len() + 1);
        fields.push(("itemcount".to_string(), ids.len().to_string()));
        for (i, id) in ids.iter().enumerate() {
            fields.push((format!("publishedfileids[{}]", i), id.to_string()));
        }
        fields
    }
}

#[async_trait]
impl DetailsApi for SteamDetailsClient {
    async fn query_batch(
        &self,
        ids: &[ItemId],
    ) -> Result<Vec<PublishedFileDetails>, DetailsError> {
        if ids.len() > MAX_DETAILS_BATCH {
            return Err(DetailsError::BatchTooLarge(ids.len()));
        }

        debug!(count = ids.len(), "Querying published file details");

        let response = self
            .client
            .post(&self.url)
            .form(&Self::form_fields(ids))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DetailsError::ApiError {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        let envelope: DetailsEnvelope = response.json().await.map_err(|e| {
            DetailsError::ParseError(format!("Failed to parse details response: {}", e))
        })?;

        Ok(envelope.response.publishedfiledetails)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_fields() {
        let ids: Vec<ItemId> = ["111", "222"]
            .iter()
            .map(|s| ItemId::parse(s).unwrap())
            .collect();
        let fields = SteamDetailsClient::form_fields(&ids);
        assert_eq!(
            fields,
            vec![
                ("itemcount".to_string(), "2".to_string()),
                ("publishedfileids[0]".to_string(), "111".to_string()),
                ("publishedfileids[1]".to_string(), "222".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_oversized_batch_rejected_before_request() {
        let client = SteamDetailsClient::new(&DetailsConfig {
            url: "http://127.0.0.1:9/unused".to_string(),
            ..DetailsConfig::default()
        })
        .unwrap();
        let ids: Vec<ItemId> = (0..101)
            .map(|i| ItemId::parse(&i.to_string()).unwrap())
            .collect();

        let err = client.query_batch(&ids).await.unwrap_err();
        assert!(matches!(err, DetailsError::BatchTooLarge(101)));
    }
}
