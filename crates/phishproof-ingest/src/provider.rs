//! Ranked-list provider client.
//!
//! The provider is an unreliable, rate-bounded HTTP collaborator: it
//! serves dated list metadata and a downloadable CSV of
//! `rank,domain` rows. All calls carry a client-level timeout, so a
//! hung provider surfaces as a retryable failure instead of stalling
//! the ingestion schedule.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::NaiveDate;
use serde::Deserialize;

/// Daily list metadata as served by the provider.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyListMetadata {
    pub list_id: String,
    #[serde(default)]
    pub available: bool,
    #[serde(default)]
    pub failed: bool,
}

impl DailyListMetadata {
    /// Whether this metadata points at a usable list.
    pub fn is_usable(&self) -> bool {
        self.available && !self.failed
    }
}

/// Provider-call failures.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("no list for the requested date")]
    NotFound,

    #[error("provider rejected the request")]
    BadRequest,

    #[error("provider returned status {0}")]
    Status(u16),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ProviderError {
    /// Whether the daily-metadata lookup should step back one day
    /// before retrying. Only the provider saying "nothing for that
    /// date" qualifies; transport failures retry the same date.
    pub fn steps_date(&self) -> bool {
        matches!(self, Self::NotFound | Self::BadRequest)
    }
}

/// The provider contract used by the ingestion pipeline.
#[async_trait]
pub trait ListProvider: Send + Sync {
    /// Metadata for the list published on `date`.
    async fn metadata_for_date(&self, date: NaiveDate)
        -> Result<DailyListMetadata, ProviderError>;

    /// The full CSV body for one list.
    async fn full_list(&self, list_id: &str) -> Result<Bytes, ProviderError>;
}

/// HTTP implementation of [`ListProvider`].
pub struct HttpListProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpListProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url: String = base_url.into();
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn status_error(status: reqwest::StatusCode) -> ProviderError {
        match status {
            reqwest::StatusCode::NOT_FOUND => ProviderError::NotFound,
            reqwest::StatusCode::BAD_REQUEST => ProviderError::BadRequest,
            other => ProviderError::Status(other.as_u16()),
        }
    }
}

#[async_trait]
impl ListProvider for HttpListProvider {
    async fn metadata_for_date(
        &self,
        date: NaiveDate,
    ) -> Result<DailyListMetadata, ProviderError> {
        let url = format!(
            "{}/api/lists/date/{}",
            self.base_url,
            date.format("%Y-%m-%d")
        );
        tracing::debug!(%url, "fetching list metadata");
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(Self::status_error(response.status()));
        }
        Ok(response.json().await?)
    }

    async fn full_list(&self, list_id: &str) -> Result<Bytes, ProviderError> {
        let url = format!("{}/download/{}/full", self.base_url, list_id);
        tracing::debug!(%url, "downloading full list");
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(Self::status_error(response.status()));
        }
        Ok(response.bytes().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_metadata_for_date() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/lists/date/2024-06-01"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "listId": "N9PQW",
                "available": true,
                "failed": false,
            })))
            .mount(&server)
            .await;

        let provider =
            HttpListProvider::new(server.uri(), Duration::from_secs(5)).expect("provider");
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).expect("date");
        let meta = provider.metadata_for_date(date).await.expect("metadata");

        assert_eq!(meta.list_id, "N9PQW");
        assert!(meta.is_usable());
    }

    #[tokio::test]
    async fn test_missing_date_maps_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let provider =
            HttpListProvider::new(server.uri(), Duration::from_secs(5)).expect("provider");
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).expect("date");
        let err = provider.metadata_for_date(date).await.expect_err("404");

        assert!(matches!(err, ProviderError::NotFound));
        assert!(err.steps_date());
    }

    #[tokio::test]
    async fn test_full_list_streams_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/download/N9PQW/full"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("1,google.com\n2,amazon.com\n"),
            )
            .mount(&server)
            .await;

        let provider =
            HttpListProvider::new(server.uri(), Duration::from_secs(5)).expect("provider");
        let body = provider.full_list("N9PQW").await.expect("body");
        assert_eq!(&body[..], b"1,google.com\n2,amazon.com\n");
    }

    #[test]
    fn test_server_errors_do_not_step_date() {
        assert!(!ProviderError::Status(500).steps_date());
        assert!(ProviderError::BadRequest.steps_date());
    }
}
