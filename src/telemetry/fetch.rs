//! Remote document-store fetcher
//!
//! The fetch collaborator behind a seam: one page of the most recent sensor
//! documents, newest first, or a classified error. The HTTP implementation
//! queries a JSON document-store endpoint; tests script their own fetcher.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;

use super::record::RawRecord;
use crate::config::AcquisitionConfig;

/// Classified fetch failures
#[derive(Error, Debug)]
pub enum FetchError {
    /// Read quota exhausted; fetches are suppressed for a cooldown window
    #[error("read quota exhausted: {0}")]
    Quota(String),

    /// Network-level or transient store failure; retried next tick
    #[error("transient fetch failure: {0}")]
    Transient(String),
}

/// Fetches the most recent sensor documents
#[async_trait]
pub trait TelemetryFetcher: Send + Sync {
    /// At most `limit` records, newest first
    async fn fetch(&self, limit: usize) -> Result<Vec<RawRecord>, FetchError>;
}

#[derive(Serialize)]
struct PageQuery<'a> {
    collection: &'a str,
    order_by: &'a str,
    direction: &'a str,
    limit: usize,
}

/// Document-store client querying a JSON HTTP endpoint
pub struct HttpDocumentStore {
    client: reqwest::Client,
    endpoint: String,
    collection: String,
}

impl HttpDocumentStore {
    pub fn new(config: &AcquisitionConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            collection: config.collection.clone(),
        }
    }
}

#[async_trait]
impl TelemetryFetcher for HttpDocumentStore {
    async fn fetch(&self, limit: usize) -> Result<Vec<RawRecord>, FetchError> {
        let query = PageQuery {
            collection: &self.collection,
            order_by: "timestamp",
            direction: "desc",
            limit,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&query)
            .send()
            .await
            .map_err(|e| FetchError::Transient(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::Quota(format!("store returned {status}")));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Some stores signal quota exhaustion in the error body instead
            // of the status code.
            if body.to_ascii_lowercase().contains("quota") {
                return Err(FetchError::Quota(body));
            }
            return Err(FetchError::Transient(format!("store returned {status}")));
        }

        response
            .json::<Vec<RawRecord>>()
            .await
            .map_err(|e| FetchError::Transient(format!("malformed page: {e}")))
    }
}
