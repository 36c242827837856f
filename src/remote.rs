//! Remote backend client.

use crate::config::RemoteConfig;
use crate::error::{AppError, Result};
use crate::events::Collection;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Source of truth the local store mirrors.
///
/// Implemented over HTTP for real deployments and by in-process fakes in tests.
pub trait RemoteBackend: Send + Sync + 'static {
    /// Every record of a collection as wire JSON.
    fn fetch_collection(&self, collection: Collection) -> impl Future<Output = Result<Vec<Value>>> + Send;

    /// Create or replace one record.
    fn upsert_record(&self, collection: Collection, id: &str, record: Value) -> impl Future<Output = Result<()>> + Send;

    /// Delete one record; deleting a missing record is not an error.
    fn delete_record(&self, collection: Collection, id: &str) -> impl Future<Output = Result<()>> + Send;

    /// Whether the backend answers.
    fn ping(&self) -> impl Future<Output = Result<bool>> + Send;
}

/// REST backend.
///
/// Collections live under `{base}/api/schools/{school}/{collection}`, records
/// under `.../{collection}/{id}`. Requests carry the API key as a bearer token.
pub struct HttpBackend {
    client: Client,
    base_url: String,
    school_id: String,
}

impl HttpBackend {
    pub fn new(config: &RemoteConfig, school_id: &str) -> Result<Self> {
        if !config.is_enabled() {
            return Err(AppError::config("Remote URL is not configured"));
        }

        let mut headers = HeaderMap::new();
        if !config.api_key.is_empty() {
            let value = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
                .map_err(|e| AppError::config(format!("Invalid API key: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim().trim_end_matches('/').to_string(),
            school_id: school_id.to_string(),
        })
    }

    fn collection_url(&self, collection: Collection) -> String {
        format!(
            "{base}/api/schools/{school}/{path}",
            base = self.base_url,
            school = self.school_id,
            path = collection.path()
        )
    }

    fn record_url(&self, collection: Collection, id: &str) -> String {
        format!("{}/{id}", self.collection_url(collection))
    }
}

impl RemoteBackend for HttpBackend {
    async fn fetch_collection(&self, collection: Collection) -> Result<Vec<Value>> {
        let url = self.collection_url(collection);
        debug!("GET {url}");
        let body = self.client.get(&url).send().await?.error_for_status()?.text().await?;
        parse_collection_body(&body)
    }

    async fn upsert_record(&self, collection: Collection, id: &str, record: Value) -> Result<()> {
        let url = self.record_url(collection, id);
        debug!("PUT {url}");
        self.client.put(&url).json(&record).send().await?.error_for_status()?;
        Ok(())
    }

    async fn delete_record(&self, collection: Collection, id: &str) -> Result<()> {
        let url = self.record_url(collection, id);
        debug!("DELETE {url}");
        let response = self.client.delete(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        response.error_for_status()?;
        Ok(())
    }

    async fn ping(&self) -> Result<bool> {
        let url = format!("{base}/api/health", base = self.base_url);
        let response = self.client.get(&url).send().await?;
        Ok(response.status().is_success())
    }
}

/// Parse a collection response: either a bare array or `{ "data": [...] }`.
pub fn parse_collection_body(body: &str) -> Result<Vec<Value>> {
    let value: Value = serde_json::from_str(body)?;
    match value {
        Value::Array(records) => Ok(records),
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(records)) => Ok(records),
            Some(Value::Null) => Ok(Vec::new()),
            _ => Err(AppError::remote("Response object has no 'data' array")),
        },
        other => Err(AppError::remote(format!("Unexpected response shape: {other}"))),
    }
}
