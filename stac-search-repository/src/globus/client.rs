//! Globus Search client implementation.
//!
//! This module provides the concrete implementation of
//! `SearchBackendProvider` over the Globus Search REST API.

use std::time::Duration;

use async_trait::async_trait;
use chrono::SecondsFormat;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use url::Url;

use crate::errors::BackendError;
use crate::globus::config::GlobusSearchConfig;
use crate::interfaces::SearchBackendProvider;
use crate::types::{
    CompiledQuery, DeleteOutcome, DeleteReport, ResultEntry, ResultPage, WriteOutcome,
    WriteReport, WriteStatus,
};
use stac_search_shared::{BackendDocument, CursorState};

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// HTTP client for a Globus Search index.
///
/// Safe for concurrent use: connection pooling lives inside the reqwest
/// client and no mutable state is shared between requests.
///
/// # Example
///
/// ```ignore
/// let config = GlobusSearchConfig::new("https://search.api.globus.org", index_id);
/// let client = GlobusSearchClient::new(config)?;
/// let page = client.execute(&compiled).await?;
/// ```
pub struct GlobusSearchClient {
    http: reqwest::Client,
    config: GlobusSearchConfig,
}

impl GlobusSearchClient {
    /// Create a new client for the configured index.
    pub fn new(config: GlobusSearchConfig) -> Result<Self, BackendError> {
        Url::parse(&config.base_url)
            .map_err(|e| BackendError::fatal(format!("Invalid base URL: {}", e)))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| BackendError::fatal(e.to_string()))?;

        info!(
            base_url = %config.base_url,
            index_id = %config.index_id,
            "Created Globus Search client"
        );

        Ok(Self { http, config })
    }

    fn index_url(&self, endpoint: &str) -> String {
        format!(
            "{}/v1/index/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.index_id,
            endpoint
        )
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.bearer_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Whether a response status warrants a retry.
    fn is_transient_status(status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
    }

    /// Send a request, retrying transient failures with exponential
    /// backoff. Returns the first non-transient response regardless of
    /// status; callers decide what the status means for their operation.
    async fn send_with_retry<F>(
        &self,
        op: &'static str,
        build: F,
    ) -> Result<reqwest::Response, BackendError>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let retry = &self.config.retry;
        let mut delay_ms = retry.initial_delay_ms;
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match self.authorized(build()).send().await {
                Ok(response) => {
                    let status = response.status();
                    if !Self::is_transient_status(status) {
                        return Ok(response);
                    }
                    let body = response.text().await.unwrap_or_default();
                    if attempt > retry.max_retries {
                        return Err(BackendError::transient(
                            attempt,
                            format!("{} failed with status {}: {}", op, status, body),
                        ));
                    }
                    warn!(op, attempt, status = %status, delay_ms, "Transient backend error, retrying");
                }
                Err(e) => {
                    let transient = e.is_timeout() || e.is_connect();
                    if !transient {
                        return Err(BackendError::fatal(format!("{} failed: {}", op, e)));
                    }
                    if attempt > retry.max_retries {
                        return Err(BackendError::transient(
                            attempt,
                            format!("{} failed: {}", op, e),
                        ));
                    }
                    warn!(op, attempt, error = %e, delay_ms, "Backend unreachable, retrying");
                }
            }

            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            delay_ms = (delay_ms * 2).min(retry.max_delay_ms);
        }
    }

    /// Decode one gmeta entry. The backend response is dynamic JSON, so
    /// the shape is checked explicitly rather than trusted.
    fn decode_entry(value: &Value) -> Option<ResultEntry> {
        let subject = value.get("subject")?.as_str()?.to_string();
        let content = value
            .get("entries")?
            .as_array()?
            .first()?
            .get("content")?
            .clone();
        Some(ResultEntry { subject, content })
    }

    fn decode_search_response(
        raw: &Value,
        query: &CompiledQuery,
    ) -> Result<ResultPage, BackendError> {
        let gmeta = raw
            .get("gmeta")
            .and_then(Value::as_array)
            .ok_or_else(|| BackendError::parse("response missing 'gmeta' array"))?;

        let mut entries = Vec::with_capacity(gmeta.len());
        for value in gmeta {
            let entry = Self::decode_entry(value)
                .ok_or_else(|| BackendError::parse("malformed gmeta entry"))?;
            entries.push(entry);
        }

        let total = raw.get("total").and_then(Value::as_u64);
        let offset = raw
            .get("offset")
            .and_then(Value::as_u64)
            .unwrap_or(query.offset);
        let next_cursor = if raw
            .get("has_next_page")
            .and_then(Value::as_bool)
            .unwrap_or(false)
        {
            Some(CursorState {
                offset: offset + entries.len() as u64,
            })
        } else {
            None
        };

        Ok(ResultPage {
            entries,
            total,
            next_cursor,
        })
    }

    /// Build the ingest envelope for one document. System fields travel
    /// inside the content; the envelope itself only carries subject,
    /// content, and visibility.
    fn ingest_body(document: &BackendDocument) -> Value {
        let mut content = document.content.clone();
        if let Some(map) = content.as_object_mut() {
            map.insert(
                "ingested_at".to_string(),
                json!(document
                    .ingested_at
                    .to_rfc3339_opts(SecondsFormat::Secs, true)),
            );
            map.insert("schema_version".to_string(), json!(document.schema_version));
        }
        json!({
            "ingest_type": "GMetaList",
            "ingest_data": {
                "gmeta": [{
                    "subject": document.subject,
                    "content": content,
                    "visible_to": document.visible_to,
                }],
            },
            "field_mapping": {"geometry": "geo_shape"},
        })
    }

    /// Upsert a single document, reporting whether it was created or
    /// updated.
    async fn write_one(&self, document: &BackendDocument) -> Result<WriteStatus, BackendError> {
        let existed = self.fetch(&document.subject).await?.is_some();

        let url = self.index_url("ingest");
        let body = Self::ingest_body(document);
        let response = self
            .send_with_retry("ingest", || self.http.post(&url).json(&body))
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(BackendError::fatal(format!(
                "ingest failed with status {}: {}",
                status, text
            )));
        }

        debug!(subject = %document.subject, existed, "Document ingested");
        Ok(if existed {
            WriteStatus::Updated
        } else {
            WriteStatus::Created
        })
    }
}

#[async_trait]
impl SearchBackendProvider for GlobusSearchClient {
    async fn execute(&self, query: &CompiledQuery) -> Result<ResultPage, BackendError> {
        let url = self.index_url("search");
        let body = query.to_body();
        let response = self
            .send_with_retry("search", || self.http.post(&url).json(&body))
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(BackendError::fatal(format!(
                "search failed with status {}: {}",
                status, text
            )));
        }

        let raw: Value = response
            .json()
            .await
            .map_err(|e| BackendError::parse(e.to_string()))?;
        Self::decode_search_response(&raw, query)
    }

    async fn fetch(&self, subject: &str) -> Result<Option<ResultEntry>, BackendError> {
        let url = self.index_url("subject");
        let response = self
            .send_with_retry("get subject", || {
                self.http.get(&url).query(&[("subject", subject)])
            })
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::fatal(format!(
                "get subject failed with status {}: {}",
                status, body
            )));
        }

        let raw: Value = response
            .json()
            .await
            .map_err(|e| BackendError::parse(e.to_string()))?;
        let entry = Self::decode_entry(&raw)
            .ok_or_else(|| BackendError::parse("malformed subject response"))?;
        Ok(Some(entry))
    }

    async fn write(&self, documents: &[BackendDocument]) -> Result<WriteReport, BackendError> {
        let mut outcomes = Vec::with_capacity(documents.len());
        let mut succeeded = 0;
        let mut failed = 0;

        for document in documents {
            match self.write_one(document).await {
                Ok(status) => {
                    succeeded += 1;
                    outcomes.push(WriteOutcome {
                        subject: document.subject.clone(),
                        status,
                    });
                }
                Err(e) => {
                    failed += 1;
                    outcomes.push(WriteOutcome {
                        subject: document.subject.clone(),
                        status: WriteStatus::Failed(e.to_string()),
                    });
                }
            }
        }

        Ok(WriteReport {
            total: documents.len(),
            succeeded,
            failed,
            outcomes,
        })
    }

    async fn delete(&self, subjects: &[String]) -> Result<DeleteReport, BackendError> {
        let url = self.index_url("subject");
        let mut outcomes = Vec::with_capacity(subjects.len());
        let mut succeeded = 0;
        let mut failed = 0;

        for subject in subjects {
            let result = self
                .send_with_retry("delete subject", || {
                    self.http.delete(&url).query(&[("subject", subject)])
                })
                .await;

            match result {
                Ok(response) => {
                    let status = response.status();
                    // 404 is acceptable - the subject may not exist
                    if status.is_success() || status == StatusCode::NOT_FOUND {
                        succeeded += 1;
                        outcomes.push(DeleteOutcome {
                            subject: subject.clone(),
                            success: true,
                            error: None,
                        });
                    } else {
                        let body = response.text().await.unwrap_or_default();
                        failed += 1;
                        outcomes.push(DeleteOutcome {
                            subject: subject.clone(),
                            success: false,
                            error: Some(format!("status {}: {}", status, body)),
                        });
                    }
                }
                Err(e) => {
                    failed += 1;
                    outcomes.push(DeleteOutcome {
                        subject: subject.clone(),
                        success: false,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        Ok(DeleteReport {
            total: subjects.len(),
            succeeded,
            failed,
            outcomes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use stac_search_shared::SCHEMA_VERSION;

    fn query_with_offset(offset: u64) -> CompiledQuery {
        CompiledQuery {
            q: "*".to_string(),
            limit: 10,
            offset,
            filters: vec![],
            sort: vec![],
        }
    }

    #[test]
    fn test_decode_entry() {
        let value = json!({
            "subject": "cmip6_item-1",
            "entries": [{"content": {"id": "item-1"}}],
        });
        let entry = GlobusSearchClient::decode_entry(&value).unwrap();
        assert_eq!(entry.subject, "cmip6_item-1");
        assert_eq!(entry.content["id"], "item-1");
    }

    #[test]
    fn test_decode_entry_missing_content() {
        let value = json!({"subject": "cmip6_item-1", "entries": []});
        assert!(GlobusSearchClient::decode_entry(&value).is_none());
    }

    #[test]
    fn test_decode_search_response_with_next_page() {
        let raw = json!({
            "gmeta": [
                {"subject": "a", "entries": [{"content": {}}]},
                {"subject": "b", "entries": [{"content": {}}]},
            ],
            "total": 5,
            "offset": 2,
            "has_next_page": true,
        });
        let page =
            GlobusSearchClient::decode_search_response(&raw, &query_with_offset(2)).unwrap();
        assert_eq!(page.entries.len(), 2);
        assert_eq!(page.total, Some(5));
        assert_eq!(page.next_cursor, Some(CursorState { offset: 4 }));
    }

    #[test]
    fn test_decode_search_response_last_page() {
        let raw = json!({
            "gmeta": [{"subject": "a", "entries": [{"content": {}}]}],
            "total": 1,
            "has_next_page": false,
        });
        let page =
            GlobusSearchClient::decode_search_response(&raw, &query_with_offset(0)).unwrap();
        assert!(page.next_cursor.is_none());
    }

    #[test]
    fn test_decode_search_response_rejects_missing_gmeta() {
        let raw = json!({"detail": "oops"});
        assert!(matches!(
            GlobusSearchClient::decode_search_response(&raw, &query_with_offset(0)),
            Err(BackendError::Parse(_))
        ));
    }

    #[test]
    fn test_transient_status_classification() {
        assert!(GlobusSearchClient::is_transient_status(
            StatusCode::TOO_MANY_REQUESTS
        ));
        assert!(GlobusSearchClient::is_transient_status(
            StatusCode::SERVICE_UNAVAILABLE
        ));
        assert!(GlobusSearchClient::is_transient_status(
            StatusCode::INTERNAL_SERVER_ERROR
        ));
        assert!(!GlobusSearchClient::is_transient_status(
            StatusCode::BAD_REQUEST
        ));
        assert!(!GlobusSearchClient::is_transient_status(
            StatusCode::UNAUTHORIZED
        ));
        assert!(!GlobusSearchClient::is_transient_status(StatusCode::OK));
    }

    #[test]
    fn test_ingest_body_shape() {
        let document = BackendDocument {
            subject: "cmip6_item-1".to_string(),
            visible_to: vec!["public".to_string()],
            content: json!({"id": "item-1", "collection": "cmip6"}),
            ingested_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            schema_version: SCHEMA_VERSION,
        };
        let body = GlobusSearchClient::ingest_body(&document);

        assert_eq!(body["ingest_type"], "GMetaList");
        assert_eq!(body["field_mapping"]["geometry"], "geo_shape");
        let entry = &body["ingest_data"]["gmeta"][0];
        assert_eq!(entry["subject"], "cmip6_item-1");
        assert_eq!(entry["visible_to"][0], "public");
        assert_eq!(entry["content"]["ingested_at"], "2024-01-01T00:00:00Z");
        assert_eq!(entry["content"]["schema_version"], 1);
    }

    #[test]
    fn test_index_url() {
        let client = GlobusSearchClient::new(GlobusSearchConfig::new(
            "https://search.example.org/",
            "abc-123",
        ))
        .unwrap();
        assert_eq!(
            client.index_url("search"),
            "https://search.example.org/v1/index/abc-123/search"
        );
    }

    #[test]
    fn test_new_rejects_invalid_url() {
        assert!(GlobusSearchClient::new(GlobusSearchConfig::new("not a url", "abc")).is_err());
    }
}
