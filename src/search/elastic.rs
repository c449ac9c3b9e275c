//! HTTP client for an Elasticsearch-compatible document-search engine

use crate::search::config::SearchConfig;
use crate::search::engine::{EngineHit, EngineSearchResponse, SearchEngine};
use crate::search::error::{SearchError, SearchResult};
use crate::search::query::QuerySpec;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

/// Engine client speaking the REST/JSON document API
#[derive(Clone)]
pub struct ElasticClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct RawSearchResponse {
    hits: RawHits,
}

#[derive(Debug, Deserialize)]
struct RawHits {
    total: RawTotal,
    #[serde(default)]
    hits: Vec<RawHit>,
}

/// Older engines report a bare count, newer ones `{ "value": n, "relation": .. }`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTotal {
    Count(u64),
    Object { value: u64 },
}

impl RawTotal {
    fn value(&self) -> u64 {
        match self {
            RawTotal::Count(n) => *n,
            RawTotal::Object { value } => *value,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawHit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_score", default)]
    score: Option<f64>,
    #[serde(rename = "_source", default)]
    source: Map<String, Value>,
    #[serde(default)]
    highlight: HashMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawGetResponse {
    #[serde(default)]
    found: bool,
    #[serde(rename = "_source", default)]
    source: Option<Value>,
}

impl ElasticClient {
    /// Create a client for the engine at `base_url` (e.g. `http://localhost:9200`)
    pub fn new(base_url: impl Into<String>, config: &SearchConfig) -> SearchResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| {
                SearchError::InvalidConfiguration(format!("Failed to create HTTP client: {}", e))
            })?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        info!(url = %base_url, "Search engine client created");

        Ok(Self { client, base_url })
    }

    /// Create a client from host and port using the configured scheme
    pub fn from_host(host: &str, port: u16, config: &SearchConfig) -> SearchResult<Self> {
        Self::new(format!("{}://{}:{}", config.scheme, host, port), config)
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn index_url(&self, index: &str) -> String {
        format!("{}/{}", self.base_url, index)
    }

    fn doc_url(&self, index: &str, doc_type: &str, id: &str) -> String {
        format!("{}/{}/{}/{}", self.base_url, index, doc_type, id)
    }

    /// Turn a non-success response into an error carrying the engine's reply
    async fn check(response: Response, context: &str) -> SearchResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(SearchError::Request(format!(
            "{} returned HTTP {}: {}",
            context, status, body
        )))
    }

    async fn post_update(&self, index: &str, doc_type: &str, id: &str, body: &Value) -> SearchResult<()> {
        let url = format!("{}/_update", self.doc_url(index, doc_type, id));
        let response = self.client.post(&url).json(body).send().await?;
        Self::check(response, "update").await?;
        Ok(())
    }
}

#[async_trait]
impl SearchEngine for ElasticClient {
    async fn ping(&self) -> SearchResult<()> {
        let response = self.client.get(&self.base_url).send().await?;
        Self::check(response, "ping").await?;
        Ok(())
    }

    async fn ensure_index(&self, index: &str) -> SearchResult<()> {
        let url = self.index_url(index);
        let response = self.client.head(&url).send().await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => {
                info!(index = %index, "Initializing search index");
                let response = self.client.put(&url).send().await?;
                if response.status() == StatusCode::BAD_REQUEST {
                    // Another process may have created it in between
                    let body = response.text().await.unwrap_or_default();
                    if body.contains("resource_already_exists_exception") {
                        return Ok(());
                    }
                    return Err(SearchError::Request(format!(
                        "create index returned HTTP 400: {}",
                        body
                    )));
                }
                Self::check(response, "create index").await?;
                Ok(())
            }
            status => Err(SearchError::Request(format!(
                "index exists check returned HTTP {}",
                status
            ))),
        }
    }

    async fn exists(&self, index: &str, doc_type: &str, id: &str) -> SearchResult<bool> {
        let response = self
            .client
            .head(self.doc_url(index, doc_type, id))
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(SearchError::Request(format!(
                "document exists check returned HTTP {}",
                status
            ))),
        }
    }

    async fn get(&self, index: &str, doc_type: &str, id: &str) -> SearchResult<Option<Value>> {
        let response = self
            .client
            .get(self.doc_url(index, doc_type, id))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = Self::check(response, "get").await?;
        let raw: RawGetResponse = response.json().await?;
        Ok(if raw.found { raw.source } else { None })
    }

    async fn create(&self, index: &str, doc_type: &str, id: &str, body: &Value) -> SearchResult<()> {
        let response = self
            .client
            .put(self.doc_url(index, doc_type, id))
            .json(body)
            .send()
            .await?;
        Self::check(response, "index").await?;
        debug!(document_id = %id, "Document written");
        Ok(())
    }

    async fn partial_update(
        &self,
        index: &str,
        doc_type: &str,
        id: &str,
        field: &str,
        value: &Value,
    ) -> SearchResult<()> {
        let body = json!({ "doc": { field: value } });
        self.post_update(index, doc_type, id, &body).await?;
        debug!(document_id = %id, field = %field, "Document field merged");
        Ok(())
    }

    async fn upsert(
        &self,
        index: &str,
        doc_type: &str,
        id: &str,
        field: &str,
        value: &Value,
        body: &Value,
    ) -> SearchResult<()> {
        // The engine applies `doc` to an existing document and indexes `upsert` otherwise
        let request = json!({
            "doc": { field: value },
            "upsert": body,
        });
        self.post_update(index, doc_type, id, &request).await?;
        debug!(document_id = %id, field = %field, "Document upserted");
        Ok(())
    }

    async fn search(
        &self,
        index: &str,
        doc_type: &str,
        spec: &QuerySpec,
    ) -> SearchResult<EngineSearchResponse> {
        let url = format!("{}/{}/{}/_search", self.base_url, index, doc_type);
        let response = self.client.post(&url).json(&spec.to_json()).send().await?;
        let response = Self::check(response, "search").await?;
        let raw: RawSearchResponse = response.json().await?;

        Ok(EngineSearchResponse {
            total_hits: raw.hits.total.value(),
            hits: raw
                .hits
                .hits
                .into_iter()
                .map(|hit| EngineHit {
                    id: hit.id,
                    score: hit.score,
                    source: hit.source,
                    highlight: hit.highlight,
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let client = ElasticClient::from_host("search.local", 9200, &SearchConfig::default()).unwrap();
        assert_eq!(client.base_url(), "http://search.local:9200");
        assert_eq!(
            client.doc_url("flightpax", "flightpax", "9-1"),
            "http://search.local:9200/flightpax/flightpax/9-1"
        );
    }

    #[test]
    fn test_total_hit_shapes() {
        let old: RawSearchResponse =
            serde_json::from_str(r#"{"hits":{"total":3,"hits":[]}}"#).unwrap();
        assert_eq!(old.hits.total.value(), 3);

        let new: RawSearchResponse = serde_json::from_str(
            r#"{"hits":{"total":{"value":7,"relation":"eq"},"hits":[]}}"#,
        )
        .unwrap();
        assert_eq!(new.hits.total.value(), 7);
    }
}
