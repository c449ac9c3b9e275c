//! Document-search engine abstraction

use crate::search::error::SearchResult;
use crate::search::query::QuerySpec;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// A single hit returned by the engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineHit {
    /// Document ID
    pub id: String,

    /// Relevance score, absent when sorted by field
    pub score: Option<f64>,

    /// Stored document fields
    pub source: Map<String, Value>,

    /// Highlight fragments per field
    pub highlight: HashMap<String, Vec<String>>,
}

/// Raw search response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineSearchResponse {
    /// Hits for the requested page
    pub hits: Vec<EngineHit>,

    /// Total number of matching documents
    pub total_hits: u64,
}

/// Capabilities consumed from the document-search engine
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Check that the engine answers
    async fn ping(&self) -> SearchResult<()>;

    /// Create `index` unless it already exists
    async fn ensure_index(&self, index: &str) -> SearchResult<()>;

    /// Check whether a document exists
    async fn exists(&self, index: &str, doc_type: &str, id: &str) -> SearchResult<bool>;

    /// Fetch a document's source
    async fn get(&self, index: &str, doc_type: &str, id: &str) -> SearchResult<Option<Value>>;

    /// Write a full document, replacing any existing one
    async fn create(&self, index: &str, doc_type: &str, id: &str, body: &Value) -> SearchResult<()>;

    /// Merge a single field into an existing document
    async fn partial_update(
        &self,
        index: &str,
        doc_type: &str,
        id: &str,
        field: &str,
        value: &Value,
    ) -> SearchResult<()>;

    /// Atomically merge `field` into the document if it exists, otherwise create it from `body`
    async fn upsert(
        &self,
        index: &str,
        doc_type: &str,
        id: &str,
        field: &str,
        value: &Value,
        body: &Value,
    ) -> SearchResult<()>;

    /// Run a search
    async fn search(
        &self,
        index: &str,
        doc_type: &str,
        spec: &QuerySpec,
    ) -> SearchResult<EngineSearchResponse>;
}
