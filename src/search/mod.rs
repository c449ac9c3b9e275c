//! Flight-passenger search projection backed by a document-search engine
//!
//! Every passenger travelling on a flight becomes one searchable document,
//! identified by `"{flight_id}-{passenger_id}"`. Manifest and reservation
//! messages are written into those documents, and the same documents serve
//! free-text passenger search and link analysis.
//!
//! - **Identity**: one document per flight/passenger pair
//! - **Indexing**: create on first sighting, merge the payload field afterwards
//! - **Free-Text Search**: `most_fields` over names, documents, flight and payloads
//! - **Link Analysis**: name, document number and reservation-text matches with highlights
//! - **Projection**: engine hits back into typed result records
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │           Search Service                         │
//! ├─────────────────────────────────────────────────┤
//! │  - connect()              - close()             │
//! │  - index_manifest_message()                     │
//! │  - index_reservation_message()                  │
//! │  - search_passengers()    - find_passenger_links()│
//! └─────────────────────────────────────────────────┘
//!          │                          │
//!          ▼                          ▼
//! ┌──────────────────┐     ┌──────────────────────┐
//! │  Indexer          │     │  Query Builder /     │
//! │  (upsert per pair)│     │  Result Projector    │
//! └──────────────────┘     └──────────────────────┘
//!          │                          │
//!          ▼                          ▼
//! ┌─────────────────────────────────────────────────┐
//! │   SearchEngine: ElasticClient | InMemoryEngine   │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use flightpax_search::config::Config;
//! use flightpax_search::search::SearchService;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load()?;
//!     let search = SearchService::new(config.engine.clone());
//!
//!     if search.connect(&config).await {
//!         let page = search.search_passengers("lee", 1, 20, "lastName", "asc").await?;
//!         println!("Found {} passengers", page.total_hits);
//!     }
//!
//!     Ok(())
//! }
//! ```

mod config;
mod document;
mod elastic;
mod engine;
mod error;
mod indexer;
mod memory;
mod query;
mod results;
mod service;

pub use config::{SearchConfig, SearchConfigBuilder, ENGINE_HOSTNAME_KEY, ENGINE_PORT_KEY};
pub use document::{
    identity_of, DocumentRecord, FlightPassengerDocument, PayloadKind, SearchDocument,
};
pub use elastic::ElasticClient;
pub use engine::{EngineHit, EngineSearchResponse, SearchEngine};
pub use error::{SearchError, SearchResult};
pub use indexer::{IndexPayload, IndexReport, Indexer};
pub use memory::InMemoryEngine;
pub use query::{
    Query, QueryBuilder, QuerySpec, SearchSort, SortOrder, FREE_TEXT_FIELDS,
    LINK_HIGHLIGHT_FIELDS,
};
pub use results::{
    project_link_hit, project_link_page, project_passenger_hit, project_search_page,
    render_highlights, DocumentResult, FlightPassengerResult, LinkPassengerResult,
    LinkResultPage, ResultPage, SearchResultPage,
};
pub use service::SearchService;
