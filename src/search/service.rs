//! Main search service implementation

use crate::config::ConfigSource;
use crate::models::{Flight, ManifestMessage, Passenger, ReservationMessage};
use crate::search::config::{SearchConfig, ENGINE_HOSTNAME_KEY, ENGINE_PORT_KEY};
use crate::search::elastic::ElasticClient;
use crate::search::engine::SearchEngine;
use crate::search::error::{SearchError, SearchResult};
use crate::search::indexer::{IndexPayload, IndexReport, Indexer};
use crate::search::query::QueryBuilder;
use crate::search::results::{project_link_page, project_search_page, LinkResultPage, SearchResultPage};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Main search service
///
/// Holds the single shared engine handle. Connecting and closing are lifecycle
/// events; while no engine is attached indexing is skipped and searches fail
/// with [`SearchError::EngineUnavailable`].
pub struct SearchService {
    /// Attached engine, if any
    engine: RwLock<Option<Arc<dyn SearchEngine>>>,

    /// Configuration
    config: SearchConfig,
}

impl SearchService {
    /// Create a service with no engine attached
    pub fn new(config: SearchConfig) -> Self {
        Self {
            engine: RwLock::new(None),
            config,
        }
    }

    /// Configuration in use
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Whether an engine is attached
    pub fn is_available(&self) -> bool {
        self.engine.read().is_some()
    }

    fn engine(&self) -> Option<Arc<dyn SearchEngine>> {
        self.engine.read().clone()
    }

    /// Connect to the engine named by the configuration source.
    ///
    /// Does nothing if already connected. Missing host/port leaves the
    /// integration disabled; an unreachable engine is logged and left detached.
    /// Returns whether the service is available afterwards.
    pub async fn connect(&self, source: &dyn ConfigSource) -> bool {
        if self.is_available() {
            return true;
        }

        match self.build_client(source) {
            Ok(client) => self.connect_with(Arc::new(client)).await,
            Err(SearchError::ConfigurationAbsent) => {
                info!("Search engine configuration not found");
                false
            }
            Err(e) => {
                error!(error = %e, "Search engine client init failed");
                false
            }
        }
    }

    fn build_client(&self, source: &dyn ConfigSource) -> SearchResult<ElasticClient> {
        let host = source.get_config_value(ENGINE_HOSTNAME_KEY);
        let port = source.get_config_value(ENGINE_PORT_KEY);
        let (host, port) = match (host, port) {
            (Some(host), Some(port)) => (host, port),
            _ => return Err(SearchError::ConfigurationAbsent),
        };

        let port: u16 = port.trim().parse().map_err(|_| {
            SearchError::InvalidConfiguration(format!("invalid engine port '{}'", port))
        })?;

        info!(host = %host, port = port, "Search engine client init");
        ElasticClient::from_host(host.trim(), port, &self.config)
    }

    /// Attach an already constructed engine after checking it answers and the index exists
    pub async fn connect_with(&self, engine: Arc<dyn SearchEngine>) -> bool {
        match Self::prepare(engine.as_ref(), &self.config.index_name).await {
            Ok(()) => {
                *self.engine.write() = Some(engine);
                info!(index = %self.config.index_name, "Search engine connected");
                true
            }
            Err(e) => {
                warn!(error = %e, "Init failed: search engine not available");
                false
            }
        }
    }

    async fn prepare(engine: &dyn SearchEngine, index: &str) -> SearchResult<()> {
        engine
            .ping()
            .await
            .map_err(|e| SearchError::EngineUnreachable(e.to_string()))?;
        engine
            .ensure_index(index)
            .await
            .map_err(|e| SearchError::EngineUnreachable(e.to_string()))
    }

    /// Detach the engine
    pub fn close(&self) {
        if self.engine.write().take().is_some() {
            info!("Closing search engine client");
        }
    }

    /// Index a manifest message: every passenger on every flight gets its `apis` payload
    pub async fn index_manifest_message(&self, message: &ManifestMessage) -> IndexReport {
        let payload = IndexPayload::Manifest { raw: &message.raw };
        self.index(&payload, &message.flights, &message.passengers)
            .await
    }

    /// Index a reservation message: every passenger on every flight gets its `pnr` payload
    pub async fn index_reservation_message(&self, message: &ReservationMessage) -> IndexReport {
        let payload = IndexPayload::Reservation {
            raw: &message.raw,
            addresses: &message.addresses,
        };
        self.index(&payload, &message.flights, &message.passengers)
            .await
    }

    async fn index(
        &self,
        payload: &IndexPayload<'_>,
        flights: &[Flight],
        passengers: &[Passenger],
    ) -> IndexReport {
        let Some(engine) = self.engine() else {
            debug!(kind = ?payload.kind(), "Search engine unavailable, skipping indexing");
            return IndexReport::default();
        };

        Indexer::new(engine, self.config.clone())
            .index(flights, passengers, payload)
            .await
    }

    /// Free-text passenger search
    pub async fn search_passengers(
        &self,
        query: &str,
        page: usize,
        page_size: usize,
        sort_field: &str,
        sort_direction: &str,
    ) -> SearchResult<SearchResultPage> {
        let engine = self.engine().ok_or(SearchError::EngineUnavailable)?;
        let spec = QueryBuilder::free_text(query, page, page_size, sort_field, sort_direction);

        let response = engine
            .search(&self.config.index_name, &self.config.doc_type, &spec)
            .await?;
        debug!(query = %query, total_hits = response.total_hits, "Passenger search executed");

        project_search_page(&response)
    }

    /// Find records linked to `passenger` by name or travel document
    pub async fn find_passenger_links(
        &self,
        passenger: &Passenger,
        page: usize,
        page_size: usize,
        sort_field: &str,
        sort_direction: &str,
    ) -> SearchResult<LinkResultPage> {
        let engine = self.engine().ok_or(SearchError::EngineUnavailable)?;
        let spec =
            QueryBuilder::link_analysis(passenger, page, page_size, sort_field, sort_direction);

        let response = engine
            .search(&self.config.index_name, &self.config.doc_type, &spec)
            .await?;
        debug!(
            passenger_id = passenger.id,
            total_hits = response.total_hits,
            "Link analysis executed"
        );

        Ok(project_link_page(&response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::memory::InMemoryEngine;
    use std::collections::HashMap;

    async fn create_test_service() -> (SearchService, InMemoryEngine) {
        let engine = InMemoryEngine::new().unwrap();
        let service = SearchService::new(SearchConfig::default());
        assert!(service.connect_with(Arc::new(engine.clone())).await);
        (service, engine)
    }

    #[tokio::test]
    async fn test_connect_with_creates_index() {
        let (service, engine) = create_test_service().await;
        assert!(service.is_available());
        assert!(engine.has_index("flightpax"));
    }

    #[tokio::test]
    async fn test_absent_configuration_disables_integration() {
        let service = SearchService::new(SearchConfig::default());
        let source: HashMap<String, String> = HashMap::new();

        assert!(!service.connect(&source).await);
        assert!(!service.is_available());

        let err = service
            .search_passengers("lee", 1, 10, "lastName", "asc")
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::EngineUnavailable));
    }

    #[tokio::test]
    async fn test_invalid_port_leaves_service_unavailable() {
        let service = SearchService::new(SearchConfig::default());
        let source: HashMap<String, String> = [
            (ENGINE_HOSTNAME_KEY.to_string(), "localhost".to_string()),
            (ENGINE_PORT_KEY.to_string(), "ninety-two".to_string()),
        ]
        .into_iter()
        .collect();

        assert!(!service.connect(&source).await);
        assert!(!service.is_available());
    }

    #[tokio::test]
    async fn test_indexing_while_unavailable_is_skipped() {
        let service = SearchService::new(SearchConfig::default());
        let message = ManifestMessage {
            raw: "APIS".to_string(),
            flights: vec![Flight::new(9, "UA", "1", "IAD", "LHR")],
            passengers: vec![Passenger::new(1, "Ann", "Lee")],
        };

        assert_eq!(service.index_manifest_message(&message).await, IndexReport::default());
    }

    #[tokio::test]
    async fn test_failed_reconnect_keeps_attached_engine() {
        let (service, engine) = create_test_service().await;
        let unreachable = ElasticClient::new("http://127.0.0.1:1", &SearchConfig::default()).unwrap();

        assert!(!service.connect_with(Arc::new(unreachable)).await);
        assert!(service.is_available());

        let message = ManifestMessage {
            raw: "APIS".to_string(),
            flights: vec![Flight::new(9, "UA", "1", "IAD", "LHR")],
            passengers: vec![Passenger::new(1, "Ann", "Lee")],
        };
        assert_eq!(service.index_manifest_message(&message).await.written, 1);
        assert_eq!(engine.document_count(), 1);
    }

    #[tokio::test]
    async fn test_close_detaches_engine() {
        let (service, _engine) = create_test_service().await;
        service.close();
        assert!(!service.is_available());
    }
}
