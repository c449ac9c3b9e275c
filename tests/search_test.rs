//! End-to-end tests for the search projection against the in-process engine

use async_trait::async_trait;
use chrono::NaiveDate;
use flightpax_search::models::*;
use flightpax_search::search::*;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio_test::assert_ok;

/// Helper to create a connected service and a handle on its engine
async fn create_test_service() -> (SearchService, InMemoryEngine) {
    let engine = InMemoryEngine::new().unwrap();
    let service = SearchService::new(SearchConfig::default());
    assert!(service.connect_with(Arc::new(engine.clone())).await);
    (service, engine)
}

fn flight_9() -> Flight {
    Flight::new(9, "UA", "123", "IAD", "LHR")
}

fn manifest(raw: &str, flights: Vec<Flight>, passengers: Vec<Passenger>) -> ManifestMessage {
    ManifestMessage {
        raw: raw.to_string(),
        flights,
        passengers,
    }
}

fn reservation(
    raw: &str,
    flights: Vec<Flight>,
    passengers: Vec<Passenger>,
    addresses: Vec<Address>,
) -> ReservationMessage {
    ReservationMessage {
        raw: raw.to_string(),
        flights,
        passengers,
        addresses,
    }
}

async fn stored(engine: &InMemoryEngine, id: &str) -> Value {
    engine
        .get("flightpax", "flightpax", id)
        .await
        .unwrap()
        .expect("document should exist")
}

#[tokio::test]
async fn test_manifest_then_search_by_last_name() {
    let (service, _engine) = create_test_service().await;

    let report = service
        .index_manifest_message(&manifest(
            "UNH+1+PAXLST LEE ANN",
            vec![flight_9()],
            vec![Passenger::new(1, "Ann", "Lee")],
        ))
        .await;
    assert_eq!(report.written, 1);

    let page = assert_ok!(
        service
            .search_passengers("Lee", 1, 10, "lastName", "asc")
            .await
    );

    assert_eq!(page.total_hits, 1);
    assert_eq!(page.records.len(), 1);

    let record = &page.records[0];
    assert_eq!(record.flight_id, 9);
    assert_eq!(record.passenger_id, 1);
    assert_eq!(record.flight_number, "UA123");
    assert_eq!(record.origin.as_deref(), Some("IAD"));
    assert_eq!(record.apis.as_deref(), Some("UNH+1+PAXLST LEE ANN"));
    assert!(record.pnr.is_none());
    assert!(record.addresses.is_empty());
}

#[tokio::test]
async fn test_manifest_and_reservation_merge_into_one_document() {
    let (service, engine) = create_test_service().await;
    let pax = Passenger::new(1, "Ann", "Lee");

    service
        .index_manifest_message(&manifest("APIS TEXT", vec![flight_9()], vec![pax.clone()]))
        .await;
    service
        .index_reservation_message(&reservation(
            "PNR TEXT",
            vec![flight_9()],
            vec![pax],
            vec![],
        ))
        .await;

    assert_eq!(engine.document_count(), 1);
    let doc = stored(&engine, "9-1").await;
    assert_eq!(doc["apis"], "APIS TEXT");
    assert_eq!(doc["pnr"], "PNR TEXT");
}

#[tokio::test]
async fn test_descriptive_fields_kept_from_first_write() {
    let (service, engine) = create_test_service().await;

    let addresses = vec![
        Address {
            line1: Some("1 Main St".to_string()),
            city: Some("Springfield".to_string()),
            ..Default::default()
        },
        Address {
            line1: Some("1 Main St".to_string()),
            city: Some("Springfield".to_string()),
            ..Default::default()
        },
    ];

    service
        .index_reservation_message(&reservation(
            "PNR TEXT",
            vec![flight_9()],
            vec![Passenger::new(1, "Ann", "Lee")],
            addresses,
        ))
        .await;
    service
        .index_manifest_message(&manifest(
            "APIS TEXT",
            vec![flight_9()],
            vec![Passenger::new(1, "Anne", "Leigh")],
        ))
        .await;

    let doc = stored(&engine, "9-1").await;
    assert_eq!(doc["firstName"], "Ann");
    assert_eq!(doc["lastName"], "Lee");
    assert_eq!(doc["apis"], "APIS TEXT");

    // Structural duplicates collapse to one address
    assert_eq!(doc["addresses"].as_array().unwrap().len(), 1);

    let page = service
        .search_passengers("springfield", 1, 10, "", "")
        .await
        .unwrap();
    assert_eq!(page.total_hits, 1);
    assert_eq!(page.records[0].addresses.len(), 1);
}

#[tokio::test]
async fn test_same_kind_reindex_overwrites_payload_only() {
    let (service, engine) = create_test_service().await;
    let message = manifest("APIS V1", vec![flight_9()], vec![Passenger::new(1, "Ann", "Lee")]);

    service.index_manifest_message(&message).await;
    service.index_manifest_message(&message).await;
    assert_eq!(engine.document_count(), 1);
    assert_eq!(stored(&engine, "9-1").await["apis"], "APIS V1");

    service
        .index_manifest_message(&manifest(
            "APIS V2",
            vec![flight_9()],
            vec![Passenger::new(1, "Ann", "Lee")],
        ))
        .await;
    assert_eq!(engine.document_count(), 1);
    assert_eq!(stored(&engine, "9-1").await["apis"], "APIS V2");
}

#[tokio::test]
async fn test_cross_product_indexing() {
    let (service, engine) = create_test_service().await;

    let report = service
        .index_manifest_message(&manifest(
            "APIS",
            vec![flight_9(), Flight::new(10, "UA", "124", "LHR", "IAD")],
            vec![Passenger::new(1, "Ann", "Lee"), Passenger::new(2, "Bo", "Kim")],
        ))
        .await;

    assert_eq!(report.attempted, 4);
    assert_eq!(report.written, 4);
    assert_eq!(engine.document_count(), 4);
    for id in ["9-1", "9-2", "10-1", "10-2"] {
        assert!(engine.exists("flightpax", "flightpax", id).await.unwrap());
    }
}

#[tokio::test]
async fn test_pagination_and_sort() {
    let (service, _engine) = create_test_service().await;

    let passengers: Vec<Passenger> = ["Eve", "Cy", "Ann", "Dee", "Bo"]
        .iter()
        .enumerate()
        .map(|(i, first)| Passenger::new(i as u64 + 1, *first, "Smith"))
        .collect();
    service
        .index_manifest_message(&manifest("APIS", vec![flight_9()], passengers))
        .await;

    let page = service
        .search_passengers("smith", 2, 2, "firstName", "asc")
        .await
        .unwrap();
    assert_eq!(page.total_hits, 5);
    let names: Vec<_> = page
        .records
        .iter()
        .map(|r| r.first_name.clone().unwrap())
        .collect();
    assert_eq!(names, vec!["Cy", "Dee"]);

    // Unrecognised direction sorts descending
    let page = service
        .search_passengers("smith", 1, 10, "firstName", "sideways")
        .await
        .unwrap();
    assert_eq!(page.records[0].first_name.as_deref(), Some("Eve"));
    assert_eq!(page.records[4].first_name.as_deref(), Some("Ann"));

    // Page 0 is the first page
    let page = service
        .search_passengers("smith", 0, 2, "firstName", "ASC")
        .await
        .unwrap();
    assert_eq!(page.records[0].first_name.as_deref(), Some("Ann"));
}

#[tokio::test]
async fn test_document_dates_survive_round_trip() {
    let (service, _engine) = create_test_service().await;
    let expires = NaiveDate::from_ymd_opt(2030, 1, 2)
        .unwrap()
        .and_hms_opt(10, 30, 0)
        .unwrap();

    let pax = Passenger::new(1, "Ann", "Lee");
    let pax = pax.clone().with_travel_document(
        TravelDocument::new("X1", "P", pax.as_owner())
            .with_issuance("USA", expires - chrono::Duration::days(3650))
            .with_expiration(expires),
    );

    service
        .index_manifest_message(&manifest("APIS", vec![flight_9()], vec![pax]))
        .await;

    let page = service
        .search_passengers("x1", 1, 10, "", "")
        .await
        .unwrap();
    assert_eq!(page.total_hits, 1);

    let document = &page.records[0].documents[0];
    assert_eq!(document.document_number.as_deref(), Some("X1"));
    assert_eq!(document.expiration_date, Some(expires));
    assert_eq!(document.issuance_country.as_deref(), Some("USA"));
    assert_eq!(document.last_name.as_deref(), Some("Lee"));
}

#[tokio::test]
async fn test_malformed_date_fails_the_page() {
    let (service, engine) = create_test_service().await;

    engine
        .create(
            "flightpax",
            "flightpax",
            "9-1",
            &json!({
                "flightId": 9,
                "passengerId": 1,
                "firstName": "Ann",
                "lastName": "Lee",
                "documents": [{
                    "documentNumber": "X1",
                    "documentType": "P",
                    "expirationDate": "02/01/2030",
                    "firstName": "Ann",
                    "lastName": "Lee"
                }]
            }),
        )
        .await
        .unwrap();

    let err = service
        .search_passengers("lee", 1, 10, "", "")
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::MalformedDate { ref field, .. } if field == "expirationDate"));
}

#[tokio::test]
async fn test_missing_fields_project_to_defaults() {
    let (service, engine) = create_test_service().await;

    engine
        .create(
            "flightpax",
            "flightpax",
            "legacy",
            &json!({ "lastName": "Lee", "flightNumber": "77" }),
        )
        .await
        .unwrap();

    let page = service
        .search_passengers("lee", 1, 10, "", "")
        .await
        .unwrap();
    let record = &page.records[0];
    assert_eq!(record.passenger_id, 0);
    assert_eq!(record.flight_id, 0);
    assert_eq!(record.flight_number, "77");
    assert!(record.addresses.is_empty());
    assert!(record.documents.is_empty());
}

#[tokio::test]
async fn test_passenger_type_and_middle_name_survive_projection() {
    let (service, _engine) = create_test_service().await;
    let pax = Passenger::new(1, "Ann", "Lee")
        .with_passenger_type("P")
        .with_middle_name("Marie");

    service
        .index_manifest_message(&manifest("APIS", vec![flight_9()], vec![pax.clone()]))
        .await;

    let page = service
        .search_passengers("lee", 1, 10, "", "")
        .await
        .unwrap();
    let record = &page.records[0];
    assert_eq!(record.passenger_type.as_deref(), Some("P"));
    assert_eq!(record.middle_name.as_deref(), Some("Marie"));

    let links = service
        .find_passenger_links(&pax, 1, 10, "", "")
        .await
        .unwrap();
    assert_eq!(links.records[0].middle_name.as_deref(), Some("Marie"));
}

#[tokio::test]
async fn test_concurrent_manifest_and_reservation_for_same_pair() {
    let (service, engine) = create_test_service().await;
    let pax = Passenger::new(1, "Ann", "Lee");
    let apis = manifest("A", vec![flight_9()], vec![pax.clone()]);
    let pnr = reservation("P", vec![flight_9()], vec![pax], vec![]);

    let (apis_report, pnr_report) = tokio::join!(
        service.index_manifest_message(&apis),
        service.index_reservation_message(&pnr)
    );

    assert_eq!(apis_report.written, 1);
    assert_eq!(pnr_report.written, 1);
    assert_eq!(engine.document_count(), 1);

    let doc = stored(&engine, "9-1").await;
    assert_eq!(doc["apis"], "A");
    assert_eq!(doc["pnr"], "P");

    let page = service
        .search_passengers("lee", 1, 10, "", "")
        .await
        .unwrap();
    assert_eq!(page.total_hits, 1);
    assert_eq!(page.records[0].apis.as_deref(), Some("A"));
    assert_eq!(page.records[0].pnr.as_deref(), Some("P"));
}

#[tokio::test]
async fn test_duplicate_passenger_in_one_message_writes_one_document() {
    let (service, engine) = create_test_service().await;
    let pax = Passenger::new(1, "Ann", "Lee");

    let apis = manifest("A", vec![flight_9()], vec![pax.clone(), pax.clone(), pax.clone()]);
    let pnr = reservation("P", vec![flight_9()], vec![pax.clone(), pax], vec![]);

    let (apis_report, pnr_report) = tokio::join!(
        service.index_manifest_message(&apis),
        service.index_reservation_message(&pnr)
    );

    assert_eq!(apis_report.attempted, 3);
    assert_eq!(apis_report.failed, 0);
    assert_eq!(pnr_report.attempted, 2);
    assert_eq!(pnr_report.failed, 0);
    assert_eq!(engine.document_count(), 1);

    let doc = stored(&engine, "9-1").await;
    assert_eq!(doc["apis"], "A");
    assert_eq!(doc["pnr"], "P");
    assert_eq!(doc["lastName"], "Lee");

    let page = service
        .search_passengers("lee", 1, 10, "", "")
        .await
        .unwrap();
    assert_eq!(page.total_hits, 1);
}

#[tokio::test]
async fn test_link_analysis_by_name_document_and_reservation_text() {
    let (service, _engine) = create_test_service().await;

    let ann = Passenger::new(1, "Ann", "Lee").with_document("X1", "P");
    let bo = Passenger::new(2, "Bo", "Kim").with_document("X1", "P");
    let dee = Passenger::new(4, "Dee", "Fox").with_document("Z9", "P");

    service
        .index_manifest_message(&manifest(
            "APIS",
            vec![flight_9()],
            vec![ann.clone(), bo, dee],
        ))
        .await;
    service
        .index_reservation_message(&reservation(
            "SSR TRAVELLING WITH LEE",
            vec![flight_9()],
            vec![Passenger::new(3, "Cy", "Ng")],
            vec![],
        ))
        .await;

    let page = assert_ok!(
        service
            .find_passenger_links(&ann, 1, 10, "passengerId", "asc")
            .await
    );

    assert_eq!(page.total_hits, 3);
    let ids: Vec<u64> = page.records.iter().map(|r| r.passenger_id).collect();
    assert_eq!(ids, vec![1, 2, 3]);

    let self_match = &page.records[0];
    assert_eq!(self_match.flight_number, "UA123");
    assert!(self_match
        .highlight_match
        .starts_with("Field: documents.documentNumber\n"));
    assert!(self_match.highlight_match.contains("Field: lastName\n"));
    assert!(self_match.highlight_match.contains("<em>Lee</em>"));

    let by_document = &page.records[1];
    assert_eq!(
        by_document.highlight_match,
        "Field: documents.documentNumber\n\nFragment: <em>X1</em>... \n\n---- \n"
    );

    let by_reservation = &page.records[2];
    assert_eq!(
        by_reservation.highlight_match,
        "Field: pnr\n\nFragment: SSR TRAVELLING WITH <em>LEE</em>... \n\n---- \n"
    );
}

#[tokio::test]
async fn test_operations_while_unavailable() {
    let service = SearchService::new(SearchConfig::default());

    let report = service
        .index_reservation_message(&reservation(
            "PNR",
            vec![flight_9()],
            vec![Passenger::new(1, "Ann", "Lee")],
            vec![],
        ))
        .await;
    assert_eq!(report, IndexReport::default());

    let err = service
        .find_passenger_links(&Passenger::new(1, "Ann", "Lee"), 1, 10, "", "")
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::EngineUnavailable));
}

/// Engine that refuses writes for one document and delegates everything else
struct FailingEngine {
    inner: InMemoryEngine,
    reject_id: &'static str,
}

#[async_trait]
impl SearchEngine for FailingEngine {
    async fn ping(&self) -> SearchResult<()> {
        self.inner.ping().await
    }

    async fn ensure_index(&self, index: &str) -> SearchResult<()> {
        self.inner.ensure_index(index).await
    }

    async fn exists(&self, index: &str, doc_type: &str, id: &str) -> SearchResult<bool> {
        self.inner.exists(index, doc_type, id).await
    }

    async fn get(&self, index: &str, doc_type: &str, id: &str) -> SearchResult<Option<Value>> {
        self.inner.get(index, doc_type, id).await
    }

    async fn create(&self, index: &str, doc_type: &str, id: &str, body: &Value) -> SearchResult<()> {
        self.inner.create(index, doc_type, id, body).await
    }

    async fn partial_update(
        &self,
        index: &str,
        doc_type: &str,
        id: &str,
        field: &str,
        value: &Value,
    ) -> SearchResult<()> {
        self.inner
            .partial_update(index, doc_type, id, field, value)
            .await
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
        if id == self.reject_id {
            return Err(SearchError::Request("rejected".to_string()));
        }
        self.inner
            .upsert(index, doc_type, id, field, value, body)
            .await
    }

    async fn search(
        &self,
        index: &str,
        doc_type: &str,
        spec: &QuerySpec,
    ) -> SearchResult<EngineSearchResponse> {
        self.inner.search(index, doc_type, spec).await
    }
}

#[tokio::test]
async fn test_failed_write_does_not_stop_the_batch() {
    let inner = InMemoryEngine::new().unwrap();
    let service = SearchService::new(SearchConfig::default());
    assert!(
        service
            .connect_with(Arc::new(FailingEngine {
                inner: inner.clone(),
                reject_id: "9-2",
            }))
            .await
    );

    let report = service
        .index_manifest_message(&manifest(
            "APIS",
            vec![flight_9()],
            vec![
                Passenger::new(1, "Ann", "Lee"),
                Passenger::new(2, "Bo", "Kim"),
                Passenger::new(3, "Cy", "Ng"),
            ],
        ))
        .await;

    assert_eq!(report.attempted, 3);
    assert_eq!(report.written, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(inner.document_count(), 2);
    assert!(!inner.exists("flightpax", "flightpax", "9-2").await.unwrap());
}
