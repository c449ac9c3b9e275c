//! Projection of engine hits into typed search results

use crate::models::{date_format, Address};
use crate::search::engine::{EngineHit, EngineSearchResponse};
use crate::search::error::{SearchError, SearchResult};
use crate::search::query::LINK_HIGHLIGHT_FIELDS;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// A page of results plus the engine's total hit count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultPage<T> {
    /// Records in query sort order
    pub records: Vec<T>,

    /// Total number of matching documents (may exceed `records.len()`)
    pub total_hits: u64,
}

/// Paged free-text search results
pub type SearchResultPage = ResultPage<FlightPassengerResult>;

/// Paged link-analysis results
pub type LinkResultPage = ResultPage<LinkPassengerResult>;

/// Travel document as returned by search
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResult {
    pub document_number: Option<String>,
    pub document_type: Option<String>,
    pub issuance_date: Option<NaiveDateTime>,
    pub expiration_date: Option<NaiveDateTime>,
    pub issuance_country: Option<String>,
    /// Owner's names, as stamped at indexing time
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Free-text search record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightPassengerResult {
    pub passenger_id: u64,
    pub flight_id: u64,
    pub passenger_type: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    /// Carrier code followed by flight number
    pub flight_number: String,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub addresses: BTreeSet<Address>,
    pub documents: Vec<DocumentResult>,
    pub apis: Option<String>,
    pub pnr: Option<String>,
}

/// Link-analysis record with a readable explanation of what matched
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkPassengerResult {
    pub passenger_id: u64,
    pub flight_id: u64,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub flight_number: String,
    pub highlight_match: String,
}

fn string_field(source: &Map<String, Value>, key: &str) -> Option<String> {
    source.get(key).and_then(Value::as_str).map(str::to_string)
}

fn id_field(source: &Map<String, Value>, key: &str) -> u64 {
    source.get(key).and_then(Value::as_u64).unwrap_or_default()
}

fn date_field(source: &Map<String, Value>, key: &str) -> SearchResult<Option<NaiveDateTime>> {
    match source.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(raw)) => date_format::parse(raw)
            .map(Some)
            .map_err(|_| SearchError::MalformedDate {
                field: key.to_string(),
                value: raw.clone(),
            }),
        Some(other) => Err(SearchError::MalformedDate {
            field: key.to_string(),
            value: other.to_string(),
        }),
    }
}

/// Carrier and flight number concatenated; a missing part contributes nothing
fn display_flight_number(source: &Map<String, Value>) -> String {
    format!(
        "{}{}",
        string_field(source, "carrier").unwrap_or_default(),
        string_field(source, "flightNumber").unwrap_or_default()
    )
}

fn nested_objects<'a>(
    source: &'a Map<String, Value>,
    key: &str,
) -> impl Iterator<Item = &'a Map<String, Value>> {
    source
        .get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
}

fn project_address(raw: &Map<String, Value>) -> Address {
    Address {
        line1: string_field(raw, "line1"),
        line2: string_field(raw, "line2"),
        line3: string_field(raw, "line3"),
        city: string_field(raw, "city"),
        state: string_field(raw, "state"),
        country: string_field(raw, "country"),
        postal_code: string_field(raw, "postalCode"),
    }
}

fn project_document(raw: &Map<String, Value>) -> SearchResult<DocumentResult> {
    Ok(DocumentResult {
        document_number: string_field(raw, "documentNumber"),
        document_type: string_field(raw, "documentType"),
        issuance_date: date_field(raw, "issuanceDate")?,
        expiration_date: date_field(raw, "expirationDate")?,
        issuance_country: string_field(raw, "issuanceCountry"),
        first_name: string_field(raw, "firstName"),
        last_name: string_field(raw, "lastName"),
    })
}

/// Project one free-text hit; fails on a malformed document date
pub fn project_passenger_hit(hit: &EngineHit) -> SearchResult<FlightPassengerResult> {
    let source = &hit.source;

    let documents = nested_objects(source, "documents")
        .map(project_document)
        .collect::<SearchResult<Vec<_>>>()?;

    Ok(FlightPassengerResult {
        passenger_id: id_field(source, "passengerId"),
        flight_id: id_field(source, "flightId"),
        passenger_type: string_field(source, "passengerType"),
        first_name: string_field(source, "firstName"),
        middle_name: string_field(source, "middleName"),
        last_name: string_field(source, "lastName"),
        flight_number: display_flight_number(source),
        origin: string_field(source, "origin"),
        destination: string_field(source, "destination"),
        addresses: nested_objects(source, "addresses").map(project_address).collect(),
        documents,
        apis: string_field(source, "apis"),
        pnr: string_field(source, "pnr"),
    })
}

/// Project a free-text response; the first malformed date aborts the whole page
pub fn project_search_page(response: &EngineSearchResponse) -> SearchResult<SearchResultPage> {
    let records = response
        .hits
        .iter()
        .map(project_passenger_hit)
        .collect::<SearchResult<Vec<_>>>()?;

    Ok(ResultPage {
        records,
        total_hits: response.total_hits,
    })
}

/// Render highlight fragments as readable text.
///
/// Link-analysis fields come first in their fixed order, any other field after
/// them in lexical order.
pub fn render_highlights(hit: &EngineHit) -> String {
    let mut fields: Vec<&str> = LINK_HIGHLIGHT_FIELDS
        .iter()
        .copied()
        .filter(|f| hit.highlight.contains_key(*f))
        .collect();
    let mut others: Vec<&str> = hit
        .highlight
        .keys()
        .map(String::as_str)
        .filter(|f| !LINK_HIGHLIGHT_FIELDS.contains(f))
        .collect();
    others.sort_unstable();
    fields.extend(others);

    let mut out = String::new();
    for field in fields {
        out.push_str("Field: ");
        out.push_str(field);
        out.push('\n');
        for fragment in &hit.highlight[field] {
            out.push_str("\nFragment: ");
            out.push_str(fragment);
            out.push_str("... \n");
        }
        out.push_str("\n---- \n");
    }
    out
}

/// Project one link-analysis hit
pub fn project_link_hit(hit: &EngineHit) -> LinkPassengerResult {
    let source = &hit.source;
    LinkPassengerResult {
        passenger_id: id_field(source, "passengerId"),
        flight_id: id_field(source, "flightId"),
        first_name: string_field(source, "firstName"),
        middle_name: string_field(source, "middleName"),
        last_name: string_field(source, "lastName"),
        flight_number: display_flight_number(source),
        highlight_match: render_highlights(hit),
    }
}

/// Project a link-analysis response
pub fn project_link_page(response: &EngineSearchResponse) -> LinkResultPage {
    ResultPage {
        records: response.hits.iter().map(project_link_hit).collect(),
        total_hits: response.total_hits,
    }
}
