//! Flight-passenger documents and their identity

use crate::models::{date_format, Address, Flight, Passenger, TravelDocument};
use crate::search::error::SearchResult;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Trait for documents that can be written to the search engine
pub trait SearchDocument {
    /// Get document ID
    fn document_id(&self) -> String;

    /// Convert to the JSON source persisted by the engine
    fn to_source(&self) -> SearchResult<serde_json::Value>;
}

/// Composite document key for one passenger on one flight: `"{flight_id}-{passenger_id}"`
pub fn identity_of(flight_id: u64, passenger_id: u64) -> String {
    format!("{}-{}", flight_id, passenger_id)
}

/// Which raw payload a write carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayloadKind {
    /// Passenger manifest text, stored under `apis`
    Manifest,
    /// Reservation text, stored under `pnr`
    Reservation,
}

impl PayloadKind {
    /// Document field holding this payload
    pub fn field_name(&self) -> &'static str {
        match self {
            PayloadKind::Manifest => "apis",
            PayloadKind::Reservation => "pnr",
        }
    }
}

/// Travel document as embedded in a flight-passenger document.
///
/// Names are those of the document's owner, which is not necessarily the
/// passenger the enclosing document was indexed for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    pub document_number: String,
    pub document_type: String,
    #[serde(default, with = "date_format::option")]
    pub issuance_date: Option<NaiveDateTime>,
    #[serde(default, with = "date_format::option")]
    pub expiration_date: Option<NaiveDateTime>,
    pub issuance_country: Option<String>,
    pub first_name: String,
    pub last_name: String,
}

impl From<&TravelDocument> for DocumentRecord {
    fn from(doc: &TravelDocument) -> Self {
        Self {
            document_number: doc.document_number.clone(),
            document_type: doc.document_type.clone(),
            issuance_date: doc.issuance_date,
            expiration_date: doc.expiration_date,
            issuance_country: doc.issuance_country.clone(),
            first_name: doc.owner.first_name.clone(),
            last_name: doc.owner.last_name.clone(),
        }
    }
}

/// Flat record persisted for one passenger on one flight
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlightPassengerDocument {
    pub flight_id: u64,
    pub passenger_id: u64,

    pub passenger_type: Option<String>,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub gender: Option<String>,
    pub citizenship_country: Option<String>,

    pub carrier: String,
    pub flight_number: String,
    pub origin: String,
    pub destination: String,

    pub documents: Vec<DocumentRecord>,

    /// Only populated from reservations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub addresses: Option<Vec<Address>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub apis: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pnr: Option<String>,
}

impl FlightPassengerDocument {
    /// Project a passenger on a flight into a document with no payload yet
    pub fn project(passenger: &Passenger, flight: &Flight) -> Self {
        Self {
            flight_id: flight.id,
            passenger_id: passenger.id,
            passenger_type: passenger.passenger_type.clone(),
            first_name: passenger.first_name.clone(),
            middle_name: passenger.middle_name.clone(),
            last_name: passenger.last_name.clone(),
            gender: passenger.gender.clone(),
            citizenship_country: passenger.citizenship_country.clone(),
            carrier: flight.carrier.clone(),
            flight_number: flight.flight_number.clone(),
            origin: flight.origin.clone(),
            destination: flight.destination.clone(),
            documents: passenger.documents.iter().map(DocumentRecord::from).collect(),
            addresses: None,
            apis: None,
            pnr: None,
        }
    }

    /// Set the raw payload field for `kind`
    pub fn with_payload(mut self, kind: PayloadKind, raw: impl Into<String>) -> Self {
        match kind {
            PayloadKind::Manifest => self.apis = Some(raw.into()),
            PayloadKind::Reservation => self.pnr = Some(raw.into()),
        }
        self
    }

    /// Attach reservation addresses, collapsing structural duplicates
    pub fn with_addresses(mut self, addresses: &[Address]) -> Self {
        let unique: BTreeSet<Address> = addresses.iter().cloned().collect();
        self.addresses = Some(unique.into_iter().collect());
        self
    }
}

impl SearchDocument for FlightPassengerDocument {
    fn document_id(&self) -> String {
        identity_of(self.flight_id, self.passenger_id)
    }

    fn to_source(&self) -> SearchResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}
