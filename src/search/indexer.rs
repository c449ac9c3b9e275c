//! Writes manifest and reservation payloads into flight-passenger documents

use crate::models::{Address, Flight, Passenger};
use crate::search::config::SearchConfig;
use crate::search::document::{FlightPassengerDocument, PayloadKind, SearchDocument};
use crate::search::engine::SearchEngine;
use crate::search::error::{SearchError, SearchResult};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Raw payload carried by one indexing call
#[derive(Debug, Clone)]
pub enum IndexPayload<'a> {
    /// Manifest text; stored under `apis`
    Manifest { raw: &'a str },
    /// Reservation text and the reservation's addresses; stored under `pnr`
    Reservation { raw: &'a str, addresses: &'a [Address] },
}

impl IndexPayload<'_> {
    pub fn kind(&self) -> PayloadKind {
        match self {
            IndexPayload::Manifest { .. } => PayloadKind::Manifest,
            IndexPayload::Reservation { .. } => PayloadKind::Reservation,
        }
    }

    pub fn raw(&self) -> &str {
        match self {
            IndexPayload::Manifest { raw } | IndexPayload::Reservation { raw, .. } => raw,
        }
    }
}

/// Outcome of indexing one message
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexReport {
    /// Passenger/flight pairs processed
    pub attempted: usize,
    /// Pairs written (created or merged)
    pub written: usize,
    /// Pairs whose write failed
    pub failed: usize,
}

/// Creates or merges one document per passenger/flight pair
pub struct Indexer {
    engine: Arc<dyn SearchEngine>,
    config: SearchConfig,
}

impl Indexer {
    pub fn new(engine: Arc<dyn SearchEngine>, config: SearchConfig) -> Self {
        Self { engine, config }
    }

    /// Index every passenger on every flight.
    ///
    /// A new pair gets a full document; an existing one only has the payload
    /// field merged, leaving its descriptive fields as first written. Write
    /// failures are logged and do not stop the batch.
    pub async fn index(
        &self,
        flights: &[Flight],
        passengers: &[Passenger],
        payload: &IndexPayload<'_>,
    ) -> IndexReport {
        let pairs: Vec<(&Passenger, &Flight)> = passengers
            .iter()
            .flat_map(|p| flights.iter().map(move |f| (p, f)))
            .collect();

        let outcomes: Vec<SearchResult<()>> = stream::iter(pairs)
            .map(|(passenger, flight)| self.index_pair(passenger, flight, payload))
            .buffer_unordered(self.config.index_concurrency.max(1))
            .collect()
            .await;

        let mut report = IndexReport {
            attempted: outcomes.len(),
            ..Default::default()
        };
        for outcome in outcomes {
            match outcome {
                Ok(()) => report.written += 1,
                Err(e) => {
                    report.failed += 1;
                    error!(error = %e, "Failed to index flight passenger");
                }
            }
        }

        info!(
            kind = ?payload.kind(),
            attempted = report.attempted,
            written = report.written,
            failed = report.failed,
            "Indexed message"
        );
        report
    }

    async fn index_pair(
        &self,
        passenger: &Passenger,
        flight: &Flight,
        payload: &IndexPayload<'_>,
    ) -> SearchResult<()> {
        let kind = payload.kind();
        let mut document =
            FlightPassengerDocument::project(passenger, flight).with_payload(kind, payload.raw());
        if let IndexPayload::Reservation { addresses, .. } = payload {
            document = document.with_addresses(addresses);
        }

        let id = document.document_id();
        let body = document.to_source()?;
        let value = Value::String(payload.raw().to_string());

        self.engine
            .upsert(
                &self.config.index_name,
                &self.config.doc_type,
                &id,
                kind.field_name(),
                &value,
                &body,
            )
            .await
            .map_err(|e| SearchError::WriteFailed {
                id: id.clone(),
                reason: e.to_string(),
            })?;

        debug!(document_id = %id, field = kind.field_name(), "Flight passenger indexed");
        Ok(())
    }
}
