//! Upstream message types feeding the search projection

use serde::{Deserialize, Serialize};

use super::{Address, Flight, Passenger};

/// Passenger manifest received for one or more flights
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestMessage {
    /// Raw message text as received
    pub raw: String,

    #[serde(default)]
    pub flights: Vec<Flight>,

    #[serde(default)]
    pub passengers: Vec<Passenger>,
}

/// Reservation (booking) record received for one or more flights
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationMessage {
    /// Raw message text as received
    pub raw: String,

    #[serde(default)]
    pub flights: Vec<Flight>,

    #[serde(default)]
    pub passengers: Vec<Passenger>,

    /// Addresses listed on the reservation
    #[serde(default)]
    pub addresses: Vec<Address>,
}
