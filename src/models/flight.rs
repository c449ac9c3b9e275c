use serde::{Deserialize, Serialize};

/// A flight leg referenced by manifest and reservation messages
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Flight {
    /// System-of-record identifier
    pub id: u64,

    /// Two or three letter carrier code
    pub carrier: String,

    /// Flight number without the carrier prefix
    pub flight_number: String,

    /// Origin station code
    pub origin: String,

    /// Destination station code
    pub destination: String,
}

impl Flight {
    pub fn new(
        id: u64,
        carrier: impl Into<String>,
        flight_number: impl Into<String>,
        origin: impl Into<String>,
        destination: impl Into<String>,
    ) -> Self {
        Self {
            id,
            carrier: carrier.into(),
            flight_number: flight_number.into(),
            origin: origin.into(),
            destination: destination.into(),
        }
    }

    /// Carrier code followed by flight number, e.g. "UA0123"
    pub fn display_number(&self) -> String {
        format!("{}{}", self.carrier, self.flight_number)
    }
}
