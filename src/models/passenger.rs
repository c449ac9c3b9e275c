use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::date_format;

/// A passenger as carried by manifest and reservation messages
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Passenger {
    /// System-of-record identifier
    pub id: u64,

    /// Passenger type code (e.g. "P" passenger, "C" crew)
    #[serde(default)]
    pub passenger_type: Option<String>,

    pub first_name: String,

    #[serde(default)]
    pub middle_name: Option<String>,

    pub last_name: String,

    #[serde(default)]
    pub gender: Option<String>,

    #[serde(default)]
    pub citizenship_country: Option<String>,

    /// Travel documents presented for this passenger
    #[serde(default)]
    pub documents: Vec<TravelDocument>,
}

impl Passenger {
    /// Create a new passenger with no documents
    pub fn new(id: u64, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id,
            passenger_type: None,
            first_name: first_name.into(),
            middle_name: None,
            last_name: last_name.into(),
            gender: None,
            citizenship_country: None,
            documents: Vec::new(),
        }
    }

    /// Set the passenger type code
    pub fn with_passenger_type(mut self, passenger_type: impl Into<String>) -> Self {
        self.passenger_type = Some(passenger_type.into());
        self
    }

    /// Set the middle name
    pub fn with_middle_name(mut self, middle_name: impl Into<String>) -> Self {
        self.middle_name = Some(middle_name.into());
        self
    }

    /// Attach a document owned by this passenger
    pub fn with_document(
        mut self,
        document_number: impl Into<String>,
        document_type: impl Into<String>,
    ) -> Self {
        let document = TravelDocument::new(document_number, document_type, self.as_owner());
        self.documents.push(document);
        self
    }

    /// Attach a document as-is, keeping whatever owner it already carries
    pub fn with_travel_document(mut self, document: TravelDocument) -> Self {
        self.documents.push(document);
        self
    }

    /// Owner reference stamped onto documents belonging to this passenger
    pub fn as_owner(&self) -> DocumentOwner {
        DocumentOwner {
            passenger_id: self.id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
        }
    }

    /// Numbers of all travel documents, in presentation order
    pub fn document_numbers(&self) -> Vec<String> {
        self.documents
            .iter()
            .map(|d| d.document_number.clone())
            .collect()
    }
}

/// The passenger a travel document belongs to.
///
/// A document reached through one passenger's message may still belong to a
/// different passenger record, so the owner travels with the document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentOwner {
    pub passenger_id: u64,
    pub first_name: String,
    pub last_name: String,
}

/// Passport, visa or similar identity document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TravelDocument {
    pub document_number: String,

    pub document_type: String,

    #[serde(default, with = "date_format::option")]
    pub issuance_date: Option<NaiveDateTime>,

    #[serde(default, with = "date_format::option")]
    pub expiration_date: Option<NaiveDateTime>,

    #[serde(default)]
    pub issuance_country: Option<String>,

    /// Owning passenger
    pub owner: DocumentOwner,
}

impl TravelDocument {
    /// Create a document with no dates or issuing country
    pub fn new(
        document_number: impl Into<String>,
        document_type: impl Into<String>,
        owner: DocumentOwner,
    ) -> Self {
        Self {
            document_number: document_number.into(),
            document_type: document_type.into(),
            issuance_date: None,
            expiration_date: None,
            issuance_country: None,
            owner,
        }
    }

    pub fn with_issuance(mut self, country: impl Into<String>, date: NaiveDateTime) -> Self {
        self.issuance_country = Some(country.into());
        self.issuance_date = Some(date);
        self
    }

    pub fn with_expiration(mut self, date: NaiveDateTime) -> Self {
        self.expiration_date = Some(date);
        self
    }
}

/// Postal address attached to a reservation.
///
/// Identity is structural: two addresses with identical fields are the same address.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)]
    pub line1: Option<String>,
    #[serde(default)]
    pub line2: Option<String>,
    #[serde(default)]
    pub line3: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
}
