//! Fixed textual date format shared by persisted documents and result projection

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serializer};

/// `yyyy-MM-ddTHH:mm`, minute precision, no zone
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Render a timestamp in the fixed format
pub fn format(value: &NaiveDateTime) -> String {
    value.format(DATE_FORMAT).to_string()
}

/// Parse a timestamp in the fixed format
pub fn parse(value: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(value, DATE_FORMAT)
}

/// Serde adapter for `Option<NaiveDateTime>` fields using [`DATE_FORMAT`]
pub mod option {
    use super::*;

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_some(&super::format(dt)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| super::parse(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
