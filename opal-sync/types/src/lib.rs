//! Wire types for the Opal notes API, shared by the sync client and its tests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =====================================================
// Records
// =====================================================

/// A note record as listed by `GET /`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteRecord {
    #[serde(rename = "_id")]
    pub id: String,
    /// Older records may have been stored without a title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(rename = "lastModified", with = "iso8601")]
    pub last_modified: DateTime<Utc>,
}

// =====================================================
// Request / Response bodies
// =====================================================

/// Body of `POST /` and `PUT /<id>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotePayload {
    pub title: String,
    pub content: String,
    #[serde(rename = "lastModified", with = "iso8601")]
    pub last_modified: DateTime<Utc>,
}

impl NotePayload {
    pub fn new(title: impl Into<String>, content: impl Into<String>, last_modified: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            last_modified,
        }
    }
}

/// Response of `POST /`. Extra fields the API echoes back are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "lastModified", with = "iso8601")]
    pub last_modified: DateTime<Utc>,
}

/// Response of `PUT /<id>`. The API is not required to return anything useful.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdatedRecord {
    #[serde(
        rename = "lastModified",
        default,
        with = "iso8601::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_modified: Option<DateTime<Utc>>,
}

// =====================================================
// Timestamp format
// =====================================================

/// ISO-8601 timestamps in the form the API produces: millisecond precision, `Z` suffix.
pub mod iso8601 {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    /// `2024-01-01T00:00:00.000Z`
    pub fn format(dt: &DateTime<Utc>) -> String {
        dt.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn parse(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
        DateTime::parse_from_rfc3339(s.trim()).map(|dt| dt.with_timezone(&Utc))
    }

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(dt))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(D::Error::custom)
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::de::Error;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            dt: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match dt {
                Some(dt) => serializer.serialize_str(&super::format(dt)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) => super::parse(&raw).map(Some).map_err(D::Error::custom),
                None => Ok(None),
            }
        }
    }
}
