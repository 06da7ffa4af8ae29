//! View models
//!
//! Typed records for documents, events and people as the UI consumes them.
//! Both data sources normalize into these shapes.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Category of a research document
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DataType {
    Report,
    Flash,
    Fundamentals,
    /// A type string outside the known set, kept so one record can't fail a collection
    Other(String),
}

impl DataType {
    /// The closed set of types that get a highlights bucket
    pub const KNOWN: [DataType; 3] = [DataType::Report, DataType::Flash, DataType::Fundamentals];

    pub fn as_str(&self) -> &str {
        match self {
            DataType::Report => "report",
            DataType::Flash => "flash",
            DataType::Fundamentals => "fundamentals",
            DataType::Other(s) => s,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, DataType::Other(_))
    }
}

impl From<String> for DataType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "report" => DataType::Report,
            "flash" => DataType::Flash,
            "fundamentals" => DataType::Fundamentals,
            _ => DataType::Other(s),
        }
    }
}

impl From<&str> for DataType {
    fn from(s: &str) -> Self {
        DataType::from(s.to_string())
    }
}

impl From<DataType> for String {
    fn from(t: DataType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of an event
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventStatus {
    Proposed,
    #[default]
    Pending,
    Confirmed,
    Cancelled,
    Postponed,
    Other(String),
}

impl EventStatus {
    pub fn as_str(&self) -> &str {
        match self {
            EventStatus::Proposed => "proposed",
            EventStatus::Pending => "pending",
            EventStatus::Confirmed => "confirmed",
            EventStatus::Cancelled => "cancelled",
            EventStatus::Postponed => "postponed",
            EventStatus::Other(s) => s,
        }
    }
}

impl From<String> for EventStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "proposed" => EventStatus::Proposed,
            "pending" => EventStatus::Pending,
            "confirmed" => EventStatus::Confirmed,
            "cancelled" => EventStatus::Cancelled,
            "postponed" => EventStatus::Postponed,
            _ => EventStatus::Other(s),
        }
    }
}

impl From<EventStatus> for String {
    fn from(s: EventStatus) -> Self {
        s.as_str().to_string()
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Preview of a research document (list views)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentPreview {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub summary: String,
    #[serde(rename = "type")]
    pub kind: DataType,
    /// ISO-8601 timestamp, empty when unknown
    #[serde(default, deserialize_with = "null_as_empty")]
    pub creation_time: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub last_modified: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Document with its full text and attachment link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentFull {
    #[serde(flatten)]
    pub preview: DocumentPreview,
    #[serde(default)]
    pub data: Option<String>,
    /// Download URL of the attached PDF
    #[serde(default)]
    pub attachment: Option<String>,
}

/// Preview of an event (list and calendar views)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPreview {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub summary: String,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Raw ISO-8601 date as delivered by the source
    #[serde(default, deserialize_with = "null_as_empty")]
    pub date: String,
    #[serde(default)]
    pub location_url: Option<String>,
    #[serde(default)]
    pub registration_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_url: Option<String>,
}

/// Event with its attachment link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventFull {
    #[serde(flatten)]
    pub preview: EventPreview,
    #[serde(default)]
    pub attachment: Option<String>,
}

/// Entry of the people directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tagline: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub linkedin: String,
    #[serde(rename = "attachmentUrl", alias = "attachment_url", default)]
    pub attachment_url: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
