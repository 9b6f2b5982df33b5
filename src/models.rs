use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::deadline;

/// Registration status of an event. `Attended` is terminal for urgency,
/// priority and reminders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventStatus {
    Registered,
    Attended,
    Other(String),
}

impl EventStatus {
    /// Parses a stored label. Blank labels are the unset state.
    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim();
        if label.is_empty() {
            None
        } else {
            Some(Self::from(label.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventStatus::Registered => "Registered",
            EventStatus::Attended => "Attended",
            EventStatus::Other(label) => label,
        }
    }
}

impl From<String> for EventStatus {
    fn from(label: String) -> Self {
        match label.as_str() {
            "Registered" => EventStatus::Registered,
            "Attended" => EventStatus::Attended,
            _ => EventStatus::Other(label),
        }
    }
}

impl From<EventStatus> for String {
    fn from(status: EventStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn deserialize_status<'de, D>(deserializer: D) -> Result<Option<EventStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    let label = Option::<String>::deserialize(deserializer)?;
    Ok(label.as_deref().and_then(EventStatus::parse))
}

/// One event record as held by the record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub event_date: Option<NaiveDate>,
    /// Raw deadline text; see [`deadline::parse_deadline`] for accepted forms.
    pub registration_deadline: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "deserialize_status")]
    pub status: Option<EventStatus>,
    #[serde(default)]
    pub reminder: bool,
    #[serde(default)]
    pub certificate_url: Option<String>,
    #[serde(default)]
    pub brochure_url: Option<String>,
}

impl Event {
    pub fn is_attended(&self) -> bool {
        self.status == Some(EventStatus::Attended)
    }

    /// The deadline as an instant, or `None` when the stored text is malformed.
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        deadline::parse_deadline(&self.registration_deadline)
    }

    pub fn days_left(&self, now: DateTime<Utc>) -> Option<i64> {
        self.deadline().map(|deadline| deadline::days_left(deadline, now))
    }
}

/// Field map used to create a new event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventFields {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub event_date: Option<NaiveDate>,
    pub registration_deadline: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "deserialize_status")]
    pub status: Option<EventStatus>,
    #[serde(default)]
    pub reminder: bool,
}

impl EventFields {
    pub fn deadline_is_malformed(&self) -> bool {
        deadline::parse_deadline(&self.registration_deadline).is_none()
    }
}

/// Partial update. `None` leaves a field untouched; for the document URLs
/// `Some(None)` clears the stored value and serializes as `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EventPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_deadline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EventStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminder: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_url: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brochure_url: Option<Option<String>>,
}

impl EventPatch {
    pub fn attach(kind: DocumentKind, url: impl Into<String>) -> Self {
        Self::document(kind, Some(url.into()))
    }

    pub fn clear(kind: DocumentKind) -> Self {
        Self::document(kind, None)
    }

    fn document(kind: DocumentKind, url: Option<String>) -> Self {
        match kind {
            DocumentKind::Certificate => EventPatch {
                certificate_url: Some(url),
                ..Default::default()
            },
            DocumentKind::Brochure => EventPatch {
                brochure_url: Some(url),
                ..Default::default()
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == EventPatch::default()
    }
}

/// Supporting document attached to an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DocumentKind {
    Certificate,
    Brochure,
}

impl DocumentKind {
    /// Storage folder the document is uploaded under.
    pub fn folder(self) -> &'static str {
        match self {
            DocumentKind::Certificate => "certificate",
            DocumentKind::Brochure => "brochure",
        }
    }

    pub fn url_of(self, event: &Event) -> Option<&str> {
        match self {
            DocumentKind::Certificate => event.certificate_url.as_deref(),
            DocumentKind::Brochure => event.brochure_url.as_deref(),
        }
    }
}

/// Urgency classification derived from days remaining and status.
///
/// For events that are still active the tiers are ordered
/// `Past < Critical < Normal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UrgencyTier {
    Past,
    Critical,
    Normal,
    /// Attended; never urgent.
    Settled,
    /// The deadline could not be parsed.
    Unknown,
}

impl UrgencyTier {
    pub fn label(self) -> &'static str {
        match self {
            UrgencyTier::Past => "past",
            UrgencyTier::Critical => "critical",
            UrgencyTier::Normal => "normal",
            UrgencyTier::Settled => "settled",
            UrgencyTier::Unknown => "unknown",
        }
    }
}

/// An event with its time-relative values for one render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnotatedEvent<'a> {
    pub event: &'a Event,
    pub days_left: Option<i64>,
    pub urgency: UrgencyTier,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EventStats {
    pub total: usize,
    pub urgent_count: usize,
    pub registered_count: usize,
    pub pending_certificate_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reminder<'a> {
    pub event: &'a Event,
    pub days_left: i64,
    pub message: String,
}

#[cfg(test)]
pub mod fixtures {
    use chrono::{DateTime, TimeZone, Utc};
    use uuid::Uuid;

    use super::{Event, EventStatus};

    pub fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 9, 30, 0).unwrap()
    }

    pub fn event(name: &str, deadline: DateTime<Utc>, status: Option<EventStatus>) -> Event {
        Event {
            id: Uuid::new_v4(),
            name: name.to_string(),
            category: Some("Hackathon".to_string()),
            source: Some("Devpost".to_string()),
            event_date: Some(deadline.date_naive()),
            registration_deadline: deadline.to_rfc3339(),
            link: Some("https://example.com/register".to_string()),
            notes: None,
            status,
            reminder: false,
            certificate_url: None,
            brochure_url: None,
        }
    }

    pub fn event_in_days(name: &str, days: i64, status: Option<EventStatus>) -> Event {
        event(name, now() + chrono::Duration::days(days), status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_known_and_free_text_labels() {
        assert_eq!(EventStatus::parse("Registered"), Some(EventStatus::Registered));
        assert_eq!(EventStatus::parse("Attended"), Some(EventStatus::Attended));
        assert_eq!(
            EventStatus::parse("Interested"),
            Some(EventStatus::Other("Interested".to_string()))
        );
        assert_eq!(EventStatus::parse("  "), None);
    }

    #[test]
    fn event_reads_snake_case_wire_shape() {
        let json = r#"{
            "id": "3d7f5d6f-24f7-4e8e-8b4b-3e7e44b4a7b2",
            "name": "RustConf",
            "category": "Conference",
            "event_date": "2026-09-01",
            "registration_deadline": "2026-08-01T12:00",
            "status": "",
            "certificate_url": null
        }"#;

        let event: Event = serde_json::from_str(json).unwrap();
        assert_eq!(event.name, "RustConf");
        assert_eq!(event.status, None);
        assert!(!event.reminder);
        assert_eq!(event.certificate_url, None);
        assert_eq!(event.event_date, NaiveDate::from_ymd_opt(2026, 9, 1));
    }

    #[test]
    fn clearing_a_document_serializes_null() {
        let patch = EventPatch::clear(DocumentKind::Certificate);
        assert_eq!(
            serde_json::to_string(&patch).unwrap(),
            r#"{"certificate_url":null}"#
        );

        let patch = EventPatch::attach(DocumentKind::Brochure, "https://cdn/b.pdf");
        assert_eq!(
            serde_json::to_string(&patch).unwrap(),
            r#"{"brochure_url":"https://cdn/b.pdf"}"#
        );
    }

    #[test]
    fn default_patch_is_empty() {
        assert!(EventPatch::default().is_empty());
        assert!(!EventPatch::clear(DocumentKind::Brochure).is_empty());
    }
}
