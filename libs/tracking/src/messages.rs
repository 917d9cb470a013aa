//! Tracking Message Set
//!
//! Every shape the tracking actor accepts or produces. The facade is the only
//! place these are constructed on the caller side.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of one tracked media file
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrackingId(String);

impl TrackingId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TrackingId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    /// Marks the whole entry as failed
    Failure,
}

/// Something that happened to a media file while it was processed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingEvent {
    pub kind: String,
    pub description: String,
    pub severity: Severity,
    /// New destination path, for events that move the file
    pub destination: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl TrackingEvent {
    pub fn new(kind: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            description: description.into(),
            severity: Severity::Info,
            destination: None,
            recorded_at: Utc::now(),
        }
    }

    pub fn failure(kind: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(kind, description).with_severity(Severity::Failure)
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaFile {
    pub source_path: String,
    pub destination_path: Option<String>,
}

/// Everything known about one tracked file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingInfo {
    pub id: TrackingId,
    pub media_file: MediaFile,
    pub events: Vec<TrackingEvent>,
}

impl TrackingInfo {
    pub fn new(id: TrackingId, source_path: impl Into<String>) -> Self {
        Self {
            id,
            media_file: MediaFile {
                source_path: source_path.into(),
                destination_path: None,
            },
            events: Vec::new(),
        }
    }

    /// Record an event, applying its effect on the media file
    pub fn apply(&mut self, event: TrackingEvent) {
        if let Some(destination) = &event.destination {
            self.media_file.destination_path = Some(destination.clone());
        }
        self.events.push(event);
    }

    pub fn events_of_kind(&self, kind: &str) -> Vec<&TrackingEvent> {
        self.events.iter().filter(|e| e.kind == kind).collect()
    }

    pub fn has_failed(&self) -> bool {
        self.events.iter().any(|e| e.severity == Severity::Failure)
    }
}

/// Outcome of every tracked file, in creation order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingSummary {
    pub successes: Vec<TrackingId>,
    pub failures: Vec<TrackingId>,
}

impl TrackingSummary {
    pub fn total(&self) -> usize {
        self.successes.len() + self.failures.len()
    }

    pub fn succeeded(&self, id: &TrackingId) -> bool {
        self.successes.contains(id)
    }

    pub fn failed(&self, id: &TrackingId) -> bool {
        self.failures.contains(id)
    }
}

/// Requests accepted by the tracking actor
#[derive(Debug, Clone)]
pub enum TrackingRequest {
    CreateEntry { source_path: String },
    Lookup { id: TrackingId },
    /// Answered with `EventRegistered` or `EntryNotFound`
    RegisterEvent { id: TrackingId, event: TrackingEvent },
    /// Never answered
    NotifyEvent { id: TrackingId, event: TrackingEvent },
    Summary,
}

impl TrackingRequest {
    pub fn name(&self) -> &'static str {
        match self {
            TrackingRequest::CreateEntry { .. } => "CreateEntry",
            TrackingRequest::Lookup { .. } => "Lookup",
            TrackingRequest::RegisterEvent { .. } => "RegisterEvent",
            TrackingRequest::NotifyEvent { .. } => "NotifyEvent",
            TrackingRequest::Summary => "Summary",
        }
    }
}

/// Replies produced by the tracking actor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackingReply {
    EntryCreated(TrackingId),
    EntryFound(TrackingInfo),
    EntryNotFound(TrackingId),
    EventRegistered(TrackingId),
    Summary(TrackingSummary),
}
