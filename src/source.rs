//! Event sources feeding the report pipeline
//!
//! Sources hand out events with outcomes already normalized, so the
//! aggregation code never sees how a store encodes success or failure.

use crate::error::Result;
use crate::model::{LoginEvent, ThreatEntry};

/// Read-only access to login events and threat entries
pub trait EventSource {
    /// All events whose timestamp is at or after `since`, compared as text
    fn events_since(&self, since: &str) -> Result<Vec<LoginEvent>>;

    /// Latest stored timestamp, used to lay out the default window bound
    fn latest_timestamp(&self) -> Result<Option<String>>;

    /// Known-malicious addresses, empty when the source has none configured
    fn threat_entries(&self) -> Result<Vec<ThreatEntry>>;
}

/// Source backed by vectors, for tests and callers that already hold events
#[derive(Debug, Default, Clone)]
pub struct InMemorySource {
    events: Vec<LoginEvent>,
    threats: Vec<ThreatEntry>,
}

impl InMemorySource {
    pub fn new(events: Vec<LoginEvent>) -> Self {
        InMemorySource {
            events,
            threats: Vec::new(),
        }
    }

    pub fn with_threats(mut self, threats: Vec<ThreatEntry>) -> Self {
        self.threats = threats;
        self
    }
}

impl EventSource for InMemorySource {
    fn events_since(&self, since: &str) -> Result<Vec<LoginEvent>> {
        Ok(self
            .events
            .iter()
            .filter(|event| event.timestamp.as_str() >= since)
            .cloned()
            .collect())
    }

    fn latest_timestamp(&self) -> Result<Option<String>> {
        Ok(self.events.iter().map(|event| &event.timestamp).max().cloned())
    }

    fn threat_entries(&self) -> Result<Vec<ThreatEntry>> {
        Ok(self.threats.clone())
    }
}
