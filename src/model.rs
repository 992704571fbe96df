use serde::Serialize;
use std::path::PathBuf;

use crate::config::ReportKind;

/// Whether a login attempt succeeded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    pub fn is_failure(self) -> bool {
        self == Outcome::Failure
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginEvent {
    pub timestamp: String,
    /// `None` when the store recorded no username
    pub username: Option<String>,
    pub source_address: String,
    pub outcome: Outcome,
}

impl LoginEvent {
    pub fn new(timestamp: &str, username: &str, source_address: &str, outcome: Outcome) -> Self {
        LoginEvent {
            timestamp: timestamp.to_string(),
            username: Some(username.to_string()),
            source_address: source_address.to_string(),
            outcome,
        }
    }

    pub fn without_username(timestamp: &str, source_address: &str, outcome: Outcome) -> Self {
        LoginEvent {
            timestamp: timestamp.to_string(),
            username: None,
            source_address: source_address.to_string(),
            outcome,
        }
    }

    /// Calendar day of the event, the leading `YYYY-MM-DD` of its timestamp
    pub fn day(&self) -> &str {
        self.timestamp.get(..10).unwrap_or(&self.timestamp)
    }
}

/// An address previously reported as malicious
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreatEntry {
    pub source_address: String,
    pub source_label: String,
    pub confidence: i64,
}

/// A row type that knows its own CSV header
pub trait CsvRow: Serialize {
    const HEADER: &'static [&'static str];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub source_address: String,
    pub failed_count: u64,
    pub total_count: u64,
    pub distinct_user_count: u64,
}

impl CsvRow for ReportRow {
    const HEADER: &'static [&'static str] = &[
        "source_address",
        "failed_count",
        "total_count",
        "distinct_user_count",
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreatAnnotatedRow {
    pub source_address: String,
    pub failed_count: u64,
    pub total_count: u64,
    pub distinct_user_count: u64,
    pub threat_label: Option<String>,
    pub threat_confidence: Option<i64>,
}

impl CsvRow for ThreatAnnotatedRow {
    const HEADER: &'static [&'static str] = &[
        "source_address",
        "failed_count",
        "total_count",
        "distinct_user_count",
        "threat_label",
        "threat_confidence",
    ];
}

/// Users seen from many addresses on a single day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiversityRow {
    pub username: String,
    pub day: String,
    pub address_count: u64,
}

impl CsvRow for DiversityRow {
    const HEADER: &'static [&'static str] = &["username", "day", "address_count"];
}

/// Rows produced by one run, kept for the terminal preview
#[derive(Debug, Clone)]
pub enum ReportRows {
    Failures(Vec<ReportRow>),
    AnnotatedFailures(Vec<ThreatAnnotatedRow>),
    Diversity(Vec<DiversityRow>),
}

impl ReportRows {
    pub fn len(&self) -> usize {
        match self {
            ReportRows::Failures(rows) => rows.len(),
            ReportRows::AnnotatedFailures(rows) => rows.len(),
            ReportRows::Diversity(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug)]
pub struct ReportSummary {
    pub kind: ReportKind,
    pub since: String,
    pub output_path: PathBuf,
    pub rows_written: usize,
    pub rows: ReportRows,
}
