use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use clap::ValueEnum;
use regex::Regex;
use std::fmt;
use std::path::PathBuf;

use crate::args::Args;
use crate::error::{ReportError, Result};

pub const DEFAULT_MIN_FAILURES: u64 = 5;
pub const DEFAULT_MIN_ADDRESSES: u64 = 3;
pub const DEFAULT_WINDOW_DAYS: i64 = 7;

/// Format of the default window bound, matching SQLite's `datetime()`
pub const SINCE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const SINCE_FORMAT_ISO: &str = "%Y-%m-%dT%H:%M:%S";
pub const SINCE_FORMAT_DATE: &str = "%Y-%m-%d";

const IDENTIFIER_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]*$";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportKind {
    /// Failed logins grouped by source address
    Failures,
    /// Distinct source addresses per user and day
    AddressDiversity,
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportKind::Failures => f.write_str("failures"),
            ReportKind::AddressDiversity => f.write_str("address-diversity"),
        }
    }
}

/// Where login events and threat entries live in the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaConfig {
    pub table: String,
    pub timestamp_column: String,
    pub username_column: String,
    pub address_column: String,
    pub outcome_column: String,
    pub threats: Option<ThreatSchema>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreatSchema {
    pub table: String,
    pub address_column: String,
    pub label_column: String,
    pub confidence_column: String,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        SchemaConfig {
            table: "logins".to_string(),
            timestamp_column: "timestamp".to_string(),
            username_column: "username".to_string(),
            address_column: "ip_address".to_string(),
            outcome_column: "status".to_string(),
            threats: None,
        }
    }
}

impl SchemaConfig {
    /// Reject any table or column name that is not a plain SQL identifier
    pub fn validate(&self) -> Result<()> {
        let pattern = Regex::new(IDENTIFIER_PATTERN)
            .map_err(|e| ReportError::InvalidConfig(e.to_string()))?;

        let mut names = vec![
            ("table", &self.table),
            ("timestamp column", &self.timestamp_column),
            ("username column", &self.username_column),
            ("address column", &self.address_column),
            ("outcome column", &self.outcome_column),
        ];
        if let Some(threats) = &self.threats {
            names.push(("threat table", &threats.table));
            names.push(("threat address column", &threats.address_column));
            names.push(("threat label column", &threats.label_column));
            names.push(("threat confidence column", &threats.confidence_column));
        }

        for (what, name) in names {
            if !pattern.is_match(name) {
                return Err(ReportError::InvalidConfig(format!(
                    "{} name '{}' is not a valid identifier",
                    what, name
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub db_path: PathBuf,
    pub output_path: PathBuf,
    pub kind: ReportKind,
    /// Inclusive window bound; `None` means seven days back, written in the
    /// store's own timestamp layout
    pub since: Option<String>,
    pub min_failures: u64,
    pub min_addresses: u64,
    pub schema: SchemaConfig,
}

impl ReportConfig {
    /// Failure report over the default schema and the default window
    pub fn new(db_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        ReportConfig {
            db_path: db_path.into(),
            output_path: output_path.into(),
            kind: ReportKind::Failures,
            since: None,
            min_failures: DEFAULT_MIN_FAILURES,
            min_addresses: DEFAULT_MIN_ADDRESSES,
            schema: SchemaConfig::default(),
        }
    }

    pub fn from_args(args: &Args) -> Result<Self> {
        let since = args.since.as_ref().map(|since| since.trim().to_string());

        let threats = args.threat_table.as_ref().map(|table| ThreatSchema {
            table: table.clone(),
            address_column: args.threat_address_column.clone(),
            label_column: args.threat_label_column.clone(),
            confidence_column: args.threat_confidence_column.clone(),
        });

        let config = ReportConfig {
            db_path: args.db.clone(),
            output_path: args.output.clone(),
            kind: args.kind,
            since,
            min_failures: args.min_failures,
            min_addresses: args.min_addresses,
            schema: SchemaConfig {
                table: args.table.clone(),
                timestamp_column: args.timestamp_column.clone(),
                username_column: args.username_column.clone(),
                address_column: args.address_column.clone(),
                outcome_column: args.outcome_column.clone(),
                threats,
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(since) = &self.since {
            validate_since(since)?;
        }
        self.schema.validate()
    }
}

pub fn default_since(now: DateTime<Utc>) -> String {
    default_since_like(now, None)
}

/// Default window bound laid out like `sample`, a timestamp read from the
/// store, so the text comparison lines up with what is stored
pub fn default_since_like(now: DateTime<Utc>, sample: Option<&str>) -> String {
    let format = match sample {
        Some(sample) if sample.len() == 10 => SINCE_FORMAT_DATE,
        Some(sample) if sample.as_bytes().get(10) == Some(&b'T') => SINCE_FORMAT_ISO,
        _ => SINCE_FORMAT,
    };
    (now - Duration::days(DEFAULT_WINDOW_DAYS))
        .format(format)
        .to_string()
}

/// Accept ISO-8601 dates and date-times. The text is compared as-is against
/// stored timestamps, so it is only checked, never rewritten.
pub fn validate_since(since: &str) -> Result<()> {
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];

    if NaiveDate::parse_from_str(since, "%Y-%m-%d").is_ok()
        || DateTime::parse_from_rfc3339(since).is_ok()
        || DATETIME_FORMATS
            .iter()
            .any(|format| NaiveDateTime::parse_from_str(since, format).is_ok())
    {
        return Ok(());
    }

    Err(ReportError::InvalidConfig(format!(
        "'{}' is not an ISO-8601 date or date-time",
        since
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_default_since_is_seven_days_back() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 30, 0).unwrap();
        assert_eq!(default_since(now), "2024-03-03 12:30:00");
    }

    #[test]
    fn test_default_since_follows_stored_layout() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 30, 0).unwrap();
        assert_eq!(
            default_since_like(now, Some("2024-03-09T08:00:00Z")),
            "2024-03-03T12:30:00"
        );
        assert_eq!(
            default_since_like(now, Some("2024-03-09 08:00:00")),
            "2024-03-03 12:30:00"
        );
        assert_eq!(default_since_like(now, Some("2024-03-09")), "2024-03-03");
        assert_eq!(default_since_like(now, None), "2024-03-03 12:30:00");
    }

    #[test]
    fn test_unset_since_skips_validation() {
        let config = ReportConfig::new("logins.db", "report.csv");
        assert!(config.since.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_since_accepts_iso_forms() {
        for since in [
            "2024-03-03",
            "2024-03-03 12:30:00",
            "2024-03-03T12:30:00",
            "2024-03-03T12:30:00.250",
            "2024-03-03T12:30:00Z",
            "2024-03-03T12:30:00+02:00",
        ] {
            assert!(validate_since(since).is_ok(), "{} should be accepted", since);
        }
    }

    #[test]
    fn test_validate_since_rejects_garbage() {
        for since in ["", "yesterday", "03/03/2024", "2024-13-01"] {
            assert!(matches!(
                validate_since(since),
                Err(ReportError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn test_schema_rejects_injection() {
        let schema = SchemaConfig {
            table: "logins; DROP TABLE logins".to_string(),
            ..SchemaConfig::default()
        };
        assert!(matches!(
            schema.validate(),
            Err(ReportError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_schema_checks_threat_names() {
        let schema = SchemaConfig {
            threats: Some(ThreatSchema {
                table: "threat_intel".to_string(),
                address_column: "ip address".to_string(),
                label_column: "source".to_string(),
                confidence_column: "confidence".to_string(),
            }),
            ..SchemaConfig::default()
        };
        assert!(schema.validate().is_err());
    }

    #[test]
    fn test_default_schema_is_valid() {
        assert!(SchemaConfig::default().validate().is_ok());
    }
}
