use rusqlite::types::Value;
use rusqlite::{params, Connection, OpenFlags};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

use crate::config::SchemaConfig;
use crate::error::{ReportError, Result};
use crate::model::{LoginEvent, Outcome, ThreatEntry};
use crate::source::EventSource;

const SUCCESS_VALUES: &[&str] = &[
    "success", "succeeded", "ok", "true", "1", "accepted", "allowed",
];
const FAILURE_VALUES: &[&str] = &[
    "failure", "failed", "fail", "false", "0", "denied", "rejected", "invalid",
];

/// Login store backed by a SQLite file, opened read-only
pub struct SqliteEventSource {
    conn: Connection,
    path: PathBuf,
    schema: SchemaConfig,
}

impl SqliteEventSource {
    /// Open an existing store. Never creates a database file.
    pub fn open(db_path: &Path, schema: SchemaConfig) -> Result<Self> {
        let start_time = Instant::now();
        info!(action = "start", component = "store_connection", path = ?db_path, "Opening login store");

        schema.validate()?;

        let connection_error = |source| ReportError::Connection {
            path: db_path.to_path_buf(),
            source,
        };

        let conn = Connection::open_with_flags(
            db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(connection_error)?;

        // SQLite opens lazily; touch the header so a non-database file fails here
        conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| {
            row.get::<_, i64>(0)
        })
        .map_err(connection_error)?;

        info!(
            action = "complete",
            component = "store_connection",
            duration_ms = start_time.elapsed().as_millis(),
            "Connected to login store"
        );

        Ok(SqliteEventSource {
            conn,
            path: db_path.to_path_buf(),
            schema,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn close(self) {
        info!(action = "close", component = "store_connection", path = ?self.path, "Closing login store");
        if let Err((_, e)) = self.conn.close() {
            warn!(action = "close", component = "store_connection", error = %e, "Login store did not close cleanly");
        }
    }

    fn events_query(&self) -> String {
        let s = &self.schema;
        format!(
            "SELECT {ts}, {user}, {addr}, {outcome} FROM {table} WHERE {ts} >= ?1 ORDER BY {ts}",
            ts = quote_identifier(&s.timestamp_column),
            user = quote_identifier(&s.username_column),
            addr = quote_identifier(&s.address_column),
            outcome = quote_identifier(&s.outcome_column),
            table = quote_identifier(&s.table),
        )
    }
}

impl EventSource for SqliteEventSource {
    fn events_since(&self, since: &str) -> Result<Vec<LoginEvent>> {
        let start_time = Instant::now();
        info!(action = "start", component = "event_query", since = since, "Querying login events");

        let mut stmt = self.conn.prepare(&self.events_query())?;
        let raw_rows = stmt
            .query_map(params![since], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Value>(3)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut events = Vec::with_capacity(raw_rows.len());
        let mut skipped = 0usize;
        for (timestamp, username, source_address, outcome) in raw_rows {
            // Events without an address cannot be attributed to any group
            let Some(source_address) = source_address else {
                skipped += 1;
                continue;
            };
            events.push(LoginEvent {
                timestamp,
                username,
                source_address,
                outcome: normalize_outcome(&outcome)?,
            });
        }

        if skipped > 0 {
            warn!(
                action = "skip",
                component = "event_query",
                skipped_count = skipped,
                "Skipped login events with no source address"
            );
        }

        info!(
            action = "complete",
            component = "event_query",
            event_count = events.len(),
            duration_ms = start_time.elapsed().as_millis(),
            "Login event query completed"
        );
        Ok(events)
    }

    fn latest_timestamp(&self) -> Result<Option<String>> {
        let s = &self.schema;
        let sql = format!(
            "SELECT MAX({ts}) FROM {table}",
            ts = quote_identifier(&s.timestamp_column),
            table = quote_identifier(&s.table),
        );
        let latest = self
            .conn
            .query_row(&sql, [], |row| row.get::<_, Option<String>>(0))?;
        Ok(latest)
    }

    fn threat_entries(&self) -> Result<Vec<ThreatEntry>> {
        let Some(threats) = &self.schema.threats else {
            return Ok(Vec::new());
        };

        let start_time = Instant::now();
        let sql = format!(
            "SELECT {addr}, {label}, {confidence} FROM {table}",
            addr = quote_identifier(&threats.address_column),
            label = quote_identifier(&threats.label_column),
            confidence = quote_identifier(&threats.confidence_column),
            table = quote_identifier(&threats.table),
        );

        let entries = self
            .conn
            .prepare(&sql)?
            .query_map([], |row| {
                Ok(ThreatEntry {
                    source_address: row.get(0)?,
                    source_label: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    confidence: row.get::<_, Option<i64>>(2)?.unwrap_or(0),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        info!(
            action = "complete",
            component = "threat_query",
            entry_count = entries.len(),
            duration_ms = start_time.elapsed().as_millis(),
            "Threat entries loaded"
        );
        Ok(entries)
    }
}

/// Backticked names are always identifiers; double-quoted ones may degrade to string literals
fn quote_identifier(name: &str) -> String {
    format!("`{}`", name)
}

/// Map a stored outcome, text status or integer flag, onto `Outcome`
pub fn normalize_outcome(value: &Value) -> Result<Outcome> {
    match value {
        Value::Integer(flag) => Ok(if *flag == 0 {
            Outcome::Failure
        } else {
            Outcome::Success
        }),
        Value::Real(flag) => Ok(if *flag == 0.0 {
            Outcome::Failure
        } else {
            Outcome::Success
        }),
        Value::Text(text) => {
            let normalized = text.trim().to_lowercase();
            if SUCCESS_VALUES.contains(&normalized.as_str()) {
                Ok(Outcome::Success)
            } else if FAILURE_VALUES.contains(&normalized.as_str()) {
                Ok(Outcome::Failure)
            } else {
                Err(ReportError::UnrecognizedOutcome(text.clone()))
            }
        }
        Value::Null => Err(ReportError::UnrecognizedOutcome("NULL".to_string())),
        Value::Blob(bytes) => Err(ReportError::UnrecognizedOutcome(format!(
            "<blob of {} bytes>",
            bytes.len()
        ))),
    }
}
