use chrono::{DateTime, Utc};
use std::time::Instant;
use tracing::info;

use crate::aggregate;
use crate::config::{default_since_like, ReportConfig, ReportKind};
use crate::error::Result;
use crate::export;
use crate::model::{ReportRows, ReportSummary};
use crate::source::EventSource;
use crate::sqlite::SqliteEventSource;
use crate::utils::{format_number, redact_address};

/// Open the configured store, build the report and write it out.
/// The store is closed before returning, whether or not the report succeeded.
pub fn generate_report(config: &ReportConfig) -> Result<ReportSummary> {
    let total_start_time = Instant::now();
    info!(action = "start", component = "report", kind = %config.kind, since = ?config.since, "Starting report generation");

    config.validate()?;
    let source = SqliteEventSource::open(&config.db_path, config.schema.clone())?;
    let result = run_report(&source, config);
    source.close();
    let summary = result?;

    info!(
        action = "complete",
        component = "report",
        rows_written = summary.rows_written,
        duration_ms = total_start_time.elapsed().as_millis(),
        "Report generation completed"
    );
    Ok(summary)
}

/// Build and write a report from any event source
pub fn run_report<S: EventSource>(source: &S, config: &ReportConfig) -> Result<ReportSummary> {
    let since = resolve_since(source, config, Utc::now())?;
    let events = source.events_since(&since)?;

    let (rows_written, rows) = match config.kind {
        ReportKind::Failures => {
            let rows = aggregate::failures_by_address(&events, config.min_failures);
            if config.schema.threats.is_some() {
                let threats = source.threat_entries()?;
                let rows = aggregate::annotate_threats(rows, &threats);
                let written = export::write_csv(&config.output_path, &rows)?;
                (written, ReportRows::AnnotatedFailures(rows))
            } else {
                let written = export::write_csv(&config.output_path, &rows)?;
                (written, ReportRows::Failures(rows))
            }
        }
        ReportKind::AddressDiversity => {
            let rows = aggregate::address_diversity(&events, config.min_addresses);
            let written = export::write_csv(&config.output_path, &rows)?;
            (written, ReportRows::Diversity(rows))
        }
    };

    info!(
        action = "aggregate",
        component = "report",
        event_count = events.len(),
        rows_written,
        "Report rows computed"
    );

    Ok(ReportSummary {
        kind: config.kind,
        since,
        output_path: config.output_path.clone(),
        rows_written,
        rows,
    })
}

/// The configured bound, or the default window laid out like the store's
/// latest timestamp
pub fn resolve_since<S: EventSource>(
    source: &S,
    config: &ReportConfig,
    now: DateTime<Utc>,
) -> Result<String> {
    if let Some(since) = &config.since {
        return Ok(since.clone());
    }

    let latest = source.latest_timestamp()?;
    let since = default_since_like(now, latest.as_deref());
    info!(action = "resolve", component = "window", since = %since, sample = ?latest, "Using default window bound");
    Ok(since)
}

pub fn print_report_summary(summary: &ReportSummary, top: Option<usize>, redact: bool) {
    println!(
        "Wrote {} rows to {}",
        format_number(summary.rows_written as u64),
        summary.output_path.display()
    );

    let Some(top_count) = top else {
        return;
    };
    if summary.rows.is_empty() {
        return;
    }

    let shown = |address: &str| {
        if redact {
            redact_address(address)
        } else {
            address.to_string()
        }
    };

    println!(
        "\n--- Top {} {} rows since {} ---",
        std::cmp::min(top_count, summary.rows.len()),
        summary.kind,
        summary.since
    );

    match &summary.rows {
        ReportRows::Failures(rows) => {
            for row in rows.iter().take(top_count) {
                println!(
                    "- {}: {} failed of {} attempts, {} users",
                    shown(&row.source_address),
                    format_number(row.failed_count),
                    format_number(row.total_count),
                    format_number(row.distinct_user_count)
                );
            }
        }
        ReportRows::AnnotatedFailures(rows) => {
            for row in rows.iter().take(top_count) {
                let threat = match (&row.threat_label, row.threat_confidence) {
                    (Some(label), Some(confidence)) => {
                        format!(" [known threat: {}, confidence {}]", label, confidence)
                    }
                    _ => String::new(),
                };
                println!(
                    "- {}: {} failed of {} attempts, {} users{}",
                    shown(&row.source_address),
                    format_number(row.failed_count),
                    format_number(row.total_count),
                    format_number(row.distinct_user_count),
                    threat
                );
            }
        }
        ReportRows::Diversity(rows) => {
            for row in rows.iter().take(top_count) {
                println!(
                    "- {} on {}: {} addresses",
                    row.username,
                    row.day,
                    format_number(row.address_count)
                );
            }
        }
    }
}
