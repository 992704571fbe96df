//! Pure aggregation from normalized login events to report rows

use std::collections::{HashMap, HashSet};

use crate::model::{DiversityRow, LoginEvent, ReportRow, ThreatAnnotatedRow, ThreatEntry};

#[derive(Default)]
struct AddressCounts<'a> {
    failed: u64,
    total: u64,
    users: HashSet<&'a str>,
}

/// Group events by source address and keep those with at least
/// `min_failures` failed attempts, busiest first.
pub fn failures_by_address(events: &[LoginEvent], min_failures: u64) -> Vec<ReportRow> {
    let mut by_address: HashMap<&str, AddressCounts> = HashMap::new();

    for event in events {
        let counts = by_address.entry(event.source_address.as_str()).or_default();
        counts.total += 1;
        if event.outcome.is_failure() {
            counts.failed += 1;
        }
        if let Some(username) = &event.username {
            counts.users.insert(username.as_str());
        }
    }

    let mut rows: Vec<ReportRow> = by_address
        .into_iter()
        .filter(|(_, counts)| counts.failed >= min_failures)
        .map(|(address, counts)| ReportRow {
            source_address: address.to_string(),
            failed_count: counts.failed,
            total_count: counts.total,
            distinct_user_count: counts.users.len() as u64,
        })
        .collect();

    // Address breaks remaining ties so repeated runs write identical files
    rows.sort_by(|a, b| {
        b.failed_count
            .cmp(&a.failed_count)
            .then_with(|| b.total_count.cmp(&a.total_count))
            .then_with(|| a.source_address.cmp(&b.source_address))
    });
    rows
}

/// Count distinct source addresses per (username, day), keeping groups
/// with at least `min_addresses`.
pub fn address_diversity(events: &[LoginEvent], min_addresses: u64) -> Vec<DiversityRow> {
    let mut by_user_day: HashMap<(&str, &str), HashSet<&str>> = HashMap::new();

    for event in events {
        let Some(username) = &event.username else {
            continue;
        };
        by_user_day
            .entry((username.as_str(), event.day()))
            .or_default()
            .insert(event.source_address.as_str());
    }

    let mut rows: Vec<DiversityRow> = by_user_day
        .into_iter()
        .map(|((username, day), addresses)| DiversityRow {
            username: username.to_string(),
            day: day.to_string(),
            address_count: addresses.len() as u64,
        })
        .filter(|row| row.address_count >= min_addresses)
        .collect();

    rows.sort_by(|a, b| {
        b.address_count
            .cmp(&a.address_count)
            .then_with(|| a.username.cmp(&b.username))
            .then_with(|| a.day.cmp(&b.day))
    });
    rows
}

pub fn annotate_threats(rows: Vec<ReportRow>, threats: &[ThreatEntry]) -> Vec<ThreatAnnotatedRow> {
    let lookup: HashMap<&str, &ThreatEntry> = threats
        .iter()
        .map(|entry| (entry.source_address.as_str(), entry))
        .collect();

    rows.into_iter()
        .map(|row| {
            let threat = lookup.get(row.source_address.as_str());
            ThreatAnnotatedRow {
                threat_label: threat.map(|t| t.source_label.clone()),
                threat_confidence: threat.map(|t| t.confidence),
                source_address: row.source_address,
                failed_count: row.failed_count,
                total_count: row.total_count,
                distinct_user_count: row.distinct_user_count,
            }
        })
        .collect()
}
