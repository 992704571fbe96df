use clap::Parser;
use std::path::PathBuf;

use crate::config::{ReportKind, DEFAULT_MIN_ADDRESSES, DEFAULT_MIN_FAILURES};

#[derive(Parser, Debug)]
#[command(
    name = "loginreport",
    about = "Report source addresses and users with suspicious login activity",
    version,
    long_about = None
)]
pub struct Args {
    /// Path to the SQLite login store
    #[arg(short, long)]
    pub db: PathBuf,

    /// Destination CSV file
    #[arg(short, long)]
    pub output: PathBuf,

    /// Report to generate
    #[arg(short, long, value_enum, default_value_t = ReportKind::Failures)]
    pub kind: ReportKind,

    /// Inclusive lower bound for event timestamps (ISO-8601, defaults to 7 days ago
    /// in the store's timestamp layout)
    #[arg(short, long)]
    pub since: Option<String>,

    /// Minimum failed logins for an address to be reported
    #[arg(long, default_value_t = DEFAULT_MIN_FAILURES)]
    pub min_failures: u64,

    /// Minimum distinct addresses per user and day to be reported
    #[arg(long, default_value_t = DEFAULT_MIN_ADDRESSES)]
    pub min_addresses: u64,

    /// Table holding login events
    #[arg(long, default_value = "logins")]
    pub table: String,

    /// Column holding the event timestamp
    #[arg(long, default_value = "timestamp")]
    pub timestamp_column: String,

    /// Column holding the username
    #[arg(long, default_value = "username")]
    pub username_column: String,

    /// Column holding the source address
    #[arg(long, default_value = "ip_address")]
    pub address_column: String,

    /// Column holding the outcome (text status or integer success flag)
    #[arg(long, default_value = "status")]
    pub outcome_column: String,

    /// Table of known-malicious addresses used to annotate the failure report
    #[arg(long)]
    pub threat_table: Option<String>,

    /// Column of the threat table holding the address
    #[arg(long, default_value = "ip_address")]
    pub threat_address_column: String,

    /// Column of the threat table holding the source label
    #[arg(long, default_value = "source")]
    pub threat_label_column: String,

    /// Column of the threat table holding the confidence score
    #[arg(long, default_value = "confidence")]
    pub threat_confidence_column: String,

    /// Number of report rows to print after writing
    #[arg(short, long)]
    pub top: Option<usize>,

    /// Mask addresses in printed rows
    #[arg(long)]
    pub redact: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
