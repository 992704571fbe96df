pub mod aggregate;
pub mod args;
pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod report;
pub mod source;
pub mod sqlite;
pub mod utils;

pub use args::Args;
pub use config::{ReportConfig, ReportKind, SchemaConfig, ThreatSchema};
pub use error::ReportError;
pub use model::{LoginEvent, Outcome, ReportRow, ReportSummary, ThreatEntry};
pub use report::{generate_report, print_report_summary, run_report};
pub use source::{EventSource, InMemorySource};
pub use sqlite::SqliteEventSource;
