use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;

use loginreport::utils::{setup_logging, validate_args};
use loginreport::{generate_report, print_report_summary, Args, ReportConfig};

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose);
    validate_args(&args)?;

    let config = ReportConfig::from_args(&args).context("Invalid report configuration")?;

    match generate_report(&config) {
        Ok(summary) => {
            print_report_summary(&summary, args.top, args.redact);
            Ok(())
        }
        Err(e) => {
            error!(action = "fail", component = "report", error = %e, "Report generation failed");
            Err(e).context("Report generation failed")
        }
    }
}
