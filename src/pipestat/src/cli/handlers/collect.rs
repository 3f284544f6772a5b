use crate::cli::commands::CollectArgs;
use crate::config::{Config, ConfigLoader};
use crate::constants::DEFAULT_STATUS_FILE;
use crate::logging::setup_logging;
use crate::status::{self, Aggregation, CollectJob};
use anyhow::{Context, Result};
use pipestat_common::{error_message, info_message, success_message, warning_message, Colorize};
use std::path::Path;
use std::process::ExitCode;
use tracing::error;

pub fn collect(config_file: Option<&Path>, args: &CollectArgs) -> ExitCode {
    let config = match ConfigLoader::load(config_file, &args.overrides()) {
        Ok(config) => config,
        Err(e) => return fail(&e, Path::new(DEFAULT_STATUS_FILE)),
    };

    if let Err(e) = setup_logging(&config.log_level, config.log_file.as_deref()) {
        return fail(&e, &config.status_file);
    }

    match run(&config) {
        Ok(aggregation) => {
            report(&config, &aggregation);
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e, &config.status_file),
    }
}

fn run(config: &Config) -> Result<Aggregation> {
    let job = CollectJob::from(config);
    status::aggregate(&job)
        .with_context(|| format!("failed to collect pipeline stats for {}", job.sample_id))
}

fn report(config: &Config, aggregation: &Aggregation) {
    let summary = &aggregation.summary;
    if summary.mismatched > 0 {
        warning_message!(
            "{} collected rows did not match the trace header; see the log for details",
            summary.mismatched
        );
    }
    success_message!(
        "Collected {} of {} trace rows for sample {}; {} tasks recorded",
        summary.collected,
        summary.scanned,
        config.sample_id,
        aggregation.accumulator.len()
    );
    for path in &aggregation.written {
        info_message!("Wrote {}", path.display());
    }
}

/// Top-level failure handling: log the full error, then leave the failure marker for the
/// workflow engine.
fn fail(err: &anyhow::Error, status_file: &Path) -> ExitCode {
    error!("Module exited unexpectedly with error:\n{:?}", err);
    error_message!("{:#}", err);
    if let Err(e) = status::mark_failed(status_file) {
        error_message!(
            "Failed to write status file {}: {}",
            status_file.display(),
            e
        );
    }
    ExitCode::FAILURE
}
