use super::accumulator::{load_prior_state, StatsAccumulator};
use super::error::{StatusError, StatusResult};
use super::filter::StatsFilter;
use super::output::StagedFile;
use super::trace::TraceReader;
use crate::config::Config;
use crate::constants::{COMPLETED_STATUS, STATS_SUFFIX};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// What to do when a collected row has a different number of fields than the header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldMismatchPolicy {
    /// Log a warning and pair names with values up to the shorter of the two.
    #[default]
    Warn,
    /// Fail the run.
    Strict,
}

/// Everything one collection run needs.
#[derive(Debug, Clone)]
pub struct CollectJob {
    pub sample_id: String,
    /// Resolved against `workdir`.
    pub trace_file: PathBuf,
    pub workdir: PathBuf,
    pub report_path: PathBuf,
    pub filter: StatsFilter,
    pub field_mismatch: FieldMismatchPolicy,
}

impl CollectJob {
    pub fn stats_path(&self) -> PathBuf {
        self.workdir.join(format!("{}{}", self.sample_id, STATS_SUFFIX))
    }

    pub fn trace_path(&self) -> PathBuf {
        self.workdir.join(&self.trace_file)
    }
}

impl From<&Config> for CollectJob {
    fn from(config: &Config) -> Self {
        Self {
            sample_id: config.sample_id.clone(),
            trace_file: config.trace_file.clone(),
            workdir: config.workdir.clone(),
            report_path: config.report_file.clone(),
            filter: StatsFilter::new(config.stats_tag.clone()),
            field_mismatch: config.field_mismatch,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Task rows read from the trace, excluding the header and blank lines.
    pub scanned: usize,
    pub collected: usize,
    pub skipped: usize,
    /// Collected rows whose field count differed from the header's.
    pub mismatched: usize,
}

#[derive(Debug, Clone)]
pub struct Aggregation {
    pub accumulator: StatsAccumulator,
    /// The stats file followed by the report snapshot.
    pub written: Vec<PathBuf>,
    pub summary: ScanSummary,
}

/// Merges the completed, stats-tagged tasks of the trace into the sample's stats file and
/// writes the result to both the stats file and the report snapshot.
///
/// Nothing is written unless the whole trace was read successfully. A task id seen more than
/// once keeps the row that appears last in the trace.
pub fn aggregate(job: &CollectJob) -> StatusResult<Aggregation> {
    if job.sample_id.trim().is_empty() {
        return Err(StatusError::InvalidSampleId);
    }
    let stats_path = job.stats_path();
    let trace_path = job.trace_path();

    info!("Starting pipeline status routine for sample {}", job.sample_id);
    let mut accumulator = load_prior_state(&stats_path)?;
    info!(
        "Loaded {} previously collected tasks from {}",
        accumulator.len(),
        stats_path.display()
    );
    debug!("Tag variable set to: {:?}", job.filter.tag());

    let summary = scan_trace(&trace_path, job, &mut accumulator)?;
    info!(
        "Finished parsing trace: {} rows scanned, {} collected, {} skipped",
        summary.scanned, summary.collected, summary.skipped
    );

    // both outputs are staged before either is replaced
    let json = accumulator.to_compact_json()?;
    let staged = [stats_path.as_path(), job.report_path.as_path()]
        .into_iter()
        .map(|path| StagedFile::stage(path, json.as_bytes()))
        .collect::<StatusResult<Vec<_>>>()?;
    let mut written = Vec::with_capacity(staged.len());
    for file in staged {
        let path = file.commit()?;
        debug!("Wrote {} tasks to {}", accumulator.len(), path.display());
        written.push(path);
    }

    Ok(Aggregation {
        accumulator,
        written,
        summary,
    })
}

fn scan_trace(
    trace_path: &Path,
    job: &CollectJob,
    accumulator: &mut StatsAccumulator,
) -> StatusResult<ScanSummary> {
    info!("Starting parsing of trace file: {}", trace_path.display());
    let reader = TraceReader::open(trace_path)?;
    let header = reader.header().clone();
    debug!("Header set to: {:?}", header.names());

    let mut summary = ScanSummary::default();
    for record in reader {
        let record = record?;
        summary.scanned += 1;

        if !job.filter.accepts(&record) {
            debug!(
                "Ignoring trace line {} without {} status or stats tag",
                record.line(),
                COMPLETED_STATUS
            );
            summary.skipped += 1;
            continue;
        }

        if record.len() != header.len() {
            summary.mismatched += 1;
            let reason = format!(
                "header has {} fields but the row has {}",
                header.len(),
                record.len()
            );
            match job.field_mismatch {
                FieldMismatchPolicy::Strict => {
                    return Err(StatusError::malformed(trace_path, record.line(), reason))
                }
                FieldMismatchPolicy::Warn => warn!(
                    "Trace line {} (task {}): {}; extra values are dropped",
                    record.line(),
                    record.task_id(),
                    reason
                ),
            }
        }

        debug!(
            "Collecting task {} ({}) from trace line {}",
            record.task_id(),
            record.process(),
            record.line()
        );
        if accumulator
            .merge(record.task_id(), record.to_entry(&header))
            .is_some()
        {
            debug!("Replaced previous stats for task {}", record.task_id());
        }
        summary.collected += 1;
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::fs;
    use tempfile::TempDir;

    const HEADER: &str = "task_id process tag status exit cpus";

    struct Fixture {
        dir: TempDir,
        job: CollectJob,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let job = CollectJob {
                sample_id: "sample1".to_string(),
                trace_file: PathBuf::from("pipeline_stats.txt"),
                workdir: dir.path().to_path_buf(),
                report_path: dir.path().join(".report.json"),
                filter: StatsFilter::default(),
                field_mismatch: FieldMismatchPolicy::Warn,
            };
            Self { dir, job }
        }

        fn write_trace(&self, rows: &[&str]) {
            let mut contents = format!("{}\n", HEADER);
            for row in rows {
                contents.push_str(row);
                contents.push('\n');
            }
            fs::write(self.job.trace_path(), contents).unwrap();
        }

        fn write_stats(&self, json: &str) {
            fs::write(self.job.stats_path(), json).unwrap();
        }

        fn read(&self, path: &Path) -> Value {
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
        }

        fn stats(&self) -> Value {
            self.read(&self.job.stats_path())
        }

        fn report(&self) -> Value {
            self.read(&self.job.report_path)
        }
    }

    #[test]
    fn collects_only_completed_stats_rows() {
        let fixture = Fixture::new();
        fixture.write_trace(&[
            "1\tprocA\tfoo getStats\tCOMPLETED\t0\t2",
            "2\tprocB\tfoo\tCOMPLETED\t0\t1",
            "3\tprocC\tbar getStats\tFAILED\t1\t1",
        ]);

        let aggregation = aggregate(&fixture.job).unwrap();

        let expected = json!({
            "1": {
                "task_id": "1",
                "process": "procA",
                "tag": "foo getStats",
                "status": "COMPLETED",
                "exit": "0",
                "cpus": "2"
            }
        });
        assert_eq!(fixture.stats(), expected);
        assert_eq!(
            aggregation.summary,
            ScanSummary {
                scanned: 3,
                collected: 1,
                skipped: 2,
                mismatched: 0
            }
        );
        assert_eq!(
            aggregation.written,
            vec![fixture.job.stats_path(), fixture.job.report_path.clone()]
        );
    }

    #[test]
    fn first_run_creates_both_files() {
        let fixture = Fixture::new();
        assert!(!fixture.job.stats_path().exists());
        fixture.write_trace(&["1\tprocA\tx getStats\tCOMPLETED\t0\t2"]);

        let aggregation = aggregate(&fixture.job).unwrap();
        assert_eq!(aggregation.accumulator.len(), 1);
        assert!(fixture.job.stats_path().exists());
        assert!(fixture.job.report_path.exists());
    }

    #[test]
    fn rerun_without_eligible_rows_keeps_previous_stats() {
        let fixture = Fixture::new();
        let previous = r#"{"9":{"task_id":"9","cpus":"8"},"4":{"task_id":"4"}}"#;
        fixture.write_stats(previous);
        fixture.write_trace(&["1\tprocA\tfoo\tCOMPLETED\t0\t2"]);

        aggregate(&fixture.job).unwrap();

        let previous: Value = serde_json::from_str(previous).unwrap();
        assert_eq!(fixture.stats(), previous);
        assert_eq!(fixture.report(), previous);
    }

    #[test]
    fn eligible_row_replaces_previous_entry_wholesale() {
        let fixture = Fixture::new();
        fixture.write_stats(r#"{"t1":{"task_id":"t1","cpus":"1","queue":"long"}}"#);
        fixture.write_trace(&["t1\tprocA\tx getStats\tCOMPLETED\t0\t4"]);

        aggregate(&fixture.job).unwrap();

        assert_eq!(
            fixture.stats()["t1"],
            json!({
                "task_id": "t1",
                "process": "procA",
                "tag": "x getStats",
                "status": "COMPLETED",
                "exit": "0",
                "cpus": "4"
            })
        );
    }

    #[test]
    fn last_duplicate_in_trace_wins() {
        let fixture = Fixture::new();
        fixture.write_trace(&[
            "5\tprocA\tx getStats\tCOMPLETED\t0\t1",
            "5\tprocA\tx getStats\tCOMPLETED\t0\t16",
        ]);

        let aggregation = aggregate(&fixture.job).unwrap();
        assert_eq!(aggregation.accumulator.len(), 1);
        assert_eq!(fixture.stats()["5"]["cpus"], "16");
    }

    #[test]
    fn key_order_is_previous_then_new() {
        let fixture = Fixture::new();
        fixture.write_stats(r#"{"b":{"task_id":"b"},"a":{"task_id":"a"}}"#);
        fixture.write_trace(&[
            "c\tprocA\tx getStats\tCOMPLETED\t0\t1",
            "a\tprocA\tx getStats\tCOMPLETED\t0\t1",
        ]);

        let aggregation = aggregate(&fixture.job).unwrap();
        assert_eq!(
            aggregation.accumulator.task_ids().collect::<Vec<_>>(),
            vec!["b", "a", "c"]
        );
    }

    #[test]
    fn report_is_byte_identical_to_stats() {
        let fixture = Fixture::new();
        fixture.write_stats(r#"{"0": {"task_id": "0"}}"#);
        fixture.write_trace(&["1\tprocA\tx getStats\tCOMPLETED\t0\t2"]);

        aggregate(&fixture.job).unwrap();

        let stats = fs::read(fixture.job.stats_path()).unwrap();
        let report = fs::read(&fixture.job.report_path).unwrap();
        assert_eq!(stats, report);
        let stats = String::from_utf8(stats).unwrap();
        assert!(!stats.contains(": ") && !stats.contains(", "));
    }

    #[test]
    fn mismatched_rows_are_truncated_with_warn_policy() {
        let fixture = Fixture::new();
        fixture.write_trace(&["1\tprocA\tx getStats\tCOMPLETED\t0\t2\t3m\t1.2 GB"]);

        let aggregation = aggregate(&fixture.job).unwrap();
        assert_eq!(aggregation.summary.mismatched, 1);
        assert_eq!(fixture.stats()["1"].as_object().unwrap().len(), 6);
    }

    #[test]
    fn mismatched_rows_fail_with_strict_policy() {
        let mut fixture = Fixture::new();
        fixture.job.field_mismatch = FieldMismatchPolicy::Strict;
        fixture.write_stats(r#"{"0":{}}"#);
        fixture.write_trace(&["1\tprocA\tx getStats\tCOMPLETED\t0"]);

        let err = aggregate(&fixture.job).unwrap_err();
        assert!(matches!(err, StatusError::MalformedTrace { line: 2, .. }));
        assert_eq!(
            fs::read_to_string(fixture.job.stats_path()).unwrap(),
            r#"{"0":{}}"#
        );
        assert!(!fixture.job.report_path.exists());
    }

    #[test]
    fn ineligible_mismatched_rows_are_ignored_with_strict_policy() {
        let mut fixture = Fixture::new();
        fixture.job.field_mismatch = FieldMismatchPolicy::Strict;
        fixture.write_trace(&["1\tprocA\tx\tCOMPLETED"]);

        let aggregation = aggregate(&fixture.job).unwrap();
        assert!(aggregation.accumulator.is_empty());
    }

    #[test]
    fn empty_trace_fails_without_touching_stats() {
        let fixture = Fixture::new();
        fixture.write_stats(r#"{"0":{}}"#);
        fs::write(fixture.job.trace_path(), "").unwrap();

        let err = aggregate(&fixture.job).unwrap_err();
        assert!(matches!(err, StatusError::MalformedTrace { .. }));
        assert_eq!(
            fs::read_to_string(fixture.job.stats_path()).unwrap(),
            r#"{"0":{}}"#
        );
    }

    #[test]
    fn missing_trace_is_an_io_error() {
        let fixture = Fixture::new();
        let err = aggregate(&fixture.job).unwrap_err();
        assert!(matches!(err, StatusError::Io { .. }));
        assert!(!fixture.job.stats_path().exists());
    }

    #[test]
    fn invalid_previous_stats_fail() {
        let fixture = Fixture::new();
        fixture.write_stats("[]");
        fixture.write_trace(&["1\tprocA\tx getStats\tCOMPLETED\t0\t2"]);

        let err = aggregate(&fixture.job).unwrap_err();
        assert!(matches!(err, StatusError::Parse { .. }));
        assert!(!fixture.job.report_path.exists());
    }

    #[test]
    fn missing_output_directory_fails() {
        let mut fixture = Fixture::new();
        fixture.write_trace(&["1\tprocA\tx getStats\tCOMPLETED\t0\t2"]);
        fixture.job.report_path = fixture.dir.path().join("missing").join(".report.json");

        let err = aggregate(&fixture.job).unwrap_err();
        assert!(matches!(err, StatusError::Io { .. }));
        assert!(!fixture.job.stats_path().exists());
    }

    #[test]
    fn empty_sample_id_is_rejected() {
        let mut fixture = Fixture::new();
        fixture.job.sample_id = " ".to_string();
        assert!(matches!(
            aggregate(&fixture.job),
            Err(StatusError::InvalidSampleId)
        ));
    }

    #[test]
    fn absolute_trace_path_ignores_workdir() {
        let fixture = Fixture::new();
        let other = TempDir::new().unwrap();
        let trace = other.path().join("trace.txt");
        fs::write(&trace, format!("{}\n", HEADER)).unwrap();

        let mut job = fixture.job.clone();
        job.trace_file = trace.clone();
        assert_eq!(job.trace_path(), trace);
        assert!(aggregate(&job).unwrap().accumulator.is_empty());
    }
}
