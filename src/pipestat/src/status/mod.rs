//! Post-run status collection: merges per-task statistics from a workflow trace into the
//! sample's cumulative stats file and a report snapshot.
mod accumulator;
mod aggregator;
mod error;
mod filter;
mod output;
mod trace;

pub use accumulator::{load_prior_state, StatsAccumulator};
pub use aggregator::{aggregate, Aggregation, CollectJob, FieldMismatchPolicy, ScanSummary};
pub use error::{StatusError, StatusResult};
pub use filter::StatsFilter;
pub use output::{mark_failed, StagedFile};
pub use trace::{TaskStatus, TraceHeader, TraceReader, TraceRecord};

