pub const DEFAULT_TRACE_FILE: &str = "pipeline_stats.txt";
pub const DEFAULT_WORKDIR: &str = ".";
pub const DEFAULT_REPORT_FILE: &str = ".report.json";
pub const DEFAULT_STATUS_FILE: &str = ".status";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Only trace rows whose tag contains this substring are collected.
pub const DEFAULT_STATS_TAG: &str = " getStats";
pub const COMPLETED_STATUS: &str = "COMPLETED";

pub const STATS_SUFFIX: &str = ".stats.json";
pub const STATUS_ERROR: &str = "error";

pub const CONFIG_FILE: &str = "pipestat.toml";
pub const ENV_PREFIX: &str = "PIPESTAT";
