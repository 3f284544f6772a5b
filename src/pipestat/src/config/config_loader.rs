use crate::constants::{
    CONFIG_FILE, DEFAULT_LOG_LEVEL, DEFAULT_REPORT_FILE, DEFAULT_STATS_TAG, DEFAULT_STATUS_FILE,
    DEFAULT_TRACE_FILE, DEFAULT_WORKDIR, ENV_PREFIX,
};
use crate::status::FieldMismatchPolicy;
use anyhow::{ensure, Context, Result};
use config::{Config as RConfig, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    pub sample_id: String,
    pub trace_file: PathBuf,
    pub workdir: PathBuf,
    pub report_file: PathBuf,
    pub status_file: PathBuf,
    pub stats_tag: String,
    pub field_mismatch: FieldMismatchPolicy,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

/// Values given on the command line. They take precedence over every other source.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub sample_id: Option<String>,
    pub trace_file: Option<String>,
    pub workdir: Option<String>,
    pub report_file: Option<String>,
    pub stats_tag: Option<String>,
    pub strict: bool,
    pub log_level: Option<String>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Builds the configuration from, in increasing precedence: defaults, the config file,
    /// `PIPESTAT_*` environment variables and `overrides`.
    ///
    /// An explicit `config_file` must exist; otherwise `pipestat.toml` in the current
    /// directory is read when present.
    pub fn load(config_file: Option<&Path>, overrides: &ConfigOverrides) -> Result<Config> {
        let mut builder = RConfig::builder();

        // set defaults
        builder = builder
            .set_default("sample_id", "")?
            .set_default("trace_file", DEFAULT_TRACE_FILE)?
            .set_default("workdir", DEFAULT_WORKDIR)?
            .set_default("report_file", DEFAULT_REPORT_FILE)?
            .set_default("status_file", DEFAULT_STATUS_FILE)?
            .set_default("stats_tag", DEFAULT_STATS_TAG)?
            .set_default("field_mismatch", "warn")?
            .set_default("log_level", DEFAULT_LOG_LEVEL)?;

        builder = match config_file {
            Some(path) => {
                debug!("Reading configuration from {}", path.display());
                builder.add_source(File::from(path).required(true))
            }
            None => builder.add_source(File::from(Path::new(CONFIG_FILE)).required(false)),
        };

        builder = builder.add_source(Environment::with_prefix(ENV_PREFIX));

        // set overrides
        builder = builder
            .set_override_option("sample_id", overrides.sample_id.clone())?
            .set_override_option("trace_file", overrides.trace_file.clone())?
            .set_override_option("workdir", overrides.workdir.clone())?
            .set_override_option("report_file", overrides.report_file.clone())?
            .set_override_option("stats_tag", overrides.stats_tag.clone())?
            .set_override_option("log_level", overrides.log_level.clone())?;
        if overrides.strict {
            builder = builder.set_override("field_mismatch", "strict")?;
        }

        let config: Config = builder
            .build()?
            .try_deserialize()
            .context("failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }
}

impl Config {
    fn validate(&self) -> Result<()> {
        ensure!(
            !self.sample_id.trim().is_empty(),
            "no sample id configured; pass --sample-id or set {}_SAMPLE_ID",
            ENV_PREFIX
        );
        ensure!(!self.stats_tag.is_empty(), "stats tag must not be empty");
        Ok(())
    }
}
