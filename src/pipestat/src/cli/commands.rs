use crate::config::ConfigOverrides;
use crate::constants::{CONFIG_FILE, ENV_PREFIX};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

fn about_message() -> String {
    format!(
        "Collects per-task statistics from workflow traces into cumulative JSON reports\nVersion: {}",
        env!("CARGO_PKG_VERSION")
    )
}

fn footer_message() -> String {
    format!(
        "Configuration is read from --config or ./{}, then {}_* environment variables, then flags.\n",
        CONFIG_FILE, ENV_PREFIX
    )
}

#[derive(Parser, Clone)]
#[clap(
    name = "pipestat",
    about = about_message(),
    version = env!("CARGO_PKG_VERSION"),
    after_help = footer_message()
)]
pub struct Cli {
    /// Path to a TOML configuration file
    #[clap(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Merge completed, stats-tagged tasks of a trace file into the sample's stats report
    Collect(CollectArgs),

    /// Inspect the built-in pipeline recipes
    Recipe {
        #[clap(subcommand)]
        command: RecipeCommand,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct CollectArgs {
    /// Sample identifier; names the stats file <workdir>/<sample-id>.stats.json
    #[clap(long)]
    pub sample_id: Option<String>,

    /// Trace file, relative to the working directory (default: pipeline_stats.txt)
    #[clap(long, value_name = "FILE")]
    pub trace: Option<String>,

    /// Directory holding the trace and the stats file (default: .)
    #[clap(long, value_name = "DIR")]
    pub workdir: Option<String>,

    /// Where to write the report snapshot (default: .report.json)
    #[clap(long, value_name = "FILE")]
    pub report: Option<String>,

    /// Substring a task's tag must contain to be collected (default: " getStats")
    #[clap(long, allow_hyphen_values = true)]
    pub tag: Option<String>,

    /// Fail when a collected row's field count differs from the header's
    #[clap(long)]
    pub strict: bool,

    /// Log level, e.g. debug or info
    #[clap(long)]
    pub log_level: Option<String>,
}

impl CollectArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            sample_id: self.sample_id.clone(),
            trace_file: self.trace.clone(),
            workdir: self.workdir.clone(),
            report_file: self.report.clone(),
            stats_tag: self.tag.clone(),
            strict: self.strict,
            log_level: self.log_level.clone(),
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum RecipeCommand {
    /// List the built-in recipes
    List,

    /// Show the pipeline string and directives of a recipe
    Show {
        name: String,

        /// Output the recipe in JSON format
        #[clap(long)]
        json: bool,
    },
}
