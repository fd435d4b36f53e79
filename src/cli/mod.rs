//! # CLI
//!
//! Command-line interface for running suites in CI/CD pipelines.
//!
//! - `apiprobe run suite.json --env staging`
//! - `apiprobe list suite.json`
//!
//! Exit codes: 0 when every assertion passed, 1 when any failed, 2 when the
//! suite could not be loaded or the report could not be written.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::{RunMode, RunOverrides};

/// Declarative HTTP contract tests
#[derive(Parser, Debug)]
#[command(name = "apiprobe")]
#[command(version, about, long_about = None)]
#[command(after_help = r#"ENVIRONMENT VARIABLES:
    APIPROBE_LOG                 Log filter (default: warn)
    APIPROBE_ENV                 Environment to select from the suite
    APIPROBE_FORMAT              Report format: text | json
    APIPROBE_DEADLINE_MS         Global suite deadline in milliseconds
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Execute a suite and report the results
    Run(RunArgs),
    /// Print the resolved scenarios without sending any request
    List(ListArgs),
}

/// Options shared by every command that resolves a suite.
#[derive(Args, Debug, Clone)]
pub struct SuiteArgs {
    /// Path to the suite document (JSON)
    pub suite: PathBuf,

    /// Environment to apply from the suite's `environments`
    #[arg(long = "env", env = "APIPROBE_ENV")]
    pub environment: Option<String>,

    /// Variable override, may be repeated
    #[arg(long = "var", value_name = "KEY=VALUE")]
    pub variables: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub suite: SuiteArgs,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, env = "APIPROBE_FORMAT")]
    pub format: OutputFormat,

    /// Write the report to this file instead of stdout
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Run scenarios concurrently, overriding the suite's `mode`
    #[arg(long, conflicts_with = "serial")]
    pub parallel: bool,

    /// Run scenarios one at a time, overriding the suite's `mode`
    #[arg(long)]
    pub serial: bool,

    /// Maximum in-flight scenarios; only used in parallel mode
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Global suite deadline in milliseconds
    #[arg(long, env = "APIPROBE_DEADLINE_MS")]
    pub deadline_ms: Option<u64>,

    /// Per-request timeout in milliseconds
    #[arg(long)]
    pub request_timeout_ms: Option<u64>,
}

impl RunArgs {
    pub fn overrides(&self) -> RunOverrides {
        let mode = if self.parallel {
            Some(RunMode::Parallel)
        } else if self.serial {
            Some(RunMode::Serial)
        } else {
            None
        };

        RunOverrides {
            mode,
            concurrency: self.concurrency,
            deadline_ms: self.deadline_ms,
            request_timeout_ms: self.request_timeout_ms,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    #[command(flatten)]
    pub suite: SuiteArgs,
}

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
