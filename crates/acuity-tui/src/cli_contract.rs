use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

/// Acuity -- adaptive staircase visual-acuity test.
#[derive(Parser)]
#[command(name = "acuity")]
#[command(version, about, long_about = None)]
pub(crate) struct Cli {
    /// Emit machine-readable JSON output.
    #[arg(long, global = true, conflicts_with = "human")]
    pub(crate) json: bool,

    /// Force human-readable output (overrides auto JSON in piped mode).
    #[arg(long, global = true)]
    pub(crate) human: bool,

    /// Config file (default: ./acuity.toml when present).
    #[arg(long, global = true)]
    pub(crate) config: Option<PathBuf>,

    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run the interactive test, right eye then left eye.
    #[command(alias = "run")]
    Test {
        /// Viewing distance: 30cm or 3m.
        #[arg(long)]
        distance: Option<String>,

        /// Seed for target directions (reproducible sessions).
        #[arg(long)]
        seed: Option<u64>,

        /// Result file to append to.
        #[arg(long)]
        results: Option<PathBuf>,
    },

    /// Run both eyes headless against a simulated observer.
    #[command(alias = "sim")]
    Simulate {
        /// Viewing distance: 30cm or 3m.
        #[arg(long)]
        distance: Option<String>,

        /// Seed for target directions.
        #[arg(long)]
        seed: Option<u64>,

        /// Best acuity the simulated observer can read.
        #[arg(long, default_value_t = 1.0)]
        threshold: f64,

        /// Append the simulated results to the result file.
        #[arg(long)]
        save: bool,

        /// Result file used with --save.
        #[arg(long)]
        results: Option<PathBuf>,
    },

    /// List stored results, oldest first.
    #[command(alias = "results")]
    History {
        /// Result file to read.
        #[arg(long)]
        results: Option<PathBuf>,
    },

    /// Compute the rendered optotype size for a level.
    Size {
        /// Acuity level on the ladder (0.5 .. 1.2).
        #[arg(long)]
        level: f64,

        /// Viewing distance: 30cm or 3m.
        #[arg(long)]
        distance: Option<String>,

        /// Display density override.
        #[arg(long)]
        px_per_mm: Option<f64>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum OutputMode {
    Human,
    Json,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum AppExit {
    Success = 0,
    NotFound = 1,
    InvalidArgs = 2,
    InvalidLevel = 3,
    RuntimeError = 4,
}

impl AppExit {
    pub(crate) fn code(self) -> ExitCode {
        ExitCode::from(self as u8)
    }
}

pub(crate) const QUICK_HELP: &str = "\
acuity — adaptive staircase visual-acuity test
Usage: acuity [--json|--human] [--config <file>] <command> [args]
Commands:
  test [--distance 30cm|3m] [--seed <n>] [--results <file.jsonl>]
  simulate [--distance 30cm|3m] [--seed <n>] [--threshold <acuity>] [--save]
  history [--results <file.jsonl>]
  size --level <0.5..1.2> [--distance 30cm|3m] [--px-per-mm <n>]
Tips:
  acuity --help
  acuity <command> --help";

pub(crate) const ROBOT_SCHEMA_VERSION: &str = "acuity-cli-robot-v1";
