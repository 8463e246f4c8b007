//! Acuity CLI entry point.
//!
//! Provides the `acuity` binary: the interactive test screen plus headless
//! simulation, result history, and optotype size lookup.

mod cli_contract;
mod cli_handlers;
mod cli_normalize;

use clap::error::ErrorKind;
use clap::Parser;
use cli_contract::{AppExit, Cli, OutputMode, QUICK_HELP};
use cli_handlers::{emit_json_error, emit_json_success, handle_command};
use cli_normalize::{
    looks_like_human_requested, looks_like_json_requested, normalize_args, select_output_mode,
};
use serde_json::json;
use std::env;
use std::io::{self, IsTerminal};
use std::process::ExitCode;

fn main() -> ExitCode {
    let raw_args: Vec<String> = env::args().collect();
    let mode = select_output_mode(
        looks_like_json_requested(&raw_args),
        looks_like_human_requested(&raw_args),
        io::stdout().is_terminal(),
    );
    if raw_args.len() == 1 {
        if mode == OutputMode::Json {
            emit_json_success(
                "OK",
                "Quick help emitted.",
                Some("help"),
                AppExit::Success as u8,
                &[],
                json!({ "quick_help": QUICK_HELP }),
            );
        } else {
            println!("{QUICK_HELP}");
        }
        return AppExit::Success.code();
    }

    let (args, repair_notes) = normalize_args(raw_args);

    let cli = match Cli::try_parse_from(&args) {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version arrive as errors but are not failures.
            if matches!(
                err.kind(),
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
            ) {
                let _ = err.print();
                return AppExit::Success.code();
            }
            let (message, suggestions) = parse_error_guidance(err.kind());
            if mode == OutputMode::Json {
                emit_json_error(
                    "INVALID_ARGS",
                    message,
                    &suggestions,
                    &repair_notes,
                    AppExit::InvalidArgs as u8,
                );
            } else {
                for note in &repair_notes {
                    eprintln!("Note: {note}");
                }
                eprintln!("{err}");
                for (idx, suggestion) in suggestions.iter().enumerate() {
                    eprintln!("Hint {}: {}", idx + 1, suggestion);
                }
            }
            return AppExit::InvalidArgs.code();
        }
    };

    let mode = select_output_mode(cli.json, cli.human, io::stdout().is_terminal());
    handle_command(cli, mode, &repair_notes).code()
}

fn parse_error_guidance(kind: ErrorKind) -> (&'static str, Vec<String>) {
    match kind {
        ErrorKind::InvalidSubcommand => (
            "Unknown subcommand.",
            vec![
                "Use one of: `acuity test`, `acuity simulate`, `acuity history`, or `acuity size`."
                    .to_string(),
                "Run `acuity --help` for full command syntax.".to_string(),
            ],
        ),
        ErrorKind::UnknownArgument => (
            "Unknown flag or option.",
            vec![
                "Run `acuity --help` for global flags.".to_string(),
                "Run `acuity <command> --help` to inspect command-specific flags.".to_string(),
            ],
        ),
        ErrorKind::MissingRequiredArgument => (
            "Missing required argument.",
            vec![
                "Example: `acuity size --level 1.0 --distance 3m`.".to_string(),
                "Example: `acuity simulate --threshold 0.8 --seed 7`.".to_string(),
            ],
        ),
        ErrorKind::InvalidValue | ErrorKind::ValueValidation => (
            "Invalid value for a flag.",
            vec![
                "Levels and thresholds are decimals such as `0.8`; seeds are integers.".to_string(),
                "Run `acuity <command> --help` for value formats.".to_string(),
            ],
        ),
        ErrorKind::ArgumentConflict => (
            "Conflicting flags or arguments.",
            vec![
                "Use either `--json` or `--human`, but not both.".to_string(),
                "Run `acuity --help` to review valid flag combinations.".to_string(),
            ],
        ),
        _ => (
            "Invalid command syntax.",
            vec![
                "Run `acuity --help` for command syntax.".to_string(),
                "Run `acuity <command> --help` for command-specific args.".to_string(),
            ],
        ),
    }
}
