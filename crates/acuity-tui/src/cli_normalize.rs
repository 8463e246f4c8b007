use crate::cli_contract::OutputMode;
use std::fmt::Write as _;

pub(crate) fn format_cli_failure(
    what_failed: &str,
    likely_cause: &str,
    next_commands: &[String],
    evidence_paths: &[String],
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Error: {what_failed}");
    let _ = writeln!(out, "Likely cause: {likely_cause}");

    if !next_commands.is_empty() {
        let _ = writeln!(out, "Next command(s):");
        for (i, cmd) in next_commands.iter().enumerate() {
            let _ = writeln!(out, "  {}. {}", i + 1, cmd);
        }
    }

    if !evidence_paths.is_empty() {
        let _ = writeln!(out, "Evidence:");
        for path in evidence_paths {
            let _ = writeln!(out, "  - {path}");
        }
    }

    out.trim_end().to_string()
}

pub(crate) fn looks_like_json_requested(args: &[String]) -> bool {
    args.iter().any(|a| a == "--json")
}

pub(crate) fn looks_like_human_requested(args: &[String]) -> bool {
    args.iter().any(|a| a == "--human")
}

pub(crate) fn select_output_mode(
    explicit_json: bool,
    explicit_human: bool,
    stdout_is_tty: bool,
) -> OutputMode {
    if explicit_json {
        return OutputMode::Json;
    }
    if explicit_human {
        return OutputMode::Human;
    }
    if stdout_is_tty {
        OutputMode::Human
    } else {
        OutputMode::Json
    }
}

/// Repair common flag misspellings before clap sees them.
///
/// Returns the repaired args and one note per repair. Stops at `--`.
pub(crate) fn normalize_args(args: Vec<String>) -> (Vec<String>, Vec<String>) {
    let mut repaired = args;
    let mut notes = Vec::new();

    let mut passthrough_positionals = false;
    for arg in repaired.iter_mut().skip(1) {
        if arg == "--" {
            passthrough_positionals = true;
            continue;
        }
        if passthrough_positionals {
            continue;
        }

        // `--px_per_mm=13` keeps its value.
        let (flag, value) = match arg.split_once('=') {
            Some((flag, value)) => (flag.to_string(), Some(value.to_string())),
            None => (arg.clone(), None),
        };
        let replacement = match flag.as_str() {
            "--px_per_mm" | "--pxpermm" | "--ppm" => Some("--px-per-mm"),
            "--result" | "--results_path" | "--results-path" => Some("--results"),
            "--dist" => Some("--distance"),
            _ => None,
        };

        if let Some(new) = replacement {
            notes.push(format!("normalized `{}` -> `{}`", flag, new));
            *arg = match value {
                Some(value) => format!("{new}={value}"),
                None => new.to_string(),
            };
        }
    }

    (repaired, notes)
}

#[cfg(test)]
mod tests {
    use super::normalize_args;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn normalize_repairs_flag_spellings() {
        let (repaired, notes) = normalize_args(args(&[
            "acuity",
            "size",
            "--level",
            "1.0",
            "--px_per_mm",
            "10",
            "--dist",
            "3m",
        ]));
        assert_eq!(repaired[4], "--px-per-mm");
        assert_eq!(repaired[6], "--distance");
        assert_eq!(notes.len(), 2);
    }

    #[test]
    fn normalize_keeps_inline_values() {
        let (repaired, notes) = normalize_args(args(&["acuity", "history", "--results_path=r.jsonl"]));
        assert_eq!(repaired[2], "--results=r.jsonl");
        assert_eq!(notes, vec!["normalized `--results_path` -> `--results`".to_string()]);
    }

    #[test]
    fn normalize_does_not_rewrite_subcommand_aliases() {
        let (repaired, notes) = normalize_args(args(&["acuity", "sim"]));
        assert_eq!(repaired[1], "sim");
        assert!(notes.is_empty());
    }

    #[test]
    fn normalize_does_not_mutate_after_double_dash() {
        let (repaired, notes) = normalize_args(args(&["acuity", "history", "--", "--dist"]));
        assert_eq!(repaired[3], "--dist");
        assert!(notes.is_empty());
    }

    #[test]
    fn normalize_is_idempotent() {
        let (repaired, notes) = normalize_args(args(&["acuity", "size", "--ppm", "12"]));
        let (repaired_2, notes_2) = normalize_args(repaired.clone());
        assert_eq!(repaired, repaired_2);
        assert_eq!(notes.len(), 1);
        assert!(notes_2.is_empty());
    }
}
