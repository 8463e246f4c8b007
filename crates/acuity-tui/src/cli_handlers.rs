use crate::cli_contract::{AppExit, Cli, Commands, OutputMode, ROBOT_SCHEMA_VERSION};
use crate::cli_normalize::format_cli_failure;
use acuity_core::calibration::Calibration;
use acuity_core::config::{AcuityConfig, ConfigError};
use acuity_core::direction::RandomDirections;
use acuity_core::error::EngineError;
use acuity_core::logging::{init_logging, LogError, LogTarget};
use acuity_core::narration::TracingNarrator;
use acuity_core::optotype::DistanceCategory;
use acuity_core::simulation::{simulate, SimulatedObserver};
use acuity_core::staircase::LEVELS;
use acuity_core::store::{list_results, MeasurementRecord, ResultSink, ResultStore, StoreError};
use acuity_core::trend::{days_since_last, eye_trends, reminder_due, EyeTrend};
use acuity_tui::{run_test_session, TestOptions};
use chrono::Utc;
use serde_json::{json, Value};
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

fn emit_json(value: Value) {
    match serde_json::to_string(&value) {
        Ok(line) => println!("{line}"),
        Err(err) => {
            // Last-resort envelope so robot mode never panics.
            let fallback = json!({
                "schema_version": ROBOT_SCHEMA_VERSION,
                "ok": false,
                "code": "RUNTIME_ERROR",
                "message": format!("failed to serialize JSON response: {err}"),
                "suggestions": [],
                "exit_code": AppExit::RuntimeError as u8,
            });
            println!("{fallback}");
        }
    }
}

pub(crate) fn emit_json_success(
    code: &str,
    message: &str,
    command: Option<&str>,
    exit_code: u8,
    notes: &[String],
    mut data: Value,
) {
    if data.is_null() {
        data = json!({});
    }
    let mut obj = json!({
        "schema_version": ROBOT_SCHEMA_VERSION,
        "ok": true,
        "code": code,
        "message": message,
        "suggestions": [],
        "exit_code": exit_code,
        "data": data,
    });
    if let Some(command) = command {
        obj["command"] = json!(command);
    }
    if !notes.is_empty() {
        obj["notes"] = json!(notes);
    }
    emit_json(obj);
}

pub(crate) fn emit_json_error(
    code: &str,
    message: &str,
    suggestions: &[String],
    notes: &[String],
    exit_code: u8,
) {
    let mut obj = json!({
        "schema_version": ROBOT_SCHEMA_VERSION,
        "ok": false,
        "code": code,
        "message": message,
        "suggestions": suggestions,
        "exit_code": exit_code,
    });
    if !notes.is_empty() {
        obj["notes"] = json!(notes);
    }
    emit_json(obj);
}

/// One failed command, reported in whichever mode is active.
struct Failure {
    exit: AppExit,
    code: &'static str,
    message: String,
    likely_cause: String,
    suggestions: Vec<String>,
    evidence: Vec<String>,
}

impl Failure {
    fn new(exit: AppExit, code: &'static str, message: impl Into<String>) -> Self {
        Failure {
            exit,
            code,
            message: message.into(),
            likely_cause: String::new(),
            suggestions: Vec::new(),
            evidence: Vec::new(),
        }
    }

    fn cause(mut self, cause: impl Into<String>) -> Self {
        self.likely_cause = cause.into();
        self
    }

    fn suggest(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    fn evidence(mut self, path: &Path) -> Self {
        self.evidence.push(path.display().to_string());
        self
    }

    fn report(self, mode: OutputMode, notes: &[String]) -> AppExit {
        if mode == OutputMode::Json {
            emit_json_error(
                self.code,
                &self.message,
                &self.suggestions,
                notes,
                self.exit as u8,
            );
        } else {
            for note in notes {
                eprintln!("Note: {note}");
            }
            eprintln!(
                "{}",
                format_cli_failure(
                    &self.message,
                    &self.likely_cause,
                    &self.suggestions,
                    &self.evidence
                )
            );
        }
        self.exit
    }
}

fn config_failure(err: ConfigError) -> Failure {
    match err {
        ConfigError::Read { ref path, ref source } if source.kind() == io::ErrorKind::NotFound => {
            let path = path.clone();
            Failure::new(AppExit::NotFound, "NOT_FOUND", err.to_string())
                .cause("The --config path does not exist.")
                .suggest("Omit --config to use ./acuity.toml or built-in defaults.")
                .evidence(&path)
        }
        ConfigError::Read { ref path, .. } => {
            let path = path.clone();
            Failure::new(AppExit::RuntimeError, "RUNTIME_ERROR", err.to_string())
                .cause("The config file could not be read.")
                .evidence(&path)
        }
        ConfigError::Parse { ref path, .. } => {
            let path = path.clone();
            Failure::new(AppExit::InvalidArgs, "INVALID_CONFIG", err.to_string())
                .cause("The config file is not valid TOML or has unknown keys.")
                .suggest("Known keys: px_per_mm, cell_px, distance, results_path, seed, [log].")
                .evidence(&path)
        }
        ConfigError::Invalid { .. } => {
            Failure::new(AppExit::InvalidArgs, "INVALID_CONFIG", err.to_string())
                .cause("A config value is out of range.")
        }
    }
}

fn store_failure(err: StoreError, path: &Path) -> Failure {
    let cause = match err {
        StoreError::Malformed { .. } => "The result file has a line that is not a valid record.",
        _ => "The result file could not be read or written.",
    };
    Failure::new(AppExit::RuntimeError, "STORE_ERROR", err.to_string())
        .cause(cause)
        .suggest(format!("Inspect `{}` or pass --results <new-file.jsonl>.", path.display()))
        .evidence(path)
}

fn parse_distance(raw: Option<&str>, fallback: DistanceCategory) -> Result<DistanceCategory, Failure> {
    match raw {
        None => Ok(fallback),
        Some(raw) => raw.parse::<DistanceCategory>().map_err(|err| {
            Failure::new(AppExit::InvalidArgs, "INVALID_ARGS", format!("{err}"))
                .cause("Distance must be one of the supported categories.")
                .suggest("Use --distance 30cm or --distance 3m.")
        }),
    }
}

fn level_ladder() -> String {
    LEVELS
        .iter()
        .map(|l| format!("{l:.1}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn record_json(record: &MeasurementRecord) -> Value {
    json!({
        "id": record.id,
        "recorded_at": record.recorded_at.to_rfc3339(),
        "eye": record.eye.as_str(),
        "distance": record.distance.as_str(),
        "visual_acuity": record.visual_acuity,
        "below_floor": record.below_floor,
        "acuity_label": record.acuity_label(),
        "trials": record.trials,
        "trial_digest": record.trial_digest,
    })
}

fn trend_json(trend: &EyeTrend) -> Value {
    json!({
        "eye": trend.eye.as_str(),
        "sparkline": trend.sparkline(),
        "series": trend.series(),
        "points": trend.points.iter().map(|p| json!({
            "id": p.id,
            "recorded_at": p.recorded_at.to_rfc3339(),
            "distance": p.distance.as_str(),
            "visual_acuity": p.visual_acuity,
            "acuity_label": p.acuity_label,
        })).collect::<Vec<_>>(),
    })
}

fn reminder_line(days: Option<i64>) -> Option<String> {
    if !reminder_due(days) {
        return None;
    }
    let days = days?;
    Some(format!(
        "It has been {days} days since your last check. Time for another test: `acuity test`."
    ))
}

pub(crate) fn handle_command(cli: Cli, mode: OutputMode, repair_notes: &[String]) -> AppExit {
    let config = match AcuityConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => return config_failure(err).report(mode, repair_notes),
    };

    // The test screen owns the terminal; its logs go to a file or nowhere.
    let target = match cli.command {
        Commands::Test { .. } => LogTarget::FileOrDiscard,
        _ => LogTarget::FileOrStderr,
    };
    match init_logging(&config.log, target) {
        Ok(()) | Err(LogError::AlreadyInitialized) => {}
        Err(err @ LogError::InvalidLevel(_)) => {
            return Failure::new(AppExit::InvalidArgs, "INVALID_CONFIG", err.to_string())
                .cause("[log] level is not a valid filter.")
                .suggest("Use one of: trace, debug, info, warn, error, off.")
                .report(mode, repair_notes)
        }
        Err(err) => {
            return Failure::new(AppExit::RuntimeError, "RUNTIME_ERROR", err.to_string())
                .cause("The log file could not be opened.")
                .report(mode, repair_notes)
        }
    }
    debug!(?config, "configuration loaded");

    let outcome = match cli.command {
        Commands::Test {
            distance,
            seed,
            results,
        } => handle_test(&config, distance.as_deref(), seed, results, mode, repair_notes),
        Commands::Simulate {
            distance,
            seed,
            threshold,
            save,
            results,
        } => handle_simulate(
            &config,
            distance.as_deref(),
            seed,
            threshold,
            save,
            results,
            mode,
            repair_notes,
        ),
        Commands::History { results } => handle_history(&config, results, mode, repair_notes),
        Commands::Size {
            level,
            distance,
            px_per_mm,
        } => handle_size(&config, level, distance.as_deref(), px_per_mm, mode, repair_notes),
    };

    match outcome {
        Ok(exit) => exit,
        Err(failure) => failure.report(mode, repair_notes),
    }
}

fn handle_test(
    config: &AcuityConfig,
    distance: Option<&str>,
    seed: Option<u64>,
    results: Option<PathBuf>,
    mode: OutputMode,
    notes: &[String],
) -> Result<AppExit, Failure> {
    let distance = parse_distance(distance, config.distance)?;
    let seed = seed.or(config.seed);
    let results_path = results.unwrap_or_else(|| config.results_path.clone());

    if !io::stdout().is_terminal() {
        return Err(
            Failure::new(AppExit::InvalidArgs, "NO_TTY", "test needs an interactive terminal.")
                .cause("stdout is piped or redirected.")
                .suggest("Run `acuity test` directly in a terminal.")
                .suggest("Use `acuity simulate` for a headless run."),
        );
    }

    let store = ResultStore::open(&results_path).map_err(|e| store_failure(e, &results_path))?;
    let options = TestOptions {
        distance,
        calibration: config.calibration(),
        cell_px: config.cell_px,
    };

    let summary = run_test_session(
        Box::new(RandomDirections::new(seed)),
        Box::new(store),
        options,
    )
    .map_err(|e| {
        Failure::new(AppExit::RuntimeError, "RUNTIME_ERROR", format!("test screen failed: {e}"))
            .cause("The terminal could not be switched to raw mode.")
            .suggest("acuity test")
    })?;

    let exit = if summary.save_failures.is_empty() {
        AppExit::Success
    } else {
        AppExit::RuntimeError
    };
    if mode == OutputMode::Json {
        let data = json!({
            "results_path": results_path.display().to_string(),
            "completed": summary.completed,
            "saved": summary.saved.iter().map(record_json).collect::<Vec<_>>(),
            "save_failures": summary.save_failures,
        });
        if exit == AppExit::Success {
            emit_json_success("OK", "Test session ended.", Some("test"), exit as u8, notes, data);
        } else {
            emit_json_error(
                "SAVE_FAILED",
                &summary.save_failures.join("; "),
                &[format!("Check that `{}` is writable.", results_path.display())],
                notes,
                exit as u8,
            );
        }
    } else {
        for record in &summary.saved {
            println!(
                "Saved #{}: {} eye at {} -> {}",
                record.id,
                record.eye,
                record.distance,
                record.acuity_label()
            );
        }
        for failure in &summary.save_failures {
            eprintln!("{failure}");
        }
        if !summary.completed {
            println!("Session ended before both eyes were finished.");
        }
    }
    Ok(exit)
}

#[allow(clippy::too_many_arguments)]
fn handle_simulate(
    config: &AcuityConfig,
    distance: Option<&str>,
    seed: Option<u64>,
    threshold: f64,
    save: bool,
    results: Option<PathBuf>,
    mode: OutputMode,
    notes: &[String],
) -> Result<AppExit, Failure> {
    let distance = parse_distance(distance, config.distance)?;
    let seed = seed.or(config.seed);
    let observer = SimulatedObserver::new(threshold).ok_or_else(|| {
        Failure::new(
            AppExit::InvalidArgs,
            "INVALID_ARGS",
            format!("invalid --threshold {threshold}"),
        )
        .cause("The observer threshold must be a finite, non-negative acuity.")
        .suggest("acuity simulate --threshold 0.8")
    })?;

    let results_path = results.unwrap_or_else(|| config.results_path.clone());
    let mut store = if save {
        Some(ResultStore::open(&results_path).map_err(|e| store_failure(e, &results_path))?)
    } else {
        None
    };

    let mut saved = Vec::new();
    let mut save_failures = Vec::new();
    let report = simulate(&observer, distance, seed, TracingNarrator, |eye| {
        if let Some(store) = store.as_mut() {
            match store.save_result(eye) {
                Ok(record) => saved.push(record),
                Err(err) => {
                    warn!(eye = %eye.eye, error = %err, "simulated result save failed");
                    save_failures.push(format!("{} eye: {err}", eye.eye));
                }
            }
        }
    })
    .map_err(|e| {
        Failure::new(AppExit::RuntimeError, "RUNTIME_ERROR", format!("simulation failed: {e}"))
            .cause("The session stopped before both eyes finished.")
    })?;

    let exit = if save_failures.is_empty() {
        AppExit::Success
    } else {
        AppExit::RuntimeError
    };

    if mode == OutputMode::Json {
        let report_value = serde_json::to_value(&report).map_err(|e| {
            Failure::new(
                AppExit::RuntimeError,
                "RUNTIME_ERROR",
                format!("failed to serialize simulation report: {e}"),
            )
        })?;
        let data = json!({
            "threshold": observer.threshold(),
            "report": report_value,
            "saved": saved.iter().map(record_json).collect::<Vec<_>>(),
            "save_failures": save_failures,
        });
        if exit == AppExit::Success {
            emit_json_success(
                "OK",
                "Simulation completed.",
                Some("simulate"),
                exit as u8,
                notes,
                data,
            );
        } else {
            emit_json_error(
                "SAVE_FAILED",
                &save_failures.join("; "),
                &[format!("Check that `{}` is writable.", results_path.display())],
                notes,
                exit as u8,
            );
        }
    } else {
        println!(
            "Simulated observer threshold {:.2} at {} (seed {}):",
            observer.threshold(),
            distance,
            seed.map_or_else(|| "random".to_string(), |s| s.to_string())
        );
        for eye in &report.eyes {
            println!(
                "  {:<5} eye: {:<4} after {} trials  digest {}",
                eye.result.eye.as_str(),
                eye.result.result.label(),
                eye.result.trials.len(),
                &eye.trial_digest[..12.min(eye.trial_digest.len())]
            );
        }
        for record in &saved {
            println!("Saved #{} to {}", record.id, results_path.display());
        }
        for failure in &save_failures {
            eprintln!("Save failed: {failure}");
        }
    }
    Ok(exit)
}

fn handle_history(
    config: &AcuityConfig,
    results: Option<PathBuf>,
    mode: OutputMode,
    notes: &[String],
) -> Result<AppExit, Failure> {
    let explicit = results.is_some();
    let path = results.unwrap_or_else(|| config.results_path.clone());
    if explicit && !path.exists() {
        return Err(Failure::new(
            AppExit::NotFound,
            "NOT_FOUND",
            format!("result file not found: {}", path.display()),
        )
        .cause("The --results path does not exist.")
        .suggest("acuity history")
        .evidence(&path));
    }

    let records = list_results(&path).map_err(|e| store_failure(e, &path))?;
    let days = days_since_last(&records, Utc::now());
    let trends = eye_trends(&records);
    debug!(count = records.len(), days_since_last = ?days, "history loaded");

    if mode == OutputMode::Json {
        emit_json_success(
            "OK",
            "Results listed.",
            Some("history"),
            AppExit::Success as u8,
            notes,
            json!({
                "results_path": path.display().to_string(),
                "count": records.len(),
                "days_since_last": days,
                "reminder_due": reminder_due(days),
                "trends": trends.iter().map(trend_json).collect::<Vec<_>>(),
                "results": records.iter().map(record_json).collect::<Vec<_>>(),
            }),
        );
    } else if records.is_empty() {
        println!("No results in {}.", path.display());
    } else {
        println!("{:>4}  {:<25}  {:<5}  {:<8}  acuity", "id", "recorded at (UTC)", "eye", "distance");
        for record in &records {
            println!(
                "{:>4}  {:<25}  {:<5}  {:<8}  {}",
                record.id,
                record.recorded_at.format("%Y-%m-%d %H:%M:%S"),
                record.eye.as_str(),
                record.distance.as_str(),
                record.acuity_label()
            );
        }
        println!();
        println!("Trend (oldest first):");
        for trend in &trends {
            println!(
                "  {:<5}  {}  {}",
                trend.eye.as_str(),
                trend.sparkline(),
                trend.series()
            );
        }
        if let Some(line) = reminder_line(days) {
            println!();
            println!("{line}");
        }
    }
    Ok(AppExit::Success)
}

fn handle_size(
    config: &AcuityConfig,
    level: f64,
    distance: Option<&str>,
    px_per_mm: Option<f64>,
    mode: OutputMode,
    notes: &[String],
) -> Result<AppExit, Failure> {
    let distance = parse_distance(distance, config.distance)?;
    let calibration = match px_per_mm {
        None => config.calibration(),
        Some(px) => Calibration::new(px).ok_or_else(|| {
            Failure::new(
                AppExit::InvalidArgs,
                "INVALID_ARGS",
                format!("invalid --px-per-mm {px}"),
            )
            .cause("Display density must be a positive number.")
            .suggest("acuity size --level 1.0 --px-per-mm 13")
        })?,
    };

    let size_px = match calibration.size_for_level(level, distance) {
        Ok(size) => size,
        Err(EngineError::InvalidLevel(bad)) => {
            return Err(Failure::new(
                AppExit::InvalidLevel,
                "INVALID_LEVEL",
                format!("level {bad} is not on the acuity ladder"),
            )
            .cause(format!("Supported levels: {}.", level_ladder()))
            .suggest(format!("acuity size --level 1.0 --distance {distance}")))
        }
        Err(other) => {
            return Err(Failure::new(
                AppExit::RuntimeError,
                "RUNTIME_ERROR",
                other.to_string(),
            ))
        }
    };
    let size_mm = size_px / calibration.px_per_mm();
    let columns = size_px / config.cell_px;

    if mode == OutputMode::Json {
        emit_json_success(
            "OK",
            "Size computed.",
            Some("size"),
            AppExit::Success as u8,
            notes,
            json!({
                "level": level,
                "distance": distance.as_str(),
                "px_per_mm": calibration.px_per_mm(),
                "size_mm": size_mm,
                "size_px": size_px,
                "cell_px": config.cell_px,
                "columns": columns,
            }),
        );
    } else {
        println!(
            "Level {level:.1} at {distance}: {size_mm:.4} mm = {size_px:.2} px ({columns:.1} columns at {} px/col)",
            config.cell_px
        );
    }
    Ok(AppExit::Success)
}
