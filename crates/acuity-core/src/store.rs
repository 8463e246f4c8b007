//! Append-only result store -- the sole assigner of measurement ids.
//!
//! # Overview
//!
//! [`ResultStore`] writes one [`MeasurementRecord`] per completed eye to a
//! JSONL file. It enforces:
//!
//! - **Monotonic `id`:** starts at 1 for a new file, increments by exactly 1
//!   per saved record. Assigned here and nowhere else.
//! - **JSONL format:** one JSON object per line, newline-terminated, UTF-8.
//! - **Fsync per record:** a result the subject saw on screen is on disk
//!   before `save` returns.
//! - **Line size limit:** rejects records that serialize past
//!   [`MAX_LINE_BYTES`].
//!
//! # Resume
//!
//! Reopening an existing file scans it for the highest `id` and continues
//! after it. Malformed lines fail the open loudly instead of silently
//! resuming from a corrupted file.
//!
//! # Independence from the engine
//!
//! The store only ever sees finished [`EyeResult`] values. A failed save is
//! returned to the caller and has no path back into engine state.

use crate::optotype::{DistanceCategory, Eye};
use crate::session::EyeResult;
use crate::staircase::{trial_digest, AcuityResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Maximum serialized record size in bytes.
const MAX_LINE_BYTES: usize = 64 * 1024;

/// One persisted per-eye result.
///
/// Field order is the on-disk order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    /// Monotonic id assigned by the store.
    pub id: u64,
    /// When the result was saved.
    pub recorded_at: DateTime<Utc>,
    pub eye: Eye,
    pub distance: DistanceCategory,
    /// Acuity value; `0.1` when `below_floor` is set.
    pub visual_acuity: f64,
    /// The subject could not pass the lowest level. `visual_acuity` is then
    /// indeterminate-low, not a reading.
    #[serde(default)]
    pub below_floor: bool,
    /// Number of answered trials.
    #[serde(default)]
    pub trials: usize,
    /// BLAKE3 digest of the trial audit trail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trial_digest: Option<String>,
}

impl MeasurementRecord {
    /// Acuity label for display; below-floor renders as `<0.5`.
    pub fn acuity_label(&self) -> String {
        if self.below_floor {
            AcuityResult::BelowFloor.label()
        } else {
            format!("{:.1}", self.visual_acuity)
        }
    }
}

/// Errors from reading or writing the result file.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("result store I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("malformed result record on line {line}: {source}")]
    Malformed {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize result record: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("serialized record exceeds max line bytes ({len} > {max})")]
    LineTooLong { len: usize, max: usize },
}

/// Persistence capability handed finished results by the session's caller.
pub trait ResultSink {
    fn save_result(&mut self, result: &EyeResult) -> Result<MeasurementRecord, StoreError>;
    fn list_results(&self) -> Result<Vec<MeasurementRecord>, StoreError>;
}

/// JSONL-backed [`ResultSink`].
pub struct ResultStore {
    file: File,
    path: PathBuf,
    next_id: u64,
}

impl ResultStore {
    /// Open or create a result file, resuming after the highest stored id.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let highest = if path.exists() {
            read_results(&path)?.iter().map(|r| r.id).max()
        } else {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            None
        };
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let next_id = highest.map_or(1, |h| h + 1);
        debug!(path = %path.display(), next_id, "result store opened");
        Ok(ResultStore {
            file,
            path,
            next_id,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Id the next saved record will receive.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Save with an explicit timestamp.
    pub fn save_at(
        &mut self,
        result: &EyeResult,
        recorded_at: DateTime<Utc>,
    ) -> Result<MeasurementRecord, StoreError> {
        let record = MeasurementRecord {
            id: self.next_id,
            recorded_at,
            eye: result.eye,
            distance: result.distance,
            visual_acuity: result.result.value(),
            below_floor: result.result.is_below_floor(),
            trials: result.trials.len(),
            trial_digest: Some(trial_digest(&result.trials)),
        };

        let mut line = serde_json::to_string(&record).map_err(StoreError::Serialize)?;
        if line.len() > MAX_LINE_BYTES {
            return Err(StoreError::LineTooLong {
                len: line.len(),
                max: MAX_LINE_BYTES,
            });
        }
        line.push('\n');

        if let Err(err) = self
            .file
            .write_all(line.as_bytes())
            .and_then(|()| self.file.sync_all())
        {
            warn!(path = %self.path.display(), error = %err, "result save failed");
            return Err(err.into());
        }

        self.next_id += 1;
        debug!(id = record.id, eye = %record.eye, "result saved");
        Ok(record)
    }
}

impl ResultSink for ResultStore {
    fn save_result(&mut self, result: &EyeResult) -> Result<MeasurementRecord, StoreError> {
        self.save_at(result, Utc::now())
    }

    fn list_results(&self) -> Result<Vec<MeasurementRecord>, StoreError> {
        list_results(&self.path)
    }
}

/// Read every record in file order.
pub fn read_results(path: &Path) -> Result<Vec<MeasurementRecord>, StoreError> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let record = serde_json::from_str(trimmed).map_err(|source| StoreError::Malformed {
            line: line_no + 1,
            source,
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Records ordered by `recorded_at`, ties kept in file order. A missing
/// file lists as empty.
pub fn list_results(path: &Path) -> Result<Vec<MeasurementRecord>, StoreError> {
    let mut records = match read_results(path) {
        Ok(records) => records,
        Err(StoreError::Io(err)) if err.kind() == io::ErrorKind::NotFound => Vec::new(),
        Err(err) => return Err(err),
    };
    records.sort_by_key(|r| r.recorded_at);
    Ok(records)
}
