//! Per-eye acuity trends and the check-up reminder.
//!
//! Below-floor results carry no numeric reading here: their
//! `visual_acuity` is `None` and their label is `<0.5`. The stored `0.1`
//! sentinel never reaches a trend.

use crate::optotype::{DistanceCategory, Eye};
use crate::staircase::level_index_of;
use crate::store::MeasurementRecord;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Days after the latest result before a new check is suggested.
pub const REMINDER_AFTER_DAYS: i64 = 30;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Bar glyphs: index 0 is below floor, 1..=7 the ladder rungs.
const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// One result in an eye's series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub id: u64,
    pub recorded_at: DateTime<Utc>,
    pub distance: DistanceCategory,
    /// `None` for below-floor results.
    pub visual_acuity: Option<f64>,
    pub acuity_label: String,
}

impl TrendPoint {
    fn from_record(record: &MeasurementRecord) -> Self {
        TrendPoint {
            id: record.id,
            recorded_at: record.recorded_at,
            distance: record.distance,
            visual_acuity: (!record.below_floor).then_some(record.visual_acuity),
            acuity_label: record.acuity_label(),
        }
    }

    fn bar(&self) -> char {
        match self.visual_acuity {
            None => BARS[0],
            Some(value) => level_index_of(value).map_or('?', |index| BARS[index + 1]),
        }
    }
}

/// Chronological results for one eye.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EyeTrend {
    pub eye: Eye,
    pub points: Vec<TrendPoint>,
}

impl EyeTrend {
    /// One bar per result, taller for better acuity.
    pub fn sparkline(&self) -> String {
        self.points.iter().map(TrendPoint::bar).collect()
    }

    /// Labels oldest first, e.g. `0.8 -> 1.0 -> <0.5`.
    pub fn series(&self) -> String {
        self.points
            .iter()
            .map(|p| p.acuity_label.as_str())
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

/// Split records into per-eye series, right eye first. Eyes without
/// results are left out. Points are ordered by `recorded_at`.
pub fn eye_trends(records: &[MeasurementRecord]) -> Vec<EyeTrend> {
    [Eye::Right, Eye::Left]
        .into_iter()
        .filter_map(|eye| {
            let mut points: Vec<TrendPoint> = records
                .iter()
                .filter(|r| r.eye == eye)
                .map(TrendPoint::from_record)
                .collect();
            points.sort_by_key(|p| p.recorded_at);
            (!points.is_empty()).then_some(EyeTrend { eye, points })
        })
        .collect()
}

/// Whole days since the newest record, rounded up. `None` when empty.
pub fn days_since_last(records: &[MeasurementRecord], now: DateTime<Utc>) -> Option<i64> {
    let last = records.iter().map(|r| r.recorded_at).max()?;
    let seconds = (now - last).num_seconds().abs();
    Some((seconds + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY)
}

/// A new check is due once more than [`REMINDER_AFTER_DAYS`] have passed.
pub fn reminder_due(days_since_last: Option<i64>) -> bool {
    days_since_last.is_some_and(|days| days > REMINDER_AFTER_DAYS)
}
