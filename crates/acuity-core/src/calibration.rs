//! Optotype size calibration.
//!
//! Acuity is inversely proportional to the critical detail size, and what
//! must stay constant at the eye is the angular subtense. The reference is a
//! Landolt C of [`REFERENCE_SIZE_MM`] at [`REFERENCE_DISTANCE_M`] for acuity
//! 1.0; other distances rescale linearly:
//!
//! ```text
//! size_mm = REFERENCE_SIZE_MM * (distance_m / REFERENCE_DISTANCE_M) / level
//!   3m   -> 4.3632  / level
//!   30cm -> 0.43632 / level
//! ```
//!
//! Millimeters become rendering units through `px_per_mm`. That density is a
//! display assumption, not physics; it defaults to [`DEFAULT_PX_PER_MM`] and
//! is configurable per display.

use crate::error::EngineError;
use crate::optotype::DistanceCategory;
use crate::staircase::{level_index_of, level_value, MAX_LEVEL_INDEX};

/// Optotype size in millimeters for acuity 1.0 at the reference distance.
pub const REFERENCE_SIZE_MM: f64 = 7.272;

/// Reference viewing distance in meters.
pub const REFERENCE_DISTANCE_M: f64 = 5.0;

/// Rendering units per millimeter assumed when nothing else is configured.
pub const DEFAULT_PX_PER_MM: f64 = 13.0;

/// Display density used to turn millimeters into rendering units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    px_per_mm: f64,
}

impl Default for Calibration {
    fn default() -> Self {
        Calibration {
            px_per_mm: DEFAULT_PX_PER_MM,
        }
    }
}

impl Calibration {
    /// Returns `None` for a non-positive or non-finite density.
    pub fn new(px_per_mm: f64) -> Option<Self> {
        (px_per_mm.is_finite() && px_per_mm > 0.0).then_some(Calibration { px_per_mm })
    }

    pub fn px_per_mm(&self) -> f64 {
        self.px_per_mm
    }

    /// Rendering size for an acuity level at a viewing distance.
    pub fn size_for_level(&self, level: f64, distance: DistanceCategory) -> Result<f64, EngineError> {
        Ok(size_mm(level, distance)? * self.px_per_mm)
    }

    /// Rendering size for a ladder index.
    pub fn size_for_index(&self, index: usize, distance: DistanceCategory) -> Result<f64, EngineError> {
        if index > MAX_LEVEL_INDEX {
            return Err(EngineError::InvalidLevel(index as f64));
        }
        self.size_for_level(level_value(index), distance)
    }
}

/// Physical optotype size in millimeters.
///
/// Rejects non-positive, non-finite and off-ladder levels with
/// [`EngineError::InvalidLevel`].
pub fn size_mm(level: f64, distance: DistanceCategory) -> Result<f64, EngineError> {
    if !level.is_finite() || level <= 0.0 || level_index_of(level).is_none() {
        return Err(EngineError::InvalidLevel(level));
    }
    Ok(REFERENCE_SIZE_MM * (distance.meters() / REFERENCE_DISTANCE_M) / level)
}

/// Rendering size with the default density.
pub fn size_for_level(level: f64, distance: DistanceCategory) -> Result<f64, EngineError> {
    Calibration::default().size_for_level(level, distance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::staircase::LEVELS;

    const EPS: f64 = 1e-9;

    #[test]
    fn reference_constants_match_published_values() {
        let far = size_mm(1.0, DistanceCategory::Far3M).unwrap();
        let near = size_mm(1.0, DistanceCategory::Near30Cm).unwrap();
        assert!((far - 4.3632).abs() < EPS, "got {far}");
        assert!((near - 0.43632).abs() < EPS, "got {near}");
    }

    #[test]
    fn default_density_is_thirteen_units_per_mm() {
        let far = size_for_level(1.0, DistanceCategory::Far3M).unwrap();
        let near = size_for_level(1.0, DistanceCategory::Near30Cm).unwrap();
        assert!((far - 4.3632 * 13.0).abs() < EPS);
        assert!((near - 0.43632 * 13.0).abs() < EPS);
    }

    #[test]
    fn size_strictly_decreases_along_ladder() {
        for distance in [DistanceCategory::Near30Cm, DistanceCategory::Far3M] {
            let sizes: Vec<f64> = LEVELS
                .iter()
                .map(|&l| size_for_level(l, distance).unwrap())
                .collect();
            assert!(
                sizes.windows(2).all(|w| w[0] > w[1]),
                "{distance}: {sizes:?}"
            );
        }
    }

    #[test]
    fn near_size_is_one_tenth_of_far_size() {
        for &level in &LEVELS {
            let far = size_for_level(level, DistanceCategory::Far3M).unwrap();
            let near = size_for_level(level, DistanceCategory::Near30Cm).unwrap();
            assert!(near < far);
            assert!((near * 10.0 - far).abs() < 1e-9);
        }
    }

    #[test]
    fn custom_density_scales_linearly() {
        let cal = Calibration::new(26.0).unwrap();
        let base = size_for_level(0.8, DistanceCategory::Far3M).unwrap();
        let doubled = cal.size_for_level(0.8, DistanceCategory::Far3M).unwrap();
        assert!((doubled - 2.0 * base).abs() < EPS);
    }

    #[test]
    fn rejects_bad_levels() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY, 1.1, 0.1] {
            let err = size_for_level(bad, DistanceCategory::Far3M).unwrap_err();
            assert!(matches!(err, EngineError::InvalidLevel(_)), "{bad}");
        }
    }

    #[test]
    fn rejects_bad_density() {
        assert!(Calibration::new(0.0).is_none());
        assert!(Calibration::new(-13.0).is_none());
        assert!(Calibration::new(f64::NAN).is_none());
        assert_eq!(Calibration::new(13.0), Some(Calibration::default()));
    }

    #[test]
    fn size_for_index_matches_level_lookup() {
        let cal = Calibration::default();
        assert_eq!(
            cal.size_for_index(5, DistanceCategory::Far3M).unwrap(),
            cal.size_for_level(1.0, DistanceCategory::Far3M).unwrap()
        );
        assert!(cal.size_for_index(7, DistanceCategory::Far3M).is_err());
    }
}
