//! Headless sessions against a deterministic observer.
//!
//! # Overview
//!
//! A [`SimulatedObserver`] reads every optotype at or below its threshold
//! acuity correctly and answers one quarter turn clockwise of the target
//! otherwise. Paired with a seeded [`RandomDirections`] this makes a full
//! two-eye session reproducible: same seed and threshold, same trials, same
//! results.
//!
//! # Determinism invariants
//!
//! - The observer never reads the wall clock or an RNG.
//! - Target directions come only from the injected [`DirectionSource`].
//! - Result digests depend only on the trials.

use crate::direction::{DirectionSource, RandomDirections};
use crate::error::SessionError;
use crate::narration::Narrator;
use crate::optotype::{Direction, DistanceCategory};
use crate::session::{EyeResult, SessionDriver, SessionProgress};
use crate::staircase::{state_hash, trial_digest, LEVELS};
use serde::Serialize;
use tracing::debug;

/// Upper bound on answers for one eye. The ladder terminates well before
/// this; hitting it means the engine stopped accepting answers.
const MAX_TRIALS_PER_EYE: usize = LEVELS.len() * 4;

/// Observer with a fixed acuity threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatedObserver {
    threshold: f64,
}

impl SimulatedObserver {
    /// `None` unless the threshold is finite and non-negative.
    pub fn new(threshold: f64) -> Option<Self> {
        (threshold.is_finite() && threshold >= 0.0).then_some(SimulatedObserver { threshold })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn sees(&self, level: f64) -> bool {
        level <= self.threshold + 1e-9
    }

    /// Answer for an optotype at `level` pointing at `target`.
    pub fn respond(&self, level: f64, target: Direction) -> Direction {
        if self.sees(level) {
            target
        } else {
            target.clockwise()
        }
    }
}

/// One eye's outcome plus its reproducibility fingerprints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulatedEye {
    #[serde(flatten)]
    pub result: EyeResult,
    pub final_state_hash: String,
    pub trial_digest: String,
}

/// Both eyes of a simulated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationReport {
    pub distance: DistanceCategory,
    pub seed: Option<u64>,
    pub eyes: Vec<SimulatedEye>,
}

/// Drive `driver` to completion with `observer` answering every trial.
///
/// `on_eye` is called with each finished eye before the driver moves on;
/// front ends persist results there.
pub fn drive_session<D, N, F>(
    driver: &mut SessionDriver<D, N>,
    observer: &SimulatedObserver,
    mut on_eye: F,
) -> Result<Vec<SimulatedEye>, SessionError>
where
    D: DirectionSource,
    N: Narrator,
    F: FnMut(&EyeResult),
{
    let mut eyes = Vec::with_capacity(2);
    loop {
        let mut answered = 0;
        while !driver.state().is_finished && answered < MAX_TRIALS_PER_EYE {
            let target = driver.engine().current_target();
            let answer = observer.respond(driver.state().level(), target);
            debug!(
                eye = %driver.current_eye(),
                level = driver.state().level(),
                %target,
                %answer,
                "simulated answer"
            );
            driver.answer(answer);
            answered += 1;
        }

        let final_state_hash = state_hash(driver.state());
        let progress = driver.advance()?;
        let completed = progress.completed().clone();
        on_eye(&completed);
        eyes.push(SimulatedEye {
            trial_digest: trial_digest(&completed.trials),
            final_state_hash,
            result: completed,
        });

        if let SessionProgress::Complete { .. } = progress {
            return Ok(eyes);
        }
    }
}

/// Run a full two-eye session with seeded random targets.
pub fn simulate<N: Narrator>(
    observer: &SimulatedObserver,
    distance: DistanceCategory,
    seed: Option<u64>,
    narrator: N,
    on_eye: impl FnMut(&EyeResult),
) -> Result<SimulationReport, SessionError> {
    let mut driver = SessionDriver::new(RandomDirections::new(seed), narrator, distance);
    let eyes = drive_session(&mut driver, observer, on_eye)?;
    Ok(SimulationReport {
        distance,
        seed,
        eyes,
    })
}
