//! Staircase transition table -- pure state machine for one eye.
//!
//! # Overview
//!
//! [`advance`] is a pure function `(TestState, Trial) -> (TestState, Step)`.
//! It never mutates its input; the engine keeps the previous value on a
//! snapshot stack, which is what makes undo a plain restore.
//!
//! # Purity contract
//!
//! - No IO.
//! - No randomness. The target direction arrives inside [`Trial`].
//! - No wall clock reads.
//! - Same inputs always produce the same output.
//!
//! # Transition table
//!
//! Evaluated on `(correct, is_retrying, level_index, consecutive_wrong)`:
//!
//! | correct | retrying | condition              | [`Step`]               |
//! |---------|----------|------------------------|------------------------|
//! | yes     | yes      | --                     | `RetryPassed`          |
//! | yes     | no       | index < max            | `Advance`              |
//! | yes     | no       | index == max           | `CeilingPassed`        |
//! | no      | yes      | index > 0              | `RetryStepDown`        |
//! | no      | yes      | index == 0             | `RetryFloorFailed`     |
//! | no      | no       | wrong == 0             | `FirstMiss`            |
//! | no      | no       | wrong == 1, index > 0  | `DoubleMissStepDown`   |
//! | no      | no       | wrong == 1, index == 0 | `DoubleMissAtFloor`    |
//!
//! Retry mode has no one-miss allowance: every wrong answer steps down.
//!
//! # Determinism
//!
//! [`TestState`] holds no floats. Levels are stored as ladder indices and
//! converted with [`level_value`] at the edges, so `state_hash` is stable.

use crate::optotype::{Direction, Eye};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Acuity ladder, easiest first.
pub const LEVELS: [f64; 7] = [0.5, 0.6, 0.7, 0.8, 0.9, 1.0, 1.2];

/// Index of the hardest level.
pub const MAX_LEVEL_INDEX: usize = LEVELS.len() - 1;

/// Reported acuity when the subject cannot pass the lowest level. This is
/// "indeterminate low", not a measurement.
pub const BELOW_FLOOR_SENTINEL: f64 = 0.1;

/// Transition logic version. Included in [`state_hash`] so that changes to
/// the table produce visibly different hashes.
pub(crate) const STAIRCASE_VERSION: &str = "staircase-v1";

/// Acuity value for a ladder index. Out-of-range indices clamp to the
/// hardest level; [`TestState`] never holds one.
pub fn level_value(index: usize) -> f64 {
    LEVELS[index.min(MAX_LEVEL_INDEX)]
}

/// Ladder index for an acuity value, if it is on the ladder.
pub fn level_index_of(level: f64) -> Option<usize> {
    LEVELS.iter().position(|&l| (l - level).abs() < 1e-9)
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Final outcome for one eye.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcuityResult {
    /// Passed the ladder level at this index.
    Level(usize),
    /// Could not pass the lowest ladder level.
    BelowFloor,
}

impl AcuityResult {
    /// Numeric acuity. [`BELOW_FLOOR_SENTINEL`] for [`AcuityResult::BelowFloor`].
    pub fn value(&self) -> f64 {
        match self {
            AcuityResult::Level(index) => level_value(*index),
            AcuityResult::BelowFloor => BELOW_FLOOR_SENTINEL,
        }
    }

    pub fn is_below_floor(&self) -> bool {
        matches!(self, AcuityResult::BelowFloor)
    }

    /// Short label for display. Below-floor renders as `<0.5`.
    pub fn label(&self) -> String {
        match self {
            AcuityResult::Level(index) => format!("{:.1}", level_value(*index)),
            AcuityResult::BelowFloor => format!("<{:.1}", LEVELS[0]),
        }
    }
}

/// One answered trial, as recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialRecord {
    /// Ladder index in effect when the answer was given.
    pub level_index: usize,
    /// Whether the answer matched the target.
    pub correct: bool,
    /// Direction the optotype was drawn in.
    pub target_direction: Direction,
    /// Direction the subject reported.
    pub answer_direction: Direction,
}

impl TrialRecord {
    /// Acuity value of the level this trial was shown at.
    pub fn level(&self) -> f64 {
        level_value(self.level_index)
    }
}

/// Complete test state for one eye.
///
/// Replaced wholesale on every transition. [`state_hash`] encodes every
/// field explicitly; extend it when adding one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestState {
    /// Eye under test.
    pub eye: Eye,
    /// Current ladder index, always `<= MAX_LEVEL_INDEX`.
    pub level_index: usize,
    /// Misses at the current level since the last level change (0 or 1).
    /// Only meaningful in forward mode.
    pub consecutive_wrong: u8,
    /// True after a double miss; the engine is searching downward.
    pub is_retrying: bool,
    /// Terminal flag.
    pub is_finished: bool,
    /// Set exactly when `is_finished` becomes true.
    pub result: Option<AcuityResult>,
    /// Audit trail of applied answers. Never read by the transition table.
    pub history: Vec<TrialRecord>,
    /// While true, answers are ignored.
    pub is_paused: bool,
}

impl TestState {
    /// Fresh state at the easiest level.
    pub fn new(eye: Eye) -> Self {
        TestState {
            eye,
            level_index: 0,
            consecutive_wrong: 0,
            is_retrying: false,
            is_finished: false,
            result: None,
            history: Vec::new(),
            is_paused: false,
        }
    }

    /// Acuity value of the current level.
    pub fn level(&self) -> f64 {
        level_value(self.level_index)
    }

    /// True when an answer would be applied rather than ignored.
    pub fn accepts_answers(&self) -> bool {
        !self.is_paused && !self.is_finished
    }
}

// ---------------------------------------------------------------------------
// Transition table
// ---------------------------------------------------------------------------

/// Target and reported direction for a single trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trial {
    pub target: Direction,
    pub answer: Direction,
}

impl Trial {
    pub fn is_correct(&self) -> bool {
        self.target == self.answer
    }
}

/// Which row of the transition table an answer took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Correct while retrying: finish at this level.
    RetryPassed,
    /// Correct in forward mode below the ceiling: one level harder.
    Advance,
    /// Correct at the hardest level: finish at the ceiling.
    CeilingPassed,
    /// Wrong while retrying above the floor: one level easier.
    RetryStepDown,
    /// Wrong while retrying at the floor: finish below floor.
    RetryFloorFailed,
    /// First miss at this level: same level again.
    FirstMiss,
    /// Second consecutive miss above the floor: one level easier, enter retry.
    DoubleMissStepDown,
    /// Second consecutive miss at the floor: finish below floor.
    DoubleMissAtFloor,
}

impl Step {
    /// True for rows that end the test.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Step::RetryPassed
                | Step::CeilingPassed
                | Step::RetryFloorFailed
                | Step::DoubleMissAtFloor
        )
    }
}

/// Pick the transition-table row for an answer.
pub fn classify(state: &TestState, correct: bool) -> Step {
    match (correct, state.is_retrying) {
        (true, true) => Step::RetryPassed,
        (true, false) if state.level_index < MAX_LEVEL_INDEX => Step::Advance,
        (true, false) => Step::CeilingPassed,
        (false, true) if state.level_index > 0 => Step::RetryStepDown,
        (false, true) => Step::RetryFloorFailed,
        (false, false) if state.consecutive_wrong == 0 => Step::FirstMiss,
        (false, false) if state.level_index > 0 => Step::DoubleMissStepDown,
        (false, false) => Step::DoubleMissAtFloor,
    }
}

/// Pure transition: `(TestState, Trial) -> (TestState, Step)`.
///
/// Returns `None` when the state does not accept answers (paused or
/// finished); callers report that as an ignored answer.
pub fn advance(state: &TestState, trial: Trial) -> Option<(TestState, Step)> {
    if !state.accepts_answers() {
        return None;
    }

    let correct = trial.is_correct();
    let step = classify(state, correct);

    let mut history = state.history.clone();
    history.push(TrialRecord {
        level_index: state.level_index,
        correct,
        target_direction: trial.target,
        answer_direction: trial.answer,
    });

    let base = TestState {
        history,
        ..state.clone()
    };

    let next = match step {
        Step::RetryPassed | Step::CeilingPassed => TestState {
            is_finished: true,
            result: Some(AcuityResult::Level(state.level_index)),
            ..base
        },
        Step::Advance => TestState {
            level_index: state.level_index + 1,
            consecutive_wrong: 0,
            ..base
        },
        Step::RetryStepDown | Step::DoubleMissStepDown => TestState {
            level_index: state.level_index - 1,
            consecutive_wrong: 0,
            is_retrying: true,
            ..base
        },
        Step::RetryFloorFailed | Step::DoubleMissAtFloor => TestState {
            is_finished: true,
            result: Some(AcuityResult::BelowFloor),
            ..base
        },
        Step::FirstMiss => TestState {
            consecutive_wrong: 1,
            ..base
        },
    };

    Some((next, step))
}

/// Replay a sequence of trials from a fresh state.
///
/// Trials after the state finishes are skipped, matching the engine's
/// ignore rule.
pub fn replay(eye: Eye, trials: &[Trial]) -> TestState {
    trials.iter().fold(TestState::new(eye), |state, trial| {
        match advance(&state, *trial) {
            Some((next, _)) => next,
            None => state,
        }
    })
}

// ---------------------------------------------------------------------------
// Hashing
// ---------------------------------------------------------------------------

/// `BLAKE3(STAIRCASE_VERSION + fixed-width encoding of TestState)`.
///
/// All fields are included. `is_paused` is part of the hash even though it
/// is not undoable, because it is part of the observable state.
pub fn state_hash(state: &TestState) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(STAIRCASE_VERSION.as_bytes());
    hasher.update(&[eye_byte(state.eye)]);
    hasher.update(&(state.level_index as u64).to_le_bytes());
    hasher.update(&[
        state.consecutive_wrong,
        u8::from(state.is_retrying),
        u8::from(state.is_finished),
        result_byte(state.result),
        u8::from(state.is_paused),
    ]);
    update_history(&mut hasher, &state.history);
    hasher.finalize().to_hex().to_string()
}

/// BLAKE3 digest of an audit trail. Stored alongside persisted results so a
/// record can be tied back to the trials that produced it.
pub fn trial_digest(history: &[TrialRecord]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(STAIRCASE_VERSION.as_bytes());
    update_history(&mut hasher, history);
    hasher.finalize().to_hex().to_string()
}

// Fixed-width encoding: every record is 11 bytes and the history is
// length-prefixed, so distinct states never share a byte stream.
fn update_history(hasher: &mut blake3::Hasher, history: &[TrialRecord]) {
    hasher.update(&(history.len() as u64).to_le_bytes());
    for record in history {
        hasher.update(&(record.level_index as u64).to_le_bytes());
        hasher.update(&[
            u8::from(record.correct),
            direction_byte(record.target_direction),
            direction_byte(record.answer_direction),
        ]);
    }
}

fn eye_byte(eye: Eye) -> u8 {
    match eye {
        Eye::Right => 0,
        Eye::Left => 1,
    }
}

fn direction_byte(direction: Direction) -> u8 {
    match direction {
        Direction::Up => 0,
        Direction::Down => 1,
        Direction::Left => 2,
        Direction::Right => 3,
    }
}

// 0 = unset, 1 = below floor, 2.. = ladder index + 2.
fn result_byte(result: Option<AcuityResult>) -> u8 {
    match result {
        None => 0,
        Some(AcuityResult::BelowFloor) => 1,
        Some(AcuityResult::Level(index)) => (index as u8).saturating_add(2),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
