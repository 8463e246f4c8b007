//! Error types for the staircase engine and session driver.
//!
//! Ignored answers (paused or finished test) are not errors. They are
//! reported through [`crate::engine::AnswerOutcome::Ignored`].

use crate::optotype::Eye;
use thiserror::Error;

/// Errors reported by [`crate::engine::StaircaseEngine`] and the size
/// calibration functions. None of them change engine state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// The input channel delivered something that is not a direction.
    #[error("invalid input: {0:?} is not one of up, down, left, right")]
    InvalidInput(String),

    /// `undo()` was called with an empty snapshot stack.
    #[error("nothing to undo")]
    NothingToUndo,

    /// A size was requested for a level that is non-positive, non-finite,
    /// or not on the acuity ladder.
    #[error("invalid level: {0}")]
    InvalidLevel(f64),
}

/// Errors reported by [`crate::session::SessionDriver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    /// `advance()` was called before the active eye finished.
    #[error("{0} eye test is not finished yet")]
    EyeNotFinished(Eye),

    /// `advance()` was called after both eyes were already handed over.
    #[error("session is already complete")]
    SessionComplete,
}
