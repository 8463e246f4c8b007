//! Session driver -- right eye, then left eye, then done.
//!
//! The driver only sequences eyes. It forwards answers, undo and pause to
//! the engine, narrates progress, and hands each finished eye's result back
//! to the caller. Persisting that result is the caller's job; a failed save
//! never feeds back into the driver.

use crate::direction::DirectionSource;
use crate::engine::{AnswerOutcome, StaircaseEngine};
use crate::error::{EngineError, SessionError};
use crate::narration::{Cue, Narrator};
use crate::optotype::{Direction, DistanceCategory, Eye};
use crate::staircase::{AcuityResult, TestState, TrialRecord};
use serde::Serialize;
use tracing::info;

/// Final result for one eye, ready for persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EyeResult {
    pub eye: Eye,
    pub distance: DistanceCategory,
    pub result: AcuityResult,
    /// Audit trail that produced the result.
    pub trials: Vec<TrialRecord>,
}

/// What `advance()` handed over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionProgress {
    /// Right eye done; the engine now runs the left eye.
    NextEye { completed: EyeResult },
    /// Left eye done; the session is over.
    Complete { completed: EyeResult },
}

impl SessionProgress {
    pub fn completed(&self) -> &EyeResult {
        match self {
            SessionProgress::NextEye { completed } | SessionProgress::Complete { completed } => {
                completed
            }
        }
    }
}

/// Two-eye session around a [`StaircaseEngine`].
pub struct SessionDriver<D: DirectionSource, N: Narrator> {
    engine: StaircaseEngine<D>,
    narrator: N,
    distance: DistanceCategory,
    is_complete: bool,
}

impl<D: DirectionSource, N: Narrator> SessionDriver<D, N> {
    /// Start a session with the right eye.
    pub fn new(directions: D, narrator: N, distance: DistanceCategory) -> Self {
        let mut driver = SessionDriver {
            engine: StaircaseEngine::new(directions, Eye::Right),
            narrator,
            distance,
            is_complete: false,
        };
        driver.narrator.narrate(&Cue::TestStarted(Eye::Right));
        driver
    }

    pub fn engine(&self) -> &StaircaseEngine<D> {
        &self.engine
    }

    pub fn state(&self) -> &TestState {
        self.engine.state()
    }

    pub fn narrator(&self) -> &N {
        &self.narrator
    }

    pub fn distance(&self) -> DistanceCategory {
        self.distance
    }

    pub fn current_eye(&self) -> Eye {
        self.engine.state().eye
    }

    /// True once the left eye result has been handed over.
    pub fn is_complete(&self) -> bool {
        self.is_complete
    }

    pub fn answer(&mut self, direction: Direction) -> AnswerOutcome {
        let outcome = self.engine.answer(direction);
        self.narrate_finish(outcome);
        outcome
    }

    pub fn answer_input(&mut self, raw: &str) -> Result<AnswerOutcome, EngineError> {
        let outcome = self.engine.answer_input(raw)?;
        self.narrate_finish(outcome);
        Ok(outcome)
    }

    pub fn undo(&mut self) -> Result<&TestState, EngineError> {
        self.engine.undo()
    }

    pub fn toggle_pause(&mut self) -> &TestState {
        let paused = self.engine.toggle_pause().is_paused;
        self.narrator
            .narrate(if paused { &Cue::Paused } else { &Cue::Resumed });
        self.engine.state()
    }

    /// Hand over the finished eye's result and move on.
    ///
    /// After the right eye, the engine is restarted for the left eye with a
    /// clean state and an empty undo stack. After the left eye, the session
    /// is complete and further calls fail with
    /// [`SessionError::SessionComplete`].
    pub fn advance(&mut self) -> Result<SessionProgress, SessionError> {
        if self.is_complete {
            return Err(SessionError::SessionComplete);
        }
        let state = self.engine.state();
        let result = match (state.is_finished, state.result) {
            (true, Some(result)) => result,
            _ => return Err(SessionError::EyeNotFinished(state.eye)),
        };
        let completed = EyeResult {
            eye: state.eye,
            distance: self.distance,
            result,
            trials: state.history.clone(),
        };
        info!(
            eye = %completed.eye,
            distance = %completed.distance,
            acuity = completed.result.value(),
            below_floor = completed.result.is_below_floor(),
            trials = completed.trials.len(),
            "eye completed"
        );

        match completed.eye {
            Eye::Right => {
                self.engine.start(Eye::Left);
                self.narrator.narrate(&Cue::TestStarted(Eye::Left));
                Ok(SessionProgress::NextEye { completed })
            }
            Eye::Left => {
                self.is_complete = true;
                self.narrator.narrate(&Cue::SessionFinished);
                Ok(SessionProgress::Complete { completed })
            }
        }
    }

    fn narrate_finish(&mut self, outcome: AnswerOutcome) {
        if let AnswerOutcome::Applied { step, .. } = outcome {
            if step.is_terminal() {
                let state = self.engine.state();
                if let Some(result) = state.result {
                    self.narrator.narrate(&Cue::EyeFinished(state.eye, result));
                }
            }
        }
    }
}
