//! Staircase engine -- the stateful shell around the pure transition table.
//!
//! # Overview
//!
//! [`StaircaseEngine`] owns the current [`TestState`], the target direction
//! of the pending trial, the undo snapshot stack, and the injected
//! [`DirectionSource`]. Every mutation goes through [`StaircaseEngine::start`],
//! [`StaircaseEngine::answer`], [`StaircaseEngine::undo`] or
//! [`StaircaseEngine::toggle_pause`].
//!
//! # Trial lifecycle
//!
//! ```text
//! start ──► draw target ──► answer ──► push snapshot ──► advance ──► draw target
//!                              │                                        ▲
//!                              └── paused / finished: Ignored ──────────┘ (no draw)
//! undo ──► pop snapshot ──► restore ──► draw target
//! ```
//!
//! The target is redrawn after undo so the subject cannot learn it by
//! undoing.
//!
//! # Concurrency
//!
//! Single-threaded. The engine has no locks; callers deliver events one at a
//! time and each call runs to completion.

use crate::direction::DirectionSource;
use crate::error::EngineError;
use crate::optotype::{Direction, Eye};
use crate::snapshots::SnapshotStack;
use crate::staircase::{advance, Step, TestState, Trial};
use serde::Serialize;
use tracing::debug;

/// Why an answer was dropped without touching state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    Paused,
    Finished,
}

/// Result of delivering one answer to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AnswerOutcome {
    /// The answer was applied and produced this transition.
    Applied { correct: bool, step: Step },
    /// The answer was a defined no-op.
    Ignored { reason: IgnoreReason },
}

impl AnswerOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, AnswerOutcome::Applied { .. })
    }
}

/// Adaptive staircase for one eye at a time.
pub struct StaircaseEngine<D: DirectionSource> {
    state: TestState,
    target: Direction,
    snapshots: SnapshotStack<TestState>,
    directions: D,
}

impl<D: DirectionSource> StaircaseEngine<D> {
    /// Create an engine and start a test for `eye`.
    pub fn new(mut directions: D, eye: Eye) -> Self {
        let target = directions.next_direction();
        StaircaseEngine {
            state: TestState::new(eye),
            target,
            snapshots: SnapshotStack::new(),
            directions,
        }
    }

    /// Reset everything and start a fresh test for `eye`.
    ///
    /// Counters, audit trail, pause flag and snapshot stack are all cleared;
    /// the result is indistinguishable from a newly constructed engine.
    pub fn start(&mut self, eye: Eye) -> &TestState {
        self.state = TestState::new(eye);
        self.snapshots.clear();
        self.target = self.directions.next_direction();
        debug!(eye = %eye, "staircase started");
        &self.state
    }

    pub fn state(&self) -> &TestState {
        &self.state
    }

    /// Target direction of the pending trial. For the renderer only; input
    /// channels must never see it.
    pub fn current_target(&self) -> Direction {
        self.target
    }

    pub fn can_undo(&self) -> bool {
        self.snapshots.can_undo()
    }

    /// Apply an answer. Ignored while paused or finished.
    pub fn answer(&mut self, direction: Direction) -> AnswerOutcome {
        let trial = Trial {
            target: self.target,
            answer: direction,
        };

        let Some((next, step)) = advance(&self.state, trial) else {
            let reason = if self.state.is_finished {
                IgnoreReason::Finished
            } else {
                IgnoreReason::Paused
            };
            debug!(?reason, answer = %direction, "answer ignored");
            return AnswerOutcome::Ignored { reason };
        };

        let previous = std::mem::replace(&mut self.state, next);
        debug!(
            eye = %self.state.eye,
            from_level = previous.level(),
            to_level = self.state.level(),
            correct = trial.is_correct(),
            ?step,
            "staircase transition"
        );
        self.snapshots.push(previous);
        self.target = self.directions.next_direction();

        AnswerOutcome::Applied {
            correct: trial.is_correct(),
            step,
        }
    }

    /// Apply a raw answer from an input channel.
    ///
    /// Anything that does not parse as a direction is rejected with
    /// [`EngineError::InvalidInput`] and leaves state untouched.
    pub fn answer_input(&mut self, raw: &str) -> Result<AnswerOutcome, EngineError> {
        let direction: Direction = raw
            .parse()
            .map_err(|_| EngineError::InvalidInput(raw.to_string()))?;
        Ok(self.answer(direction))
    }

    /// Restore the state from before the last applied answer.
    ///
    /// Every field comes from the snapshot except `is_paused`, which keeps
    /// its current value, so undo never pauses or resumes. A verbatim
    /// restore would always resume: snapshots are only taken while unpaused.
    pub fn undo(&mut self) -> Result<&TestState, EngineError> {
        let snapshot = self.snapshots.pop().ok_or(EngineError::NothingToUndo)?;
        let is_paused = self.state.is_paused;
        self.state = TestState {
            is_paused,
            ..snapshot
        };
        self.target = self.directions.next_direction();
        debug!(
            eye = %self.state.eye,
            level = self.state.level(),
            depth = self.snapshots.depth(),
            "undo"
        );
        Ok(&self.state)
    }

    /// Flip the pause flag. Not recorded and not undoable.
    pub fn toggle_pause(&mut self) -> &TestState {
        self.state = TestState {
            is_paused: !self.state.is_paused,
            ..self.state.clone()
        };
        debug!(paused = self.state.is_paused, "pause toggled");
        &self.state
    }

    /// Give back the direction source.
    pub fn into_directions(self) -> D {
        self.directions
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direction::ScriptedDirections;
    use crate::staircase::{AcuityResult, BELOW_FLOOR_SENTINEL};

    fn engine_with(script: Vec<Direction>) -> StaircaseEngine<ScriptedDirections> {
        StaircaseEngine::new(ScriptedDirections::new(script), Eye::Right)
    }

    /// Engine whose target is always `Up`.
    fn engine() -> StaircaseEngine<ScriptedDirections> {
        engine_with(vec![Direction::Up])
    }

    fn hit(e: &mut StaircaseEngine<ScriptedDirections>) -> AnswerOutcome {
        let target = e.current_target();
        e.answer(target)
    }

    fn miss(e: &mut StaircaseEngine<ScriptedDirections>) -> AnswerOutcome {
        let target = e.current_target();
        e.answer(target.clockwise())
    }

    #[test]
    fn initial_target_comes_from_source() {
        let e = engine_with(vec![Direction::Left, Direction::Down]);
        assert_eq!(e.current_target(), Direction::Left);
        assert!(!e.can_undo());
    }

    #[test]
    fn target_is_redrawn_after_every_applied_answer() {
        let mut e = engine_with(vec![Direction::Left, Direction::Down, Direction::Up]);
        hit(&mut e);
        assert_eq!(e.current_target(), Direction::Down);
        miss(&mut e);
        assert_eq!(e.current_target(), Direction::Up);
    }

    #[test]
    fn seven_hits_finish_at_ceiling() {
        let mut e = engine();
        for _ in 0..7 {
            assert!(hit(&mut e).is_applied());
        }
        let s = e.state();
        assert!(s.is_finished);
        assert_eq!(s.result.map(|r| r.value()), Some(1.2));
        assert!(!s.is_retrying);
    }

    #[test]
    fn two_misses_at_floor_finish_below_floor() {
        let mut e = engine();
        miss(&mut e);
        miss(&mut e);
        assert!(e.state().is_finished);
        assert_eq!(
            e.state().result.map(|r| r.value()),
            Some(BELOW_FLOOR_SENTINEL)
        );
    }

    #[test]
    fn miss_then_hit_never_steps_down() {
        let mut e = engine();
        hit(&mut e);
        hit(&mut e);
        let before = e.state().level_index;
        miss(&mut e);
        assert_eq!(e.state().level_index, before);
        assert_eq!(e.state().consecutive_wrong, 1);
        let outcome = hit(&mut e);
        assert_eq!(
            outcome,
            AnswerOutcome::Applied {
                correct: true,
                step: Step::Advance
            }
        );
        assert!(e.state().level_index >= before);
        assert_eq!(e.state().consecutive_wrong, 0);
        assert!(!e.state().is_retrying);
    }

    #[test]
    fn retry_hit_finishes_at_that_level() {
        let mut e = engine();
        for _ in 0..4 {
            hit(&mut e);
        }
        miss(&mut e);
        miss(&mut e);
        assert!(e.state().is_retrying);
        let level_at_retry = e.state().level_index;
        hit(&mut e);
        assert!(e.state().is_finished);
        assert_eq!(e.state().result, Some(AcuityResult::Level(level_at_retry)));
    }

    #[test]
    fn answers_after_finish_are_ignored() {
        let mut e = engine();
        miss(&mut e);
        miss(&mut e);
        let snapshot = e.state().clone();
        let target = e.current_target();
        let outcome = hit(&mut e);
        assert_eq!(
            outcome,
            AnswerOutcome::Ignored {
                reason: IgnoreReason::Finished
            }
        );
        assert_eq!(e.state(), &snapshot);
        assert_eq!(e.current_target(), target, "ignored answers do not redraw");
    }

    #[test]
    fn answers_while_paused_are_ignored() {
        let mut e = engine();
        e.toggle_pause();
        let outcome = hit(&mut e);
        assert_eq!(
            outcome,
            AnswerOutcome::Ignored {
                reason: IgnoreReason::Paused
            }
        );
        assert!(e.state().history.is_empty());
        assert!(!e.can_undo());
        e.toggle_pause();
        assert!(hit(&mut e).is_applied());
        assert_eq!(e.state().history.len(), 1);
    }

    #[test]
    fn pause_is_not_recorded_or_undoable() {
        let mut e = engine();
        let paused = e.toggle_pause().clone();
        assert!(paused.is_paused);
        assert!(paused.history.is_empty());
        assert!(!e.can_undo());
        assert_eq!(e.undo().unwrap_err(), EngineError::NothingToUndo);
    }

    #[test]
    fn invalid_raw_input_is_rejected_without_change() {
        let mut e = engine();
        let before = e.state().clone();
        let err = e.answer_input("north-east").unwrap_err();
        assert_eq!(err, EngineError::InvalidInput("north-east".into()));
        assert_eq!(e.state(), &before);
        assert!(!e.can_undo());
    }

    #[test]
    fn raw_input_is_applied_when_valid() {
        let mut e = engine();
        let outcome = e.answer_input("up").unwrap();
        assert_eq!(
            outcome,
            AnswerOutcome::Applied {
                correct: true,
                step: Step::Advance
            }
        );
    }

    #[test]
    fn undo_restores_previous_state_exactly() {
        let mut e = engine();
        hit(&mut e);
        hit(&mut e);
        miss(&mut e);

        for action in [true, false, false, true] {
            let before = e.state().clone();
            if action {
                hit(&mut e);
            } else {
                miss(&mut e);
            }
            let restored = e.undo().unwrap().clone();
            assert_eq!(restored, before);
            // Re-apply to walk forward through the sequence.
            if action {
                hit(&mut e);
            } else {
                miss(&mut e);
            }
        }
    }

    #[test]
    fn undo_twice_with_one_snapshot_reports_nothing_to_undo() {
        let mut e = engine();
        let initial = e.state().clone();
        hit(&mut e);
        assert_eq!(e.undo().unwrap(), &initial);
        let err = e.undo().unwrap_err();
        assert_eq!(err, EngineError::NothingToUndo);
        assert_eq!(e.state(), &initial);
    }

    #[test]
    fn undo_redraws_target() {
        let mut e = engine_with(vec![Direction::Up, Direction::Left, Direction::Down]);
        hit(&mut e);
        assert_eq!(e.current_target(), Direction::Left);
        e.undo().unwrap();
        assert_eq!(e.current_target(), Direction::Down);
    }

    #[test]
    fn undo_reopens_finished_test() {
        let mut e = engine();
        miss(&mut e);
        miss(&mut e);
        assert!(e.state().is_finished);
        e.undo().unwrap();
        assert!(!e.state().is_finished);
        assert!(e.state().result.is_none());
        assert_eq!(e.state().consecutive_wrong, 1);
    }

    #[test]
    fn undo_keeps_current_pause_flag() {
        let mut e = engine();
        hit(&mut e);
        e.toggle_pause();
        let restored = e.undo().unwrap().clone();
        assert!(restored.is_paused);
        assert_eq!(restored.level_index, 0);
        assert!(restored.history.is_empty());
        // Still paused, so answers stay ignored until resumed.
        assert!(matches!(e.answer(Direction::Up), AnswerOutcome::Ignored { .. }));
    }

    #[test]
    fn start_resets_state_and_undo_stack() {
        let mut e = engine();
        hit(&mut e);
        miss(&mut e);
        e.toggle_pause();
        let fresh = e.start(Eye::Left).clone();
        assert_eq!(fresh, TestState::new(Eye::Left));
        assert!(!e.can_undo());
    }

    #[test]
    fn history_length_counts_applied_answers_only() {
        let mut e = engine();
        hit(&mut e);
        e.toggle_pause();
        hit(&mut e);
        e.toggle_pause();
        miss(&mut e);
        let _ = e.answer_input("sideways");
        hit(&mut e);
        let levels: Vec<usize> = e.state().history.iter().map(|t| t.level_index).collect();
        assert_eq!(levels, vec![0, 1, 1]);
    }

    #[test]
    fn into_directions_returns_source() {
        let mut e = engine_with(vec![Direction::Up, Direction::Down]);
        hit(&mut e);
        let src = e.into_directions();
        assert_eq!(src.drawn(), 2);
    }
}
