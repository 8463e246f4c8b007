//! Narration cues for speech or on-screen guidance.
//!
//! Narrators observe session progress and have no way to influence it: they
//! receive a [`Cue`] by reference and return nothing.

use crate::optotype::Eye;
use crate::staircase::AcuityResult;
use tracing::info;

/// A point in the session worth announcing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    /// A test for this eye is starting.
    TestStarted(Eye),
    /// The test for this eye produced a result.
    EyeFinished(Eye, AcuityResult),
    /// Both eyes are done.
    SessionFinished,
    Paused,
    Resumed,
}

impl Cue {
    /// Spoken or displayed guidance text.
    pub fn message(&self) -> String {
        match self {
            Cue::TestStarted(Eye::Right) => {
                "Starting the test with your right eye. Cover your left eye and tell me which way the gap opens.".to_string()
            }
            Cue::TestStarted(Eye::Left) => {
                "Now the left eye. Cover your right eye and tell me which way the gap opens.".to_string()
            }
            Cue::EyeFinished(Eye::Right, _) => {
                "Right eye finished. Next is the left eye.".to_string()
            }
            Cue::EyeFinished(Eye::Left, _) => "Left eye finished.".to_string(),
            Cue::SessionFinished => "The test is complete. Well done.".to_string(),
            Cue::Paused => "Paused.".to_string(),
            Cue::Resumed => "Resuming.".to_string(),
        }
    }
}

/// Capability that voices or displays cues.
pub trait Narrator {
    fn narrate(&mut self, cue: &Cue);
}

/// Drops every cue.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentNarrator;

impl Narrator for SilentNarrator {
    fn narrate(&mut self, _cue: &Cue) {}
}

/// Emits cues as `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNarrator;

impl Narrator for TracingNarrator {
    fn narrate(&mut self, cue: &Cue) {
        info!(cue = ?cue, "{}", cue.message());
    }
}

/// Keeps every cue in order. Used by front ends that show the latest line
/// and by tests.
#[derive(Debug, Default, Clone)]
pub struct TranscriptNarrator {
    cues: Vec<Cue>,
}

impl TranscriptNarrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    pub fn latest(&self) -> Option<&Cue> {
        self.cues.last()
    }
}

impl Narrator for TranscriptNarrator {
    fn narrate(&mut self, cue: &Cue) {
        self.cues.push(*cue);
    }
}
