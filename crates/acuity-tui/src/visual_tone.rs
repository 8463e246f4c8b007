//! Shared visual tone tokens for the acuity test screen.
//!
//! Status semantics stay consistent across panels:
//! - success: correct answers, readable results
//! - warning: retry mode, pause, first misses
//! - error: wrong answers, below-floor results, failed saves
//! - info: eye, distance and level identifiers
//! - muted: key hints and metadata chrome

use acuity_core::staircase::AcuityResult;
use ratatui::style::{Color, Modifier, Style};

pub fn success() -> Style {
    Style::default().fg(Color::Green)
}

pub fn warning() -> Style {
    Style::default().fg(Color::Yellow)
}

pub fn error() -> Style {
    Style::default().fg(Color::Red)
}

pub fn info() -> Style {
    Style::default().fg(Color::Cyan)
}

pub fn muted() -> Style {
    Style::default().fg(Color::DarkGray)
}

pub fn label() -> Style {
    Style::default().fg(Color::White)
}

pub fn panel_border() -> Style {
    Style::default().fg(Color::Gray)
}

/// The optotype itself: plain high-contrast glyphs, no color.
pub fn optotype() -> Style {
    Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
}

pub fn answer(correct: bool) -> Style {
    if correct {
        success()
    } else {
        error()
    }
}

pub fn result(result: AcuityResult) -> Style {
    match result {
        AcuityResult::BelowFloor => error().add_modifier(Modifier::BOLD),
        AcuityResult::Level(_) => success().add_modifier(Modifier::BOLD),
    }
}
