//! Status HUD -- always-visible strip stating exactly where the test is.
//!
//! # Required fields
//!
//! 1. Eye under test
//! 2. Viewing distance
//! 3. Current level (or the final result once finished)
//! 4. Calibrated optotype size, and the ladder magnification if any
//! 5. Mode: forward, retry, paused or finished
//! 6. Undo availability
//!
//! The second line lists the keys that act in the current phase.

use crate::visual_tone;
use acuity_core::optotype::{DistanceCategory, Eye};
use acuity_core::staircase::{AcuityResult, TestState};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Everything the HUD confesses, gathered by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct HudView {
    pub eye: Eye,
    pub distance: DistanceCategory,
    pub level: f64,
    pub result: Option<AcuityResult>,
    pub size_px: Option<f64>,
    /// Ladder magnification; `1.0` when drawn at calibrated size.
    pub scale: f64,
    pub is_retrying: bool,
    pub is_paused: bool,
    pub is_finished: bool,
    pub can_undo: bool,
    pub session_complete: bool,
}

impl HudView {
    pub fn from_state(
        state: &TestState,
        distance: DistanceCategory,
        size_px: Option<f64>,
        scale: f64,
        can_undo: bool,
        session_complete: bool,
    ) -> Self {
        HudView {
            eye: state.eye,
            distance,
            level: state.level(),
            result: state.result,
            size_px,
            scale,
            is_retrying: state.is_retrying,
            is_paused: state.is_paused,
            is_finished: state.is_finished,
            can_undo,
            session_complete,
        }
    }

    fn mode(&self) -> (&'static str, Style) {
        if self.session_complete {
            ("done", visual_tone::success())
        } else if self.is_finished {
            ("finished", visual_tone::success())
        } else if self.is_paused {
            ("PAUSED", visual_tone::warning())
        } else if self.is_retrying {
            ("retry", visual_tone::warning())
        } else {
            ("forward", visual_tone::info())
        }
    }

    fn key_hints(&self) -> &'static str {
        if self.session_complete {
            " Enter/q quit"
        } else if self.is_finished {
            " Enter save & continue | u undo | Tab log | q quit"
        } else if self.is_paused {
            " p resume | u undo | Tab log | q quit"
        } else {
            " ←↑↓→/hjkl/wasd answer | / type | u undo | p pause | Tab log | q quit"
        }
    }
}

pub fn render_status_hud(frame: &mut Frame, area: Rect, hud: &HudView) {
    let size = match hud.size_px {
        Some(px) if hud.scale > 1.0 => format!("{px:.1}px (x{:.1})", hud.scale),
        Some(px) => format!("{px:.1}px"),
        None => "-".to_string(),
    };
    let level = match hud.result {
        Some(result) => Span::styled(result.label(), visual_tone::result(result)),
        None => Span::styled(format!("{:.1}", hud.level), visual_tone::info()),
    };
    let (mode, mode_style) = hud.mode();

    let status_line = Line::from(vec![
        Span::styled(" Eye: ", visual_tone::label()),
        Span::styled(hud.eye.as_str(), visual_tone::info()),
        Span::raw(" | "),
        Span::styled("Distance: ", visual_tone::label()),
        Span::raw(hud.distance.as_str()),
        Span::raw(" | "),
        Span::styled(
            if hud.result.is_some() { "Result: " } else { "Level: " },
            visual_tone::label(),
        ),
        level,
        Span::raw(" | "),
        Span::styled("Size: ", visual_tone::label()),
        Span::raw(size),
        Span::raw(" | "),
        Span::styled("Mode: ", visual_tone::label()),
        Span::styled(mode, mode_style),
        Span::raw(" | "),
        Span::styled("Undo: ", visual_tone::label()),
        if hud.can_undo {
            Span::styled("yes", visual_tone::success())
        } else {
            Span::styled("no", visual_tone::muted())
        },
    ]);
    let keys_line = Line::from(Span::styled(hud.key_hints(), visual_tone::muted()));

    let block = Block::default()
        .title(" Status ")
        .borders(Borders::ALL)
        .border_style(visual_tone::panel_border());
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(Paragraph::new(vec![status_line, keys_line]), inner);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    fn buffer_text(terminal: &Terminal<TestBackend>, area: Rect) -> String {
        let buf = terminal.backend().buffer();
        let mut text = String::new();
        for y in area.y..area.y + area.height {
            for x in area.x..area.x + area.width {
                text.push(buf[(x, y)].symbol().chars().next().unwrap_or(' '));
            }
        }
        text
    }

    fn render(hud: &HudView) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 4)).unwrap();
        terminal
            .draw(|frame| render_status_hud(frame, Rect::new(0, 0, 120, 4), hud))
            .unwrap();
        buffer_text(&terminal, Rect::new(0, 0, 120, 4))
    }

    fn base() -> HudView {
        HudView::from_state(
            &TestState::new(Eye::Right),
            DistanceCategory::Far3M,
            Some(113.4),
            1.0,
            false,
            false,
        )
    }

    #[test]
    fn hud_renders_all_required_fields() {
        let text = render(&base());
        assert!(text.contains("Eye: right"));
        assert!(text.contains("Distance: 3m"));
        assert!(text.contains("Level: 0.5"));
        assert!(text.contains("Size: 113.4px"));
        assert!(text.contains("Mode: forward"));
        assert!(text.contains("Undo: no"));
        assert!(text.contains("u undo"));
    }

    #[test]
    fn hud_shows_magnification_and_retry() {
        let hud = HudView {
            scale: 1.69,
            is_retrying: true,
            can_undo: true,
            ..base()
        };
        let text = render(&hud);
        assert!(text.contains("Size: 113.4px (x1.7)"));
        assert!(text.contains("Mode: retry"));
        assert!(text.contains("Undo: yes"));
    }

    #[test]
    fn hud_labels_below_floor_result() {
        let hud = HudView {
            is_finished: true,
            result: Some(AcuityResult::BelowFloor),
            ..base()
        };
        let text = render(&hud);
        assert!(text.contains("Result: <0.5"));
        assert!(text.contains("Mode: finished"));
        assert!(text.contains("Enter save & continue"));
    }

    #[test]
    fn paused_mode_wins_over_retry() {
        let hud = HudView {
            is_paused: true,
            is_retrying: true,
            ..base()
        };
        assert!(render(&hud).contains("Mode: PAUSED"));
    }
}
